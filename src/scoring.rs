use tracing::debug;

use crate::data_models::{BudgetTier, Candidate, ScoredCandidate, SearchQuery};
use crate::intent::IntentSignals;

/// Size of the pre-ranked working set handed to enrichment.
pub const PRE_RANK_LIMIT: usize = 40;
/// Size of the final response.
pub const RESULT_LIMIT: usize = 15;

pub const REVIEW_WEIGHT: f64 = 0.12;
pub const PRICE_PENALTY_PER_TIER: f64 = 0.45;
pub const FREE_DISTANCE_KM: f64 = 2.0;
pub const DISTANCE_PENALTY_PER_KM: f64 = 0.08;

pub const OPEN_NOW_BOOST: f64 = 0.30;
pub const VEGAN_BOOST: f64 = 0.25;
pub const VEGETARIAN_BOOST: f64 = 0.15;

pub const CATEGORY_MATCH_BOOST: f64 = 0.4;
pub const TERM_MATCH_BOOST: f64 = 0.1;
pub const CATEGORY_BOOST_CAP: f64 = 0.6;

/// Non-finite inputs count as 0 instead of poisoning the score.
fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

pub fn price_penalty(price: Option<BudgetTier>, budget_max: BudgetTier) -> f64 {
    match price {
        Some(price) => {
            f64::from(price.rank().saturating_sub(budget_max.rank())) * PRICE_PENALTY_PER_TIER
        }
        None => 0.0,
    }
}

pub fn distance_penalty(distance_km: f64) -> f64 {
    let distance = finite_or_zero(Some(distance_km));
    (distance - FREE_DISTANCE_KM).max(0.0) * DISTANCE_PENALTY_PER_KM
}

/// Rating amplified by review volume, minus price and distance penalties.
pub fn base_score(candidate: &Candidate, budget_max: BudgetTier) -> f64 {
    let rating = finite_or_zero(candidate.rating);
    let reviews = candidate.review_count.map(|n| (n as f64).ln_1p()).unwrap_or(0.0);
    rating * (1.0 + reviews * REVIEW_WEIGHT)
        - price_penalty(candidate.price_level, budget_max)
        - distance_penalty(candidate.distance_km)
}

/// Dietary boosts apply whether or not the venue serves that diet; the places
/// source gives no reliable signal for it.
pub fn chip_boost(candidate: &Candidate, query: &SearchQuery, intent: &IntentSignals) -> f64 {
    let mut boost = 0.0;
    if (query.has_chip("open now") || intent.open_now) && candidate.is_open_now() {
        boost += OPEN_NOW_BOOST;
    }
    if query.has_chip("vegan") || intent.vegan {
        boost += VEGAN_BOOST;
    }
    if query.has_chip("vegetarian") || intent.vegetarian {
        boost += VEGETARIAN_BOOST;
    }
    boost
}

pub fn category_boost(candidate: &Candidate, category: Option<&str>, terms: &[String]) -> f64 {
    if category.is_none() && terms.is_empty() {
        return 0.0;
    }
    let label = candidate
        .category_label
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    let mut boost = 0.0;
    if category.is_some_and(|c| label.contains(&c.to_lowercase())) {
        boost += CATEGORY_MATCH_BOOST;
    }
    for term in terms.iter().filter(|t| !t.is_empty()) {
        if label.contains(term.as_str()) {
            boost += TERM_MATCH_BOOST;
        }
    }
    boost.min(CATEGORY_BOOST_CAP)
}

/// Deterministic, I/O-free relevance ranking.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, candidate: &Candidate, query: &SearchQuery, intent: &IntentSignals) -> f64 {
        base_score(candidate, query.budget_max)
            + chip_boost(candidate, query, intent)
            + category_boost(candidate, query.category.as_deref(), &intent.terms)
    }

    /// Scores every candidate independently, sorts by score descending and keeps
    /// the pre-ranked set. The sort is stable, so ties keep source order.
    pub fn rank(
        &self,
        candidates: Vec<Candidate>,
        query: &SearchQuery,
        intent: &IntentSignals,
    ) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|c| {
                let score = self.score(&c, query, intent);
                ScoredCandidate::new(c, score)
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(PRE_RANK_LIMIT);

        debug!(
            pre_ranked = scored.len(),
            top_score = scored.first().map(|s| s.score),
            "ranked candidates"
        );
        scored
    }
}
