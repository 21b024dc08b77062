use serde::{Deserialize, Serialize};

use crate::error::RecommendationError;

/// Smallest and largest search radius accepted, in kilometers.
pub const MIN_RADIUS_KM: f64 = 0.001;
pub const MAX_RADIUS_KM: f64 = 50.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> LatLng {
        LatLng { lat, lng }
    }

    fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Ordinal price tier. Always compare through [`BudgetTier::rank`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BudgetTier {
    #[serde(rename = "$")]
    Inexpensive,
    #[serde(rename = "$$")]
    Moderate,
    #[serde(rename = "$$$")]
    Expensive,
    #[serde(rename = "$$$$")]
    VeryExpensive,
}

impl BudgetTier {
    pub fn rank(self) -> u8 {
        match self {
            BudgetTier::Inexpensive => 1,
            BudgetTier::Moderate => 2,
            BudgetTier::Expensive => 3,
            BudgetTier::VeryExpensive => 4,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BudgetTier::Inexpensive => "$",
            BudgetTier::Moderate => "$$",
            BudgetTier::Expensive => "$$$",
            BudgetTier::VeryExpensive => "$$$$",
        }
    }

    /// Maps the places source price enumeration. Free and unspecified levels have no tier.
    pub fn from_places_level(level: &str) -> Option<BudgetTier> {
        match level {
            "PRICE_LEVEL_INEXPENSIVE" => Some(BudgetTier::Inexpensive),
            "PRICE_LEVEL_MODERATE" => Some(BudgetTier::Moderate),
            "PRICE_LEVEL_EXPENSIVE" => Some(BudgetTier::Expensive),
            "PRICE_LEVEL_VERY_EXPENSIVE" => Some(BudgetTier::VeryExpensive),
            _ => None,
        }
    }

    pub fn exceeds(self, ceiling: BudgetTier) -> bool {
        self.rank() > ceiling.rank()
    }
}

impl std::fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Caller-facing request body. Every field is optional here so that
/// [`SearchQuery::from_request`] owns the validation error.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SearchRequest {
    pub location: Option<LatLng>,
    pub radius_km: Option<f64>,
    pub budget_max: Option<BudgetTier>,
    #[serde(default)]
    pub chips: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

/// A validated, normalized search. Immutable for the lifetime of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub location: LatLng,
    pub radius_km: f64,
    pub budget_max: BudgetTier,
    pub chips: Vec<String>,
    pub category: Option<String>,
    pub query: Option<String>,
}

impl SearchQuery {
    pub fn from_request(request: SearchRequest) -> Result<SearchQuery, RecommendationError> {
        let location = request
            .location
            .ok_or_else(|| RecommendationError::Validation("location is required".into()))?;
        if !location.is_valid() {
            return Err(RecommendationError::Validation(format!(
                "location out of range: lat={}, lng={}",
                location.lat, location.lng
            )));
        }

        let radius_km = request
            .radius_km
            .ok_or_else(|| RecommendationError::Validation("radius_km is required".into()))?;
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(RecommendationError::Validation(format!(
                "radius_km must be a positive number, got {radius_km}"
            )));
        }

        let budget_max = request
            .budget_max
            .ok_or_else(|| RecommendationError::Validation("budget_max is required".into()))?;

        Ok(SearchQuery {
            location,
            radius_km: radius_km.clamp(MIN_RADIUS_KM, MAX_RADIUS_KM),
            budget_max,
            chips: normalize_chips(&request.chips),
            category: non_blank(request.category),
            query: non_blank(request.query),
        })
    }

    pub fn has_chip(&self, chip: &str) -> bool {
        self.chips.iter().any(|c| c == chip)
    }
}

/// Lower-cases chips and collapses their whitespace so "Open  Now " matches "open now".
pub fn normalize_chips(chips: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(chips.len());
    for chip in chips {
        let normalized = chip
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if !normalized.is_empty() && !out.contains(&normalized) {
            out.push(normalized);
        }
    }
    out
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PhotoAttribution {
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// One venue normalized from the places source.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub place_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,

    /// Raw source tag, e.g. `middle_eastern_restaurant`. Replaced by the label in responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip)]
    pub category_label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_level: Option<BudgetTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u64>,
    pub distance_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub photo_attributions: Vec<PhotoAttribution>,
}

impl Candidate {
    pub fn is_open_now(&self) -> bool {
        self.open_now == Some(true)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

impl ScoredCandidate {
    pub fn new(candidate: Candidate, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            candidate,
            score,
            justification: None,
        }
    }

    /// Presentation pass: rounds the distance and swaps the raw tag for its label.
    pub fn finalize(mut self) -> ScoredCandidate {
        self.candidate.distance_km = round2(self.candidate.distance_km);
        self.candidate.category = self.candidate.category_label.clone();
        self
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct RecommendationResponse {
    pub results: Vec<ScoredCandidate>,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
