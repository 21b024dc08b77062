use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::config::Config;
use crate::data_models::{RecommendationResponse, ScoredCandidate, SearchQuery, SearchRequest};
use crate::error::RecommendationError;
use crate::intent::{IntentExtractor, IntentSignals};
use crate::justification::{
    Enrichment, JustificationEnricher, JustificationGenerator, JustificationPrompt, OpenAiJustifier,
};
use crate::places::{GooglePlacesClient, PlacesGateway, PlacesSource, compose_text_query};
use crate::scoring::{RESULT_LIMIT, ScoringEngine};

/// One request in, one ranked response out. Holds no per-request state, so a
/// single instance is shared across concurrent requests.
pub struct RecommendationPipeline {
    gateway: Option<PlacesGateway>,
    intent: IntentExtractor,
    scoring: ScoringEngine,
    enricher: JustificationEnricher,
}

impl RecommendationPipeline {
    pub fn new(gateway: Option<PlacesGateway>, enricher: JustificationEnricher) -> Self {
        Self {
            gateway,
            intent: IntentExtractor::new(),
            scoring: ScoringEngine::new(),
            enricher,
        }
    }

    /// Wires the Google Places source and the OpenAI generator when their
    /// credentials are present.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        let gateway = match config.google_maps_api_key.clone() {
            Some(key) => {
                let client = GooglePlacesClient::new(
                    key,
                    config.places_search_url.clone(),
                    config.places_timeout,
                )?;
                let source: Arc<dyn PlacesSource> = Arc::new(client);
                Some(PlacesGateway::new(source, config.photo_proxy_path.clone()))
            }
            None => None,
        };

        let generator = config.openai_api_key.clone().map(|key| {
            Arc::new(OpenAiJustifier::new(
                key,
                config.openai_chat_url.clone(),
                config.justification_model.clone(),
            )) as Arc<dyn JustificationGenerator>
        });

        Ok(Self::new(
            gateway,
            JustificationEnricher::new(generator, config.justification_timeout),
        ))
    }

    pub fn extract_intent(&self, text: Option<&str>) -> IntentSignals {
        self.intent.extract(text)
    }

    #[instrument(skip_all)]
    pub async fn recommend(
        &self,
        request: SearchRequest,
    ) -> Result<RecommendationResponse, RecommendationError> {
        let query = SearchQuery::from_request(request)?;
        let gateway = self.gateway.as_ref().ok_or_else(|| {
            RecommendationError::Configuration("GOOGLE_MAPS_API_KEY is not set".to_string())
        })?;

        let intent = self.intent.extract(query.query.as_deref());
        let candidates = gateway.search(&query, &intent).await?;
        if candidates.is_empty() {
            info!("no candidates from places source");
            return Ok(RecommendationResponse::default());
        }

        let pre_ranked = self.scoring.rank(candidates, &query, &intent);

        // Captions are requested for the whole pre-ranked set, then only the
        // final slice keeps them.
        let enrichment = if self.enricher.is_enabled() {
            let query_text = query
                .query
                .clone()
                .unwrap_or_else(|| compose_text_query(&query, &intent));
            let prompt = JustificationPrompt::new(query.budget_max, query_text, &pre_ranked);
            self.enricher.enrich(&prompt).await
        } else {
            Enrichment::Absent
        };

        let mut results: Vec<ScoredCandidate> =
            pre_ranked.into_iter().take(RESULT_LIMIT).collect();
        enrichment.apply(&mut results);
        let results: Vec<ScoredCandidate> =
            results.into_iter().map(ScoredCandidate::finalize).collect();

        info!(results = results.len(), "recommendations ready");
        Ok(RecommendationResponse { results })
    }

    /// Same as [`Self::recommend`], but a panic anywhere inside becomes
    /// [`RecommendationError::Unexpected`]. Runs on the caller's task, so
    /// dropping the future still cancels the request.
    pub async fn recommend_guarded(
        &self,
        request: SearchRequest,
    ) -> Result<RecommendationResponse, RecommendationError> {
        match AssertUnwindSafe(self.recommend(request)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                error!(%detail, "recommendation pipeline panicked");
                Err(RecommendationError::Unexpected(detail))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
