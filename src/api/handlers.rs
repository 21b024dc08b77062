use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::data_models::{RecommendationResponse, SearchRequest};
use crate::error::RecommendationError;
use crate::pipeline::RecommendationPipeline;

use super::models::{
    ErrorEnvelope, HealthResponse, ParseIntentRequest, ParseIntentResponse, VersionResponse,
};

impl IntoResponse for RecommendationError {
    fn into_response(self) -> Response {
        let status = match &self {
            RecommendationError::Validation(_) => StatusCode::BAD_REQUEST,
            RecommendationError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            RecommendationError::Configuration(_) | RecommendationError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if let RecommendationError::Unexpected(detail) = &self {
            error!(%detail, "unexpected error");
        }

        let body = Json(ErrorEnvelope {
            error: self.kind().to_string(),
            detail: self.public_detail(),
        });
        (status, body).into_response()
    }
}

pub async fn recommendations_handler(
    State(pipeline): State<Arc<RecommendationPipeline>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<RecommendationResponse>, RecommendationError> {
    let start = Instant::now();

    let Json(body) = body.map_err(|e| RecommendationError::Validation(e.body_text()))?;
    let request: SearchRequest = serde_json::from_value(body)
        .map_err(|e| RecommendationError::Validation(format!("invalid request body: {e}")))?;

    let response = pipeline.recommend_guarded(request).await?;

    info!(
        results = response.results.len(),
        processing_time_ms = start.elapsed().as_millis() as u64,
        "served recommendations"
    );
    Ok(Json(response))
}

pub async fn parse_intent_handler(
    State(pipeline): State<Arc<RecommendationPipeline>>,
    body: Result<Json<ParseIntentRequest>, JsonRejection>,
) -> Result<Json<ParseIntentResponse>, RecommendationError> {
    let Json(request) = body.map_err(|e| RecommendationError::Validation(e.body_text()))?;
    let intent = pipeline.extract_intent(request.query.as_deref());
    Ok(Json(ParseIntentResponse::from_intent(intent)))
}

pub async fn version_handler() -> Json<VersionResponse> {
    let default_env = if cfg!(debug_assertions) {
        "development"
    } else {
        "production"
    };
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit_sha: std::env::var("GIT_COMMIT_SHA").ok().filter(|s| !s.is_empty()),
        env: std::env::var("WHATSPOT_ENV").unwrap_or_else(|_| default_env.to_string()),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
