use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::pipeline::RecommendationPipeline;

pub mod handlers;
pub mod models;

pub fn create_router(pipeline: Arc<RecommendationPipeline>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(handlers::health_handler))
        .route("/api/version", get(handlers::version_handler))
        .route("/api/parse-intent", post(handlers::parse_intent_handler))
        .route(
            "/api/recommendations",
            post(handlers::recommendations_handler),
        )
        .with_state(pipeline)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
