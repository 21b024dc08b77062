use thiserror::Error;

/// Caller-facing failure of a recommendation request.
///
/// Enrichment failures never show up here; [`crate::justification`] recovers them.
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("missing configuration: {0}")]
    Configuration(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("places source failed{}: {detail}", status_suffix(.status))]
    Upstream { status: Option<u16>, detail: String },

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

impl RecommendationError {
    /// Stable machine-readable kind used in the error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            RecommendationError::Configuration(_) => "configuration_error",
            RecommendationError::Validation(_) => "validation_error",
            RecommendationError::Upstream { .. } => "upstream_error",
            RecommendationError::Unexpected(_) => "unexpected_error",
        }
    }

    /// Detail safe to show to the caller. Unexpected faults only get logged.
    pub fn public_detail(&self) -> Option<String> {
        match self {
            RecommendationError::Configuration(detail) | RecommendationError::Validation(detail) => {
                Some(detail.clone())
            }
            RecommendationError::Upstream { detail, .. } => Some(detail.clone()),
            RecommendationError::Unexpected(_) => None,
        }
    }
}
