use serde::{Deserialize, Serialize};

use crate::intent::IntentSignals;

/// Body of every failed response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ParseIntentRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ParseIntentResponse {
    pub intent: IntentSignals,
    pub suggested_chips: Vec<&'static str>,
}

impl ParseIntentResponse {
    pub fn from_intent(intent: IntentSignals) -> Self {
        let mut suggested_chips = Vec::new();
        if intent.open_now {
            suggested_chips.push("Open now");
        }
        if intent.vegan {
            suggested_chips.push("Vegan");
        }
        if intent.vegetarian {
            suggested_chips.push("Vegetarian");
        }
        Self {
            intent,
            suggested_chips,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub commit_sha: Option<String>,
    pub env: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
