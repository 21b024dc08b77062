use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::data_models::{BudgetTier, ScoredCandidate, round2};

pub const SYSTEM_INSTRUCTION: &str = "Return strictly JSON with one-line factual justifications per venue using ONLY provided facts. No speculation.";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Facts already known about one venue. Nothing else may be sent to the generator.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct VenueFacts {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<BudgetTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub distance_km: f64,
}

impl VenueFacts {
    pub fn from_scored(scored: &ScoredCandidate) -> Self {
        let c = &scored.candidate;
        Self {
            id: c.place_id.clone(),
            name: c.name.clone(),
            rating: c.rating,
            reviews: c.review_count,
            price: c.price_level,
            open_now: c.open_now,
            category: c.category_label.clone(),
            address: c.address.clone(),
            distance_km: round2(c.distance_km),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JustificationPrompt {
    pub budget_max: BudgetTier,
    /// The caller's free text, or the composed search text when there was none.
    pub query_text: String,
    pub items: Vec<VenueFacts>,
}

impl JustificationPrompt {
    pub fn new(budget_max: BudgetTier, query_text: impl Into<String>, ranked: &[ScoredCandidate]) -> Self {
        Self {
            budget_max,
            query_text: query_text.into(),
            items: ranked.iter().map(VenueFacts::from_scored).collect(),
        }
    }

    pub fn user_message(&self) -> String {
        #[derive(Serialize)]
        struct Items<'a> {
            items: &'a [VenueFacts],
        }
        let payload = serde_json::to_string(&Items { items: &self.items }).unwrap_or_default();
        format!(
            "Budget max: {}. Query: \"{}\".\nReturn {{\"justifications\":{{\"<place_id>\":\"<one line>\"}}}} for all items below:\n\n{}",
            self.budget_max, self.query_text, payload
        )
    }
}

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("justification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("justification generator returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("malformed justification response: {0}")]
    Malformed(String),

    #[error("justification generator timed out after {0:?}")]
    Timeout(Duration),
}

/// External text generator returning `place_id -> one-line caption`.
#[async_trait]
pub trait JustificationGenerator: Send + Sync {
    async fn generate(&self, prompt: &JustificationPrompt) -> Result<HashMap<String, String>, EnrichmentError>;
}

/// Parses `{"justifications": {"<id>": "<line>"}}`. Non-string values are dropped.
pub fn parse_justifications(content: &str) -> Result<HashMap<String, String>, EnrichmentError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| EnrichmentError::Malformed(e.to_string()))?;
    let map = value
        .get("justifications")
        .and_then(|j| j.as_object())
        .ok_or_else(|| EnrichmentError::Malformed("missing \"justifications\" object".into()))?;

    Ok(map
        .iter()
        .filter_map(|(id, line)| {
            line.as_str()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| (id.clone(), l.to_string()))
        })
        .collect())
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions generator.
pub struct OpenAiJustifier {
    client: reqwest::Client,
    api_key: String,
    chat_url: String,
    model: String,
}

impl OpenAiJustifier {
    pub fn new(api_key: String, chat_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            chat_url,
            model,
        }
    }
}

#[async_trait]
impl JustificationGenerator for OpenAiJustifier {
    #[instrument(skip(self, prompt), fields(model = %self.model, items = prompt.items.len()))]
    async fn generate(&self, prompt: &JustificationPrompt) -> Result<HashMap<String, String>, EnrichmentError> {
        let user_message = prompt.user_message();
        let body = ChatCompletionRequest {
            model: &self.model,
            temperature: DEFAULT_TEMPERATURE,
            response_format: ResponseFormat { kind: "json_object" },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: &user_message,
                },
            ],
        };

        let res = self
            .client
            .post(&self.chat_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(EnrichmentError::Status {
                status: status.as_u16(),
                detail: res.text().await.unwrap_or_default(),
            });
        }

        let completion: ChatCompletionResponse = res
            .json()
            .await
            .map_err(|e| EnrichmentError::Malformed(e.to_string()))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_else(|| "{}".to_string());
        parse_justifications(&content)
    }
}

/// Outcome of the best-effort enrichment step. Failures are already recovered here.
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment {
    Attached(HashMap<String, String>),
    Absent,
}

impl Enrichment {
    /// Attaches captions by place id. Items without a caption keep `None`.
    pub fn apply(self, results: &mut [ScoredCandidate]) {
        let Enrichment::Attached(mut lines) = self else {
            return;
        };
        for scored in results.iter_mut() {
            scored.justification = lines.remove(&scored.candidate.place_id);
        }
    }
}

pub struct JustificationEnricher {
    generator: Option<Arc<dyn JustificationGenerator>>,
    timeout: Duration,
}

impl JustificationEnricher {
    pub fn new(generator: Option<Arc<dyn JustificationGenerator>>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn disabled() -> Self {
        Self::new(None, Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Never fails: errors and timeouts are logged and become [`Enrichment::Absent`].
    pub async fn enrich(&self, prompt: &JustificationPrompt) -> Enrichment {
        let Some(generator) = self.generator.as_ref() else {
            return Enrichment::Absent;
        };
        if prompt.items.is_empty() {
            return Enrichment::Absent;
        }

        let outcome = match tokio::time::timeout(self.timeout, generator.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(EnrichmentError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(lines) => {
                debug!(count = lines.len(), "attached justifications");
                Enrichment::Attached(lines)
            }
            Err(e) => {
                warn!(error = %e, "justification enrichment skipped");
                Enrichment::Absent
            }
        }
    }
}
