mod common;

use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{FailingGenerator, SlowGenerator, StaticGenerator, candidate, spawn_mock_server};
use whatspot::data_models::{BudgetTier, ScoredCandidate};
use whatspot::justification::{
    EnrichmentError, Enrichment, JustificationEnricher, JustificationGenerator,
    JustificationPrompt, OpenAiJustifier, SYSTEM_INSTRUCTION,
};

fn scored(id: &str, score: f64) -> ScoredCandidate {
    ScoredCandidate::new(candidate(id), score)
}

fn prompt(ids: &[&str]) -> JustificationPrompt {
    let ranked: Vec<ScoredCandidate> = ids.iter().map(|id| scored(id, 1.0)).collect();
    JustificationPrompt::new(BudgetTier::Moderate, "tacos", &ranked)
}

#[test]
fn test_prompt_carries_only_known_facts() {
    let mut c = candidate("p1");
    c.category = Some("mexican_restaurant".into());
    c.category_label = Some("Mexican".into());
    c.distance_km = 1.23456;
    c.rating = Some(4.4);
    c.website = Some("https://tacos.example".into());

    let prompt = JustificationPrompt::new(
        BudgetTier::Inexpensive,
        "tacos",
        &[ScoredCandidate::new(c, 6.0)],
    );
    let facts = &prompt.items[0];
    assert_eq!(facts.id, "p1");
    assert_eq!(facts.category.as_deref(), Some("Mexican"));
    assert_eq!(facts.distance_km, 1.23);
    assert_eq!(facts.rating, Some(4.4));

    let msg = prompt.user_message();
    assert!(msg.starts_with("Budget max: $. Query: \"tacos\"."));
    assert!(!msg.contains("tacos.example"));
    assert!(!msg.contains("mexican_restaurant"));
}

#[tokio::test]
async fn test_disabled_enricher_is_absent() {
    let enricher = JustificationEnricher::disabled();
    assert!(!enricher.is_enabled());
    assert_eq!(enricher.enrich(&prompt(&["a"])).await, Enrichment::Absent);
}

#[tokio::test]
async fn test_enricher_returns_generated_lines() {
    let generator = StaticGenerator::new(&[("a", "Open late, 0.4 km away.")]);
    let enricher = JustificationEnricher::new(Some(generator.clone()), Duration::from_secs(1));
    assert!(enricher.is_enabled());

    let out = enricher.enrich(&prompt(&["a", "b"])).await;
    assert_eq!(
        out,
        Enrichment::Attached(HashMap::from([(
            "a".to_string(),
            "Open late, 0.4 km away.".to_string()
        )]))
    );
    let seen = generator.last_prompt().expect("generator called");
    assert_eq!(seen.items.len(), 2);
    assert_eq!(seen.query_text, "tacos");
}

#[tokio::test]
async fn test_enricher_skips_empty_prompt() {
    let generator = StaticGenerator::new(&[("a", "x")]);
    let enricher = JustificationEnricher::new(Some(generator.clone()), Duration::from_secs(1));
    assert_eq!(enricher.enrich(&prompt(&[])).await, Enrichment::Absent);
    assert!(generator.last_prompt().is_none());
}

#[tokio::test]
async fn test_enricher_swallows_generator_errors() {
    let enricher = JustificationEnricher::new(Some(Arc::new(FailingGenerator)), Duration::from_secs(1));
    assert_eq!(enricher.enrich(&prompt(&["a"])).await, Enrichment::Absent);
}

#[tokio::test]
async fn test_enricher_times_out() {
    let enricher = JustificationEnricher::new(
        Some(Arc::new(SlowGenerator(Duration::from_secs(5)))),
        Duration::from_millis(20),
    );
    assert_eq!(enricher.enrich(&prompt(&["a"])).await, Enrichment::Absent);
}

#[test]
fn test_apply_attaches_by_place_id() {
    let mut results = vec![scored("a", 3.0), scored("b", 2.0), scored("c", 1.0)];
    Enrichment::Attached(HashMap::from([
        ("c".to_string(), "Cheapest nearby.".to_string()),
        ("a".to_string(), "Best rated.".to_string()),
        ("zzz".to_string(), "Not in the results.".to_string()),
    ]))
    .apply(&mut results);

    assert_eq!(results[0].justification.as_deref(), Some("Best rated."));
    assert_eq!(results[1].justification, None);
    assert_eq!(results[2].justification.as_deref(), Some("Cheapest nearby."));
}

#[test]
fn test_absent_leaves_results_untouched() {
    let mut results = vec![scored("a", 3.0)];
    let before = results.clone();
    Enrichment::Absent.apply(&mut results);
    assert_eq!(results, before);
}

type Captured = Arc<Mutex<Option<(HeaderMap, Value)>>>;

fn chat_router(captured: Captured, status: StatusCode, response: Value) -> Router {
    Router::new().route(
        "/v1/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let captured = captured.clone();
            let response = response.clone();
            async move {
                *captured.lock().unwrap() = Some((headers, body));
                (status, Json(response))
            }
        }),
    )
}

fn completion(content: &str) -> Value {
    json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]})
}

fn justifier(addr: std::net::SocketAddr) -> OpenAiJustifier {
    OpenAiJustifier::new(
        "sk-test".into(),
        format!("http://{addr}/v1/chat/completions"),
        "gpt-4o-mini".into(),
    )
}

#[tokio::test]
async fn test_openai_justifier_parses_content() -> anyhow::Result<()> {
    let captured: Captured = Arc::default();
    let addr = spawn_mock_server(chat_router(
        captured.clone(),
        StatusCode::OK,
        completion(r#"{"justifications": {"p1": "4.4 stars, 1.2 km away."}}"#),
    ))
    .await;

    let lines = justifier(addr).generate(&prompt(&["p1"])).await?;
    assert_eq!(lines["p1"], "4.4 stars, 1.2 km away.");

    let (headers, body) = captured.lock().unwrap().take().expect("request captured");
    assert_eq!(headers["authorization"], "Bearer sk-test");
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["response_format"]["type"], "json_object");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], SYSTEM_INSTRUCTION);
    assert_eq!(body["messages"][1]["role"], "user");
    assert!(body["messages"][1]["content"].as_str().unwrap_or_default().contains("\"id\":\"p1\""));
    Ok(())
}

#[tokio::test]
async fn test_openai_justifier_rejects_malformed_content() {
    let addr = spawn_mock_server(chat_router(
        Arc::default(),
        StatusCode::OK,
        completion("Sure! Here are your justifications:"),
    ))
    .await;

    let err = justifier(addr).generate(&prompt(&["p1"])).await.unwrap_err();
    assert!(matches!(err, EnrichmentError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn test_openai_justifier_reports_status() {
    let addr = spawn_mock_server(chat_router(
        Arc::default(),
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"message": "rate limited"}}),
    ))
    .await;

    let err = justifier(addr).generate(&prompt(&["p1"])).await.unwrap_err();
    assert!(matches!(err, EnrichmentError::Status { status: 429, .. }), "got {err:?}");
}
