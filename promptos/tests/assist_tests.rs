use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use promptos::assist::{Assistant, GeminiAssistant};
use serde_json::{Value, json};

type Reply = fn() -> Response;

#[derive(Clone)]
struct Mock {
    reply: Reply,
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

fn text_reply(text: &str) -> Response {
    Json(json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    }))
    .into_response()
}

async fn generate(
    State(mock): State<Mock>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if call != "gemini-2.5-flash:generateContent" {
        return StatusCode::NOT_FOUND.into_response();
    }
    let key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    mock.requests.lock().unwrap().push((key, body));
    (mock.reply)()
}

async fn spawn_provider(reply: Reply) -> (SocketAddr, Arc<Mutex<Vec<(Option<String>, Value)>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/v1beta/models/:call", post(generate))
        .with_state(Mock {
            reply,
            requests: requests.clone(),
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock provider");
    });
    (addr, requests)
}

fn assistant(addr: SocketAddr) -> GeminiAssistant {
    GeminiAssistant::new("test-key", &format!("http://{addr}/v1beta"), "gemini-2.5-flash")
        .expect("assistant")
}

#[tokio::test]
async fn enhance_sends_schema_and_parses_reply() {
    let (addr, requests) = spawn_provider(|| {
        text_reply(r#"{"optimized":"You are a poet. Write a haiku.","tags":["poetry","haiku","creative"],"summary":"Writes a haiku."}"#)
    })
    .await;

    let enhanced = assistant(addr).enhance("write haiku").await;
    assert_eq!(enhanced.optimized_text, "You are a poet. Write a haiku.");
    assert_eq!(enhanced.tags.len(), 3);
    assert_eq!(enhanced.summary, "Writes a haiku.");

    let (key, body) = requests.lock().unwrap()[0].clone();
    assert_eq!(key.as_deref(), Some("test-key"));
    assert_eq!(
        body["generationConfig"]["responseMimeType"],
        "application/json"
    );
    assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text");
    assert!(prompt.contains("write haiku"));
}

#[tokio::test]
async fn provider_failure_degrades_enhance() {
    let (addr, _) = spawn_provider(|| {
        (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": { "code": 403, "message": "API key not valid" } })),
        )
            .into_response()
    })
    .await;
    let gemini = assistant(addr);

    let enhanced = gemini.enhance("keep me").await;
    assert_eq!(enhanced.optimized_text, "keep me");
    assert_eq!(enhanced.tags, vec!["ai-failed"]);

    assert!(gemini.variations("keep me").await.is_empty());
    assert_eq!(
        gemini.run("keep me").await,
        "Execution Error: API key not valid"
    );
}

#[tokio::test]
async fn variations_parse_a_json_array() {
    let (addr, requests) =
        spawn_provider(|| text_reply(r#"["Formal take","Playful take","Short take"]"#)).await;

    let variations = assistant(addr).variations("take").await;
    assert_eq!(variations, vec!["Formal take", "Playful take", "Short take"]);

    let (_, body) = requests.lock().unwrap()[0].clone();
    assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
}

#[tokio::test]
async fn malformed_variations_become_empty() {
    let (addr, _) = spawn_provider(|| text_reply("not json at all")).await;
    assert!(assistant(addr).variations("take").await.is_empty());
}

#[tokio::test]
async fn run_returns_plain_text_without_schema() {
    let (addr, requests) = spawn_provider(|| text_reply("Bonjour")).await;
    assert_eq!(assistant(addr).run("Translate hello to French").await, "Bonjour");

    let (_, body) = requests.lock().unwrap()[0].clone();
    assert!(body.get("generationConfig").is_none());
}

#[tokio::test]
async fn empty_candidates_mean_no_output() {
    let (addr, _) = spawn_provider(|| Json(json!({ "candidates": [] })).into_response()).await;
    assert_eq!(assistant(addr).run("anything").await, "No output generated.");
}
