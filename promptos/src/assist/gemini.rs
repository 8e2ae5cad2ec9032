use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::assist::{Assistant, Enhancement};
use crate::backend::http::error_message;
use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<OutPart<'a>>,
}

#[derive(Debug, Serialize)]
struct OutPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<InPart>,
}

#[derive(Debug, Deserialize)]
struct InPart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

fn enhance_instruction(raw: &str) -> String {
    format!(
        "You are an expert prompt engineer. Analyze the following raw prompt.\n\
         1. Create an optimized version of it (better clarity, structure, role definition).\n\
         2. Generate 3-5 relevant short tags.\n\
         3. Create a one-sentence summary.\n\n\
         Raw Prompt: \"{raw}\""
    )
}

fn variations_instruction(content: &str) -> String {
    format!(
        "Generate 3 distinct variations of this prompt for different tones \
         (Professional, Creative, Concise). Return ONLY a JSON array of strings. Prompt: {content}"
    )
}

fn enhance_schema() -> Value {
    json!({
        "responseMimeType": "application/json",
        "responseSchema": {
            "type": "OBJECT",
            "properties": {
                "optimized": { "type": "STRING" },
                "tags": { "type": "ARRAY", "items": { "type": "STRING" } },
                "summary": { "type": "STRING" }
            },
            "required": ["optimized", "tags", "summary"]
        }
    })
}

fn variations_schema() -> Value {
    json!({
        "responseMimeType": "application/json",
        "responseSchema": {
            "type": "ARRAY",
            "items": { "type": "STRING" }
        }
    })
}

/// Google Gemini `generateContent` over REST.
#[derive(Debug, Clone)]
pub struct GeminiAssistant {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiAssistant {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::from)?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate(&self, prompt: &str, generation_config: Option<Value>) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![OutPart { text: prompt }],
            }],
            generation_config,
        };
        debug!(model = %self.model, "generateContent");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: provider_error(&text).unwrap_or_else(|| status.to_string()),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed
            .text()
            .ok_or_else(|| Error::Decode("No response text".to_string()))
    }

    async fn try_enhance(&self, text: &str) -> Result<Enhancement> {
        let raw = self
            .generate(&enhance_instruction(text), Some(enhance_schema()))
            .await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn try_variations(&self, text: &str) -> Result<Vec<String>> {
        let raw = self
            .generate(&variations_instruction(text), Some(variations_schema()))
            .await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Gemini nests its message under `error.message`.
fn provider_error(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .or_else(|| error_message(body))
}

#[async_trait]
impl Assistant for GeminiAssistant {
    fn is_available(&self) -> bool {
        true
    }

    async fn enhance(&self, text: &str) -> Enhancement {
        match self.try_enhance(text).await {
            Ok(enhancement) => enhancement,
            Err(err) => {
                warn!(error = %err, "AI enhance failed");
                Enhancement::passthrough(text, &["ai-failed"])
            }
        }
    }

    async fn variations(&self, text: &str) -> Vec<String> {
        match self.try_variations(text).await {
            Ok(variations) => variations,
            Err(err) => {
                warn!(error = %err, "AI variations failed");
                Vec::new()
            }
        }
    }

    async fn run(&self, text: &str) -> String {
        match self.generate(text, None).await {
            Ok(output) => output,
            Err(Error::Decode(_)) => "No output generated.".to_string(),
            Err(err) => {
                warn!(error = %err, "run prompt failed");
                format!("Execution Error: {}", describe(&err))
            }
        }
    }
}

fn describe(err: &Error) -> String {
    match err {
        Error::Api { message, .. } => message.clone(),
        Error::Transport(message) => message.clone(),
        other => other.to_string(),
    }
}
