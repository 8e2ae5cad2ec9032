//! Generative-AI helpers for prompt text.
//!
//! Assistants never fail their caller: a missing credential or a provider
//! error degrades to the original text, an empty list or an error string.

pub mod gemini;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;

pub use gemini::GeminiAssistant;

pub const SUMMARY_PREVIEW_CHARS: usize = 50;
pub const MISSING_KEY_MESSAGE: &str =
    "System Error: API Key is missing. Please check your configuration.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enhancement {
    #[serde(rename = "optimized")]
    pub optimized_text: String,
    pub tags: Vec<String>,
    pub summary: String,
}

impl Enhancement {
    /// Leaves the text untouched and labels it with `tags`.
    pub fn passthrough(text: &str, tags: &[&str]) -> Self {
        Self {
            optimized_text: text.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            summary: preview(text),
        }
    }
}

pub fn preview(text: &str) -> String {
    let head: String = text.chars().take(SUMMARY_PREVIEW_CHARS).collect();
    format!("{head}...")
}

#[async_trait]
pub trait Assistant: Send + Sync {
    fn is_available(&self) -> bool;
    async fn enhance(&self, text: &str) -> Enhancement;
    async fn variations(&self, text: &str) -> Vec<String>;
    async fn run(&self, text: &str) -> String;
}

/// Used when no provider credential is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAssistant;

#[async_trait]
impl Assistant for OfflineAssistant {
    fn is_available(&self) -> bool {
        false
    }

    async fn enhance(&self, text: &str) -> Enhancement {
        Enhancement::passthrough(text, &["manual", "draft"])
    }

    async fn variations(&self, _text: &str) -> Vec<String> {
        Vec::new()
    }

    async fn run(&self, _text: &str) -> String {
        MISSING_KEY_MESSAGE.to_string()
    }
}

pub fn assistant_from_config(config: &AiConfig) -> Arc<dyn Assistant> {
    match &config.api_key {
        Some(key) => match GeminiAssistant::new(key, &config.base_url, &config.model) {
            Ok(gemini) => Arc::new(gemini),
            Err(err) => {
                tracing::warn!(error = %err, "falling back to offline assistant");
                Arc::new(OfflineAssistant)
            }
        },
        None => Arc::new(OfflineAssistant),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_assistant_degrades_gracefully() {
        let assistant = OfflineAssistant;
        let text = "Write a haiku about [TOPIC] that is unexpectedly moving and very long";

        let enhanced = assistant.enhance(text).await;
        assert_eq!(enhanced.optimized_text, text);
        assert_eq!(enhanced.tags, vec!["manual", "draft"]);
        assert_eq!(enhanced.summary, format!("{}...", &text[..50]));

        assert!(assistant.variations(text).await.is_empty());
        assert_eq!(assistant.run(text).await, MISSING_KEY_MESSAGE);
        assert!(!assistant.is_available());
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let text = "é".repeat(60);
        assert_eq!(preview(&text).chars().count(), 53);
    }

    #[test]
    fn config_without_key_is_offline() {
        let assistant = assistant_from_config(&AiConfig::default());
        assert!(!assistant.is_available());
    }
}
