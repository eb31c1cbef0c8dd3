//! Gemini client for menu extraction and summarization.
//!
//! Both calls use structured output: `responseMimeType: application/json`
//! plus a response schema, so the model's answer deserializes straight into
//! the crate's menu models instead of being scraped out of prose.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::models::{DailySummary, ParsedMenu};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the Gemini client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API base URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model used for both extraction and summarization.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature. Zero: extraction should be deterministic.
    #[serde(default)]
    pub temperature: f32,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: 0.0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GeminiConfig {
    /// Model override from the environment, falling back to the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            if !model.is_empty() {
                config.model = model;
            }
        }
        config
    }
}

/// Errors that can occur during Gemini calls.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("empty response: no candidate content returned")]
    Empty,
}

/// Gemini API client.
pub struct GeminiClient {
    config: GeminiConfig,
    api_key: String,
    client: Client,
}

impl GeminiClient {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>, config: GeminiConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;
        Ok(Self {
            config,
            api_key: api_key.into(),
            client,
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Extract a structured menu from a single image.
    pub async fn extract_menu(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<ParsedMenu, LlmError> {
        use base64::Engine;
        let data = base64::engine::general_purpose::STANDARD.encode(image);
        let parts = json!([
            {"inlineData": {"mimeType": mime_type, "data": data}},
            {"text": prompt},
        ]);
        self.generate(parts, menu_schema()).await
    }

    /// Produce the daily summary for an already-assembled menu document.
    pub async fn summarize(&self, prompt: &str) -> Result<DailySummary, LlmError> {
        self.generate(json!([{"text": prompt}]), summary_schema())
            .await
    }

    /// Call `generateContent` and deserialize the JSON answer into `T`.
    async fn generate<T: serde::de::DeserializeOwned>(
        &self,
        parts: serde_json::Value,
        schema: serde_json::Value,
    ) -> Result<T, LlmError> {
        let request = json!({
            "contents": [{"parts": parts}],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
                "temperature": self.config.temperature,
            },
        });

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );
        debug!("Calling {} ({})", url, self.config.model);

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let text = candidate_text(&body)?;
        serde_json::from_str(&text).map_err(|e| LlmError::Parse(e.to_string()))
    }
}

/// Concatenated text of the first candidate's parts.
fn candidate_text(body: &serde_json::Value) -> Result<String, LlmError> {
    let parts = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.pointer("/content/parts"))
        .and_then(|p| p.as_array())
        .ok_or(LlmError::Empty)?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        return Err(LlmError::Empty);
    }
    Ok(text)
}

/// Response schema for `ParsedMenu`, in Gemini's OpenAPI-subset dialect.
///
/// `date` is the flat projection of `MenuDate`: `kind` is always present and
/// the remaining fields are read according to it.
fn menu_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "languages": {
                "type": "ARRAY",
                "description": "Language tags of the menu text, e.g. cs, en",
                "items": {"type": "STRING"}
            },
            "daily_menus": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "date": {
                            "type": "OBJECT",
                            "properties": {
                                "kind": {
                                    "type": "STRING",
                                    "enum": ["date", "range", "weekday", "whole_week", "text"]
                                },
                                "date": {"type": "STRING", "description": "ISO date when kind is 'date'"},
                                "start": {"type": "STRING", "description": "ISO date when kind is 'range'"},
                                "end": {"type": "STRING", "description": "ISO date when kind is 'range'"},
                                "weekday": {
                                    "type": "STRING",
                                    "enum": ["monday", "tuesday", "wednesday", "thursday",
                                             "friday", "saturday", "sunday"]
                                },
                                "raw": {"type": "STRING", "description": "verbatim label when kind is 'text'"}
                            },
                            "required": ["kind"]
                        },
                        "dishes": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "name": {"type": "STRING"},
                                    "description": {"type": "STRING"},
                                    "vegetarian": {"type": "BOOLEAN"},
                                    "price": {"type": "NUMBER", "description": "price in CZK"}
                                },
                                "required": ["name", "vegetarian"]
                            }
                        }
                    },
                    "required": ["date", "dishes"]
                }
            }
        },
        "required": ["languages", "daily_menus"]
    })
}

/// Response schema for `DailySummary`. Reasoning is ordered first so the
/// model plans before it writes.
fn summary_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "reasoning": {"type": "STRING", "description": "step-by-step planning, not shown to users"},
            "text": {"type": "STRING", "description": "Markdown summary in Czech"}
        },
        "required": ["reasoning", "text"],
        "propertyOrdering": ["reasoning", "text"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_text_extraction() {
        let body = json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": "{\"reasoning\""}, {"text": ": \"\", \"text\": \"menu\"}"}]
                }
            }]
        });
        let text = candidate_text(&body).unwrap();
        let summary: DailySummary = serde_json::from_str(&text).unwrap();
        assert_eq!(summary.text, "menu");
    }

    #[test]
    fn test_candidate_text_empty_response() {
        assert!(matches!(
            candidate_text(&json!({"candidates": []})),
            Err(LlmError::Empty)
        ));
        assert!(matches!(candidate_text(&json!({})), Err(LlmError::Empty)));
    }

    #[test]
    fn test_menu_schema_matches_model() {
        // A document valid against the schema must deserialize as ParsedMenu.
        let sample = json!({
            "languages": ["cs"],
            "daily_menus": [{
                "date": {"kind": "whole_week"},
                "dishes": [{"name": "Polévka dne", "vegetarian": true}]
            }]
        });
        let menu: ParsedMenu = serde_json::from_value(sample).unwrap();
        assert_eq!(menu.daily_menus[0].dishes[0].name, "Polévka dne");

        let schema = menu_schema();
        assert_eq!(schema["required"], json!(["languages", "daily_menus"]));
    }

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();
        assert!(config.model.starts_with("gemini"));
        assert_eq!(config.temperature, 0.0);
        assert!(config.endpoint.contains("generativelanguage"));
    }
}
