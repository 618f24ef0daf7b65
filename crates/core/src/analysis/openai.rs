//! OpenAI-compatible vision analyzer.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::error::AnalysisError;
use super::provider::AnalysisProvider;
use super::reply::parse_reply;
use crate::art::AnalysisResult;

const PROMPT: &str = r#"Analyze this digital artwork. Provide:
1) A creative 2-4 word title
2) Three descriptive tags (single words, comma-separated)

Return ONLY valid JSON in this exact format:
{"title": "...", "tags": "tag1,tag2,tag3"}"#;

/// Analyzer configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer API key.
    pub api_key: String,
    /// API base URL, without trailing `/chat/completions`.
    pub base_url: String,
    /// Vision-capable model.
    pub model: String,
    /// Completion token cap.
    pub max_tokens: u32,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Default API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o";

    /// Create a config with defaults for everything but the key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            max_tokens: 100,
            timeout: Duration::from_secs(30),
        }
    }

    /// Point at a different OpenAI-compatible endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a different model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Analyzer backed by a chat-completions endpoint.
pub struct OpenAiAnalyzer {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiAnalyzer {
    /// Create a new analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, AnalysisError> {
        if config.api_key.trim().is_empty() {
            return Err(AnalysisError::Configuration("API key required".to_string()));
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| AnalysisError::Configuration(format!("invalid API key: {e}")))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AnalysisError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn build_body(&self, image: &[u8]) -> Value {
        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(image));
        json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url } },
                ],
            }],
        })
    }
}

#[async_trait]
impl AnalysisProvider for OpenAiAnalyzer {
    async fn analyze_image(&self, image: Bytes) -> Result<AnalysisResult, AnalysisError> {
        let response = self
            .client
            .post(self.completions_url())
            .json(&self.build_body(&image))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".to_string());
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AnalysisError::EmptyResponse)?;

        debug!(model = %self.config.model, reply_len = content.len(), "Analysis reply received");
        parse_reply(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_api_key() {
        let err = OpenAiAnalyzer::new(OpenAiConfig::new("  ")).err().unwrap();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }

    #[test]
    fn test_completions_url_trims_slash() {
        let analyzer =
            OpenAiAnalyzer::new(OpenAiConfig::new("sk-test").with_base_url("http://localhost:1/v1/"))
                .unwrap();
        assert_eq!(
            analyzer.completions_url(),
            "http://localhost:1/v1/chat/completions"
        );
    }

    #[test]
    fn test_build_body_embeds_image() {
        let analyzer =
            OpenAiAnalyzer::new(OpenAiConfig::new("sk-test").with_model("gpt-4o-mini")).unwrap();
        let body = analyzer.build_body(b"\x89PNG");

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 100);
        let parts = &body["messages"][0]["content"];
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_completion_envelope_decoding() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"{\"title\":\"A\",\"tags\":\"b,c,d\"}"}}]}"#;
        let completion: ChatCompletion = serde_json::from_str(raw).unwrap();
        let content = completion.choices[0].message.content.clone().unwrap();
        assert_eq!(parse_reply(&content).unwrap().tags, vec!["b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let analyzer =
            OpenAiAnalyzer::new(OpenAiConfig::new("sk-test").with_base_url("http://127.0.0.1:1/v1"))
                .unwrap();
        let err = analyzer
            .analyze_image(Bytes::from_static(b"png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Transport(_)));
        assert!(!err.is_malformed());
    }
}
