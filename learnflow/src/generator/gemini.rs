//! Gemini REST generator.

use super::{GenerationRequest, Generator};
use crate::config::GeneratorConfig;
use crate::core::ArtifactKind;
use crate::errors::GenerationError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Generator backed by the Gemini `generateContent` endpoint.
///
/// Structured kinds are requested in JSON mode. The audio script is
/// requested as plain text.
pub struct GeminiGenerator {
    config: GeneratorConfig,
    http: reqwest::Client,
    api_key: String,
}

impl GeminiGenerator {
    /// Creates a generator, reading the API key from the configured environment variable.
    pub fn from_env(config: GeneratorConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| GenerationError::new(format!("set {} env var", config.api_key_env)))?;
        Ok(Self::with_api_key(config, api_key))
    }

    /// Creates a generator with an explicit API key.
    #[must_use]
    pub fn with_api_key(config: GeneratorConfig, api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config,
            http,
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn body(request: &GenerationRequest) -> Value {
        let mut parts = vec![json!({ "text": request.user_prompt })];
        if let Some(url) = request.inputs.file_url.as_deref() {
            parts.push(json!({
                "fileData": { "fileUri": url, "mimeType": mime_for(url) }
            }));
        }

        let mime = if request.kind.is_structured() {
            "application/json"
        } else {
            "text/plain"
        };

        json!({
            "systemInstruction": { "parts": [{ "text": request.system_prompt }] },
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "temperature": request.temperature,
                "responseMimeType": mime,
            }
        })
    }
}

fn mime_for(url: &str) -> &'static str {
    let lowered = url.to_lowercase();
    let path = lowered.split('?').next().unwrap_or_default();
    if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "image/jpeg"
    } else if path.ends_with(".mp3") {
        "audio/mpeg"
    } else {
        "application/pdf"
    }
}

fn decode_text(kind: ArtifactKind, text: &str) -> Result<Value, GenerationError> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) => Ok(value),
        Err(_) if kind == ArtifactKind::AudioScript => Ok(Value::String(text.to_string())),
        Err(e) => Err(GenerationError::malformed(kind, e)),
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, GenerationError> {
        debug!(
            model = %self.config.model,
            kind = %request.kind,
            language = %request.inputs.language,
            "Sending generation request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::body(request))
            .send()
            .await
            .map_err(|e| GenerationError::new(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::http(status.as_u16(), body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::new(format!("invalid response: {e}")))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::malformed(request.kind, "empty response"));
        }
        decode_text(request.kind, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::PromptInputs;
    use tokio_test::{assert_err, assert_ok};

    fn request(kind: ArtifactKind, file_url: Option<&str>) -> GenerationRequest {
        GenerationRequest {
            kind,
            system_prompt: "system".to_string(),
            user_prompt: "user".to_string(),
            inputs: PromptInputs {
                file_url: file_url.map(str::to_string),
                ..PromptInputs::default()
            },
            temperature: 0.1,
        }
    }

    #[test]
    fn test_endpoint() {
        let generator = GeminiGenerator::with_api_key(
            GeneratorConfig::default().with_base_url("https://api.example.com/v1beta/"),
            "key",
        );
        assert_eq!(
            generator.endpoint(),
            "https://api.example.com/v1beta/models/gemini-flash-latest:generateContent"
        );
    }

    #[test]
    fn test_body_attaches_file() {
        let body = GeminiGenerator::body(&request(
            ArtifactKind::Summary,
            Some("https://files.example.com/notes.pdf"),
        ));
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1]["fileData"]["mimeType"], "application/pdf");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_script_body_is_plain_text() {
        let body = GeminiGenerator::body(&request(ArtifactKind::AudioScript, None));
        assert_eq!(body["generationConfig"]["responseMimeType"], "text/plain");
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_decode_text() {
        assert_ok!(decode_text(ArtifactKind::Quiz, "{\"questions\": []}"));
        assert_err!(decode_text(ArtifactKind::Quiz, "not json"));
        assert_eq!(
            decode_text(ArtifactKind::AudioScript, "Hello listeners").unwrap(),
            Value::String("Hello listeners".to_string())
        );
    }
}
