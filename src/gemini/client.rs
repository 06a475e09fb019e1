//! HTTP client for the `generateContent` endpoint.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::config::GeminiConfig;
use super::types::{GeminiError, GenerateContent, GenerateRequest};

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: GeminiConfig) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| GeminiError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            api_key: config.api_key,
            base_url: config.base_url,
            model: config.model,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, GeminiError> {
        Self::new(GeminiConfig::from_env()?)
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn send_json(&self, body: &impl Serialize) -> Result<String, GeminiError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GeminiError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| GeminiError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(GeminiError::ApiResponse { status, body: text });
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl GenerateContent for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GeminiError> {
        let body = build_request_body(request);
        debug!(model = %self.model, prompt_chars = request.prompt.len(), "sending generateContent");
        let text = self.send_json(&body).await?;
        parse_response_text(&text)
    }
}

/// Builds a [`GeminiClient`] from the environment at call time, so commands
/// that never reach the model do not need an API key.
pub struct EnvGeminiClient;

#[async_trait::async_trait]
impl GenerateContent for EnvGeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GeminiError> {
        let client = GeminiClient::from_env()?;
        debug!(model = client.model(), "gemini client configured from env");
        client.generate(request).await
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent<'a>>,
    contents: Vec<WireContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig<'a>>,
}

#[derive(Serialize)]
struct WireContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<WirePart<'a>>,
}

#[derive(Serialize)]
struct WirePart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

fn build_request_body(request: &GenerateRequest) -> WireRequest<'_> {
    WireRequest {
        system_instruction: request
            .system_instruction
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|text| WireContent { role: None, parts: vec![WirePart { text }] }),
        contents: vec![WireContent {
            role: Some("user"),
            parts: vec![WirePart { text: &request.prompt }],
        }],
        generation_config: request
            .response_schema
            .as_ref()
            .map(|schema| WireGenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            }),
    }
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

pub(crate) fn parse_response_text(json_text: &str) -> Result<String, GeminiError> {
    let root: Value = serde_json::from_str(json_text).map_err(|e| GeminiError::ApiParse(e.to_string()))?;

    if let Some(reason) = root
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(Value::as_str)
    {
        return Err(GeminiError::ApiParse(format!("prompt blocked: {reason}")));
    }

    let Some(candidate) = root
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
    else {
        return Err(GeminiError::EmptyResponse);
    };

    let text: String = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GeminiError::EmptyResponse);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_carries_schema_and_system_instruction() {
        let request = GenerateRequest::new("Analyze")
            .with_system_instruction("Be an advisor")
            .with_json_schema(json!({ "type": "OBJECT" }));
        let body = serde_json::to_value(build_request_body(&request)).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Analyze");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be an advisor");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn plain_body_omits_optional_sections() {
        let body = serde_json::to_value(build_request_body(&GenerateRequest::new("Summarize"))).unwrap();
        assert!(body.get("systemInstruction").is_none());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn joins_candidate_parts() {
        let json = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Hello " }, { "text": "world" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 2 }
        })
        .to_string();
        assert_eq!(parse_response_text(&json).unwrap(), "Hello world");
    }

    #[test]
    fn skips_thought_parts() {
        let json = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "thinking...", "thought": true }, { "text": "{}" }] }
            }]
        })
        .to_string();
        assert_eq!(parse_response_text(&json).unwrap(), "{}");
    }

    #[test]
    fn missing_candidates_is_empty_response() {
        let json = json!({ "candidates": [] }).to_string();
        assert!(matches!(parse_response_text(&json), Err(GeminiError::EmptyResponse)));
    }

    #[test]
    fn blocked_prompt_is_parse_error() {
        let json = json!({ "promptFeedback": { "blockReason": "SAFETY" } }).to_string();
        let err = parse_response_text(&json).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        assert!(matches!(parse_response_text("not json"), Err(GeminiError::ApiParse(_))));
    }

    #[test]
    fn endpoint_uses_model_name() {
        let client = GeminiClient::new(GeminiConfig {
            api_key: "k".into(),
            model: "gemini-2.5-flash".into(),
            base_url: "https://example.test/v1beta".into(),
            timeouts: super::super::config::Timeouts { request_secs: 5, connect_secs: 1 },
        })
        .unwrap();
        assert_eq!(client.endpoint(), "https://example.test/v1beta/models/gemini-2.5-flash:generateContent");
        assert_eq!(client.model(), "gemini-2.5-flash");
    }
}
