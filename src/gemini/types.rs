//! Request and error types shared by the Gemini client and its callers.

use serde_json::Value;

/// Errors produced by Gemini client operations.
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The required API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The HTTP request to the API failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The API returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The model produced no text.
    #[error("no response from model")]
    EmptyResponse,
}

/// One prompt, optionally constrained to a JSON response schema.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub response_schema: Option<Value>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Ask for `application/json` output matching `schema`.
    #[must_use]
    pub fn with_json_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Text generation seam. Implemented by [`super::GeminiClient`] and by test doubles.
#[async_trait::async_trait]
pub trait GenerateContent: Send + Sync {
    /// Send one request and return the model's text output.
    ///
    /// # Errors
    ///
    /// Returns a [`GeminiError`] if the request fails or the response carries no text.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GeminiError>;
}
