//! Gemini client error types.

use thiserror::Error;

/// Result type for Gemini operations.
pub type GeminiResult<T> = Result<T, GeminiError>;

/// Errors that can occur calling the Gemini API.
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY not configured")]
    MissingApiKey,

    #[error("API key error. Please re-select your API key and try again.")]
    InvalidApiKey,

    #[error("Gemini API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeminiError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}
