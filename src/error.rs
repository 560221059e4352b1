// src/error.rs
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Non-2xx response; `body` is the raw response text.
    #[error("request failed with HTTP {status}: {body}")]
    Request { status: StatusCode, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
