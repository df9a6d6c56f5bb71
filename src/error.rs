// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error types.
//!
//! Every failure a front end can observe is an [`AppError`]. Messages are
//! written to be shown to the user verbatim (toast, status line).

use crate::config::ConfigError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Client-side form validation failed; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// Non-2xx response, with the message supplied by the server when present.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// A backend record did not have the expected shape.
    #[error("Unexpected response from server: {0}")]
    InvalidRecord(String),

    /// The AI answer could not be read as structured data.
    #[error("{0}")]
    AiParse(String),

    #[error("AI quota exceeded for all models. Please get a new API key or try again tomorrow.")]
    QuotaExhausted,

    #[error("You need to log in first")]
    NotAuthenticated,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Generic message used when the server did not explain a failure.
    pub fn request_failed(status: u16) -> Self {
        AppError::Http {
            status,
            message: format!("Request failed with status {}", status),
        }
    }

    /// True if the backend rejected the credentials or token.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, AppError::Http { status: 401 | 403, .. })
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, AppError>;
