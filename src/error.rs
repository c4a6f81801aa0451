//! Failure values returned by the dispatcher and provider adapters.

use thiserror::Error;

/// Broad class of a [`Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected before any network attempt.
    Configuration,
    /// Network failure or non-2xx status.
    Transport,
    /// 2xx response without the expected reply field.
    Schema,
}

#[derive(Debug, Error)]
pub enum Failure {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("API key not found")]
    MissingApiKey,

    #[error("API key contains characters not allowed in a request header")]
    InvalidApiKey,

    #[error("Cloudflare account id not found")]
    MissingAccountId,

    #[error("No model configured for {0}")]
    MissingModel(&'static str),

    #[error("Invalid model name: {0}")]
    InvalidModel(String),

    #[error("failed to read settings: {0}")]
    Settings(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("{0} processing is only supported for Gemini platform")]
    GeminiOnly(&'static str),

    #[error("{provider} request failed: {message}")]
    Network {
        provider: &'static str,
        message: String,
    },

    #[error("HTTP error! status: {status}, body: {body}")]
    Http { status: u16, body: String },

    /// Error message reported by the API itself.
    #[error("{0}")]
    Api(String),

    #[error("Failed to fetch file: {0}")]
    Fetch(String),

    #[error("No valid response from {0} API")]
    NoValidResponse(&'static str),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl Failure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Failure::UnsupportedPlatform(_)
            | Failure::MissingApiKey
            | Failure::InvalidApiKey
            | Failure::MissingAccountId
            | Failure::MissingModel(_)
            | Failure::InvalidModel(_)
            | Failure::Settings(_)
            | Failure::UnknownAction(_)
            | Failure::GeminiOnly(_) => FailureKind::Configuration,
            Failure::Network { .. } | Failure::Http { .. } | Failure::Api(_) | Failure::Fetch(_) => {
                FailureKind::Transport
            }
            Failure::NoValidResponse(_) | Failure::InvalidResponse(_) => FailureKind::Schema,
        }
    }

    pub(crate) fn network(provider: &'static str, err: reqwest::Error) -> Self {
        // reqwest includes the URL in its Display; strip it so `?key=` never leaks.
        Failure::Network {
            provider,
            message: err.without_url().to_string(),
        }
    }
}
