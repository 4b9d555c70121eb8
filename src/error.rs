use std::fmt;
use thiserror::Error;

/// Failure reported by the completion capability.
///
/// `transient` marks errors eligible for retry (HTTP 503 or a provider
/// "busy" message); everything else aborts immediately.
#[derive(Debug, Clone)]
pub struct CompletionError {
    pub code: Option<u16>,
    pub message: String,
    pub transient: bool,
}

impl CompletionError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            transient: false,
        }
    }

    /// Classify an HTTP error response. Only "service busy" conditions are
    /// transient; auth and malformed-request failures must not retry.
    pub fn from_status(code: u16, body: String) -> Self {
        let transient =
            code == 503 || body.contains("too busy") || body.contains("System is too busy");
        Self {
            code: Some(code),
            message: body,
            transient,
        }
    }
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "completion error ({}): {}", code, self.message),
            None => write!(f, "completion error: {}", self.message),
        }
    }
}

impl std::error::Error for CompletionError {}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
