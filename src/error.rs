//! Library error type
//!
//! The responder core has no fatal conditions; these errors surface from
//! rule construction, registry lookups and the persistence collaborator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Invalid pattern rule: {0}")]
    InvalidRule(String),

    #[error("Unknown engine: {0}")]
    UnknownEngine(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
