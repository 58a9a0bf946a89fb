//! Parrot - keyword-learning chat responder library
//!
//! A rule-based responder with:
//! - Substring pattern rules, builtin groups first
//! - A keyword-indexed store of scored replies learned from feedback
//! - Templated fallback replies
//! - Named, isolated engines held in a caller-owned registry
//! - JSON snapshot persistence with forgiving partial loads
//!
//! # Example
//!
//! ```
//! use parrot::{EngineRegistry, Feedback};
//!
//! let mut registry = EngineRegistry::with_seed(7);
//! let reply = registry.respond("Parrot", "Tell me a joke");
//! registry.learn("Parrot", "Tell me a joke", &reply, Feedback::Positive);
//! assert_eq!(registry.stats("Parrot").unwrap().keyword_count, 2);
//! ```

pub mod error;
pub mod types;
pub mod responder;
pub mod memory;
pub mod config;
pub mod chat;
pub mod cli;

// Re-export commonly used types for convenience
pub use error::{ChatError, Result};

pub use responder::{
    EngineRegistry,
    EngineStats,
    Feedback,
    ResponderEngine,
};

pub use chat::{ChatSession, FeedbackStatus};

pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - keyword-learning chat responder", NAME, VERSION)
}
