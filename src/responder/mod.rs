//! Rule-based responder
//!
//! Pattern rules, a keyword-indexed store of scored replies, and templated
//! fallback text. Learning appends records and rules; nothing is ever
//! rewritten or evicted.

pub mod keywords;
pub mod patterns;
pub mod knowledge;
pub mod synthesis;
pub mod engine;
pub mod registry;

pub use keywords::KeywordExtractor;
pub use patterns::{PatternRule, PatternTable, RuleOrigin};
pub use knowledge::{Feedback, KnowledgeRecord, KnowledgeStore, WordAssociations};
pub use synthesis::TemplateKind;
pub use engine::{EngineState, EngineStats, LearnSummary, Reply, ReplySource, ResponderEngine};
pub use registry::EngineRegistry;
