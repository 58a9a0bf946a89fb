//! Chat front end: session bookkeeping and the interactive terminal loop

pub mod session;
pub mod interactive;

pub use session::{ChatSession, FeedbackStatus, Turn};
pub use interactive::{run_interactive, ChatOptions};
