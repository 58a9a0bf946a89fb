//! Chat session - the caller side of a conversation
//!
//! Keeps the timestamped message history, remembers the most recent
//! exchange so feedback can be applied to it, and tracks when the next
//! autosave is due.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::ChatConfig;
use crate::responder::{EngineRegistry, Feedback, LearnSummary, Reply};
use crate::types::Message;

/// One user/bot exchange
#[derive(Debug, Clone)]
pub struct Turn {
    pub user_text: String,
    pub reply: Reply,
    /// Feedback already applied to this turn, if any
    pub rated: Option<Feedback>,
}

impl Turn {
    /// The bot side of the exchange, independent of the capped history
    pub fn reply_message(&self) -> Message {
        Message::assistant(self.reply.text.clone())
    }
}

/// Result of a feedback request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackStatus {
    Applied(LearnSummary),
    /// Nothing has been said yet
    NoPriorTurn,
    /// The latest turn was already rated
    AlreadyRated(Feedback),
}

impl FeedbackStatus {
    /// Short status line for the user
    pub fn describe(&self) -> String {
        match self {
            FeedbackStatus::Applied(summary) if summary.score > 0 => {
                "Thanks! I'll remember that answer.".to_string()
            }
            FeedbackStatus::Applied(_) => "Noted, I'll try to do better.".to_string(),
            FeedbackStatus::NoPriorTurn => "There is no reply to rate yet.".to_string(),
            FeedbackStatus::AlreadyRated(feedback) => {
                format!("That reply was already rated {}.", feedback)
            }
        }
    }
}

pub struct ChatSession {
    id: String,
    engine: String,
    config: ChatConfig,
    history: VecDeque<Message>,
    last_turn: Option<Turn>,
    autosave_interval: Option<Duration>,
    last_saved: Instant,
}

impl ChatSession {
    pub fn new(engine: impl Into<String>, config: ChatConfig) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            engine: engine.into(),
            config,
            history: VecDeque::new(),
            last_turn: None,
            autosave_interval: None,
            last_saved: Instant::now(),
        }
    }

    /// Enable interval autosave
    pub fn with_autosave(mut self, interval: Duration) -> Self {
        self.autosave_interval = Some(interval);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// Switch engines; the last turn belongs to the old one and is dropped
    pub fn switch_engine(&mut self, engine: impl Into<String>) {
        self.engine = engine.into();
        self.last_turn = None;
        info!("Session {} now talking to '{}'", self.id, self.engine);
    }

    pub fn history(&self) -> impl Iterator<Item = &Message> {
        self.history.iter()
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.last_turn.as_ref()
    }

    /// Send user text to the engine and record the exchange
    pub fn send(&mut self, registry: &mut EngineRegistry, text: &str) -> &Turn {
        let engine = registry.engine_mut(&self.engine);
        let reply = engine.respond_detailed(text);
        debug!("Reply source: {:?}", reply.source);

        if self.config.learn_every_turn {
            engine.learn(text, &reply.text, Feedback::Neutral);
        }

        self.push(Message::user(text));
        self.push(Message::assistant(reply.text.clone()));

        self.last_turn.insert(Turn {
            user_text: text.to_string(),
            reply,
            rated: None,
        })
    }

    /// Apply feedback to the most recent turn only
    pub fn feedback(&mut self, registry: &mut EngineRegistry, feedback: Feedback) -> FeedbackStatus {
        let Some(turn) = self.last_turn.as_mut() else {
            return FeedbackStatus::NoPriorTurn;
        };
        if let Some(previous) = turn.rated {
            return FeedbackStatus::AlreadyRated(previous);
        }

        let summary = registry.learn(&self.engine, &turn.user_text, &turn.reply.text, feedback);
        turn.rated = Some(feedback);
        FeedbackStatus::Applied(summary)
    }

    /// Whether the autosave interval has elapsed
    pub fn autosave_due(&self, now: Instant) -> bool {
        match self.autosave_interval {
            Some(interval) => now.duration_since(self.last_saved) >= interval,
            None => false,
        }
    }

    pub fn mark_saved(&mut self, now: Instant) {
        self.last_saved = now;
    }

    fn push(&mut self, message: Message) {
        self.history.push_back(message);
        while self.history.len() > self.config.history_limit {
            self.history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn session(learn_every_turn: bool) -> ChatSession {
        let config = ChatConfig {
            learn_every_turn,
            history_limit: 4,
            show_timestamps: false,
        };
        ChatSession::new("Parrot", config)
    }

    #[test]
    fn test_reply_survives_zero_history() {
        let mut registry = EngineRegistry::with_seed(1);
        let config = ChatConfig {
            learn_every_turn: false,
            history_limit: 0,
            show_timestamps: false,
        };
        let mut chat = ChatSession::new("Parrot", config);

        let message = chat.send(&mut registry, "hello").reply_message();
        assert_eq!(message.role, Role::Assistant);
        assert!(!message.content.is_empty());
        assert_eq!(chat.history().count(), 0);
        assert_eq!(chat.last_turn().unwrap().reply.text, message.content);
    }

    #[test]
    fn test_feedback_without_turn() {
        let mut registry = EngineRegistry::with_seed(1);
        let mut session = session(false);
        assert_eq!(session.feedback(&mut registry, Feedback::Positive), FeedbackStatus::NoPriorTurn);
    }

    #[test]
    fn test_feedback_applies_once() {
        let mut registry = EngineRegistry::with_seed(1);
        let mut session = session(false);
        session.send(&mut registry, "dinosaurs roamed");

        let status = session.feedback(&mut registry, Feedback::Positive);
        assert!(matches!(status, FeedbackStatus::Applied(ref s) if s.score == 3));
        assert_eq!(
            session.feedback(&mut registry, Feedback::Negative),
            FeedbackStatus::AlreadyRated(Feedback::Positive)
        );
        assert_eq!(registry.stats("Parrot").unwrap().knowledge_item_count, 2);
    }

    #[test]
    fn test_learn_every_turn() {
        let mut registry = EngineRegistry::with_seed(1);
        let mut session = session(true);
        session.send(&mut registry, "dinosaurs roamed");
        let stats = registry.stats("Parrot").unwrap();
        assert_eq!(stats.knowledge_item_count, 2);
        assert_eq!(stats.conversation_count, 1);
    }

    #[test]
    fn test_history_is_capped() {
        let mut registry = EngineRegistry::with_seed(1);
        let mut session = session(false);
        for text in ["one", "two", "three"] {
            session.send(&mut registry, text);
        }
        let contents: Vec<&str> = session.history().map(|m| m.content.as_str()).collect();
        assert_eq!(contents.len(), 4);
        assert_eq!(contents[0], "two");
    }

    #[test]
    fn test_switch_engine_drops_last_turn() {
        let mut registry = EngineRegistry::with_seed(1);
        let mut session = session(false);
        session.send(&mut registry, "hello");
        session.switch_engine("Echo");
        assert!(session.last_turn().is_none());
        assert_eq!(session.feedback(&mut registry, Feedback::Positive), FeedbackStatus::NoPriorTurn);
    }

    #[test]
    fn test_autosave_schedule() {
        let start = Instant::now();
        let mut saver = session(false).with_autosave(Duration::from_secs(60));
        saver.mark_saved(start);
        assert!(!saver.autosave_due(start + Duration::from_secs(30)));
        assert!(saver.autosave_due(start + Duration::from_secs(61)));

        let plain = session(false);
        assert!(!plain.autosave_due(start + Duration::from_secs(3600)));
    }
}
