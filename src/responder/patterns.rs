//! Pattern table - ordered trigger rules searched before anything else
//!
//! A rule fires when any of its triggers occurs as a substring of the
//! lowercased input. The table is scanned in insertion order and the first
//! hit wins, so the builtin groups always shadow learned rules that share
//! trigger text.

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

/// Builtin rule groups: trigger alternatives and candidate replies
const BUILTIN_RULES: &[(&[&str], &[&str])] = &[
    // greeting
    (
        &["hello", "hi", "hey", "greetings"],
        &[
            "Hello! How can I help you?",
            "Hi there! What's on your mind?",
            "Hey! Nice to meet you!",
        ],
    ),
    // wellbeing
    (
        &["how are you", "how do you do", "what's up"],
        &[
            "I'm doing great! How about you?",
            "I'm well, thanks for asking!",
            "Doing fantastic! How can I assist you?",
        ],
    ),
    // farewell
    (
        &["bye", "goodbye", "see you", "farewell"],
        &["Goodbye! Have a great day!", "See you later!", "Take care!"],
    ),
    // thanks
    (
        &["thank", "thanks", "appreciate"],
        &["You're welcome!", "Happy to help!", "Anytime!"],
    ),
    // identity
    (
        &["your name", "who are you", "what are you"],
        &[
            "I'm a self-learning AI assistant. I learn from our conversations!",
            "I'm an AI that gets smarter with every chat!",
        ],
    ),
    // help
    (
        &["help", "assist", "support"],
        &[
            "I'm here to help! Just ask me anything and I'll do my best to assist you.",
            "Sure! What do you need help with?",
        ],
    ),
    // weather
    (
        &["weather", "temperature", "climate"],
        &[
            "I don't have real-time weather data, but I can learn about weather patterns if you teach me!",
            "Tell me about the weather in your area!",
        ],
    ),
    // joke
    (
        &["joke", "funny", "humor"],
        &[
            "Why don't scientists trust atoms? Because they make up everything! 😄",
            "What do you call a bear with no teeth? A gummy bear!",
        ],
    ),
    // age
    (
        &["age", "old", "years"],
        &[
            "I was just created, but I'm learning fast!",
            "Age is just a number. I measure my growth in conversations!",
        ],
    ),
    // affinity
    (
        &["love", "like", "enjoy"],
        &[
            "That's great! Tell me more about what you love!",
            "I'd love to hear more about that!",
        ],
    ),
];

/// Where a rule came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOrigin {
    Builtin,
    Learned,
}

/// A set of trigger alternatives and the replies they unlock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    triggers: Vec<String>,
    replies: Vec<String>,
    origin: RuleOrigin,
}

impl PatternRule {
    /// Build a rule; both lists must be non-empty and at least one trigger
    /// must contain something other than whitespace.
    pub fn new(triggers: Vec<String>, replies: Vec<String>, origin: RuleOrigin) -> Result<Self> {
        if triggers.iter().all(|t| t.trim().is_empty()) {
            return Err(ChatError::InvalidRule("rule has no usable trigger".to_string()));
        }
        if replies.is_empty() {
            return Err(ChatError::InvalidRule(format!(
                "rule '{}' has no replies",
                triggers.join("|")
            )));
        }
        Ok(Self {
            triggers: triggers.into_iter().map(|t| t.to_lowercase()).collect(),
            replies,
            origin,
        })
    }

    /// A learned single-reply rule
    pub fn learned(triggers: Vec<String>, reply: impl Into<String>) -> Result<Self> {
        Self::new(triggers, vec![reply.into()], RuleOrigin::Learned)
    }

    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    pub fn replies(&self) -> &[String] {
        &self.replies
    }

    pub fn origin(&self) -> RuleOrigin {
        self.origin
    }

    /// Substring match against already-lowercased input
    pub fn matches(&self, lowered: &str) -> bool {
        self.triggers
            .iter()
            .any(|t| !t.is_empty() && lowered.contains(t.as_str()))
    }

    /// Re-check invariants on a rule that did not come through `new`
    pub fn validate(self) -> Result<Self> {
        Self::new(self.triggers, self.replies, self.origin)
    }
}

/// Ordered rule list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternTable {
    rules: Vec<PatternRule>,
}

impl PatternTable {
    /// An empty table with no builtins
    pub fn empty() -> Self {
        Self::default()
    }

    /// The seeded table every new engine starts from
    pub fn builtin() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|(triggers, replies)| PatternRule {
                triggers: triggers.iter().map(|t| t.to_string()).collect(),
                replies: replies.iter().map(|r| r.to_string()).collect(),
                origin: RuleOrigin::Builtin,
            })
            .collect();
        Self { rules }
    }

    /// First rule whose trigger occurs in the input
    pub fn find(&self, text: &str) -> Option<&PatternRule> {
        let lowered = text.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&lowered))
    }

    /// Append after every existing rule
    pub fn push(&mut self, rule: PatternRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter()
    }

    /// Number of rules appended by learning
    pub fn learned_count(&self) -> usize {
        self.rules
            .iter()
            .filter(|r| r.origin == RuleOrigin::Learned)
            .count()
    }
}

impl FromIterator<PatternRule> for PatternTable {
    fn from_iter<I: IntoIterator<Item = PatternRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_shape() {
        let table = PatternTable::builtin();
        assert_eq!(table.len(), 10);
        assert_eq!(table.learned_count(), 0);
        assert!(table.iter().all(|r| !r.triggers().is_empty() && !r.replies().is_empty()));
    }

    #[test]
    fn test_substring_matching() {
        let table = PatternTable::builtin();
        // "hi" hides inside "this"
        let rule = table.find("this is hilarious").unwrap();
        assert!(rule.triggers().contains(&"hi".to_string()));
        assert!(table.find("HELLO there").is_some());
        assert!(table.find("xyzzy plugh").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let table = PatternTable::builtin();
        // both greeting and joke triggers present; greeting is earlier
        let rule = table.find("hey, tell me a joke").unwrap();
        assert!(rule.triggers().contains(&"hey".to_string()));
    }

    #[test]
    fn test_learned_rules_come_after_builtins() {
        let mut table = PatternTable::builtin();
        table.push(PatternRule::learned(vec!["hello".into()], "learned hello").unwrap());
        let rule = table.find("hello").unwrap();
        assert_eq!(rule.origin(), RuleOrigin::Builtin);
        assert_eq!(table.learned_count(), 1);
    }

    #[test]
    fn test_rule_validation() {
        assert!(PatternRule::learned(vec![], "reply").is_err());
        assert!(PatternRule::learned(vec!["  ".into()], "reply").is_err());
        assert!(PatternRule::new(vec!["x".into()], vec![], RuleOrigin::Learned).is_err());

        let rule = PatternRule::learned(vec!["Rust".into()], "crabs").unwrap();
        assert_eq!(rule.triggers(), &["rust".to_string()]);
    }

    #[test]
    fn test_empty_trigger_never_matches() {
        let rule = PatternRule::learned(vec!["".into(), "zebra".into()], "stripes").unwrap();
        assert!(!rule.matches("anything at all"));
        assert!(rule.matches("a zebra"));
    }
}
