//! Knowledge store - scored replies indexed by keyword
//!
//! Every learning event appends a fresh record to each of its keywords.
//! Records are never edited: later feedback about the same exchange lands as
//! a new record with its own score. Lookup re-scans the record list each time
//! and picks the first record holding the highest score.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// How many leading keywords a lookup consults
pub const LOOKUP_KEYWORDS: usize = 3;

/// User verdict on a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    #[default]
    Neutral,
    Positive,
    Negative,
}

impl Feedback {
    /// Score stored on records learned with this feedback
    pub fn score(self) -> i32 {
        match self {
            Feedback::Positive => 3,
            Feedback::Negative => -1,
            Feedback::Neutral => 1,
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feedback::Neutral => write!(f, "neutral"),
            Feedback::Positive => write!(f, "positive"),
            Feedback::Negative => write!(f, "negative"),
        }
    }
}

impl std::str::FromStr for Feedback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "neutral" | "none" => Ok(Feedback::Neutral),
            "positive" | "good" | "+" => Ok(Feedback::Positive),
            "negative" | "bad" | "-" => Ok(Feedback::Negative),
            other => Err(format!("unknown feedback '{}', expected positive, negative or neutral", other)),
        }
    }
}

/// One scored reply associated with a keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub reply: String,
    /// The user text the reply was learned from
    pub source_text: String,
    pub timestamp: DateTime<Utc>,
    pub score: i32,
}

impl KnowledgeRecord {
    pub fn new(reply: &str, source_text: &str, feedback: Feedback) -> Self {
        Self {
            reply: reply.to_string(),
            source_text: source_text.to_string(),
            timestamp: Utc::now(),
            score: feedback.score(),
        }
    }
}

/// Keyword to ordered record list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeStore {
    entries: BTreeMap<String, Vec<KnowledgeRecord>>,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record under a keyword
    pub fn append(&mut self, keyword: &str, record: KnowledgeRecord) {
        self.entries.entry(keyword.to_string()).or_default().push(record);
    }

    /// Records for a keyword in insertion order
    pub fn records(&self, keyword: &str) -> &[KnowledgeRecord] {
        self.entries.get(keyword).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Highest-scoring record for a keyword; earliest wins ties
    pub fn best(&self, keyword: &str) -> Option<&KnowledgeRecord> {
        let mut best: Option<&KnowledgeRecord> = None;
        for record in self.records(keyword) {
            match best {
                Some(current) if current.score >= record.score => {}
                _ => best = Some(record),
            }
        }
        best
    }

    /// First of the leading keywords whose best record scores above zero,
    /// with that record
    pub fn lookup<'a, 'k>(&'a self, keywords: &'k [String]) -> Option<(&'k str, &'a KnowledgeRecord)> {
        for keyword in keywords.iter().take(LOOKUP_KEYWORDS) {
            if let Some(record) = self.best(keyword) {
                if record.score > 0 {
                    debug!("Knowledge hit for '{}' (score {})", keyword, record.score);
                    return Some((keyword.as_str(), record));
                }
                debug!("Best record for '{}' scores {}, skipping", keyword, record.score);
            }
        }
        None
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.entries.contains_key(keyword)
    }

    /// Distinct keywords
    pub fn keyword_count(&self) -> usize {
        self.entries.len()
    }

    /// Records across all keywords
    pub fn record_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Keywords ranked by how many records they hold
    pub fn top_keywords(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        counts.truncate(limit);
        counts
    }
}

/// Adjacent-word followers, kept for statistics only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordAssociations {
    followers: BTreeMap<String, BTreeSet<String>>,
}

impl WordAssociations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record each consecutive pair of the lowercased, whitespace-split text
    pub fn record(&mut self, text: &str) {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();
        for pair in words.windows(2) {
            self.followers
                .entry(pair[0].to_string())
                .or_default()
                .insert(pair[1].to_string());
        }
    }

    pub fn followers(&self, word: &str) -> Option<&BTreeSet<String>> {
        self.followers.get(word)
    }

    /// Distinct head words
    pub fn len(&self) -> usize {
        self.followers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.followers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(reply: &str, feedback: Feedback) -> KnowledgeRecord {
        KnowledgeRecord::new(reply, "source", feedback)
    }

    #[test]
    fn test_feedback_scores() {
        assert_eq!(Feedback::Positive.score(), 3);
        assert_eq!(Feedback::Negative.score(), -1);
        assert_eq!(Feedback::Neutral.score(), 1);
        assert_eq!(Feedback::default(), Feedback::Neutral);
        assert_eq!("good".parse::<Feedback>().unwrap(), Feedback::Positive);
        assert!("maybe".parse::<Feedback>().is_err());
    }

    #[test]
    fn test_best_is_stable_max() {
        let mut store = KnowledgeStore::new();
        store.append("rust", record("first", Feedback::Neutral));
        store.append("rust", record("second", Feedback::Positive));
        store.append("rust", record("third", Feedback::Positive));
        assert_eq!(store.best("rust").unwrap().reply, "second");
        assert!(store.best("missing").is_none());
    }

    #[test]
    fn test_negative_never_beats_positive() {
        let mut store = KnowledgeStore::new();
        store.append("joke", record("A", Feedback::Positive));
        store.append("joke", record("B", Feedback::Negative));
        let keys = vec!["joke".to_string()];
        assert_eq!(store.lookup(&keys).unwrap().1.reply, "A");
    }

    #[test]
    fn test_lookup_skips_non_positive_and_stops_at_three() {
        let mut store = KnowledgeStore::new();
        store.append("alpha", record("bad", Feedback::Negative));
        store.append("beta", record("good", Feedback::Neutral));
        store.append("delta", record("late", Feedback::Positive));

        let keys: Vec<String> = ["alpha", "beta", "gamma", "delta"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (keyword, hit) = store.lookup(&keys).unwrap();
        assert_eq!(keyword, "beta");
        assert_eq!(hit.reply, "good");

        // delta is the fourth keyword and is never consulted
        let keys: Vec<String> = ["alpha", "gamma", "omega", "delta"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(store.lookup(&keys).is_none());
    }

    #[test]
    fn test_counts() {
        let mut store = KnowledgeStore::new();
        store.append("a1", record("x", Feedback::Neutral));
        store.append("a1", record("y", Feedback::Neutral));
        store.append("b2", record("z", Feedback::Neutral));
        assert_eq!(store.keyword_count(), 2);
        assert_eq!(store.record_count(), 3);
        assert_eq!(store.top_keywords(1), vec![("a1", 2)]);
    }

    #[test]
    fn test_word_associations() {
        let mut assoc = WordAssociations::new();
        assoc.record("I like Rust and I like tea");
        assert_eq!(assoc.followers("i").unwrap().len(), 1);
        assert_eq!(assoc.followers("like").unwrap().len(), 2);
        assert!(assoc.followers("tea").is_none());
        assert_eq!(assoc.len(), 4);

        assoc.record("single");
        assert_eq!(assoc.len(), 4);
    }
}
