//! Responder engine - one independently seeded, independently evolving persona
//!
//! Reply selection runs in a fixed order:
//! 1. pattern table (substring triggers, first hit wins)
//! 2. stored knowledge for the leading keywords (best positive score)
//! 3. templated synthesis from the turn's keywords

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::keywords::KeywordExtractor;
use super::knowledge::{Feedback, KnowledgeRecord, KnowledgeStore, WordAssociations};
use super::patterns::{PatternRule, PatternTable};
use super::synthesis::{self, TemplateKind};

/// Keywords a single learning event fans out to
pub const LEARN_KEYWORDS: usize = 5;

/// Keywords that become triggers of a learned rule
pub const RULE_TRIGGERS: usize = 3;

/// Random source used for reply choice
pub type ReplyRng = Box<dyn RngCore + Send>;

/// Where a reply came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    /// Index of the matching rule in the pattern table
    Pattern(usize),
    /// Keyword whose stored record answered
    Knowledge(String),
    Synthesized(TemplateKind),
}

/// A reply with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
    pub keywords: Vec<String>,
}

/// What a learning call stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnSummary {
    /// Keywords that received a new record
    pub keywords: Vec<String>,
    pub score: i32,
    pub rule_added: bool,
}

/// Counters reported to callers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub pattern_count: usize,
    pub keyword_count: usize,
    pub association_count: usize,
    pub knowledge_item_count: usize,
    pub conversation_count: u64,
}

impl std::fmt::Display for EngineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Patterns:        {}", self.pattern_count)?;
        writeln!(f, "Keywords:        {}", self.keyword_count)?;
        writeln!(f, "Associations:    {}", self.association_count)?;
        writeln!(f, "Knowledge items: {}", self.knowledge_item_count)?;
        write!(f, "Conversations:   {}", self.conversation_count)
    }
}

/// Serializable engine state, everything but the name and random source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub patterns: PatternTable,
    pub knowledge: KnowledgeStore,
    pub associations: WordAssociations,
    pub conversation_count: u64,
}

impl EngineState {
    /// Builtin rules only, nothing learned
    pub fn seeded() -> Self {
        Self {
            patterns: PatternTable::builtin(),
            ..Default::default()
        }
    }
}

pub struct ResponderEngine {
    name: String,
    state: EngineState,
    extractor: KeywordExtractor,
    rng: ReplyRng,
}

impl std::fmt::Debug for ResponderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponderEngine")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl ResponderEngine {
    /// Fresh engine with builtin rules and an OS-seeded random source
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_rng(name, Box::new(StdRng::from_os_rng()))
    }

    /// Fresh engine with a caller-supplied random source
    pub fn with_rng(name: impl Into<String>, rng: ReplyRng) -> Self {
        Self::from_state(name, EngineState::seeded(), rng)
    }

    /// Fresh engine whose reply choices are reproducible
    pub fn with_seed(name: impl Into<String>, seed: u64) -> Self {
        Self::with_rng(name, Box::new(StdRng::seed_from_u64(seed)))
    }

    /// Rebuild an engine from saved state
    pub fn from_state(name: impl Into<String>, state: EngineState, rng: ReplyRng) -> Self {
        Self {
            name: name.into(),
            state,
            extractor: KeywordExtractor::new(),
            rng,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn patterns(&self) -> &PatternTable {
        &self.state.patterns
    }

    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.state.knowledge
    }

    pub fn associations(&self) -> &WordAssociations {
        &self.state.associations
    }

    pub fn extractor(&self) -> &KeywordExtractor {
        &self.extractor
    }

    /// Swap the random source, e.g. to pin outcomes in tests
    pub fn set_rng(&mut self, rng: ReplyRng) {
        self.rng = rng;
    }

    /// Reply text for a user turn
    pub fn respond(&mut self, text: &str) -> String {
        self.respond_detailed(text).text
    }

    /// Reply for a user turn along with where it came from
    pub fn respond_detailed(&mut self, text: &str) -> Reply {
        self.state.conversation_count += 1;
        let keywords = self.extractor.extract(text);

        let lowered = text.to_lowercase();
        let hit = self
            .state
            .patterns
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(&lowered));
        if let Some((index, rule)) = hit {
            let replies = rule.replies();
            let text = replies[self.rng.random_range(0..replies.len())].clone();
            debug!("[{}] Pattern rule {} matched", self.name, index);
            return Reply {
                text,
                source: ReplySource::Pattern(index),
                keywords,
            };
        }

        let hit = self
            .state
            .knowledge
            .lookup(&keywords)
            .map(|(keyword, record)| (keyword.to_string(), record.reply.clone()));
        if let Some((keyword, text)) = hit {
            return Reply {
                text,
                source: ReplySource::Knowledge(keyword),
                keywords,
            };
        }

        let kind = synthesis::classify(text, &keywords);
        let text = synthesis::synthesize(text, &keywords, &mut self.rng);
        debug!("[{}] Synthesized {:?} reply", self.name, kind);
        Reply {
            text,
            source: ReplySource::Synthesized(kind),
            keywords,
        }
    }

    /// Store a scored reply for the input's keywords and append a rule for it
    ///
    /// The rule triggers on the first keywords, or on the whole lowercased
    /// input when it has none. Blank or whitespace-only input stores nothing
    /// and adds no rule (`rule_added` is false).
    pub fn learn(&mut self, user_input: &str, bot_reply: &str, feedback: Feedback) -> LearnSummary {
        let keywords = self.extractor.extract(user_input);
        let score = feedback.score();

        let learned: Vec<String> = keywords.iter().take(LEARN_KEYWORDS).cloned().collect();
        for keyword in &learned {
            self.state
                .knowledge
                .append(keyword, KnowledgeRecord::new(bot_reply, user_input, feedback));
        }

        self.state.associations.record(user_input);

        let triggers: Vec<String> = if keywords.is_empty() {
            vec![user_input.to_lowercase()]
        } else {
            keywords.iter().take(RULE_TRIGGERS).cloned().collect()
        };
        let rule_added = match PatternRule::learned(triggers, bot_reply) {
            Ok(rule) => {
                self.state.patterns.push(rule);
                true
            }
            Err(e) => {
                debug!("[{}] No rule learned from '{}': {}", self.name, user_input, e);
                false
            }
        };

        info!(
            "[{}] Learned {} reply for {:?} (score {})",
            self.name, feedback, learned, score
        );

        LearnSummary {
            keywords: learned,
            score,
            rule_added,
        }
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            pattern_count: self.state.patterns.len(),
            keyword_count: self.state.knowledge.keyword_count(),
            association_count: self.state.associations.len(),
            knowledge_item_count: self.state.knowledge.record_count(),
            conversation_count: self.state.conversation_count,
        }
    }
}
