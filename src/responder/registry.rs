//! Engine registry - named, isolated responder instances
//!
//! The registry is owned by the caller and is the only place engines live.
//! Unknown names are created on first use with builtin-only state.

use std::collections::BTreeMap;
use tracing::info;

use super::engine::{EngineState, EngineStats, LearnSummary, ReplyRng, ResponderEngine};
use super::knowledge::Feedback;
use crate::error::{ChatError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Default)]
pub struct EngineRegistry {
    engines: BTreeMap<String, ResponderEngine>,
    /// Base seed for reproducible reply choice; OS entropy when unset
    seed: Option<u64>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose engines pick replies deterministically
    pub fn with_seed(seed: u64) -> Self {
        Self {
            engines: BTreeMap::new(),
            seed: Some(seed),
        }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Engine by name, creating a fresh one if needed
    pub fn engine_mut(&mut self, name: &str) -> &mut ResponderEngine {
        let (seed, count) = (self.seed, self.engines.len());
        self.engines.entry(name.to_string()).or_insert_with(|| {
            info!("Creating engine '{}'", name);
            ResponderEngine::with_rng(name, reply_rng(seed, count))
        })
    }

    pub fn engine(&self, name: &str) -> Option<&ResponderEngine> {
        self.engines.get(name)
    }

    /// Install an engine rebuilt from saved state, replacing any namesake
    pub fn restore(&mut self, name: &str, state: EngineState) {
        let engine = ResponderEngine::from_state(name, state, reply_rng(self.seed, self.engines.len()));
        self.engines.insert(name.to_string(), engine);
    }

    /// Add an already-built engine, replacing any namesake
    pub fn insert(&mut self, engine: ResponderEngine) {
        self.engines.insert(engine.name().to_string(), engine);
    }

    pub fn remove(&mut self, name: &str) -> Option<ResponderEngine> {
        self.engines.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.engines.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResponderEngine)> {
        self.engines.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn respond(&mut self, name: &str, text: &str) -> String {
        self.engine_mut(name).respond(text)
    }

    pub fn learn(&mut self, name: &str, user_text: &str, bot_reply: &str, feedback: Feedback) -> LearnSummary {
        self.engine_mut(name).learn(user_text, bot_reply, feedback)
    }

    pub fn stats(&self, name: &str) -> Result<EngineStats> {
        self.engines
            .get(name)
            .map(ResponderEngine::stats)
            .ok_or_else(|| ChatError::UnknownEngine(name.to_string()))
    }
}

/// Random source for the engine created after `count` others
fn reply_rng(seed: Option<u64>, count: usize) -> ReplyRng {
    match seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed.wrapping_add(count as u64))),
        None => Box::new(StdRng::from_os_rng()),
    }
}
