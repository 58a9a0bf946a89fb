//! Snapshot persistence - every engine in one JSON document
//!
//! Document layout:
//!
//! ```json
//! {
//!   "version": 1,
//!   "saved_at": "2026-01-01T00:00:00Z",
//!   "engines": {
//!     "Parrot": {
//!       "patterns": [ ... ],
//!       "knowledge": { "keyword": [ ... ] },
//!       "associations": { "word": [ ... ] },
//!       "conversation_count": 12
//!     }
//!   }
//! }
//! ```
//!
//! Loading is forgiving. Each engine and each of its sections decodes on
//! its own, so a damaged section costs only that section and is reported
//! as a warning. A file that loads with warnings is copied aside first,
//! so the next save cannot destroy what failed to decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Result;
use crate::responder::{EngineRegistry, EngineState, KnowledgeStore, PatternRule, PatternTable, WordAssociations};

pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk document
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub engines: BTreeMap<String, EngineState>,
}

impl Snapshot {
    pub fn capture(registry: &EngineRegistry) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            engines: registry
                .iter()
                .map(|(name, engine)| (name.to_string(), engine.state().clone()))
                .collect(),
        }
    }
}

/// Result of a load: whatever decoded, plus what did not
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub registry: EngineRegistry,
    pub warnings: Vec<String>,
    /// False when the file did not exist
    pub found: bool,
    /// Copy of a damaged file, kept before anything can overwrite it
    pub backup: Option<PathBuf>,
}

impl LoadOutcome {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Write every engine to `path`, creating parent directories
pub fn save(path: &Path, registry: &EngineRegistry) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let snapshot = Snapshot::capture(registry);
    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(path, json)?;
    info!("Saved {} engine(s) to {}", registry.len(), path.display());
    Ok(())
}

/// Read a snapshot into a fresh registry
pub fn load(path: &Path) -> Result<LoadOutcome> {
    load_into(path, EngineRegistry::new())
}

/// Read a snapshot into the given (normally empty) registry
pub fn load_into(path: &Path, registry: EngineRegistry) -> Result<LoadOutcome> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No snapshot at {}, starting fresh", path.display());
            return Ok(LoadOutcome {
                registry,
                warnings: Vec::new(),
                found: false,
                backup: None,
            });
        }
        Err(e) => return Err(e.into()),
    };

    let mut outcome = decode(&content, registry);
    outcome.found = true;
    for warning in &outcome.warnings {
        warn!("{}: {}", path.display(), warning);
    }
    if !outcome.is_clean() {
        let backup = backup_path(path);
        std::fs::write(&backup, &content)?;
        warn!("Kept damaged snapshot as {}", backup.display());
        outcome.backup = Some(backup);
    }
    info!(
        "Loaded {} engine(s) from {} ({} warning(s))",
        outcome.registry.len(),
        path.display(),
        outcome.warnings.len()
    );
    Ok(outcome)
}

/// `knowledge.json` -> `knowledge.json.corrupt-20260101T120000`
fn backup_path(path: &Path) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".corrupt-{}", stamp));
    path.with_file_name(name)
}

/// Decode document text, keeping every section that parses
pub fn decode(content: &str, mut registry: EngineRegistry) -> LoadOutcome {
    let mut warnings = Vec::new();

    let root: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            warnings.push(format!("snapshot is not valid JSON: {}", e));
            return LoadOutcome {
                registry,
                warnings,
                found: true,
                backup: None,
            };
        }
    };

    if let Some(version) = root.get("version").and_then(Value::as_u64) {
        if version != SNAPSHOT_VERSION as u64 {
            warnings.push(format!(
                "snapshot version {} differs from {}, loading what is readable",
                version, SNAPSHOT_VERSION
            ));
        }
    }

    let engines = match root.get("engines").and_then(Value::as_object) {
        Some(engines) => engines,
        None => {
            warnings.push("snapshot has no 'engines' object".to_string());
            return LoadOutcome {
                registry,
                warnings,
                found: true,
                backup: None,
            };
        }
    };

    for (name, value) in engines {
        match value.as_object() {
            Some(sections) => {
                let state = decode_engine(name, sections, &mut warnings);
                registry.restore(name, state);
            }
            None => warnings.push(format!("engine '{}' is not an object, skipped", name)),
        }
    }

    LoadOutcome {
        registry,
        warnings,
        found: true,
        backup: None,
    }
}

fn decode_engine(name: &str, sections: &Map<String, Value>, warnings: &mut Vec<String>) -> EngineState {
    let mut state = EngineState::seeded();

    if let Some(value) = sections.get("patterns") {
        match value.as_array() {
            Some(items) => state.patterns = decode_patterns(name, items, warnings),
            None => warnings.push(format!("engine '{}': patterns is not a list, using builtins", name)),
        }
    }

    if let Some(value) = sections.get("knowledge") {
        match serde_json::from_value::<KnowledgeStore>(value.clone()) {
            Ok(knowledge) => state.knowledge = knowledge,
            Err(e) => warnings.push(format!("engine '{}': knowledge unreadable: {}", name, e)),
        }
    }

    if let Some(value) = sections.get("associations") {
        match serde_json::from_value::<WordAssociations>(value.clone()) {
            Ok(associations) => state.associations = associations,
            Err(e) => warnings.push(format!("engine '{}': associations unreadable: {}", name, e)),
        }
    }

    if let Some(value) = sections.get("conversation_count") {
        match value.as_u64() {
            Some(count) => state.conversation_count = count,
            None => warnings.push(format!("engine '{}': conversation_count is not a number", name)),
        }
    }

    state
}

/// Rules decode one at a time; a bad rule is dropped on its own
fn decode_patterns(name: &str, items: &[Value], warnings: &mut Vec<String>) -> PatternTable {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let decoded = serde_json::from_value::<PatternRule>(item.clone())
                .map_err(|e| e.to_string())
                .and_then(|rule| rule.validate().map_err(|e| e.to_string()));
            match decoded {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warnings.push(format!("engine '{}': pattern {} dropped: {}", name, index, e));
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::Feedback;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let outcome = load(&dir.path().join("absent.json")).unwrap();
        assert!(!outcome.found);
        assert!(outcome.is_clean());
        assert!(outcome.registry.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("knowledge.json");

        let mut registry = EngineRegistry::with_seed(1);
        registry.respond("Parrot", "hello");
        registry.learn("Parrot", "volcanoes erupt lava", "Hot stuff!", Feedback::Positive);
        registry.learn("Echo", "chess openings", "Try the Sicilian.", Feedback::Negative);
        save(&path, &registry).unwrap();

        let outcome = load(&path).unwrap();
        assert!(outcome.found);
        assert!(outcome.is_clean(), "{:?}", outcome.warnings);
        assert!(outcome.backup.is_none());
        for name in ["Parrot", "Echo"] {
            assert_eq!(registry.stats(name).unwrap(), outcome.registry.stats(name).unwrap());
            assert_eq!(
                registry.engine(name).unwrap().state(),
                outcome.registry.engine(name).unwrap().state()
            );
        }
    }

    #[test]
    fn test_not_json_is_a_warning() {
        let outcome = decode("{ not json", EngineRegistry::new());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.registry.is_empty());
    }

    #[test]
    fn test_damaged_file_is_copied_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.json");
        let damaged = r#"{"version": 1, "engines": {"Parrot": {"knowledge": {"rust": [{"reply": "crabs""#;
        std::fs::write(&path, damaged).unwrap();

        let outcome = load(&path).unwrap();
        let backup = outcome.backup.expect("damaged file should be kept");
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), damaged);
        assert!(backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("knowledge.json.corrupt-"));
    }

    #[test]
    fn test_partial_load() {
        let doc = r#"{
            "version": 1,
            "engines": {
                "Parrot": {
                    "patterns": [
                        {"triggers": ["hello"], "replies": ["Hi!"], "origin": "builtin"},
                        {"triggers": [], "replies": ["broken"], "origin": "learned"},
                        {"nonsense": true}
                    ],
                    "knowledge": "garbage",
                    "associations": {"big": ["cat"]},
                    "conversation_count": 4
                },
                "Broken": 17
            }
        }"#;
        let outcome = decode(doc, EngineRegistry::new());
        assert_eq!(outcome.warnings.len(), 4, "{:?}", outcome.warnings);

        let stats = outcome.registry.stats("Parrot").unwrap();
        assert_eq!(stats.pattern_count, 1);
        assert_eq!(stats.keyword_count, 0);
        assert_eq!(stats.association_count, 1);
        assert_eq!(stats.conversation_count, 4);
        assert!(!outcome.registry.contains("Broken"));
    }
}
