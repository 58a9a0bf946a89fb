//! Configuration management
//!
//! Manages engine defaults, snapshot storage and chat session behaviour.

use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Engine defaults
    #[serde(default)]
    pub engine: EngineConfig,
    /// Snapshot location and autosave
    #[serde(default)]
    pub storage: StorageConfig,
    /// Chat session behaviour
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine used when none is named on the command line
    #[serde(default = "default_engine_name")]
    pub default_name: String,
    /// Fixed seed for reply choice (reproducible sessions)
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_engine_name() -> String {
    "Parrot".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_name: default_engine_name(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot file; defaults to knowledge.json in the data directory
    #[serde(default)]
    pub state_file: Option<PathBuf>,
    /// Save automatically during interactive chat
    #[serde(default = "default_true")]
    pub autosave_enabled: bool,
    /// Seconds between autosaves
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_autosave_interval() -> u64 {
    60
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: None,
            autosave_enabled: true,
            autosave_interval_secs: default_autosave_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Learn every exchange with neutral feedback as it happens
    #[serde(default = "default_true")]
    pub learn_every_turn: bool,
    /// Messages kept in session history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Prefix chat lines with the time
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_history_limit() -> usize {
    100
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            learn_every_turn: true,
            history_limit: default_history_limit(),
            show_timestamps: true,
        }
    }
}

impl Config {
    /// Load configuration from the default location, writing defaults on
    /// first use
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Snapshot file, resolved against the data directory
    pub fn state_file(&self) -> Result<PathBuf> {
        match &self.storage.state_file {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("knowledge.json")),
        }
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "parrot", "parrot")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "parrot", "parrot")
        .context("Failed to get project directories")?;
    Ok(base.data_dir().to_path_buf())
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Configuration ({})", config_path()?.display());
    println!();
    println!("  Default engine:   {}", config.engine.default_name);
    println!("  Seed:             {}", config.engine.seed.map(|s| s.to_string()).unwrap_or_else(|| "random".to_string()));
    println!("  State file:       {}", config.state_file()?.display());
    println!("  Autosave:         {}", if config.storage.autosave_enabled {
        format!("every {}s", config.storage.autosave_interval_secs)
    } else {
        "disabled".to_string()
    });
    println!("  Learn every turn: {}", if config.chat.learn_every_turn { "yes" } else { "no" });
    println!("  History limit:    {}", config.chat.history_limit);
    println!("  Timestamps:       {}", if config.chat.show_timestamps { "shown" } else { "hidden" });

    Ok(())
}

/// Reset configuration to defaults
pub fn reset_config() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}

/// Get default configuration as TOML string
pub fn default_config_toml() -> String {
    let config = Config::default();
    toml::to_string_pretty(&config).unwrap_or_else(|_| "# Default configuration\n".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.default_name, "Parrot");
        assert_eq!(config.storage.autosave_interval_secs, 60);
        assert!(config.chat.learn_every_turn);
        assert_eq!(config.chat.history_limit, 100);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[engine]\nseed = 7\n").unwrap();
        assert_eq!(config.engine.seed, Some(7));
        assert_eq!(config.engine.default_name, "Parrot");
        assert!(config.storage.autosave_enabled);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("config.toml");

        let mut config = Config::default();
        config.engine.default_name = "Echo".to_string();
        config.storage.state_file = Some(dir.path().join("state.json"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.state_file().unwrap(), dir.path().join("state.json"));
    }

    #[test]
    fn test_default_toml_parses() {
        let parsed: Config = toml::from_str(&default_config_toml()).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
