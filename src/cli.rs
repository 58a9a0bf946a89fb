//! CLI interface for parrot

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::chat::interactive::{run_interactive, ChatOptions};
use crate::config::{self, Config};
use crate::memory;
use crate::responder::{EngineRegistry, Feedback};

#[derive(Parser)]
#[command(name = "parrot")]
#[command(about = "Keyword-learning chat responder that remembers the replies you like", long_about = None)]
#[command(version)]
struct Cli {
    /// Snapshot file to load and save (overrides the configured one)
    #[arg(long, global = true, env = "PARROT_STATE")]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session (default when no command given)
    Chat {
        /// Engine to talk to
        #[arg(short, long)]
        engine: Option<String>,
        /// Seed reply choice for a reproducible session
        #[arg(long)]
        seed: Option<u64>,
        /// Do not write the snapshot
        #[arg(long)]
        no_save: bool,
    },
    /// Get a single reply
    Ask {
        /// What to say
        text: String,
        /// Engine to talk to
        #[arg(short, long)]
        engine: Option<String>,
        /// Learn the exchange with neutral feedback and save
        #[arg(short, long)]
        learn: bool,
    },
    /// Teach an engine a reply for some input
    Teach {
        /// User input the reply belongs to
        input: String,
        /// Reply to remember
        reply: String,
        /// positive, negative or neutral
        #[arg(short, long, default_value = "neutral")]
        feedback: Feedback,
        /// Engine to teach
        #[arg(short, long)]
        engine: Option<String>,
    },
    /// Show learning statistics
    Stats {
        /// Only this engine (default: all saved engines)
        #[arg(short, long)]
        engine: Option<String>,
    },
    /// Configure parrot
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
        /// Print the configuration file path
        #[arg(long)]
        path: bool,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let state_file = match cli.state {
        Some(path) => path,
        None => config.state_file()?,
    };

    match cli.command {
        None => {
            let options = chat_options(&config, state_file, None, None, false);
            run_interactive(&config, options)?;
        }
        Some(Commands::Chat { engine, seed, no_save }) => {
            let options = chat_options(&config, state_file, engine, seed, no_save);
            run_interactive(&config, options)?;
        }
        Some(Commands::Ask { text, engine, learn }) => {
            let name = engine.unwrap_or_else(|| config.engine.default_name.clone());
            let mut registry = load_registry(&state_file, config.engine.seed)?;
            let reply = registry.respond(&name, &text);
            println!("{}", reply);
            if learn {
                registry.learn(&name, &text, &reply, Feedback::Neutral);
            }
            // the conversation counter advanced either way
            save_registry(&state_file, &registry)?;
        }
        Some(Commands::Teach { input, reply, feedback, engine }) => {
            let name = engine.unwrap_or_else(|| config.engine.default_name.clone());
            let mut registry = load_registry(&state_file, config.engine.seed)?;
            let summary = registry.learn(&name, &input, &reply, feedback);
            save_registry(&state_file, &registry)?;
            println!(
                "Taught '{}' a {} reply for: {}",
                name,
                feedback,
                if summary.keywords.is_empty() { "(no keywords)".to_string() } else { summary.keywords.join(", ") }
            );
        }
        Some(Commands::Stats { engine }) => {
            let registry = load_registry(&state_file, None)?;
            print_stats(&registry, engine.as_deref())?;
        }
        Some(Commands::Config { show, reset, path }) => {
            if reset {
                config::reset_config()?;
            } else if path {
                println!("{}", config::config_path()?.display());
            } else if show {
                config::show_config()?;
            } else {
                print!("{}", config::default_config_toml());
            }
        }
    }

    Ok(())
}

fn chat_options(
    config: &Config,
    state_file: PathBuf,
    engine: Option<String>,
    seed: Option<u64>,
    no_save: bool,
) -> ChatOptions {
    ChatOptions {
        engine: engine.unwrap_or_else(|| config.engine.default_name.clone()),
        state_file,
        seed: seed.or(config.engine.seed),
        persist: !no_save,
    }
}

/// Load the snapshot, reporting partial-load warnings on stderr
fn load_registry(path: &Path, seed: Option<u64>) -> Result<EngineRegistry> {
    let registry = match seed {
        Some(seed) => EngineRegistry::with_seed(seed),
        None => EngineRegistry::new(),
    };
    let outcome = memory::load_into(path, registry)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }
    if let Some(backup) = &outcome.backup {
        eprintln!("warning: damaged snapshot kept as {}", backup.display());
    }
    Ok(outcome.registry)
}

fn save_registry(path: &Path, registry: &EngineRegistry) -> Result<()> {
    memory::save(path, registry)
        .with_context(|| format!("Failed to save {}", path.display()))
}

fn print_stats(registry: &EngineRegistry, engine: Option<&str>) -> Result<()> {
    match engine {
        Some(name) => {
            let stats = registry.stats(name)?;
            println!("Engine '{}'", name);
            println!("{}", stats);
        }
        None if registry.is_empty() => println!("No engines saved yet."),
        None => {
            for (name, engine) in registry.iter() {
                println!("Engine '{}'", name);
                println!("{}", engine.stats());
                println!();
            }
        }
    }
    Ok(())
}
