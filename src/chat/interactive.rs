//! Interactive chat loop
//!
//! Line-editing terminal front end: reads user turns, prints timestamped
//! replies, forwards /good and /bad feedback for the latest reply and
//! autosaves on the configured interval.

use anyhow::{Context, Result};
use crossterm::{execute, style::{Color, Print, ResetColor, SetForegroundColor}};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;

use super::session::ChatSession;
use crate::config::Config;
use crate::memory;
use crate::responder::{EngineRegistry, Feedback};
use crate::types::Message;

/// Slash commands and their help text
const COMMANDS: &[(&str, &str)] = &[
    ("/good", "Rate the last reply as helpful"),
    ("/bad", "Rate the last reply as unhelpful"),
    ("/stats", "Show what this engine has learned"),
    ("/history", "Show this session's messages"),
    ("/engine", "Switch engine: /engine <name>"),
    ("/save", "Save all engines now"),
    ("/help", "Show this help"),
    ("/exit", "Save and quit"),
];

/// Options for an interactive session
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub engine: String,
    pub state_file: PathBuf,
    pub seed: Option<u64>,
    /// Write the snapshot on autosave, /save and exit
    pub persist: bool,
}

/// Completion and hints for slash commands
struct ChatHelper {
    commands: Vec<&'static str>,
}

impl ChatHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|(cmd, _)| *cmd).collect(),
        }
    }
}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let partial = &line[..pos];
        if !partial.starts_with('/') {
            return Ok((pos, Vec::new()));
        }

        let matches = self.commands
            .iter()
            .filter(|c| c.starts_with(partial))
            .map(|c| Pair {
                display: c.to_string(),
                replacement: c[partial.len()..].to_string(),
            })
            .collect();
        Ok((pos, matches))
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if !line.starts_with('/') || pos < line.len() {
            return None;
        }
        self.commands
            .iter()
            .find(|c| c.starts_with(line) && **c != line)
            .map(|c| c[line.len()..].to_string())
    }
}

impl Highlighter for ChatHelper {}

impl Validator for ChatHelper {}

impl Helper for ChatHelper {}

/// Print colored output
fn print_colored(text: &str, color: Color) {
    let _ = execute!(
        io::stdout(),
        SetForegroundColor(color),
        Print(text),
        ResetColor
    );
}

fn print_dim(text: &str) {
    print_colored(text, Color::DarkGrey);
}

fn print_info(text: &str) {
    print_colored(text, Color::Cyan);
}

fn print_error(text: &str) {
    print_colored(text, Color::Red);
}

fn print_message(message: &Message, show_timestamps: bool) {
    if show_timestamps {
        print_dim(&format!("[{}] ", message.time_label()));
    }
    let color = match message.role {
        crate::types::Role::User => Color::Green,
        crate::types::Role::Assistant => Color::Cyan,
    };
    print_colored(&format!("{}: ", message.role), color);
    println!("{}", message.content);
}

fn print_help() {
    println!();
    for (cmd, desc) in COMMANDS {
        print_info(&format!("  {:<10}", cmd));
        println!("{}", desc);
    }
    println!();
}

/// Interactive loop state
struct Repl {
    registry: EngineRegistry,
    session: ChatSession,
    options: ChatOptions,
    show_timestamps: bool,
}

impl Repl {
    fn save(&mut self) -> Result<()> {
        if !self.options.persist {
            return Ok(());
        }
        memory::save(&self.options.state_file, &self.registry)
            .with_context(|| format!("Failed to save {}", self.options.state_file.display()))?;
        self.session.mark_saved(Instant::now());
        Ok(())
    }

    /// Handle a slash command; false means quit
    fn handle_command(&mut self, input: &str) -> Result<bool> {
        let mut parts = input.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).unwrap_or_default();

        match command {
            "/good" | "/bad" => {
                let feedback = if command == "/good" { Feedback::Positive } else { Feedback::Negative };
                let status = self.session.feedback(&mut self.registry, feedback);
                print_info(&status.describe());
                println!();
            }
            "/stats" => {
                match self.registry.stats(self.session.engine()) {
                    Ok(stats) => {
                        println!("Engine '{}'", self.session.engine());
                        println!("{}", stats);
                    }
                    Err(e) => {
                        print_error(&e.to_string());
                        println!();
                    }
                }
                if let Some(engine) = self.registry.engine(self.session.engine()) {
                    let top = engine.knowledge().top_keywords(5);
                    if !top.is_empty() {
                        let list: Vec<String> = top.iter().map(|(k, n)| format!("{} ({})", k, n)).collect();
                        println!("Top keywords:    {}", list.join(", "));
                    }
                }
            }
            "/history" => {
                for message in self.session.history() {
                    print_message(message, self.show_timestamps);
                }
            }
            "/engine" => {
                if arg.is_empty() {
                    println!("Talking to '{}'", self.session.engine());
                } else {
                    self.session.switch_engine(arg);
                    self.registry.engine_mut(arg);
                    print_info(&format!("Now talking to '{}'", arg));
                    println!();
                }
            }
            "/save" => {
                if self.options.persist {
                    self.save()?;
                    print_info(&format!("Saved to {}", self.options.state_file.display()));
                } else {
                    print_dim("Saving is disabled for this session.");
                }
                println!();
            }
            "/help" => print_help(),
            "/exit" | "/quit" => return Ok(false),
            other => {
                print_error(&format!("Unknown command '{}'. Type /help for commands.", other));
                println!();
            }
        }
        Ok(true)
    }

    fn handle_turn(&mut self, input: &str) {
        let show_timestamps = self.show_timestamps;
        let turn = self.session.send(&mut self.registry, input);
        debug!("Turn keywords: {:?}", turn.reply.keywords);
        print_message(&turn.reply_message(), show_timestamps);
    }
}

/// Run the interactive chat loop until /exit or end of input
pub fn run_interactive(config: &Config, options: ChatOptions) -> Result<()> {
    let registry = match options.seed {
        Some(seed) => EngineRegistry::with_seed(seed),
        None => EngineRegistry::new(),
    };
    let outcome = memory::load_into(&options.state_file, registry)
        .with_context(|| format!("Failed to read {}", options.state_file.display()))?;
    for warning in &outcome.warnings {
        print_error(&format!("warning: {}", warning));
        println!();
    }
    if let Some(backup) = &outcome.backup {
        print_error(&format!("warning: damaged snapshot kept as {}", backup.display()));
        println!();
    }

    let mut session = ChatSession::new(options.engine.clone(), config.chat.clone());
    if options.persist && config.storage.autosave_enabled {
        session = session.with_autosave(Duration::from_secs(config.storage.autosave_interval_secs));
    }

    let mut repl = Repl {
        registry: outcome.registry,
        session,
        show_timestamps: config.chat.show_timestamps,
        options,
    };
    repl.registry.engine_mut(&repl.options.engine);

    print_info(&format!("Chatting with '{}'. Type /help for commands.", repl.options.engine));
    println!();

    let rl_config = rustyline::Config::builder()
        .completion_type(rustyline::CompletionType::List)
        .edit_mode(rustyline::EditMode::Emacs)
        .auto_add_history(true)
        .build();

    let mut rl = rustyline::Editor::<ChatHelper, rustyline::history::DefaultHistory>::with_config(rl_config)
        .context("Failed to initialise line editor")?;
    rl.set_helper(Some(ChatHelper::new()));

    loop {
        match rl.readline("\x1b[32m❯\x1b[0m ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }

                if input.starts_with('/') {
                    if !repl.handle_command(input)? {
                        break;
                    }
                } else {
                    repl.handle_turn(input);
                }

                if repl.session.autosave_due(Instant::now()) {
                    match repl.save() {
                        Ok(()) => debug!("Autosaved to {}", repl.options.state_file.display()),
                        Err(e) => {
                            print_error(&format!("Autosave failed: {:#}", e));
                            println!();
                        }
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                print_error(&format!("Error: {}", err));
                println!();
                break;
            }
        }
    }

    repl.save()?;
    print_info("Goodbye!");
    println!();
    Ok(())
}
