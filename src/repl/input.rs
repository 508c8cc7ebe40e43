//! Line editing for the dashboard REPL
//!
//! Wraps a rustyline editor with persistent history and tab completion of
//! slash commands, state names and district names.

use anyhow::Result;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::{DefaultHistory, History};
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::path::PathBuf;

/// Prompt shown before every line
pub const PROMPT: &str = ">outbreakcast: ";

/// Commands offered by completion
const COMMANDS: &[&str] = &[
    "/state", "/district", "/week", "/reset", "/options", "/kpi", "/bands", "/table", "/trend",
    "/export", "/status", "/history", "/help", "/clear", "/exit",
];

/// Completion candidates drawn from the loaded dataset
#[derive(Debug, Default, Clone)]
pub struct DashboardCompleter {
    states: Vec<String>,
    districts: Vec<String>,
}

impl DashboardCompleter {
    pub fn new(states: Vec<String>, districts: Vec<String>) -> Self {
        DashboardCompleter { states, districts }
    }

    /// Start offset and candidates for the text before the cursor
    fn candidates(&self, line: &str) -> (usize, Vec<String>) {
        let Some(rest) = line.strip_prefix('/') else {
            return (0, matching(&self.districts, line));
        };

        match rest.split_once(' ') {
            None => (
                0,
                COMMANDS
                    .iter()
                    .filter(|c| c.starts_with(line))
                    .map(|c| c.to_string())
                    .collect(),
            ),
            Some((command, arg)) => {
                let start = command.len() + 2;
                let names = match command {
                    "state" => &self.states,
                    "district" | "trend" => &self.districts,
                    _ => return (start, Vec::new()),
                };
                (start, matching(names, arg))
            }
        }
    }
}

fn matching(names: &[String], prefix: &str) -> Vec<String> {
    let prefix = prefix.to_lowercase();
    names
        .iter()
        .filter(|n| n.to_lowercase().starts_with(&prefix))
        .cloned()
        .collect()
}

impl Completer for DashboardCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, found) = self.candidates(&line[..pos]);
        let pairs = found
            .into_iter()
            .map(|c| Pair {
                display: c.clone(),
                replacement: c,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for DashboardCompleter {
    type Hint = String;
}

impl Highlighter for DashboardCompleter {}

impl Validator for DashboardCompleter {}

impl Helper for DashboardCompleter {}

/// Readline interface with command history
pub struct InputHandler {
    editor: Editor<DashboardCompleter, DefaultHistory>,
    history_path: Option<PathBuf>,
    prompt: String,
}

impl InputHandler {
    pub fn new() -> Result<Self> {
        Self::open(None)
    }

    /// Input handler whose history survives the session
    pub fn with_history(history_file: PathBuf) -> Result<Self> {
        Self::open(Some(history_file))
    }

    fn open(history_path: Option<PathBuf>) -> Result<Self> {
        let mut editor = Editor::<DashboardCompleter, DefaultHistory>::new()?;
        editor.set_helper(Some(DashboardCompleter::default()));

        if let Some(path) = history_path.as_ref().filter(|p| p.exists()) {
            if let Err(e) = editor.load_history(path) {
                tracing::warn!(path = %path.display(), error = %e, "could not load REPL history");
            }
        }

        Ok(InputHandler {
            editor,
            history_path,
            prompt: PROMPT.to_string(),
        })
    }

    /// Replace the names offered by tab completion
    pub fn set_completions(&mut self, completer: DashboardCompleter) {
        self.editor.set_helper(Some(completer));
    }

    pub fn set_prompt(&mut self, prompt: String) {
        self.prompt = prompt;
    }

    /// Next trimmed line; empty after Ctrl-C, `None` on Ctrl-D
    pub fn read_line(&mut self) -> Result<Option<String>> {
        match self.editor.readline(&self.prompt) {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    let _ = self.editor.add_history_entry(line);
                }
                Ok(Some(line.to_string()))
            }
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(anyhow::anyhow!("Readline error: {}", err)),
        }
    }

    pub fn save_history(&mut self) -> Result<()> {
        let Some(path) = &self.history_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.editor.save_history(path)?;
        Ok(())
    }

    pub fn history_len(&self) -> usize {
        self.editor.history().len()
    }
}
