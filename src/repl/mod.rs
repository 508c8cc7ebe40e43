//! Interactive dashboard (REPL)
//!
//! Holds the loaded dataset and the current selection. Filter commands
//! re-render the KPI row; bare input shows a district's trend.

pub mod commands;
pub mod display;
pub mod input;
pub mod session;

use anyhow::Result;
use std::path::PathBuf;

use crate::dashboard::{Filter, FilterOptions, Snapshot, DEFAULT_HISTORY_WINDOW};
use crate::data::Dataset;
use crate::telemetry::TelemetryCollector;
pub use crate::repl::commands::{is_command, Command, CommandHandler, Reply};
pub use crate::repl::display::DisplayManager;
use crate::repl::input::{DashboardCompleter, InputHandler, PROMPT};
pub use crate::repl::session::{ActionKind, ActionRecord, SessionManager};

/// Dataset plus the current selection
pub struct DashboardState {
    pub dataset: Dataset,
    pub filter: Filter,
    pub history_window: usize,
    pub table_limit: usize,
    pub export_dir: PathBuf,
}

impl DashboardState {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            filter: Filter::default(),
            history_window: DEFAULT_HISTORY_WINDOW,
            table_limit: 50,
            export_dir: PathBuf::from("."),
        }
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn with_table_limit(mut self, limit: usize) -> Self {
        self.table_limit = limit;
        self
    }

    pub fn with_export_dir(mut self, dir: PathBuf) -> Self {
        self.export_dir = dir;
        self
    }

    /// KPIs, distribution and rows for the current selection
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::build(self.dataset.risk(), &self.filter)
    }

    /// Prompt carrying the narrowest active location
    pub fn prompt(&self) -> String {
        match self.filter.district.as_ref().or(self.filter.state.as_ref()) {
            Some(place) => format!("[{}] {}", place, PROMPT),
            None => PROMPT.to_string(),
        }
    }

    fn completer(&self) -> DashboardCompleter {
        let options = FilterOptions::from_records(self.dataset.risk(), &self.filter);
        DashboardCompleter::new(options.states, options.districts)
    }
}

/// REPL session coordinator
pub struct ReplSession {
    input_handler: InputHandler,
    command_handler: CommandHandler,
    session_manager: SessionManager,
    display_manager: DisplayManager,
    state: DashboardState,
}

impl ReplSession {
    pub fn new(state: DashboardState, telemetry: TelemetryCollector) -> Result<Self> {
        Self::build(InputHandler::new()?, state, telemetry)
    }

    /// Create REPL session with persistent history
    pub fn with_history(
        history_path: PathBuf,
        state: DashboardState,
        telemetry: TelemetryCollector,
    ) -> Result<Self> {
        Self::build(InputHandler::with_history(history_path)?, state, telemetry)
    }

    fn build(
        input_handler: InputHandler,
        state: DashboardState,
        telemetry: TelemetryCollector,
    ) -> Result<Self> {
        let mut session = ReplSession {
            input_handler,
            command_handler: CommandHandler::new(telemetry),
            session_manager: SessionManager::new(),
            display_manager: DisplayManager::new(),
            state,
        };
        session.sync_input();
        Ok(session)
    }

    /// Point prompt and completion at the current selection
    fn sync_input(&mut self) {
        self.input_handler.set_prompt(self.state.prompt());
        self.input_handler.set_completions(self.state.completer());
    }

    /// Banner followed by the full dashboard for the initial selection
    pub fn show_welcome(&self, version: &str) {
        self.display_manager.show_banner(
            version,
            &self.state.dataset.origin().to_string(),
            self.state.dataset.risk().len(),
        );
        if self.state.dataset.is_synthetic() {
            self.display_manager
                .show_info("No input files given; showing synthetic demo data.");
        }
        let snapshot = self.state.snapshot();
        self.display_manager
            .show_output(&crate::render::dashboard(&snapshot, Some(self.state.table_limit)));
    }

    pub fn read_input(&mut self) -> Result<Option<String>> {
        self.input_handler.read_line()
    }

    /// Handle one line of input
    ///
    /// Returns true if session should continue, false to exit
    pub fn handle_input(&mut self, input: &str) -> Result<bool> {
        if input.trim().is_empty() {
            return Ok(true);
        }

        let command = self.command_handler.parse(input);
        match self
            .command_handler
            .execute(command, &mut self.state, &mut self.session_manager)
        {
            Ok(Reply::Output(text)) => {
                self.display_manager.show_output(&text);
                self.sync_input();
            }
            Ok(Reply::Clear) => self.display_manager.clear_screen()?,
            Ok(Reply::Exit) => return Ok(false),
            Err(e) => self.display_manager.show_error(&e.to_string()),
        }
        Ok(true)
    }

    /// Read-eval-print until `/exit` or Ctrl-D
    pub fn run(&mut self) -> Result<()> {
        while let Some(line) = self.read_input()? {
            if !self.handle_input(&line)? {
                break;
            }
        }
        self.save()
    }

    pub fn session(&self) -> &SessionManager {
        &self.session_manager
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn save(&mut self) -> Result<()> {
        self.input_handler.save_history()
    }
}
