//! Command handler for the dashboard REPL
//!
//! Commands render to strings; the session decides how to show them.

use crate::cli::Verbosity;
use crate::dashboard::{district_trend, FilterOptions, ALL};
use crate::data::{export_risk, DEFAULT_EXPORT_NAME};
use crate::errors::Result;
use crate::render;
use crate::repl::session::{format_duration, ActionRecord, SessionManager};
use crate::repl::DashboardState;
use crate::telemetry::{TelemetryCollector, TelemetryDisplay, TelemetryEvent};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

/// Default number of `/history` entries
const DEFAULT_HISTORY_LIMIT: usize = 10;

/// REPL command types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    State { value: Option<String> },
    District { value: Option<String> },
    Week { value: Option<String> },
    Reset,
    Options,
    Kpi,
    Bands,
    Table { limit: Option<usize> },
    Trend { district: Option<String> },
    Export { path: Option<PathBuf> },
    Status,
    History { limit: Option<usize> },
    Help,
    Clear,
    Exit,
    Unknown { input: String },
}

/// What the session should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Output(String),
    Clear,
    Exit,
}

/// Check if input is a command (starts with /)
pub fn is_command(input: &str) -> bool {
    input.trim().starts_with('/')
}

/// Argument text after the command word, if any
fn rest(parts: &[&str]) -> Option<String> {
    if parts.len() > 1 {
        Some(parts[1..].join(" "))
    } else {
        None
    }
}

/// Parse input string into a command
///
/// Bare text is a district name for the trend view.
pub fn parse(input: &str) -> Command {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        if trimmed.is_empty() {
            return Command::Unknown { input: input.to_string() };
        }
        return Command::Trend { district: Some(trimmed.to_string()) };
    }

    let parts: Vec<&str> = trimmed[1..].split_whitespace().collect();
    if parts.is_empty() {
        return Command::Unknown { input: input.to_string() };
    }

    match parts[0].to_lowercase().as_str() {
        "state" => Command::State { value: rest(&parts) },
        "district" => Command::District { value: rest(&parts) },
        "week" => Command::Week { value: rest(&parts) },
        "reset" => Command::Reset,
        "options" | "opts" => Command::Options,
        "kpi" | "kpis" => Command::Kpi,
        "bands" => Command::Bands,
        "table" => Command::Table {
            limit: parts.get(1).and_then(|s| s.parse().ok()),
        },
        "trend" => Command::Trend { district: rest(&parts) },
        "export" => Command::Export {
            path: rest(&parts).map(PathBuf::from),
        },
        "status" => Command::Status,
        "history" => Command::History {
            limit: parts.get(1).and_then(|s| s.parse().ok()),
        },
        "help" | "h" => Command::Help,
        "clear" | "cls" => Command::Clear,
        "exit" | "quit" | "q" => Command::Exit,
        _ => Command::Unknown { input: input.to_string() },
    }
}

/// Executes commands against the dashboard state
pub struct CommandHandler {
    telemetry: TelemetryCollector,
}

impl CommandHandler {
    pub fn new(telemetry: TelemetryCollector) -> Self {
        CommandHandler { telemetry }
    }

    pub fn parse(&self, input: &str) -> Command {
        parse(input)
    }

    /// Execute a command
    pub fn execute(
        &mut self,
        command: Command,
        state: &mut DashboardState,
        session: &mut SessionManager,
    ) -> Result<Reply> {
        let text = match command {
            Command::State { value: None } => list("States", &options_of(state).states),
            Command::District { value: None } => list("Districts", &options_of(state).districts),
            Command::Week { value: None } => {
                let weeks: Vec<String> =
                    options_of(state).weeks.iter().map(|w| w.to_string()).collect();
                list("Weeks", &weeks)
            }
            Command::State { value: Some(v) } => {
                let cleared = state.filter.select_state(&v, state.dataset.risk())?;
                let mut out = self.apply_filter(state, session);
                if cleared {
                    out = format!(
                        "{}\n{}",
                        "District reset to (All): not in the selected state.".yellow(),
                        out
                    );
                }
                out
            }
            Command::District { value: Some(v) } => {
                state.filter.select_district(&v, state.dataset.risk())?;
                self.apply_filter(state, session)
            }
            Command::Week { value: Some(v) } => {
                state.filter.select_week(&v, state.dataset.risk())?;
                self.apply_filter(state, session)
            }
            Command::Reset => {
                state.filter.reset();
                self.apply_filter(state, session)
            }
            Command::Options => self.options(state),
            Command::Kpi => {
                let snapshot = state.snapshot();
                format!(
                    "{}\n{}",
                    snapshot.filter.to_string().dimmed(),
                    render::kpi_row(&snapshot.kpis)
                )
            }
            Command::Bands => render::distribution_chart(&state.snapshot().distribution),
            Command::Table { limit } => {
                let snapshot = state.snapshot();
                render::risk_table(&snapshot.rows, Some(limit.unwrap_or(state.table_limit)))
            }
            Command::Trend { district: None } => list("Districts", &state.dataset.districts()),
            Command::Trend { district: Some(d) } => {
                let trend = district_trend(
                    state.dataset.risk(),
                    state.dataset.history(),
                    &d,
                    state.history_window,
                )?;
                render::trend_view(&trend)
            }
            Command::Export { path } => self.export(path, state, session)?,
            Command::Status => self.status(state, session),
            Command::History { limit } => history(session, limit.unwrap_or(DEFAULT_HISTORY_LIMIT)),
            Command::Help => help(),
            Command::Clear => return Ok(Reply::Clear),
            Command::Exit => return Ok(Reply::Exit),
            Command::Unknown { input } => format!(
                "{}\nType {} for available commands",
                format!("Unknown command: {}", input.trim()).red(),
                "/help".cyan()
            ),
        };
        Ok(Reply::Output(text))
    }

    /// Record the current selection and render its KPI row
    fn apply_filter(&self, state: &DashboardState, session: &mut SessionManager) -> String {
        let snapshot = state.snapshot();
        let caption = state.filter.to_string();

        self.telemetry.record(TelemetryEvent::FilterApplied {
            matched: snapshot.rows.len(),
            total: state.dataset.risk().len(),
            timestamp: Instant::now(),
        });
        session.record(ActionRecord::filter(caption.clone(), snapshot.rows.len()));

        let mut out = format!("{}\n{}", caption.dimmed(), render::kpi_row(&snapshot.kpis));
        if snapshot.is_empty() {
            out.push('\n');
            out.push_str(render::NO_ROWS);
        }
        out
    }

    fn options(&self, state: &DashboardState) -> String {
        let options = options_of(state);
        let weeks: Vec<String> = options.weeks.iter().map(|w| w.to_string()).collect();
        [
            list("States", &options.states),
            list("Districts", &options.districts),
            list("Weeks", &weeks),
        ]
        .join("\n")
    }

    fn export(
        &self,
        path: Option<PathBuf>,
        state: &DashboardState,
        session: &mut SessionManager,
    ) -> Result<String> {
        let path = path.unwrap_or_else(|| state.export_dir.join(DEFAULT_EXPORT_NAME));
        let snapshot = state.snapshot();
        let rows = export_risk(&snapshot.rows, &path)?;

        self.telemetry.record(TelemetryEvent::ExportWritten {
            path: path.display().to_string(),
            rows,
            timestamp: Instant::now(),
        });
        session.record(ActionRecord::export(path.clone(), state.filter.to_string(), rows));

        Ok(format!("{} Exported {} rows to {}", "✓".green(), rows, path.display()))
    }

    fn status(&self, state: &DashboardState, session: &SessionManager) -> String {
        let history = match state.dataset.history() {
            Some(rows) => format!("{} rows", rows.len()),
            None => "none".to_string(),
        };

        let mut lines = vec![
            "Session Status:".bold().cyan().to_string(),
            "=".repeat(60).cyan().to_string(),
            format!("  Data:             {}", state.dataset.origin().to_string().green()),
            format!("  Risk rows:        {}", state.dataset.risk().len().to_string().green()),
            format!("  History:          {}", history.green()),
            format!("  Selection:        {}", state.filter.to_string().green()),
            format!("  Actions:          {}", session.action_count().to_string().green()),
            format!("  Exports:          {}", session.export_count().to_string().green()),
            format!(
                "  Session Duration: {}",
                format_duration(session.session_duration()).green()
            ),
            String::new(),
            "Pipeline:".bold().cyan().to_string(),
        ];
        let pipeline = TelemetryDisplay::new(self.telemetry.clone(), Verbosity::Normal);
        lines.extend(pipeline.summary_lines().into_iter().map(|l| format!("  {}", l)));
        lines.join("\n")
    }
}

fn options_of(state: &DashboardState) -> FilterOptions {
    FilterOptions::from_records(state.dataset.risk(), &state.filter)
}

/// Titled, comma-separated list with (All) first
fn list(title: &str, values: &[String]) -> String {
    let mut items = vec![ALL.to_string()];
    items.extend(values.iter().cloned());
    format!("{} {}", format!("{}:", title).bold(), items.join(", "))
}

fn history(session: &SessionManager, limit: usize) -> String {
    let records = session.get_history(limit);
    if records.is_empty() {
        return "No filters or exports yet.".yellow().to_string();
    }

    let mut out = vec![
        format!("History (last {}):", records.len()).bold().cyan().to_string(),
        "=".repeat(60).cyan().to_string(),
    ];
    for (i, record) in records.iter().enumerate() {
        let icon = if record.is_export() { "↓".green() } else { "•".cyan() };
        out.push(format!(
            "  {}. {} {}",
            (records.len() - i).to_string().cyan(),
            icon,
            record.describe()
        ));
    }
    out.join("\n")
}

fn help() -> String {
    let commands = [
        ("/state <S|all>", "Select a state"),
        ("/district <D|all>", "Select a district in the selected state"),
        ("/week <YYYY-MM-DD|all>", "Select a forecast week"),
        ("/reset", "Clear all selections"),
        ("/options", "List the values each selector accepts"),
        ("/kpi", "Show the KPI row"),
        ("/bands", "Show risk-band distribution by week"),
        ("/table [n]", "Show the selected rows"),
        ("/trend <district>", "Show one district's history and forecast"),
        ("/export [path]", "Write the selected rows as CSV"),
        ("/status", "Show session status"),
        ("/history [n]", "Show recent filters and exports (default: 10)"),
        ("/clear, /cls", "Clear screen"),
        ("/exit, /quit, /q", "Exit"),
    ];

    let mut out = vec![
        "Available Commands:".bold().cyan().to_string(),
        "=".repeat(60).cyan().to_string(),
    ];
    for (cmd, desc) in commands {
        out.push(format!("  {:<26} {}", cmd.green(), desc));
    }
    out.push(String::new());
    out.push("Usage:".bold().to_string());
    out.push("  - Type a district name (no / prefix) to see its trend".to_string());
    out.push(format!("  - Use {} for command history", "UP/DOWN arrows".cyan()));
    out.push(format!("  - Press {} or {} to exit", "Ctrl-D".cyan(), "/exit".cyan()));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::risk::BandThresholds;
    use tempfile::TempDir;

    fn state(dir: &TempDir) -> DashboardState {
        DashboardState::new(Dataset::synthetic(7, &BandThresholds::default()))
            .with_export_dir(dir.path().to_path_buf())
    }

    fn run(
        handler: &mut CommandHandler,
        state: &mut DashboardState,
        session: &mut SessionManager,
        input: &str,
    ) -> String {
        match handler.execute(parse(input), state, session).unwrap() {
            Reply::Output(text) => text,
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn test_is_command() {
        assert!(is_command("/help"));
        assert!(is_command(" /help"));
        assert!(!is_command("Chennai"));
    }

    #[test]
    fn test_parse_selectors() {
        assert_eq!(
            parse("/state Tamil Nadu"),
            Command::State {
                value: Some("Tamil Nadu".to_string())
            }
        );
        assert_eq!(parse("/district all"), Command::District { value: Some("all".to_string()) });
        assert_eq!(parse("/week"), Command::Week { value: None });
        assert_eq!(parse("/STATE Delhi"), Command::State { value: Some("Delhi".to_string()) });
    }

    #[test]
    fn test_parse_views() {
        assert_eq!(parse("/table"), Command::Table { limit: None });
        assert_eq!(parse("/table 5"), Command::Table { limit: Some(5) });
        assert_eq!(parse("/history 3"), Command::History { limit: Some(3) });
        assert_eq!(
            parse("/export out/x.csv"),
            Command::Export {
                path: Some(PathBuf::from("out/x.csv"))
            }
        );
        assert_eq!(parse("/q"), Command::Exit);
        assert_eq!(parse("/cls"), Command::Clear);
    }

    #[test]
    fn test_bare_input_is_trend() {
        assert_eq!(parse("New Delhi"), Command::Trend { district: Some("New Delhi".to_string()) });
        assert!(matches!(parse("/nope"), Command::Unknown { .. }));
    }

    #[test]
    fn test_filter_records_history() {
        crate::render::set_color(false);
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let mut session = SessionManager::new();
        let mut handler = CommandHandler::new(TelemetryCollector::new());

        let out = run(&mut handler, &mut state, &mut session, "/state delhi");
        assert!(out.contains("State: Delhi"));
        assert!(out.contains("Red (count)"));
        assert_eq!(session.action_count(), 1);
        assert_eq!(handler.telemetry.get_stats().filters_applied, 1);
    }

    #[test]
    fn test_state_change_clears_foreign_district() {
        crate::render::set_color(false);
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let mut session = SessionManager::new();
        let mut handler = CommandHandler::new(TelemetryCollector::new());

        run(&mut handler, &mut state, &mut session, "/district Chennai");
        let out = run(&mut handler, &mut state, &mut session, "/state Delhi");
        assert!(out.contains("District reset to (All)"));
        assert!(state.filter.district.is_none());
    }

    #[test]
    fn test_unknown_state_is_error() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let mut session = SessionManager::new();
        let mut handler = CommandHandler::new(TelemetryCollector::new());

        assert!(handler.execute(parse("/state Atlantis"), &mut state, &mut session).is_err());
        assert_eq!(session.action_count(), 0);
    }

    #[test]
    fn test_export_default_path() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let mut session = SessionManager::new();
        let mut handler = CommandHandler::new(TelemetryCollector::new());

        run(&mut handler, &mut state, &mut session, "/state Delhi");
        let out = run(&mut handler, &mut state, &mut session, "/export");
        assert!(out.contains("Exported 4 rows"));

        let written = std::fs::read_to_string(dir.path().join(DEFAULT_EXPORT_NAME)).unwrap();
        assert_eq!(written.lines().count(), 5);
        assert_eq!(session.export_count(), 1);
    }

    #[test]
    fn test_trend_and_unknown_district() {
        crate::render::set_color(false);
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let mut session = SessionManager::new();
        let mut handler = CommandHandler::new(TelemetryCollector::new());

        let out = run(&mut handler, &mut state, &mut session, "chennai");
        assert!(out.contains("District trend: Chennai"));
        assert!(handler.execute(parse("Gotham"), &mut state, &mut session).is_err());
    }

    #[test]
    fn test_history_and_exit() {
        crate::render::set_color(false);
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let mut session = SessionManager::new();
        let mut handler = CommandHandler::new(TelemetryCollector::new());

        let out = run(&mut handler, &mut state, &mut session, "/history");
        assert!(out.contains("No filters or exports yet."));

        run(&mut handler, &mut state, &mut session, "/reset");
        let out = run(&mut handler, &mut state, &mut session, "/history");
        assert!(out.contains("State: (All)"));

        let exit = handler.execute(Command::Exit, &mut state, &mut session).unwrap();
        assert_eq!(exit, Reply::Exit);
        let clear = handler.execute(Command::Clear, &mut state, &mut session).unwrap();
        assert_eq!(clear, Reply::Clear);
    }

    #[test]
    fn test_options_lists_all_first() {
        crate::render::set_color(false);
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let mut session = SessionManager::new();
        let mut handler = CommandHandler::new(TelemetryCollector::new());

        let out = run(&mut handler, &mut state, &mut session, "/options");
        assert!(out.contains("States: (All), Delhi, Karnataka, Tamil Nadu"));
        assert!(out.contains("2025-11-16"));
    }
}
