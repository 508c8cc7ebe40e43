//! Display manager for the REPL terminal UI
//!
//! Banner, status messages, screen clearing and the loading spinner.

use colored::*;
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::time::Duration;

/// Display manager for REPL UI
pub struct DisplayManager {
    current_spinner: Option<ProgressBar>,
    tick_interval: Duration,
}

impl DisplayManager {
    pub fn new() -> Self {
        DisplayManager {
            current_spinner: None,
            tick_interval: Duration::from_millis(100),
        }
    }

    /// Show welcome banner
    pub fn show_banner(&self, version: &str, origin: &str, rows: usize) {
        let width = 64;
        let rule = "=".repeat(width).cyan().to_string();
        let title = format!("  OutbreakCast {} - Fever Risk Dashboard", version);
        let info = format!("  Data: {} | Rows: {}", origin, rows);

        println!("\n{}", rule);
        println!("{}", title.bold().cyan());
        println!("{}", info.dimmed());
        println!("{}\n", rule);
        println!(
            "Type a district to see its trend (or {} for commands, {} to quit)\n",
            "/help".green(),
            "/exit".green()
        );
    }

    /// Start a spinner with `message`; replaces any running one
    pub fn start_spinner(&mut self, message: &str) -> ProgressBar {
        self.finish_current();

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(self.tick_interval);

        self.current_spinner = Some(pb.clone());
        pb
    }

    pub fn finish_current(&mut self) {
        if let Some(pb) = self.current_spinner.take() {
            pb.finish_and_clear();
        }
    }

    pub fn show_output(&self, text: &str) {
        println!("{}\n", text);
    }

    pub fn show_error(&self, error: &str) {
        println!("{} {}", "Error:".red().bold(), error.red());
    }

    pub fn show_info(&self, info: &str) {
        println!("{} {}", "Info:".cyan(), info);
    }

    pub fn clear_screen(&self) -> io::Result<()> {
        execute!(io::stdout(), Clear(ClearType::All), cursor::MoveTo(0, 0))
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_lifecycle() {
        let mut manager = DisplayManager::new();
        let _pb = manager.start_spinner("Loading forecasts");
        assert!(manager.current_spinner.is_some());

        manager.finish_current();
        assert!(manager.current_spinner.is_none());
    }

    #[test]
    fn test_spinner_replaced() {
        let mut manager = DisplayManager::new();
        let first = manager.start_spinner("one");
        let _second = manager.start_spinner("two");
        assert!(first.is_finished());
        manager.finish_current();
        assert!(manager.current_spinner.is_none());
    }

    #[test]
    fn test_message_display() {
        let manager = DisplayManager::new();
        manager.show_error("Test error");
        manager.show_info("Test info");
        manager.show_output("Test output");
    }
}
