//! Session manager for the interactive dashboard
//!
//! Records applied filters and exports so `/history` can replay what the
//! user looked at.

use serde::Serialize;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Maximum number of actions to keep in history
const MAX_HISTORY_SIZE: usize = 1000;

/// Kind of recorded action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActionKind {
    Filter,
    Export { path: PathBuf },
}

/// One applied filter or export
#[derive(Debug, Clone, Serialize)]
pub struct ActionRecord {
    pub kind: ActionKind,
    /// Filter caption at the time of the action
    pub selection: String,
    /// Rows matched (filters) or written (exports)
    pub rows: usize,
    pub timestamp: u64,
}

impl ActionRecord {
    pub fn filter(selection: impl Into<String>, rows: usize) -> Self {
        Self {
            kind: ActionKind::Filter,
            selection: selection.into(),
            rows,
            timestamp: unix_now(),
        }
    }

    pub fn export(path: PathBuf, selection: impl Into<String>, rows: usize) -> Self {
        Self {
            kind: ActionKind::Export { path },
            selection: selection.into(),
            rows,
            timestamp: unix_now(),
        }
    }

    pub fn is_export(&self) -> bool {
        matches!(self.kind, ActionKind::Export { .. })
    }

    /// One-line description for `/history`
    pub fn describe(&self) -> String {
        match &self.kind {
            ActionKind::Filter => format!("{} -> {} rows", self.selection, self.rows),
            ActionKind::Export { path } => {
                format!("exported {} rows to {} ({})", self.rows, path.display(), self.selection)
            }
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Session manager maintaining REPL state
pub struct SessionManager {
    /// Action history (FIFO queue, bounded)
    history: VecDeque<ActionRecord>,

    /// Session start time
    session_start: u64,

    /// Total actions recorded, including evicted ones
    action_count: usize,

    export_count: usize,
}

impl SessionManager {
    pub fn new() -> Self {
        SessionManager {
            history: VecDeque::with_capacity(64),
            session_start: unix_now(),
            action_count: 0,
            export_count: 0,
        }
    }

    /// Record an applied filter or export
    pub fn record(&mut self, record: ActionRecord) {
        if record.is_export() {
            self.export_count += 1;
        }

        if self.history.len() >= MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(record);
        self.action_count += 1;
    }

    /// Get action history (newest first)
    pub fn get_history(&self, limit: usize) -> Vec<&ActionRecord> {
        self.history.iter().rev().take(limit).collect()
    }

    /// Most recent export, if any
    pub fn last_export(&self) -> Option<&ActionRecord> {
        self.history.iter().rev().find(|r| r.is_export())
    }

    /// Clear recorded actions
    pub fn reset(&mut self) {
        self.history.clear();
        self.action_count = 0;
        self.export_count = 0;
        self.session_start = unix_now();
    }

    pub fn action_count(&self) -> usize {
        self.action_count
    }

    pub fn export_count(&self) -> usize {
        self.export_count
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Get session duration in seconds
    pub fn session_duration(&self) -> u64 {
        unix_now().saturating_sub(self.session_start)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable duration, e.g. `1h 2m 3s`
pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
