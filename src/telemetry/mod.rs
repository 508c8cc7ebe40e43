//! Telemetry system for OutbreakCast
//!
//! Collects pipeline events (tables loaded, bands computed, filters applied,
//! exports written) and prints a session summary.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    // Ingestion events
    TableLoaded {
        table: String,
        rows: usize,
        skipped: usize,
        duration_ms: u64,
        timestamp: Instant,
    },
    HistoryIgnored {
        reason: String,
        timestamp: Instant,
    },
    SyntheticGenerated {
        seed: u64,
        rows: usize,
        timestamp: Instant,
    },
    BandsComputed {
        rows: usize,
        timestamp: Instant,
    },

    // Dashboard events
    FilterApplied {
        matched: usize,
        total: usize,
        timestamp: Instant,
    },
    ExportWritten {
        path: String,
        rows: usize,
        timestamp: Instant,
    },
}

/// Events listed in the very verbose summary
const RECENT_EVENTS: usize = 5;

impl TelemetryEvent {
    /// One-line description for the summary
    pub fn describe(&self) -> String {
        match self {
            TelemetryEvent::TableLoaded {
                table,
                rows,
                skipped,
                duration_ms,
                ..
            } => format!(
                "loaded {}: {} rows, {} skipped in {}ms",
                table, rows, skipped, duration_ms
            ),
            TelemetryEvent::HistoryIgnored { reason, .. } => format!("history ignored: {}", reason),
            TelemetryEvent::SyntheticGenerated { seed, rows, .. } => {
                format!("synthetic demo: {} rows (seed {})", rows, seed)
            }
            TelemetryEvent::BandsComputed { rows, .. } => {
                format!("bands computed for {} rows", rows)
            }
            TelemetryEvent::FilterApplied { matched, total, .. } => {
                format!("filter kept {} of {} rows", matched, total)
            }
            TelemetryEvent::ExportWritten { path, rows, .. } => {
                format!("exported {} rows to {}", rows, path)
            }
        }
    }
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub tables_loaded: usize,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub load_time_ms: u64,
    pub history_ignored: usize,
    pub synthetic_generated: usize,
    pub bands_computed: usize,
    pub filters_applied: usize,
    pub exports_written: usize,
    pub rows_exported: usize,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // a panic while holding the lock leaves plain counters behind; keep going
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TelemetryCollector {
    /// Empty collector; the clock starts now
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = lock(&self.stats);
            match &event {
                TelemetryEvent::TableLoaded {
                    rows,
                    skipped,
                    duration_ms,
                    ..
                } => {
                    stats.tables_loaded += 1;
                    stats.rows_loaded += rows;
                    stats.rows_skipped += skipped;
                    stats.load_time_ms += duration_ms;
                }
                TelemetryEvent::HistoryIgnored { .. } => {
                    stats.history_ignored += 1;
                }
                TelemetryEvent::SyntheticGenerated { rows, .. } => {
                    stats.synthetic_generated += 1;
                    stats.rows_loaded += rows;
                }
                TelemetryEvent::BandsComputed { .. } => {
                    stats.bands_computed += 1;
                }
                TelemetryEvent::FilterApplied { .. } => {
                    stats.filters_applied += 1;
                }
                TelemetryEvent::ExportWritten { rows, .. } => {
                    stats.exports_written += 1;
                    stats.rows_exported += rows;
                }
            }
        }

        lock(&self.events).push(event);
    }

    /// Copy of the running counters
    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    /// Time since the collector was created
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// The last `n` events, oldest first
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        let events = lock(&self.events);
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Share of loaded rows that were kept
    pub fn row_retention(&self) -> f64 {
        let stats = lock(&self.stats);
        let total = stats.rows_loaded + stats.rows_skipped;
        if total == 0 {
            1.0
        } else {
            stats.rows_loaded as f64 / total as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders collector counters for the terminal
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: crate::cli::Verbosity,
}

impl TelemetryDisplay {
    /// Create a new display
    pub fn new(collector: TelemetryCollector, verbosity: crate::cli::Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Summary lines, without printing them
    pub fn summary_lines(&self) -> Vec<String> {
        let stats = self.collector.get_stats();
        let mut lines = vec![
            format!("Duration:          {:?}", self.collector.elapsed()),
            format!("Tables loaded:     {}", stats.tables_loaded),
            format!("Rows loaded:       {}", stats.rows_loaded),
            format!(
                "Rows skipped:      {} ({:.1}% kept)",
                stats.rows_skipped,
                self.collector.row_retention() * 100.0
            ),
            format!("Load time:         {}ms", stats.load_time_ms),
            format!("Bands computed:    {}", stats.bands_computed),
            format!("Filters applied:   {}", stats.filters_applied),
            format!(
                "Exports written:   {} ({} rows)",
                stats.exports_written, stats.rows_exported
            ),
        ];

        if self.verbosity == crate::cli::Verbosity::VeryVerbose {
            lines.push("Recent events:".to_string());
            lines.extend(
                self.collector
                    .recent_events(RECENT_EVENTS)
                    .iter()
                    .map(|e| format!("  {}", e.describe())),
            );
        }
        lines
    }

    /// Print the pipeline summary to stdout
    pub fn display_summary(&self) {
        println!("\nSession Summary");
        println!("─────────────────────────────────────");
        for line in self.summary_lines() {
            println!("{}", line);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(rows: usize, skipped: usize) -> TelemetryEvent {
        TelemetryEvent::TableLoaded {
            table: "forecasts.csv".to_string(),
            rows,
            skipped,
            duration_ms: 4,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn test_collector_creation() {
        let collector = TelemetryCollector::new();
        assert_eq!(collector.event_count(), 0);
        assert_eq!(collector.get_stats().tables_loaded, 0);
    }

    #[test]
    fn test_record_table_loaded() {
        let collector = TelemetryCollector::new();
        collector.record(loaded(10, 2));
        collector.record(loaded(5, 0));

        let stats = collector.get_stats();
        assert_eq!(stats.tables_loaded, 2);
        assert_eq!(stats.rows_loaded, 15);
        assert_eq!(stats.rows_skipped, 2);
        assert_eq!(stats.load_time_ms, 8);
    }

    #[test]
    fn test_row_retention() {
        let collector = TelemetryCollector::new();
        assert_eq!(collector.row_retention(), 1.0);
        collector.record(loaded(3, 1));
        assert!((collector.row_retention() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_export_counts() {
        let collector = TelemetryCollector::new();
        collector.record(TelemetryEvent::ExportWritten {
            path: "out.csv".to_string(),
            rows: 7,
            timestamp: Instant::now(),
        });
        let stats = collector.get_stats();
        assert_eq!(stats.exports_written, 1);
        assert_eq!(stats.rows_exported, 7);
    }

    #[test]
    fn test_recent_events() {
        let collector = TelemetryCollector::new();
        for i in 0..10 {
            collector.record(TelemetryEvent::FilterApplied {
                matched: i,
                total: 10,
                timestamp: Instant::now(),
            });
        }
        let recent = collector.recent_events(3);
        assert_eq!(recent.len(), 3);
        assert!(matches!(recent[2], TelemetryEvent::FilterApplied { matched: 9, .. }));
    }

    #[test]
    fn test_summary_lines_mention_exports() {
        let collector = TelemetryCollector::new();
        let display = TelemetryDisplay::new(collector, crate::cli::Verbosity::Normal);
        assert!(display
            .summary_lines()
            .iter()
            .any(|l| l.starts_with("Exports written")));
    }

    #[test]
    fn test_very_verbose_lists_recent_events() {
        let collector = TelemetryCollector::new();
        collector.record(TelemetryEvent::BandsComputed {
            rows: 12,
            timestamp: Instant::now(),
        });

        let normal = TelemetryDisplay::new(collector.clone(), crate::cli::Verbosity::Normal);
        assert!(!normal.summary_lines().iter().any(|l| l == "Recent events:"));

        let detailed = TelemetryDisplay::new(collector, crate::cli::Verbosity::VeryVerbose);
        let lines = detailed.summary_lines();
        assert_eq!(lines.last().map(String::as_str), Some("  bands computed for 12 rows"));
    }
}
