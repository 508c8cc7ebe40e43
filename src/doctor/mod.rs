//! Doctor command for input and environment diagnostics
//!
//! Every check yields PASS, WARN or FAIL; any FAIL makes `outbreakcast
//! doctor` exit non-zero.

use crate::cli::Config;
use crate::data::{
    load_forecasts, load_history, load_risk_bands, DataSource, DatasetInputs, SourceFetcher,
};
use crate::risk::{band_disagreements, BandThresholds};
use crate::types::RiskRecord;
use colored::*;
use std::path::{Path, PathBuf};

const MB: u64 = 1024 * 1024;

/// Below this the export directory check fails
const MIN_FREE_MB: u64 = 100;

/// Below this the export directory check warns
const LOW_FREE_MB: u64 = 1024;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn pass(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Pass,
        }
    }

    fn warn(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Warn(message.into()),
        }
    }

    fn fail(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Fail(message.into()),
        }
    }
}

/// Doctor diagnostics system
pub struct Doctor {
    inputs: DatasetInputs,
    config: Config,
    config_error: Option<String>,
    export_dir: PathBuf,
}

impl Doctor {
    pub fn new(inputs: DatasetInputs, config: Config) -> Self {
        let export_dir = config.export_dir();
        Self {
            inputs,
            config,
            config_error: None,
            export_dir,
        }
    }

    /// Report a configuration file that failed to load
    pub fn with_config_error(mut self, error: impl Into<String>) -> Self {
        self.config_error = Some(error.into());
        self
    }

    pub fn with_export_dir(mut self, dir: PathBuf) -> Self {
        self.export_dir = dir;
        self
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self, fetcher: &dyn SourceFetcher) -> Vec<HealthCheck> {
        let mut checks = Vec::new();

        checks.push(self.check_forecasts(fetcher).await);
        let (risk_check, risk_rows) = self.check_risk_bands(fetcher).await;
        checks.push(risk_check);
        checks.push(self.check_band_consistency(risk_rows.as_deref()));
        checks.push(self.check_history(fetcher).await);
        checks.push(self.check_export_dir());
        checks.push(self.check_disk_space());
        checks.push(self.check_config());

        checks
    }

    fn thresholds(&self) -> BandThresholds {
        self.config.thresholds().unwrap_or_default()
    }

    async fn check_forecasts(&self, fetcher: &dyn SourceFetcher) -> HealthCheck {
        const NAME: &str = "Forecasts";
        let Some(src) = &self.inputs.forecasts else {
            return if self.inputs.risk_bands.is_some() {
                HealthCheck::pass(NAME)
            } else {
                HealthCheck::warn(
                    NAME,
                    "no inputs given; the dashboard will show synthetic demo data",
                )
            };
        };

        match fetch(fetcher, src).await {
            Ok(bytes) => match load_forecasts(&bytes[..], &src.label()) {
                Ok(report) if report.is_empty() => {
                    HealthCheck::fail(NAME, format!("{} has no usable rows", src))
                }
                Ok(report) if report.skipped > 0 => HealthCheck::warn(
                    NAME,
                    format!(
                        "{} rows, {} skipped for missing fields",
                        report.len(),
                        report.skipped
                    ),
                ),
                Ok(_) => HealthCheck::pass(NAME),
                Err(e) => HealthCheck::fail(NAME, e.to_string()),
            },
            Err(e) => HealthCheck::fail(NAME, e),
        }
    }

    async fn check_risk_bands(
        &self,
        fetcher: &dyn SourceFetcher,
    ) -> (HealthCheck, Option<Vec<RiskRecord>>) {
        const NAME: &str = "Risk bands";
        let Some(src) = &self.inputs.risk_bands else {
            return (HealthCheck::pass(NAME), None);
        };

        match fetch(fetcher, src).await {
            Ok(bytes) => match load_risk_bands(&bytes[..], &src.label()) {
                Ok(report) if report.is_empty() => {
                    (HealthCheck::fail(NAME, format!("{} has no usable rows", src)), None)
                }
                Ok(report) => {
                    let check = if report.skipped > 0 {
                        HealthCheck::warn(
                            NAME,
                            format!(
                                "{} rows, {} skipped for missing fields",
                                report.len(),
                                report.skipped
                            ),
                        )
                    } else {
                        HealthCheck::pass(NAME)
                    };
                    (check, Some(report.rows))
                }
                Err(e) => (HealthCheck::fail(NAME, e.to_string()), None),
            },
            Err(e) => (HealthCheck::fail(NAME, e), None),
        }
    }

    /// Supplied bands against bands recomputed with the configured thresholds
    fn check_band_consistency(&self, risk: Option<&[RiskRecord]>) -> HealthCheck {
        const NAME: &str = "Band consistency";
        let Some(risk) = risk else {
            return HealthCheck::pass(NAME);
        };

        let differing = band_disagreements(risk, &self.thresholds());
        match differing.first() {
            None => HealthCheck::pass(NAME),
            Some((row, expected)) => HealthCheck::warn(
                NAME,
                format!(
                    "{} of {} rows differ from recomputed bands (e.g. {} {}: file {}, computed {})",
                    differing.len(),
                    risk.len(),
                    row.district,
                    row.week_start,
                    row.risk_band,
                    expected
                ),
            ),
        }
    }

    async fn check_history(&self, fetcher: &dyn SourceFetcher) -> HealthCheck {
        const NAME: &str = "History";
        let Some(src) = &self.inputs.history else {
            return HealthCheck::pass(NAME);
        };

        match fetch(fetcher, src).await {
            Ok(bytes) => match load_history(&bytes[..], &src.label()) {
                Ok(Some(report)) if !report.is_empty() => HealthCheck::pass(NAME),
                Ok(Some(_)) => {
                    HealthCheck::warn(NAME, "no usable rows; trends will show forecasts only")
                }
                Ok(None) => HealthCheck::warn(
                    NAME,
                    "neither 'dengue_cases' nor 'cases' column; trends will show forecasts only",
                ),
                Err(e) => {
                    HealthCheck::warn(NAME, format!("{}; trends will show forecasts only", e))
                }
            },
            Err(e) => HealthCheck::warn(NAME, format!("{}; trends will show forecasts only", e)),
        }
    }

    /// Write a probe file into the export directory
    fn check_export_dir(&self) -> HealthCheck {
        const NAME: &str = "Export directory";
        if !self.export_dir.exists() {
            return HealthCheck::warn(
                NAME,
                format!(
                    "{} does not exist; it will be created on export",
                    self.export_dir.display()
                ),
            );
        }

        let probe = self.export_dir.join(".outbreakcast_write_test");
        match std::fs::write(&probe, "test") {
            Ok(_) => {
                let _ = std::fs::remove_file(&probe);
                HealthCheck::pass(NAME)
            }
            Err(e) => HealthCheck::fail(
                NAME,
                format!("cannot write to {}: {}", self.export_dir.display(), e),
            ),
        }
    }

    fn check_disk_space(&self) -> HealthCheck {
        use sysinfo::Disks;
        const NAME: &str = "Disk space";

        let target = absolute(&self.export_dir);
        let disks = Disks::new_with_refreshed_list();

        // deepest mount point containing the export directory
        let disk = disks
            .iter()
            .filter(|d| target.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().components().count());

        match disk {
            Some(d) => {
                let available_mb = d.available_space() / MB;
                if available_mb < MIN_FREE_MB {
                    HealthCheck::fail(NAME, format!("only {} MB available", available_mb))
                } else if available_mb < LOW_FREE_MB {
                    HealthCheck::warn(
                        NAME,
                        format!("low disk space ({} MB available)", available_mb),
                    )
                } else {
                    HealthCheck::pass(NAME)
                }
            }
            None => HealthCheck::warn(NAME, "could not determine disk space"),
        }
    }

    fn check_config(&self) -> HealthCheck {
        const NAME: &str = "Configuration";
        if let Some(err) = &self.config_error {
            return HealthCheck::fail(NAME, err.clone());
        }
        match self.config.validate() {
            Ok(()) => HealthCheck::pass(NAME),
            Err(e) => HealthCheck::fail(NAME, e.to_string()),
        }
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("{}", Self::format_results(checks));
    }

    /// PASS / WARN / FAIL table
    pub fn format_results(checks: &[HealthCheck]) -> String {
        let mut out = vec![
            String::new(),
            "OutbreakCast Diagnostics".bold().cyan().to_string(),
            String::new(),
            format!("{:<20} {}", "Check", "Status"),
            "=".repeat(50),
        ];

        for check in checks {
            let status = match &check.status {
                HealthStatus::Pass => "PASS".green().bold().to_string(),
                HealthStatus::Warn(msg) => format!("{} {}", "WARN".yellow().bold(), msg),
                HealthStatus::Fail(msg) => format!("{} {}", "FAIL".red().bold(), msg),
            };
            out.push(format!("{:<20} {}", check.name, status));
        }
        out.push(String::new());
        out.join("\n")
    }

    /// Get overall health status
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

async fn fetch(fetcher: &dyn SourceFetcher, src: &DataSource) -> Result<bytes::Bytes, String> {
    fetcher.fetch(src).await.map_err(|e| e.to_string())
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DefaultFetcher;
    use tempfile::TempDir;

    const FORECASTS: &str = "week_start,state,district,yhat\n\
        2025-11-16,Delhi,New Delhi,10\n\
        2025-11-23,Delhi,New Delhi,20\n\
        2025-11-30,Delhi,New Delhi,30\n\
        2025-12-07,Delhi,New Delhi,40\n";

    fn write(dir: &TempDir, name: &str, contents: &str) -> Option<DataSource> {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        Some(DataSource::File(path))
    }

    fn doctor(dir: &TempDir, inputs: DatasetInputs) -> Doctor {
        Doctor::new(inputs, Config::default()).with_export_dir(dir.path().to_path_buf())
    }

    fn status_of<'a>(checks: &'a [HealthCheck], name: &str) -> &'a HealthStatus {
        &checks.iter().find(|c| c.name == name).unwrap().status
    }

    #[test]
    fn test_overall_status() {
        let checks = vec![HealthCheck::pass("a"), HealthCheck::warn("b", "warning")];
        assert!(Doctor::overall_status(&checks));

        let checks = vec![HealthCheck::pass("a"), HealthCheck::fail("b", "error")];
        assert!(!Doctor::overall_status(&checks));
    }

    #[tokio::test]
    async fn test_valid_inputs_pass() {
        let dir = TempDir::new().unwrap();
        let risk = "week_start,state,district,yhat,risk_band\n\
            2025-11-16,Delhi,New Delhi,10,Green\n\
            2025-11-23,Delhi,New Delhi,20,Green\n\
            2025-11-30,Delhi,New Delhi,30,Green\n\
            2025-12-07,Delhi,New Delhi,40,Red\n";
        let inputs = DatasetInputs {
            forecasts: write(&dir, "forecasts.csv", FORECASTS),
            risk_bands: write(&dir, "risk_bands.csv", risk),
            history: None,
        };

        let checks = doctor(&dir, inputs).run_diagnostics(&DefaultFetcher::default()).await;
        assert_eq!(status_of(&checks, "Forecasts"), &HealthStatus::Pass);
        assert_eq!(status_of(&checks, "Risk bands"), &HealthStatus::Pass);
        assert_eq!(status_of(&checks, "Band consistency"), &HealthStatus::Pass);
        assert_eq!(status_of(&checks, "Export directory"), &HealthStatus::Pass);
        assert_eq!(status_of(&checks, "Configuration"), &HealthStatus::Pass);
    }

    #[tokio::test]
    async fn test_band_disagreement_warns() {
        let dir = TempDir::new().unwrap();
        let risk = "week_start,state,district,yhat,risk_band\n\
            2025-11-16,Delhi,New Delhi,10,Red\n\
            2025-11-23,Delhi,New Delhi,20,Green\n\
            2025-11-30,Delhi,New Delhi,30,Green\n\
            2025-12-07,Delhi,New Delhi,40,Red\n";
        let inputs = DatasetInputs {
            risk_bands: write(&dir, "risk_bands.csv", risk),
            ..Default::default()
        };

        let checks = doctor(&dir, inputs).run_diagnostics(&DefaultFetcher::default()).await;
        match status_of(&checks, "Band consistency") {
            HealthStatus::Warn(msg) => assert!(msg.starts_with("1 of 4 rows")),
            other => panic!("expected warning, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_column_fails() {
        let dir = TempDir::new().unwrap();
        let inputs = DatasetInputs {
            forecasts: write(&dir, "forecasts.csv", "week_start,state,yhat\n2025-11-16,Delhi,1\n"),
            ..Default::default()
        };

        let checks = doctor(&dir, inputs).run_diagnostics(&DefaultFetcher::default()).await;
        assert!(matches!(
            status_of(&checks, "Forecasts"),
            HealthStatus::Fail(msg) if msg.contains("district")
        ));
        assert!(!Doctor::overall_status(&checks));
    }

    #[tokio::test]
    async fn test_unreadable_history_only_warns() {
        let dir = TempDir::new().unwrap();
        let inputs = DatasetInputs {
            forecasts: write(&dir, "forecasts.csv", FORECASTS),
            history: Some(DataSource::File(dir.path().join("missing.csv"))),
            ..Default::default()
        };

        let checks = doctor(&dir, inputs).run_diagnostics(&DefaultFetcher::default()).await;
        assert!(matches!(status_of(&checks, "History"), HealthStatus::Warn(_)));
        assert!(Doctor::overall_status(&checks));
    }

    #[tokio::test]
    async fn test_no_inputs_warns_about_demo() {
        let dir = TempDir::new().unwrap();
        let checks = doctor(&dir, DatasetInputs::default())
            .run_diagnostics(&DefaultFetcher::default())
            .await;
        assert!(matches!(
            status_of(&checks, "Forecasts"),
            HealthStatus::Warn(msg) if msg.contains("synthetic")
        ));
    }

    #[tokio::test]
    async fn test_config_error_fails() {
        let dir = TempDir::new().unwrap();
        let checks = doctor(&dir, DatasetInputs::default())
            .with_config_error("Failed to parse config: expected `=`")
            .run_diagnostics(&DefaultFetcher::default())
            .await;
        assert!(matches!(status_of(&checks, "Configuration"), HealthStatus::Fail(_)));
    }

    #[test]
    fn test_format_results() {
        colored::control::set_override(false);
        let out = Doctor::format_results(&[
            HealthCheck::pass("Forecasts"),
            HealthCheck::warn("History", "not found"),
        ]);
        assert!(out.contains("PASS"));
        assert!(out.contains("WARN not found"));
    }
}
