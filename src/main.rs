//! OutbreakCast - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use outbreakcast::{
    cli::{Args, Commands, Config, SelectionArgs},
    dashboard::{district_trend, Filter, Snapshot},
    data::{
        export_forecasts, export_risk, Dataset, DatasetInputs, DefaultFetcher, LoadOptions,
        DEFAULT_EXPORT_NAME,
    },
    doctor::Doctor,
    logging::init_tracing,
    render,
    repl::{DashboardState, DisplayManager, ReplSession},
    telemetry::{TelemetryCollector, TelemetryDisplay, TelemetryEvent},
};
use std::path::{Path, PathBuf};
use std::time::Instant;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // doctor reports a broken config file instead of refusing to start
    let (config, config_error) = match Config::load(args.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) if matches!(args.command, Some(Commands::Doctor)) => {
            (Config::default(), Some(e.to_string()))
        }
        Err(e) => return Err(e).context("Could not load configuration"),
    };

    if let Err(msg) = args.validate(&config) {
        eprintln!("{} {}", "Error:".red().bold(), msg);
        std::process::exit(2);
    }

    let verbosity = args.verbosity(&config);
    render::set_color(args.color_enabled(&config));
    init_tracing(verbosity);

    let telemetry = TelemetryCollector::new();

    match &args.command {
        Some(Commands::Start) => run_repl(&args, &config, &telemetry).await?,
        Some(Commands::Summary {
            selection,
            limit,
            json,
        }) => run_summary(&args, &config, &telemetry, selection, *limit, *json).await?,
        Some(Commands::Export { selection, output }) => {
            run_export(&args, &config, &telemetry, selection, output.as_deref()).await?
        }
        Some(Commands::Trend {
            district,
            window,
            json,
        }) => run_trend(&args, &config, &telemetry, district, *window, *json).await?,
        Some(Commands::Bands { output }) => run_bands(&args, &config, &telemetry, output).await?,
        Some(Commands::Demo { out_dir }) => run_demo(&args, &config, out_dir)?,
        Some(Commands::Doctor) => run_doctor(&args, config, config_error).await?,
        Some(Commands::Config) => show_config(&args, &config)?,
        None => print_usage(),
    }

    if verbosity.show_events() && telemetry.event_count() > 0 {
        TelemetryDisplay::new(telemetry, verbosity).display_summary();
    }

    Ok(())
}

fn print_usage() {
    println!("OutbreakCast v{} - Fever Risk Dashboard", VERSION);
    println!("\nUsage:");
    println!("  outbreakcast start                   Interactive dashboard");
    println!("  outbreakcast summary [--state S]     KPIs, band distribution and rows");
    println!("  outbreakcast export [-o PATH]        Write the selected rows as CSV");
    println!("  outbreakcast trend --district D      One district's history and forecast");
    println!("  outbreakcast bands -o PATH           Derive risk bands from --forecasts");
    println!("  outbreakcast demo --out-dir DIR      Write the synthetic demo data");
    println!("  outbreakcast doctor                  Validate inputs and environment");
    println!("  outbreakcast config                  Show configuration");
    println!("\nExample:");
    println!("  outbreakcast --forecasts out/forecasts.csv --risk-bands out/risk_bands.csv \\");
    println!("      summary --state Delhi");
    println!();
}

/// Resolve the inputs into a dataset, showing a spinner for real loads
async fn load_with(
    inputs: &DatasetInputs,
    args: &Args,
    config: &Config,
    telemetry: &TelemetryCollector,
) -> Result<Dataset> {
    let options = LoadOptions {
        thresholds: config.thresholds()?,
        seed: args.seed,
    };
    let fetcher = DefaultFetcher::new(config.fetch_timeout());

    let mut display = DisplayManager::new();
    let has_files = inputs.forecasts.is_some() || inputs.risk_bands.is_some();
    if has_files && args.verbosity(config).show_progress() {
        display.start_spinner("Loading forecast tables...");
    }

    let result = Dataset::load(inputs, &options, &fetcher, telemetry).await;
    display.finish_current();
    result.context("Could not load input data")
}

async fn load_dataset(
    args: &Args,
    config: &Config,
    telemetry: &TelemetryCollector,
) -> Result<Dataset> {
    load_with(&args.inputs(config), args, config, telemetry).await
}

fn build_filter(dataset: &Dataset, selection: &SelectionArgs) -> Result<Filter> {
    Ok(Filter::build(
        dataset.risk(),
        selection.state.as_deref(),
        selection.district.as_deref(),
        selection.week.as_deref(),
    )?)
}

async fn run_repl(args: &Args, config: &Config, telemetry: &TelemetryCollector) -> Result<()> {
    let dataset = load_dataset(args, config, telemetry).await?;
    let state = DashboardState::new(dataset)
        .with_history_window(config.trend.history_window)
        .with_table_limit(config.display.table_limit)
        .with_export_dir(config.export_dir());

    let mut repl_session =
        ReplSession::with_history(config.repl_history_path(), state, telemetry.clone())?;
    repl_session.show_welcome(VERSION);
    repl_session.run()
}

async fn run_summary(
    args: &Args,
    config: &Config,
    telemetry: &TelemetryCollector,
    selection: &SelectionArgs,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let dataset = load_dataset(args, config, telemetry).await?;
    let filter = build_filter(&dataset, selection)?;
    let snapshot = Snapshot::build(dataset.risk(), &filter);
    telemetry.record(TelemetryEvent::FilterApplied {
        matched: snapshot.rows.len(),
        total: dataset.risk().len(),
        timestamp: Instant::now(),
    });

    if json {
        println!("{}", render::to_json(&snapshot)?);
    } else {
        if dataset.is_synthetic() {
            println!("{}", format!("Data: {}", dataset.origin()).dimmed());
        }
        let limit = limit.unwrap_or(config.display.table_limit);
        println!("{}", render::dashboard(&snapshot, Some(limit)));
    }
    Ok(())
}

async fn run_export(
    args: &Args,
    config: &Config,
    telemetry: &TelemetryCollector,
    selection: &SelectionArgs,
    output: Option<&Path>,
) -> Result<()> {
    let dataset = load_dataset(args, config, telemetry).await?;
    let filter = build_filter(&dataset, selection)?;
    let snapshot = Snapshot::build(dataset.risk(), &filter);

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.export_dir().join(DEFAULT_EXPORT_NAME));
    let rows = export_risk(&snapshot.rows, &path)
        .with_context(|| format!("Could not write {}", path.display()))?;
    telemetry.record(TelemetryEvent::ExportWritten {
        path: path.display().to_string(),
        rows,
        timestamp: Instant::now(),
    });

    println!("{} Exported {} rows to {}", "✓".green(), rows, path.display());
    Ok(())
}

async fn run_trend(
    args: &Args,
    config: &Config,
    telemetry: &TelemetryCollector,
    district: &str,
    window: Option<usize>,
    json: bool,
) -> Result<()> {
    let dataset = load_dataset(args, config, telemetry).await?;
    let window = window.unwrap_or(config.trend.history_window);
    let trend = district_trend(dataset.risk(), dataset.history(), district, window)?;

    if json {
        println!("{}", render::to_json(&trend)?);
    } else {
        println!("{}", render::trend_view(&trend));
    }
    Ok(())
}

async fn run_bands(
    args: &Args,
    config: &Config,
    telemetry: &TelemetryCollector,
    output: &Path,
) -> Result<()> {
    // only the forecasts matter; bands are always recomputed
    let inputs = DatasetInputs {
        forecasts: args.inputs(config).forecasts,
        ..Default::default()
    };
    let dataset = load_with(&inputs, args, config, telemetry).await?;

    let rows = export_risk(dataset.risk(), output)
        .with_context(|| format!("Could not write {}", output.display()))?;
    telemetry.record(TelemetryEvent::ExportWritten {
        path: output.display().to_string(),
        rows,
        timestamp: Instant::now(),
    });

    println!("{} Wrote {} banded rows to {}", "✓".green(), rows, output.display());
    Ok(())
}

fn run_demo(args: &Args, config: &Config, out_dir: &Path) -> Result<()> {
    let seed = args.seed.unwrap_or_else(rand::random);
    let dataset = Dataset::synthetic(seed, &config.thresholds()?);

    let forecasts_path = out_dir.join("forecasts.csv");
    let risk_path = out_dir.join("risk_bands.csv");
    export_forecasts(dataset.forecasts(), &forecasts_path)
        .with_context(|| format!("Could not write {}", forecasts_path.display()))?;
    export_risk(dataset.risk(), &risk_path)
        .with_context(|| format!("Could not write {}", risk_path.display()))?;

    println!("{} Synthetic demo (seed {})", "✓".green(), seed);
    println!("  {}", forecasts_path.display());
    println!("  {}", risk_path.display());
    Ok(())
}

async fn run_doctor(args: &Args, config: Config, config_error: Option<String>) -> Result<()> {
    let fetcher = DefaultFetcher::new(config.fetch_timeout());
    let mut doctor = Doctor::new(args.inputs(&config), config);
    if let Some(err) = config_error {
        doctor = doctor.with_config_error(err);
    }

    let checks = doctor.run_diagnostics(&fetcher).await;
    Doctor::display_results(&checks);

    if !Doctor::overall_status(&checks) {
        std::process::exit(1);
    }
    Ok(())
}

fn show_config(args: &Args, config: &Config) -> Result<()> {
    let path = args
        .config
        .clone()
        .or_else(Config::default_path)
        .unwrap_or_else(|| PathBuf::from("(none)"));
    let source = if path.exists() { "" } else { " (not found, using defaults)" };

    println!("\n{}", "OutbreakCast Configuration".bold().cyan());
    println!("{}\n", "=".repeat(50).cyan());
    println!("File:      {}{}", path.display(), source);
    println!("Verbosity: {}", args.verbosity(config).as_str());
    println!();

    let inputs = args.inputs(config);
    println!("Effective inputs:");
    for (name, src) in [
        ("forecasts", &inputs.forecasts),
        ("risk_bands", &inputs.risk_bands),
        ("history", &inputs.history),
    ] {
        let shown = src
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<11} {}", name, shown);
    }
    println!();

    let rendered = toml::to_string_pretty(config).context("Could not render configuration")?;
    println!("{}", rendered);
    Ok(())
}
