//! DockerSec - Dockerfile security analysis with streamed remediation
//!
//! A CLI tool that sends a Dockerfile to a risk detection service, then
//! streams remediation advice for the detected risks and renders it as it
//! arrives.
//!
//! Exit codes:
//!   0 - Success (remediation stream completed)
//!   1 - Runtime error (empty input, service failure, config error, etc.)
//!   2 - Remediation stream ended before it was marked complete

mod analysis;
mod analyzer;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod sink;
mod stream;

use analyzer::{Analyzer, SessionOutcome};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use models::{FindingsSummary, ReportMetadata, SessionReport};
use sink::{HtmlPanel, PresentationSink, TerminalSink};
use std::io::Read;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is needed first: it may turn on verbose logging
    let (config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(config.log_level(args.quiet));

    info!("DockerSec v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_source);
    debug!("Arguments: {:?}", args);

    match run_analysis(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .dockersec.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to point at your detection and remediation services.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one analysis session. Returns the exit code.
async fn run_analysis(args: Args, config: Config) -> Result<i32> {
    let dockerfile = read_dockerfile(&args).await?;
    info!("Read {} bytes from {}", dockerfile.len(), args.source_name());

    let analyzer = Analyzer::new(config.analyzer_config())?;

    let mut sinks: Vec<Box<dyn PresentationSink>> = vec![Box::new(TerminalSink::new(args.quiet))];
    if let Some(ref panel) = config.panel.output {
        info!("Rendering panel to {}", panel);
        sinks.push(Box::new(HtmlPanel::new(panel, config.panel.title.clone())));
    }

    let outcome = match analyzer.run(&dockerfile, &mut sinks).await {
        Ok(outcome) => outcome,
        // Already shown to the user by the sinks.
        Err(e) => {
            debug!("Session ended with error: {:?}", e);
            return Ok(1);
        }
    };
    drop(sinks);

    if !args.quiet {
        print_findings(&outcome);
    }

    if let Some(ref path) = args.report {
        write_report(&args, &config, &outcome, path)?;
    }

    if outcome.is_completed() {
        Ok(0)
    } else {
        warn!("No terminal fragment received; the advice may be truncated");
        Ok(2)
    }
}

/// Read the Dockerfile from the given path or stdin, applying --lines.
async fn read_dockerfile(args: &Args) -> Result<String> {
    let content = if args.reads_stdin() {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read Dockerfile from stdin")?;
        buffer
    } else {
        let path = args.file.as_deref().context("No Dockerfile given")?;
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read Dockerfile: {}", path.display()))?
    };

    Ok(match args.lines {
        Some(range) => {
            debug!("Selecting lines {}-{}", range.start, range.end);
            range.select(&content)
        }
        None => content,
    })
}

/// Print the detected findings after the remediation text.
fn print_findings(outcome: &SessionOutcome) {
    let summary = FindingsSummary::from_findings(&outcome.findings.predicted_risks);

    eprintln!("\n📋 Detected risks ({}):", summary.total);
    for line in analysis::format_finding_lines(&outcome.findings.predicted_risks) {
        eprintln!("   {}", line);
    }
    if summary.unrecognized > 0 {
        eprintln!(
            "   {} finding(s) have a category the remediation service does not know.",
            summary.unrecognized
        );
    }
    eprintln!("   Duration: {:.1}s", outcome.elapsed.as_secs_f64());
}

/// Build and save the session report.
fn write_report(args: &Args, config: &Config, outcome: &SessionOutcome, path: &Path) -> Result<()> {
    let findings = outcome.findings.predicted_risks.clone();
    let report = SessionReport {
        metadata: ReportMetadata {
            source: args.source_name(),
            analysis_date: Utc::now(),
            detect_url: config.service.detect_url.clone(),
            fix_url: config.service.fix_url.clone(),
            fragments: outcome.fragments,
            duration_seconds: outcome.elapsed.as_secs_f64(),
        },
        outcome: outcome.kind,
        summary: FindingsSummary::from_findings(&findings),
        findings,
        remediation: outcome.remediation.clone(),
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    std::fs::write(path, &output)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    if !args.quiet {
        eprintln!("📝 Report saved to: {}", path.display());
    }
    Ok(())
}

/// Load configuration from file or use defaults, merge the CLI arguments
/// and validate the result. Also returns where the settings came from.
fn load_config(args: &Args) -> Result<(Config, String)> {
    let (mut config, source) = if let Some(ref config_path) = args.config {
        // Explicit config path
        (Config::load(config_path)?, config_path.display().to_string())
    } else {
        // Default location
        match Config::load_from_dir(Path::new("."))? {
            Some(config) => (config, config::CONFIG_FILE.to_string()),
            None => (Config::default(), "defaults".to_string()),
        }
    };

    config.merge_with_args(args);
    config
        .validate()
        .with_context(|| format!("Invalid configuration ({})", source))?;

    Ok((config, source))
}
