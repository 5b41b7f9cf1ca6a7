//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

/// DockerSec - Dockerfile security analysis with streamed remediation
///
/// Sends a Dockerfile to a risk detection service, then streams remediation
/// advice for the detected risks and renders it as it arrives.
///
/// Examples:
///   dockersec Dockerfile
///   dockersec Dockerfile --lines 3:12
///   cat Dockerfile | dockersec -
///   dockersec Dockerfile --panel analysis.html --report report.md
///   dockersec --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Dockerfile to analyze, or `-` to read from stdin
    #[arg(value_name = "FILE", required_unless_present = "init_config")]
    pub file: Option<PathBuf>,

    /// Analyze only these lines of the file (1-indexed, inclusive)
    ///
    /// Example: --lines 3:12 or --lines 5
    #[arg(long, value_name = "START:END")]
    pub lines: Option<LineRange>,

    /// Risk detection endpoint URL
    #[arg(long, value_name = "URL", env = "DOCKERSEC_DETECT_URL")]
    pub detect_url: Option<String>,

    /// Remediation (streaming) endpoint URL
    #[arg(long, value_name = "URL", env = "DOCKERSEC_FIX_URL")]
    pub fix_url: Option<String>,

    /// HTML panel file rewritten as remediation advice arrives
    #[arg(long, value_name = "FILE")]
    pub panel: Option<PathBuf>,

    /// Write a session report to this file when the analysis ends
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Report format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Request timeout in seconds
    ///
    /// Bounds the detection call and connecting to the remediation service.
    /// The remediation stream itself may run longer.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .dockersec.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .dockersec.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Inclusive, 1-indexed line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    /// Extract the selected lines from `text`.
    pub fn select(&self, text: &str) -> String {
        text.lines()
            .skip(self.start - 1)
            .take(self.end - self.start + 1)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromStr for LineRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| format!("Invalid line number: '{}'", part))
        };

        let (start, end) = match s.split_once(':') {
            Some((start, end)) => (parse(start)?, parse(end)?),
            None => {
                let line = parse(s)?;
                (line, line)
            }
        };

        if start == 0 {
            return Err("Line numbers start at 1".to_string());
        }
        if end < start {
            return Err(format!("Line range {}:{} ends before it starts", start, end));
        }

        Ok(Self { start, end })
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether the Dockerfile comes from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.file.as_deref().map_or(false, |p| p.as_os_str() == "-")
    }

    /// Human-readable name of the input.
    pub fn source_name(&self) -> String {
        if self.reads_stdin() {
            return "<stdin>".to_string();
        }
        self.file
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_default()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        for url in [&self.detect_url, &self.fix_url].into_iter().flatten() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!(
                    "Service URL must start with 'http://' or 'https://': {}",
                    url
                ));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref path) = self.file {
            if !self.reads_stdin() && !path.is_file() {
                return Err(format!("Dockerfile does not exist: {}", path.display()));
            }
        }

        Ok(())
    }
}
