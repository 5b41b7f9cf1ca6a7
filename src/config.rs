//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.dockersec.toml` files.

use crate::analyzer::AnalyzerConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".dockersec.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Remote service settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Panel settings.
    #[serde(default)]
    pub panel: PanelConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Detection and remediation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Risk detection endpoint.
    #[serde(default = "default_detect_url")]
    pub detect_url: String,

    /// Streaming remediation endpoint.
    #[serde(default = "default_fix_url")]
    pub fix_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            detect_url: default_detect_url(),
            fix_url: default_fix_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_detect_url() -> String {
    "http://localhost:6006/analyze?debug=1".to_string()
}

fn default_fix_url() -> String {
    "http://localhost:8008/fix".to_string()
}

fn default_timeout() -> u64 {
    120
}

/// Rendered panel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// HTML file to keep updated. No panel when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Title of the panel document.
    #[serde(default = "default_panel_title")]
    pub title: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            output: None,
            title: default_panel_title(),
        }
    }
}

fn default_panel_title() -> String {
    "Dockerfile Security Analysis".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from `dir`.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.detect_url {
            self.service.detect_url = url.clone();
        }
        if let Some(ref url) = args.fix_url {
            self.service.fix_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.service.timeout_seconds = timeout;
        }
        if let Some(ref panel) = args.panel {
            self.panel.output = Some(panel.display().to_string());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values that may have come from the config file.
    pub fn validate(&self) -> Result<()> {
        for (key, url) in [
            ("detect_url", &self.service.detect_url),
            ("fix_url", &self.service.fix_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!(
                    "service.{} must start with 'http://' or 'https://': {}",
                    key,
                    url
                );
            }
        }

        if self.service.timeout_seconds == 0 {
            bail!("service.timeout_seconds must be at least 1");
        }

        Ok(())
    }

    /// Log level for this run. `--quiet` wins over a verbose config.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Settings for the analyzer.
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            detect_url: self.service.detect_url.clone(),
            fix_url: self.service.fix_url.clone(),
            timeout_seconds: self.service.timeout_seconds,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, OutputFormat};
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.fix_url, "http://localhost:8008/fix");
        assert_eq!(config.service.timeout_seconds, 120);
        assert!(config.panel.output.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[service]
detect_url = "https://detector.internal:6006/analyze"
timeout_seconds = 30

[panel]
output = "analysis.html"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.service.detect_url, "https://detector.internal:6006/analyze");
        assert_eq!(config.service.fix_url, "http://localhost:8008/fix");
        assert_eq!(config.service.timeout_seconds, 30);
        assert_eq!(config.panel.output.as_deref(), Some("analysis.html"));
        assert_eq!(config.panel.title, "Dockerfile Security Analysis");
    }

    #[test]
    fn test_cli_overrides_only_given_values() {
        let mut config = Config::default();
        config.service.detect_url = "http://from-file/analyze".to_string();

        let args = Args {
            file: Some(PathBuf::from("-")),
            lines: None,
            detect_url: None,
            fix_url: Some("http://from-cli/fix".to_string()),
            panel: Some(PathBuf::from("panel.html")),
            report: None,
            format: OutputFormat::Markdown,
            timeout: Some(9),
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        };
        config.merge_with_args(&args);

        let analyzer = config.analyzer_config();
        assert_eq!(analyzer.detect_url, "http://from-file/analyze");
        assert_eq!(analyzer.fix_url, "http://from-cli/fix");
        assert_eq!(analyzer.timeout_seconds, 9);
        assert_eq!(config.panel.output.as_deref(), Some("panel.html"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config: Config = toml::from_str("[service]\ntimeout_seconds = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let config: Config =
            toml::from_str("[service]\nfix_url = \"ftp://localhost:8008/fix\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("service.fix_url"));

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_log_level_reads_verbose_from_file() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
        assert_eq!(config.log_level(true), tracing::Level::ERROR);

        config.general.verbose = false;
        assert_eq!(config.log_level(false), tracing::Level::INFO);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE), "[service]\ntimeout_seconds = 5\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.service.timeout_seconds, 5);

        std::fs::write(dir.path().join(CONFIG_FILE), "[service\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[service]"));
        assert!(toml_str.contains("[panel]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.service.detect_url, default_detect_url());
    }
}
