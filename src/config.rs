//! Configuration module
//!
//! Provides structured configuration for the evtriage CLI.
//! Configuration can be loaded from:
//! 1. Default values (hardcoded)
//! 2. evtriage.toml file (optional)
//! 3. Environment variables with TRIAGE__ prefix
//!
//! Example environment variable override:
//! TRIAGE__LOGGING__LEVEL=debug
//! TRIAGE__EXPORT__TIMELINE_PREFIX=Focused_Timeline

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub export: ExportConfig,
}

/// Operational logging configuration (application debug logs)
#[derive(Debug, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub directory: PathBuf,
    pub filename: String,
    pub console_output: bool,
}

/// CSV export configuration (file name prefixes; the run timestamp and
/// `.csv` suffix are appended)
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub timeline_prefix: String,
    pub full_prefix: String,
}

impl AppConfig {
    /// Load configuration from defaults, evtriage.toml, and environment
    /// variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let s = config::Config::builder()
            // --- Defaults ---
            // Logging
            .set_default("logging.level", "info")?
            .set_default("logging.directory", "logs")?
            .set_default("logging.filename", "evtriage.log")?
            .set_default("logging.console_output", true)?
            // Export
            .set_default("export.timeline_prefix", "Filtered_Timeline")?
            .set_default("export.full_prefix", "All_Events")?
            // --- Sources ---
            .add_source(config::File::with_name("evtriage").required(false))
            .add_source(config::Environment::with_prefix("TRIAGE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LogConfig {
                level: "info".to_string(),
                directory: PathBuf::from("logs"),
                filename: "evtriage.log".to_string(),
                console_output: true,
            },
            export: ExportConfig::default(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            timeline_prefix: "Filtered_Timeline".to_string(),
            full_prefix: "All_Events".to_string(),
        }
    }
}
