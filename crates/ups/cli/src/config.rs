//! Configuration for the ups binary

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use ups_engine::EvolutionConfig;
use ups_types::ResourceLimits;

/// Main CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Evolution run parameters
    #[serde(default)]
    pub evolution: EvolutionConfig,

    /// Candidate execution; the surrogate evaluator is used when unset
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Output destinations
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Execution of candidate code through a local interpreter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Interpreter that reads candidate code on stdin
    #[serde(default)]
    pub interpreter: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Per-execution timeout in milliseconds
    #[serde(default = "default_runner_timeout")]
    pub timeout_ms: u64,

    /// Captured output limit in bytes
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Screen candidates with the surrogate first; only those reaching this
    /// score are executed
    #[serde(default)]
    pub screen_threshold: Option<f64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interpreter: None,
            args: Vec::new(),
            timeout_ms: default_runner_timeout(),
            max_output_bytes: default_max_output_bytes(),
            env: BTreeMap::new(),
            screen_threshold: None,
        }
    }
}

impl RunnerConfig {
    pub fn limits(&self) -> ResourceLimits {
        ResourceLimits {
            timeout_ms: self.timeout_ms,
            max_output_bytes: self.max_output_bytes,
            env: self.env.clone(),
        }
    }
}

/// Output destinations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON-lines file receiving one state snapshot per generation
    #[serde(default)]
    pub state_out: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_runner_timeout() -> u64 {
    30_000
}

fn default_max_output_bytes() -> usize {
    1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl CliConfig {
    /// Layer defaults, the optional file, then `UPS_*` environment variables.
    ///
    /// Nested keys use a double underscore:
    /// `UPS_EVOLUTION__BUDGET__MAX_GENERATIONS=20`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&CliConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Add environment variables with UPS_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("UPS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
