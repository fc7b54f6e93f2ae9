//! Error types for grant analysis runs

use thiserror::Error;

/// Errors raised while loading or validating an [`AnalysisConfig`](crate::config::AnalysisConfig)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error reading a config file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML syntax or type error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value outside its allowed range
    #[error("Invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by the top-level analysis entry points.
///
/// Data-quality problems (missing EINs, amounts or purposes) never produce an error.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Fewer distinct foundations than the analysis needs
    #[error("at least {required} foundation ids required (got {supplied})")]
    InsufficientFoundations { required: usize, supplied: usize },

    /// No tax years requested
    #[error("at least 1 tax year required")]
    MissingTaxYears,

    /// A caller-supplied parameter outside its allowed range
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The caller-imposed deadline elapsed; no partial result is kept
    #[error("analysis deadline exceeded after {elapsed_ms} ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The blocking analysis task panicked or was cancelled
    #[error("analysis task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
