//! Configuration types for controlling tester behavior.

use std::fmt;
use std::str::FromStr;

/// Default number of trials per test
pub const DEFAULT_COUNT: usize = 100;
/// Default number of skipped trials tolerated before a run is aborted
pub const DEFAULT_SKIPS: usize = 50;
/// Default number of trials between progress dots
pub const DEFAULT_PROGRESS: usize = 10;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid number of trials (must be > 0)
    InvalidCount(usize),
    /// A verbosity setting that is not `true`, `false` or `error_only`
    InvalidVerbosity(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCount(n) => {
                write!(f, "Invalid trial count: {} (must be > 0)", n)
            }
            ConfigError::InvalidVerbosity(value) => {
                write!(
                    f,
                    "Invalid verbosity '{}' (expected true, false or error_only)",
                    value
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// How much the tester writes to its logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Verbosity {
    /// Progress dots, failures, errors and the summary
    #[default]
    Quiet,
    /// One line per trial in addition to everything `Quiet` writes
    Verbose,
    /// Like `Quiet`, without the per-failure reports
    ErrorOnly,
}

impl From<bool> for Verbosity {
    fn from(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Quiet
        }
    }
}

impl FromStr for Verbosity {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "true" | "verbose" => Ok(Verbosity::Verbose),
            "false" | "quiet" => Ok(Verbosity::Quiet),
            "error_only" | "error-only" => Ok(Verbosity::ErrorOnly),
            other => Err(ConfigError::InvalidVerbosity(other.to_string())),
        }
    }
}

/// Configuration for a [`Tester`](crate::Tester)
#[derive(Debug, Clone, PartialEq)]
pub struct TesterConfig {
    /// Number of trials per test
    pub count: usize,
    /// Initial seed; the wall clock is used when absent
    pub seed: Option<u64>,
    /// Skip budget; the run aborts once more trials than this are skipped
    pub skips: usize,
    /// Output level
    pub verbose: Verbosity,
    /// Trials between progress dots; 0 disables them
    pub progress: usize,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            seed: None,
            skips: DEFAULT_SKIPS,
            verbose: Verbosity::Quiet,
            progress: DEFAULT_PROGRESS,
        }
    }
}

impl TesterConfig {
    /// Create a new tester configuration with validation
    pub fn new(
        count: usize,
        seed: Option<u64>,
        skips: usize,
        verbose: Verbosity,
        progress: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            count,
            seed,
            skips,
            verbose,
            progress,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the tester configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::InvalidCount(self.count));
        }
        Ok(())
    }
}
