//! Error types for random generation, pattern compilation and test execution.

use std::fmt;

use crate::config::ConfigError;

/// Errors raised by [`RandomSource`](crate::rng::RandomSource) draws
#[derive(Debug, Clone, PartialEq)]
pub enum RngError {
    /// The requested bounds describe an empty or degenerate interval
    InvalidArgument {
        operation: &'static str,
        message: String,
    },
}

impl RngError {
    pub(crate) fn invalid_argument(operation: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation,
            message: message.into(),
        }
    }
}

impl fmt::Display for RngError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RngError::InvalidArgument { operation, message } => {
                write!(f, "Invalid argument to {}: {}", operation, message)
            }
        }
    }
}

impl std::error::Error for RngError {}

/// Errors raised while compiling a string pattern such as `"2,4 a-z%d"`
#[derive(Debug, Clone, PartialEq)]
pub enum PatternError {
    /// The pattern does not start with a length specification
    MissingCount { spec: String },
    /// The length specification could not be parsed
    MalformedCount { spec: String, count: String },
    /// The minimum length is larger than the maximum length
    InvertedCount { low: usize, high: usize },
    /// A `X-Y` range that expands to nothing
    InvalidRange { from: char, to: char },
    /// `%` followed by a letter or digit that names no character class
    UnknownClass { tag: char },
    /// The pattern ends with a lone `%`
    DanglingEscape { spec: String },
    /// Nothing to draw characters from
    EmptyCharset { spec: String },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::MissingCount { spec } => {
                write!(f, "Pattern '{}' is missing its length specification", spec)
            }
            PatternError::MalformedCount { spec, count } => {
                write!(
                    f,
                    "Malformed length '{}' in pattern '{}' (expected N or N,M)",
                    count, spec
                )
            }
            PatternError::InvertedCount { low, high } => {
                write!(f, "Invalid length range {},{} (minimum exceeds maximum)", low, high)
            }
            PatternError::InvalidRange { from, to } => {
                write!(f, "Invalid character range {:?}-{:?}", from, to)
            }
            PatternError::UnknownClass { tag } => {
                write!(f, "Unknown character class '%{}'", tag)
            }
            PatternError::DanglingEscape { spec } => {
                write!(f, "Pattern '{}' ends with an unterminated '%'", spec)
            }
            PatternError::EmptyCharset { spec } => {
                write!(f, "Pattern '{}' compiles to an empty charset", spec)
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// Errors raised while turning a descriptor into a value
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// A draw from the random source was rejected
    Rng(RngError),
    /// A string pattern descriptor failed to compile
    Pattern(PatternError),
    /// An object descriptor does not expose a custom generator
    MissingCapability { shape: String },
    /// The descriptor has a shape the dispatcher does not understand
    UnsupportedType { shape: String },
    /// A user-supplied generator reported a failure
    Custom(String),
}

impl GenerationError {
    /// Create an error from inside a custom generator
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Rng(err) => write!(f, "Generation failed: {}", err),
            GenerationError::Pattern(err) => write!(f, "Generation failed: {}", err),
            GenerationError::MissingCapability { shape } => {
                write!(f, "Value of type '{}' has no custom generator", shape)
            }
            GenerationError::UnsupportedType { shape } => {
                write!(f, "Cannot generate values from a descriptor of type '{}'", shape)
            }
            GenerationError::Custom(message) => write!(f, "Generation failed: {}", message),
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerationError::Rng(err) => Some(err),
            GenerationError::Pattern(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RngError> for GenerationError {
    fn from(err: RngError) -> Self {
        Self::Rng(err)
    }
}

impl From<PatternError> for GenerationError {
    fn from(err: PatternError) -> Self {
        Self::Pattern(err)
    }
}

/// Errors that stop a [`Tester`](crate::execution::Tester) run before it can report
///
/// These describe a misconfigured test rather than a failing property, so they are
/// returned to the caller instead of being counted as trial outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum TestError {
    /// The tester configuration is invalid
    Config(ConfigError),
    /// The random source could not produce a trial seed
    Seed(RngError),
    /// A string pattern argument failed to compile
    Pattern {
        argument: usize,
        source: PatternError,
    },
    /// An argument could not be generated
    Generation {
        argument: usize,
        seed: u64,
        source: GenerationError,
    },
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestError::Config(err) => write!(f, "Configuration error: {}", err),
            TestError::Seed(err) => write!(f, "Could not draw a trial seed: {}", err),
            TestError::Pattern { argument, source } => {
                write!(f, "Argument {}: {}", argument, source)
            }
            TestError::Generation {
                argument,
                seed,
                source,
            } => write!(f, "Argument {} (seed {}): {}", argument, seed, source),
        }
    }
}

impl std::error::Error for TestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TestError::Config(err) => Some(err),
            TestError::Seed(err) => Some(err),
            TestError::Pattern { source, .. } => Some(source),
            TestError::Generation { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for TestError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}
