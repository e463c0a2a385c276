#![allow(clippy::result_large_err)]

//! # randtest - Randomized Property Testing for Rust
//!
//! randtest checks a predicate against many randomly generated argument tuples.
//! Arguments are described by [`Descriptor`]s: a number bounds an integer or
//! float draw, a string is a pattern such as `"1,8 a-z%d"`, a boolean asks for a
//! coin flip, and closures or [`CustomGenerate`] implementations cover anything
//! else.
//!
//! Every trial runs under its own seed, which is logged when the trial fails so
//! it can be replayed on its own.
//!
//! ## Quick Start
//!
//! ```rust
//! use randtest::{BufferLogger, Descriptor, Outcome, Tester, Value};
//!
//! let log = BufferLogger::new();
//! let mut tester = Tester::builder().seed(2024).log(log.clone()).build().unwrap();
//!
//! let report = tester
//!     .test(
//!         Some("reverse twice"),
//!         |args: &[Value]| {
//!             let text = args[0].as_str().unwrap_or_default();
//!             if text.is_empty() {
//!                 return Outcome::Skip;
//!             }
//!             let twice: String = text.chars().rev().collect::<String>().chars().rev().collect();
//!             Outcome::from(twice == text)
//!         },
//!         &[Descriptor::pattern("0,12 %w-")],
//!     )
//!     .unwrap();
//!
//! assert!(report.is_success());
//! assert!(log.contents().contains("reverse twice: PASS"));
//! ```

pub mod arbitrary;
pub mod config;
pub mod error;
pub mod execution;
mod macros;
pub mod pattern;
pub mod property;
pub mod report;
pub mod rng;
pub mod value;

// Re-export the main public API
pub use arbitrary::{CustomGenerate, Descriptor, Domain, GeneratorFn, PreparedDescriptor, generate};
pub use config::{ConfigError, TesterConfig, Verbosity};
pub use error::{GenerationError, PatternError, RngError, TestError};
pub use execution::{
    DEFAULT_TEST_NAME, Tester, TesterBuilder, check, check_with_config, check_with_logger,
};
pub use pattern::{CharClass, CompiledPattern, PatternCompiler, compile};
pub use property::{IntoOutcome, Outcome, Predicate};
pub use report::{
    BufferLogger, Logger, Progress, ProgressHook, RunReport, RunStatus, StderrLogger,
    StdoutLogger, TrialRecord, WriterLogger, default_progress,
};
pub use rng::{BackendKind, RandomSource, SeededRng, SmallSource, StdSource, default_source};
pub use value::{Value, ValueObject};
