//! Trial runner: draws a seed per trial, generates arguments and classifies the predicate's verdict.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::arbitrary::{Descriptor, PreparedDescriptor};
use crate::config::{ConfigError, TesterConfig, Verbosity};
use crate::error::TestError;
use crate::pattern::PatternCompiler;
use crate::property::{Outcome, Predicate};
use crate::report::{
    Logger, Progress, ProgressHook, RunReport, RunStatus, StdoutLogger, TrialRecord,
    default_progress, format_arguments, format_error, format_failure, format_skip_abort,
};
use crate::rng::{BackendKind, RandomSource, wall_clock_seed};
use crate::value::Value;

/// Name used in log lines when a test is run without one
pub const DEFAULT_TEST_NAME: &str = "unnamed_test";

enum ProgressReporter {
    Default,
    Custom(ProgressHook),
}

/// Runs predicates against randomly generated arguments
///
/// A tester owns its random source and logger. Every call to [`Tester::test`]
/// starts from the tester's initial seed, so repeated runs with the same
/// configuration see the same arguments.
///
/// ```
/// use randtest::{Descriptor, Tester, Value, BufferLogger};
///
/// let mut tester = Tester::builder()
///     .count(50)
///     .seed(1234)
///     .log(BufferLogger::new())
///     .build()
///     .unwrap();
///
/// let report = tester
///     .test(
///         Some("addition commutes"),
///         |args: &[Value]| {
///             let (a, b) = (args[0].as_int().unwrap(), args[1].as_int().unwrap());
///             a + b == b + a
///         },
///         &[Descriptor::int(-1000), Descriptor::int(1000)],
///     )
///     .unwrap();
///
/// assert!(report.is_success());
/// assert_eq!(report.passed, 50);
/// ```
pub struct Tester {
    config: TesterConfig,
    initial_seed: u64,
    seed: u64,
    rng: Box<dyn RandomSource>,
    log: Box<dyn Logger>,
    progress: ProgressReporter,
    compiler: PatternCompiler,
}

impl Tester {
    /// Create a tester on the default backend, logging to stdout
    pub fn new(config: TesterConfig) -> Result<Self, ConfigError> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> TesterBuilder {
        TesterBuilder::new()
    }

    pub fn config(&self) -> &TesterConfig {
        &self.config
    }

    /// Seed of the trial currently or most recently executed
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Reseed the tester and its random source
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng.set_seed(seed);
    }

    /// Seed every run starts from
    pub fn initial_seed(&self) -> u64 {
        self.initial_seed
    }

    pub fn set_initial_seed(&mut self, seed: u64) {
        self.initial_seed = seed;
    }

    pub fn rng_mut(&mut self) -> &mut dyn RandomSource {
        self.rng.as_mut()
    }

    /// Run the predicate against `count` generated argument tuples
    ///
    /// Pattern and generation problems are returned as errors since they point
    /// at a broken test rather than a broken property. Everything the predicate
    /// does, including panicking, is classified into the report.
    pub fn test<P: Predicate>(
        &mut self,
        name: Option<&str>,
        mut predicate: P,
        descriptors: &[Descriptor],
    ) -> Result<RunReport, TestError> {
        self.config.validate()?;
        let name = name.unwrap_or(DEFAULT_TEST_NAME);
        let prepared = self.prepare(descriptors)?;
        let count = self.config.count;
        let verbosity = self.config.verbose;

        self.set_seed(self.initial_seed);
        let bound = i64::try_from(self.rng.limit()).unwrap_or(i64::MAX);

        tracing::debug!(
            test = name,
            count,
            seed = self.initial_seed,
            backend = self.rng.backend_name(),
            "starting run"
        );

        let (mut passed, mut failed, mut skipped, mut errored) = (0, 0, 0, 0);
        let mut records = Vec::new();
        let mut aborted = false;
        // A progress dot has been written without a newline after it
        let mut line_open = false;

        for trial in 1..=count {
            let thisseed = self.rng.get_int(bound).map_err(TestError::Seed)? as u64;
            self.set_seed(thisseed);

            let arguments = generate_arguments(&prepared, self.rng.as_mut(), thisseed)?;
            let outcome = invoke(&mut predicate, &arguments);
            tracing::trace!(test = name, trial, seed = thisseed, outcome = outcome.label());

            match &outcome {
                Outcome::Pass => passed += 1,
                Outcome::Fail => {
                    failed += 1;
                    if verbosity != Verbosity::ErrorOnly {
                        self.emit(&mut line_open, &format_failure(name, thisseed, passed, failed));
                        self.emit(&mut line_open, &format_arguments(&arguments));
                    }
                }
                Outcome::Skip => skipped += 1,
                Outcome::Error(message) => {
                    errored += 1;
                    self.emit(&mut line_open, &format_error(name, thisseed, message));
                    self.emit(&mut line_open, &format_arguments(&arguments));
                }
            }

            if skipped > self.config.skips {
                tracing::warn!(
                    test = name,
                    skipped,
                    budget = self.config.skips,
                    executed = trial,
                    "skip budget exhausted"
                );
                self.emit(
                    &mut line_open,
                    &format_skip_abort(name, skipped, self.config.skips, trial, count),
                );
                aborted = true;
                break;
            }

            let progress = Progress {
                name,
                trial,
                count,
                seed: thisseed,
                outcome: &outcome,
                verbosity,
                interval: self.config.progress,
            };
            match &mut self.progress {
                ProgressReporter::Default => {
                    default_progress(&progress, self.log.as_mut());
                    if verbosity != Verbosity::Verbose
                        && progress.interval > 0
                        && trial % progress.interval == 0
                    {
                        line_open = true;
                    }
                }
                ProgressReporter::Custom(hook) => hook(&progress, self.log.as_mut()),
            }

            if outcome.is_fail() || outcome.is_error() {
                records.push(TrialRecord {
                    trial,
                    seed: thisseed,
                    outcome,
                    arguments,
                });
            }
        }

        let status = if failed > 0 || errored > 0 {
            RunStatus::Fail
        } else if aborted {
            RunStatus::Incomplete
        } else {
            RunStatus::Pass
        };

        let report = RunReport {
            name: name.to_string(),
            status,
            passed,
            failed,
            skipped,
            errored,
            count,
            initial_seed: self.initial_seed,
            records,
        };
        self.emit(&mut line_open, &format!("{}\n", report));

        tracing::debug!(test = name, status = %report.status, executed = report.executed(), "run finished");
        Ok(report)
    }

    /// Re-run the single trial identified by a logged seed
    ///
    /// The returned record has trial number 0 since it is not part of a run.
    pub fn replay<P: Predicate>(
        &mut self,
        mut predicate: P,
        descriptors: &[Descriptor],
        seed: u64,
    ) -> Result<TrialRecord, TestError> {
        let prepared = self.prepare(descriptors)?;
        self.set_seed(seed);

        let arguments = generate_arguments(&prepared, self.rng.as_mut(), seed)?;
        let outcome = invoke(&mut predicate, &arguments);
        tracing::debug!(seed, outcome = outcome.label(), "replayed trial");

        Ok(TrialRecord {
            trial: 0,
            seed,
            outcome,
            arguments,
        })
    }

    fn prepare(&mut self, descriptors: &[Descriptor]) -> Result<Vec<PreparedDescriptor>, TestError> {
        descriptors
            .iter()
            .enumerate()
            .map(|(index, descriptor)| {
                descriptor
                    .prepare(&mut self.compiler)
                    .map_err(|source| TestError::Pattern {
                        argument: index + 1,
                        source,
                    })
            })
            .collect()
    }

    fn emit(&mut self, line_open: &mut bool, text: &str) {
        if *line_open {
            self.log.write("\n");
            *line_open = false;
        }
        self.log.write(text);
    }
}

impl fmt::Debug for Tester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tester")
            .field("config", &self.config)
            .field("initial_seed", &self.initial_seed)
            .field("seed", &self.seed)
            .field("backend", &self.rng.backend_name())
            .field(
                "custom_progress",
                &matches!(self.progress, ProgressReporter::Custom(_)),
            )
            .finish()
    }
}

fn generate_arguments(
    prepared: &[PreparedDescriptor],
    rng: &mut dyn RandomSource,
    seed: u64,
) -> Result<Vec<Value>, TestError> {
    prepared
        .iter()
        .enumerate()
        .map(|(index, descriptor)| {
            descriptor
                .generate(rng)
                .map_err(|source| TestError::Generation {
                    argument: index + 1,
                    seed,
                    source,
                })
        })
        .collect()
}

fn invoke<P: Predicate>(predicate: &mut P, arguments: &[Value]) -> Outcome {
    panic::catch_unwind(AssertUnwindSafe(|| predicate.check(arguments)))
        .unwrap_or_else(Outcome::from_panic)
}

/// Builder for configuring a [`Tester`]
pub struct TesterBuilder {
    config: TesterConfig,
    log: Option<Box<dyn Logger>>,
    progress: Option<ProgressHook>,
    backend: Option<BackendKind>,
    rng: Option<Box<dyn RandomSource>>,
}

impl TesterBuilder {
    pub fn new() -> Self {
        Self {
            config: TesterConfig::default(),
            log: None,
            progress: None,
            backend: None,
            rng: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: TesterConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of trials per test
    pub fn count(mut self, count: usize) -> Self {
        self.config.count = count;
        self
    }

    /// Set the initial seed for reproducible runs
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set the skip budget
    pub fn skips(mut self, skips: usize) -> Self {
        self.config.skips = skips;
        self
    }

    pub fn verbose(mut self, verbose: impl Into<Verbosity>) -> Self {
        self.config.verbose = verbose.into();
        self
    }

    /// Set the number of trials between progress dots
    pub fn progress(mut self, interval: usize) -> Self {
        self.config.progress = interval;
        self
    }

    /// Send output to `log` instead of stdout
    pub fn log(mut self, log: impl Logger + 'static) -> Self {
        self.log = Some(Box::new(log));
        self
    }

    /// Pick the random backend instead of the detected default
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use a caller-provided random source; it is reseeded with the initial seed
    pub fn rng(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Replace the default progress reporting
    pub fn show_progress<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&Progress<'_>, &mut dyn Logger) + 'static,
    {
        self.progress = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Result<Tester, ConfigError> {
        self.config.validate()?;
        let seed = self.config.seed.unwrap_or_else(wall_clock_seed);

        let rng = match self.rng {
            Some(mut rng) => {
                rng.set_seed(seed);
                rng
            }
            None => self.backend.unwrap_or_else(BackendKind::detect).create(seed),
        };

        Ok(Tester {
            config: self.config,
            initial_seed: seed,
            seed,
            rng,
            log: self.log.unwrap_or_else(|| Box::new(StdoutLogger)),
            progress: match self.progress {
                Some(hook) => ProgressReporter::Custom(hook),
                None => ProgressReporter::Default,
            },
            compiler: PatternCompiler::new(),
        })
    }
}

impl Default for TesterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a predicate with the default configuration
pub fn check<P: Predicate>(predicate: P, descriptors: &[Descriptor]) -> Result<RunReport, TestError> {
    check_with_config(TesterConfig::default(), predicate, descriptors)
}

/// Run a predicate with a custom configuration
pub fn check_with_config<P: Predicate>(
    config: TesterConfig,
    predicate: P,
    descriptors: &[Descriptor],
) -> Result<RunReport, TestError> {
    check_with_logger(config, StdoutLogger, predicate, descriptors)
}

/// Run a predicate with a custom configuration, writing the run log to `log`
pub fn check_with_logger<P: Predicate>(
    config: TesterConfig,
    log: impl Logger + 'static,
    predicate: P,
    descriptors: &[Descriptor],
) -> Result<RunReport, TestError> {
    let mut tester = Tester::builder().config(config).log(log).build()?;
    tester.test(None, predicate, descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenerationError, PatternError};
    use crate::report::BufferLogger;
    use crate::rng::StdSource;
    use std::cell::Cell;
    use std::rc::Rc;

    fn tester(logger: &BufferLogger) -> Tester {
        Tester::builder()
            .seed(42)
            .backend(BackendKind::Std)
            .log(logger.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn test_all_pass() {
        let logger = BufferLogger::new();
        let report = tester(&logger)
            .test(Some("always"), |_: &[Value]| true, &[Descriptor::int(10)])
            .unwrap();

        assert_eq!(report.status, RunStatus::Pass);
        assert_eq!(
            (report.passed, report.failed, report.skipped, report.errored),
            (100, 0, 0, 0)
        );
        assert!(report.records.is_empty());
        assert!(
            logger
                .contents()
                .ends_with("..........\nalways: PASS (passed=100, failed=0, skipped=0, errored=0)\n")
        );
    }

    #[test]
    fn test_all_fail() {
        let logger = BufferLogger::new();
        let report = tester(&logger)
            .test(Some("never"), |_: &[Value]| false, &[Descriptor::int(10), "3 abc".into()])
            .unwrap();

        assert_eq!(report.status, RunStatus::Fail);
        assert_eq!(report.failed, 100);
        assert_eq!(report.records.len(), 100);

        let contents = logger.contents();
        let first = report.first_failure().unwrap();
        assert!(contents.contains(&format!("never: FAIL seed={} (passed=0, failed=1)", first.seed)));
        assert!(contents.contains("  arg[2] = \""));
        assert!(contents.ends_with("never: FAIL (passed=0, failed=100, skipped=0, errored=0)\n"));
    }

    #[test]
    fn test_all_error() {
        let logger = BufferLogger::new();
        let report = tester(&logger)
            .test(
                Some("broken"),
                |_: &[Value]| Err::<bool, _>("connection refused"),
                &[Descriptor::boolean()],
            )
            .unwrap();

        assert_eq!(report.errored, 100);
        assert_eq!(report.status, RunStatus::Fail);
        assert!(logger.contents().contains("broken: ERROR seed="));
        assert!(logger.contents().contains(": connection refused\n  arg[1] = "));
    }

    #[test]
    fn test_panics_are_classified() {
        let logger = BufferLogger::new();
        let report = Tester::builder()
            .count(20)
            .seed(3)
            .log(logger.clone())
            .build()
            .unwrap()
            .test(
                None,
                |args: &[Value]| -> bool {
                    if args[0].as_int().unwrap_or_default() < 5 {
                        panic!("precondition not met: skip");
                    }
                    panic!("unexpected");
                },
                &[Descriptor::int(10)],
            )
            .unwrap();

        assert_eq!(report.passed + report.failed, 0);
        assert_eq!(report.skipped + report.errored, 20);
        assert!(report.skipped > 0);
        assert!(report.errored > 0);
        assert!(logger.contents().contains("unnamed_test: ERROR seed="));
    }

    #[test]
    fn test_skip_budget_aborts_run() {
        let logger = BufferLogger::new();
        let report = tester(&logger)
            .test(Some("picky"), |_: &[Value]| Outcome::Skip, &[])
            .unwrap();

        assert_eq!(report.status, RunStatus::Incomplete);
        assert_eq!(report.skipped, 51);
        assert_eq!(report.executed(), 51);
        assert!(
            logger
                .contents()
                .contains("picky: WARNING 51 trials skipped (budget 50), aborting after 51 of 100 trials\n")
        );
        assert!(logger.contents().contains("picky: INCOMPLETE"));
    }

    #[test]
    fn test_skips_within_budget_still_pass() {
        let logger = BufferLogger::new();
        let report = tester(&logger)
            .test(
                Some("even"),
                |args: &[Value]| Outcome::pass_or_skip(args[0].as_int() != Some(0)),
                &[Descriptor::int(100)],
            )
            .unwrap();

        assert_eq!(report.status, RunStatus::Pass);
        assert_eq!(report.executed(), 100);
        assert!(report.skipped <= 50);
    }

    #[test]
    fn test_counter_conservation() {
        let logger = BufferLogger::new();
        let mut tester = Tester::builder()
            .count(300)
            .seed(99)
            .skips(300)
            .log(logger)
            .build()
            .unwrap();

        let report = tester
            .test(
                Some("mixed"),
                |args: &[Value]| match args[0].as_int().unwrap_or_default() {
                    0 => Outcome::Pass,
                    1 => Outcome::Fail,
                    2 => Outcome::Skip,
                    _ => Outcome::Error("three".to_string()),
                },
                &[Descriptor::int(4)],
            )
            .unwrap();

        assert_eq!(report.executed(), 300);
        assert!(report.passed > 0 && report.failed > 0 && report.skipped > 0 && report.errored > 0);
        assert_eq!(report.records.len(), report.failed + report.errored);
    }

    #[test]
    fn test_runs_are_deterministic() {
        fn collect(seed: u64) -> Vec<Vec<Value>> {
            let mut seen = Vec::new();
            Tester::builder()
                .count(25)
                .seed(seed)
                .log(BufferLogger::new())
                .build()
                .unwrap()
                .test(
                    None,
                    |args: &[Value]| {
                        seen.push(args.to_vec());
                        true
                    },
                    &[Descriptor::int(-50), Descriptor::float(2.5), "1,6 a-f%d".into()],
                )
                .unwrap();
            seen
        }

        assert_eq!(collect(7), collect(7));
        assert_ne!(collect(7), collect(8));
    }

    #[test]
    fn test_repeated_runs_restart_from_initial_seed() {
        let mut tester = tester(&BufferLogger::new());
        let first = tester
            .test(None, |_: &[Value]| false, &[Descriptor::int(1000)])
            .unwrap();
        let second = tester
            .test(None, |_: &[Value]| false, &[Descriptor::int(1000)])
            .unwrap();
        assert_eq!(first.records, second.records);
        assert_eq!(tester.initial_seed(), 42);
    }

    #[test]
    fn test_replay_reproduces_failing_trial() {
        let logger = BufferLogger::new();
        let mut tester = tester(&logger);
        let descriptors = [Descriptor::int(1000), "2,5 %l".into()];
        let predicate = |args: &[Value]| args[0].as_int().unwrap_or_default() < 900;

        let report = tester.test(Some("small"), predicate, &descriptors).unwrap();
        let failure = report.first_failure().unwrap().clone();

        let replayed = tester.replay(predicate, &descriptors, failure.seed).unwrap();
        assert_eq!(replayed.seed, failure.seed);
        assert_eq!(replayed.arguments, failure.arguments);
        assert_eq!(replayed.outcome, Outcome::Fail);
        assert_eq!(tester.seed(), failure.seed);
    }

    #[test]
    fn test_error_only_hides_failures() {
        let logger = BufferLogger::new();
        let report = Tester::builder()
            .seed(5)
            .verbose(Verbosity::ErrorOnly)
            .log(logger.clone())
            .build()
            .unwrap()
            .test(Some("quiet"), |_: &[Value]| false, &[Descriptor::int(3)])
            .unwrap();

        assert_eq!(report.failed, 100);
        let contents = logger.contents();
        assert!(!contents.contains("FAIL seed="));
        assert!(!contents.contains("arg[1]"));
        assert!(contents.contains("quiet: FAIL (passed=0, failed=100"));
    }

    #[test]
    fn test_error_only_still_dumps_errors() {
        let logger = BufferLogger::new();
        let report = Tester::builder()
            .count(20)
            .seed(5)
            .verbose(Verbosity::ErrorOnly)
            .log(logger.clone())
            .build()
            .unwrap()
            .test(
                Some("e"),
                |_: &[Value]| -> bool { panic!("boom") },
                &[Descriptor::int(3)],
            )
            .unwrap();

        assert_eq!(report.errored, 20);
        let contents = logger.contents();
        let first = report.first_failure().unwrap();
        assert!(contents.contains(&format!("e: ERROR seed={}: boom\n  arg[1] = ", first.seed)));
        assert_eq!(contents.matches("arg[1]").count(), 20);
    }

    #[test]
    fn test_verbose_lines_per_trial() {
        let logger = BufferLogger::new();
        Tester::builder()
            .count(5)
            .seed(5)
            .verbose(true)
            .log(logger.clone())
            .build()
            .unwrap()
            .test(Some("loud"), |_: &[Value]| true, &[])
            .unwrap();

        let lines = logger.lines();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("loud: trial 1/5 seed="));
        assert!(lines[4].ends_with(" pass"));
    }

    #[test]
    fn test_custom_progress_hook() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let logger = BufferLogger::new();

        Tester::builder()
            .count(12)
            .seed(1)
            .log(logger.clone())
            .show_progress(move |progress, log| {
                counter.set(counter.get() + 1);
                if progress.trial == progress.count {
                    log.write("done\n");
                }
            })
            .build()
            .unwrap()
            .test(Some("hooked"), |_: &[Value]| true, &[])
            .unwrap();

        assert_eq!(calls.get(), 12);
        assert!(!logger.contents().contains('.'));
        assert!(logger.contents().starts_with("done\nhooked: PASS"));
    }

    #[test]
    fn test_configuration_errors_fail_fast() {
        assert_eq!(
            Tester::builder().count(0).build().err(),
            Some(ConfigError::InvalidCount(0))
        );

        let mut calls = 0;
        let error = tester(&BufferLogger::new())
            .test(
                None,
                |_: &[Value]| {
                    calls += 1;
                    true
                },
                &[Descriptor::int(4), "2,1 abc".into()],
            )
            .unwrap_err();
        assert_eq!(
            error,
            TestError::Pattern {
                argument: 2,
                source: PatternError::InvertedCount { low: 2, high: 1 },
            }
        );
        assert_eq!(calls, 0);

        let error = tester(&BufferLogger::new())
            .test(
                None,
                |_: &[Value]| true,
                &[Descriptor::pattern("1,18446744073709551615 a")],
            )
            .unwrap_err();
        assert!(matches!(
            error,
            TestError::Pattern {
                argument: 1,
                source: PatternError::MalformedCount { .. },
            }
        ));
    }

    #[test]
    fn test_generation_errors_propagate() {
        let error = tester(&BufferLogger::new())
            .test(None, |_: &[Value]| true, &[Descriptor::Nil])
            .unwrap_err();
        assert!(matches!(
            error,
            TestError::Generation {
                argument: 1,
                source: GenerationError::UnsupportedType { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_custom_rng_is_reseeded() {
        let logger = BufferLogger::new();
        let tester = Tester::builder()
            .seed(11)
            .rng(Box::new(StdSource::new(0)))
            .log(logger)
            .build()
            .unwrap();
        assert_eq!(tester.seed(), 11);
        assert_eq!(tester.initial_seed(), 11);
        assert!(format!("{:?}", tester).contains("backend: \"std\""));
    }

    #[test]
    fn test_check_helpers() {
        let config = TesterConfig {
            count: 10,
            seed: Some(8),
            progress: 0,
            ..TesterConfig::default()
        };
        let logger = BufferLogger::new();
        let report = check_with_logger(
            config,
            logger.clone(),
            |args: &[Value]| args[0].as_bool().is_some(),
            &[Descriptor::boolean()],
        )
        .unwrap();
        assert_eq!(report.name, DEFAULT_TEST_NAME);
        assert_eq!(report.passed, 10);
        assert_eq!(
            logger.contents(),
            "unnamed_test: PASS (passed=10, failed=0, skipped=0, errored=0)\n"
        );
    }
}
