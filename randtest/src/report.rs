//! Logger capability, progress reporting and run results
//!
//! The tester never prints directly. Every line it produces is handed to a
//! [`Logger`], which makes the output destination (stdout, a file, an in-memory
//! buffer) a choice of the caller.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use crate::config::Verbosity;
use crate::property::Outcome;
use crate::value::Value;

/// Destination for the tester's text output
pub trait Logger {
    /// Write already formatted text; failures are the logger's own business
    fn write(&mut self, text: &str);
}

impl<L: Logger + ?Sized> Logger for Box<L> {
    fn write(&mut self, text: &str) {
        (**self).write(text)
    }
}

impl<L: Logger + ?Sized> Logger for &mut L {
    fn write(&mut self, text: &str) {
        (**self).write(text)
    }
}

/// Writes to standard output, flushing after every write
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutLogger;

impl Logger for StdoutLogger {
    fn write(&mut self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

/// Writes to standard error
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrLogger;

impl Logger for StderrLogger {
    fn write(&mut self, text: &str) {
        let _ = io::stderr().lock().write_all(text.as_bytes());
    }
}

/// Writes to any [`io::Write`], such as a file
#[derive(Debug)]
pub struct WriterLogger<W> {
    writer: W,
}

impl<W: Write> WriterLogger<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Logger for WriterLogger<W> {
    fn write(&mut self, text: &str) {
        let _ = self.writer.write_all(text.as_bytes());
        let _ = self.writer.flush();
    }
}

/// Collects output in a buffer shared between clones
///
/// Hand one clone to the tester and keep another to read what was written.
#[derive(Debug, Default, Clone)]
pub struct BufferLogger {
    buffer: Rc<RefCell<String>>,
}

impl BufferLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        self.buffer.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.buffer.borrow().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.buffer.borrow_mut().clear();
    }
}

impl Logger for BufferLogger {
    fn write(&mut self, text: &str) {
        self.buffer.borrow_mut().push_str(text);
    }
}

/// State handed to the progress hook after each reported trial
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub name: &'a str,
    /// 1-based trial number
    pub trial: usize,
    pub count: usize,
    pub seed: u64,
    pub outcome: &'a Outcome,
    pub verbosity: Verbosity,
    /// Trials between progress dots
    pub interval: usize,
}

/// Replacement for [`default_progress`]
pub type ProgressHook = Box<dyn FnMut(&Progress<'_>, &mut dyn Logger)>;

/// One line per trial when verbose, otherwise a dot every `interval` trials
pub fn default_progress(progress: &Progress<'_>, log: &mut dyn Logger) {
    match progress.verbosity {
        Verbosity::Verbose => log.write(&format!(
            "{}: trial {}/{} seed={} {}\n",
            progress.name, progress.trial, progress.count, progress.seed, progress.outcome
        )),
        Verbosity::Quiet | Verbosity::ErrorOnly => {
            if progress.interval > 0 && progress.trial % progress.interval == 0 {
                log.write(".");
            }
        }
    }
}

pub(crate) fn format_failure(name: &str, seed: u64, passed: usize, failed: usize) -> String {
    format!(
        "{}: FAIL seed={} (passed={}, failed={})\n",
        name, seed, passed, failed
    )
}

pub(crate) fn format_error(name: &str, seed: u64, message: &str) -> String {
    format!("{}: ERROR seed={}: {}\n", name, seed, message)
}

pub(crate) fn format_arguments(arguments: &[Value]) -> String {
    arguments
        .iter()
        .enumerate()
        .map(|(index, value)| format!("  arg[{}] = {}\n", index + 1, value))
        .collect()
}

pub(crate) fn format_skip_abort(
    name: &str,
    skipped: usize,
    budget: usize,
    executed: usize,
    count: usize,
) -> String {
    format!(
        "{}: WARNING {} trials skipped (budget {}), aborting after {} of {} trials\n",
        name, skipped, budget, executed, count
    )
}

/// Final verdict of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RunStatus {
    /// Every executed trial passed or was skipped within budget
    Pass,
    /// At least one trial failed or errored
    Fail,
    /// The skip budget ran out before all trials executed
    Incomplete,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Pass => f.write_str("PASS"),
            RunStatus::Fail => f.write_str("FAIL"),
            RunStatus::Incomplete => f.write_str("INCOMPLETE"),
        }
    }
}

/// One executed trial, kept for failures and errors and returned by replays
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TrialRecord {
    /// 1-based trial number
    pub trial: usize,
    /// Seed that reproduces this trial through [`Tester::replay`](crate::Tester::replay)
    pub seed: u64,
    pub outcome: Outcome,
    pub arguments: Vec<Value>,
}

impl fmt::Display for TrialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "trial {} seed={} {}", self.trial, self.seed, self.outcome)?;
        write!(f, "{}", format_arguments(&self.arguments))
    }
}

/// Result of a [`Tester::test`](crate::Tester::test) run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RunReport {
    pub name: String,
    pub status: RunStatus,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errored: usize,
    /// Configured number of trials
    pub count: usize,
    /// Seed the run started from
    pub initial_seed: u64,
    /// Failing and erroring trials, in order
    pub records: Vec<TrialRecord>,
}

impl RunReport {
    /// Number of trials that ran
    pub fn executed(&self) -> usize {
        self.passed + self.failed + self.skipped + self.errored
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Pass
    }

    /// The first failing or erroring trial
    pub fn first_failure(&self) -> Option<&TrialRecord> {
        self.records.first()
    }

    /// Serialize the report as JSON
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// The summary line written at the end of every run
impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (passed={}, failed={}, skipped={}, errored={})",
            self.name, self.status, self.passed, self.failed, self.skipped, self.errored
        )
    }
}
