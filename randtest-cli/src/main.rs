use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use randtest::{
    BackendKind, Descriptor, Logger, RunReport, StderrLogger, StdoutLogger, Tester, TesterConfig,
    Value, Verbosity, WriterLogger,
};
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod suite;

#[derive(Parser)]
#[command(name = "randtest")]
#[command(about = "Sample random descriptors and run the randtest self-check", long_about = None)]
#[command(version)]
struct Cli {
    /// Initial seed (defaults to the wall clock)
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    /// Random backend
    #[arg(short, long, global = true, value_enum)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Std,
    Small,
}

impl From<Backend> for BackendKind {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Std => BackendKind::Std,
            Backend::Small => BackendKind::Small,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate argument tuples from descriptors
    ///
    /// A descriptor is an integer bound (`10`, `-5`), a float bound (`2.5`),
    /// `bool`, or a string pattern such as `"3,8 a-z%d"`.
    Sample {
        /// Descriptors, one per argument
        #[arg(required = true, allow_negative_numbers = true)]
        descriptors: Vec<String>,

        /// Number of tuples to generate
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,

        /// Print each tuple as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Show the length range and charset a pattern compiles to
    Charset {
        /// Pattern such as "2,4 a-z%d"
        pattern: String,
    },
    /// Run the built-in property suite
    Selfcheck {
        #[command(flatten)]
        run: RunArgs,

        /// Also run a property that is expected to fail
        #[arg(long)]
        include_failing: bool,
    },
    /// Re-run one trial of a built-in property from a logged seed
    Replay {
        /// Property name as printed by selfcheck
        property: String,

        /// Seed from a FAIL or ERROR line
        trial_seed: u64,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Trials per property
    #[arg(short = 'n', long, default_value_t = randtest::config::DEFAULT_COUNT)]
    count: usize,

    /// Skip budget per property
    #[arg(long, default_value_t = randtest::config::DEFAULT_SKIPS)]
    skips: usize,

    /// Trials between progress dots (0 disables them)
    #[arg(long, default_value_t = randtest::config::DEFAULT_PROGRESS)]
    progress: usize,

    /// Print a line for every trial
    #[arg(short, long, conflicts_with = "error_only")]
    verbose: bool,

    /// Only report errors, not failures
    #[arg(long)]
    error_only: bool,

    /// Write the run log to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Print the reports as JSON
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn verbosity(&self) -> Verbosity {
        if self.error_only {
            Verbosity::ErrorOnly
        } else {
            Verbosity::from(self.verbose)
        }
    }

    fn logger(&self) -> Result<Box<dyn Logger>> {
        Ok(match &self.log {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create log file '{}'", path.display()))?;
                Box::new(WriterLogger::new(file))
            }
            // Keep stdout clean for the JSON document
            None if self.json => Box::new(StderrLogger),
            None => Box::new(StdoutLogger),
        })
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RANDTEST_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let backend = cli.backend.map(BackendKind::from).unwrap_or_else(BackendKind::detect);
    let seed = cli.seed.unwrap_or_else(randtest::rng::wall_clock_seed);
    tracing::info!(seed, backend = backend.name(), "starting");

    match cli.command {
        Commands::Sample {
            descriptors,
            count,
            json,
        } => sample(backend, seed, &descriptors, count, json),
        Commands::Charset { pattern } => show_charset(&pattern),
        Commands::Selfcheck {
            run,
            include_failing,
        } => selfcheck(backend, seed, &run, include_failing),
        Commands::Replay {
            property,
            trial_seed,
        } => replay(backend, seed, &property, trial_seed),
    }
}

fn parse_descriptor(text: &str) -> Result<Descriptor> {
    if text == "bool" {
        return Ok(Descriptor::boolean());
    }
    if let Ok(bound) = text.parse::<i64>() {
        return Ok(Descriptor::int(bound));
    }
    if !text.contains(' ')
        && let Ok(bound) = text.parse::<f64>()
    {
        return Ok(Descriptor::float(bound));
    }

    randtest::compile(text).with_context(|| format!("Invalid descriptor '{}'", text))?;
    Ok(Descriptor::pattern(text))
}

fn sample(
    backend: BackendKind,
    seed: u64,
    descriptors: &[String],
    count: usize,
    json: bool,
) -> Result<ExitCode> {
    let descriptors = descriptors
        .iter()
        .map(|text| parse_descriptor(text))
        .collect::<Result<Vec<_>>>()?;

    let mut rng = backend.create(seed);
    if !json {
        println!(
            "{}",
            format!("# seed={} backend={}", seed, backend.name()).bright_black()
        );
    }

    for _ in 0..count {
        let values = descriptors
            .iter()
            .map(|descriptor| descriptor.generate(rng.as_mut()))
            .collect::<Result<Vec<Value>, _>>()
            .context("Failed to generate a value")?;

        if json {
            println!("{}", serde_json::to_string(&values)?);
        } else {
            let line: Vec<String> = values.iter().map(Value::to_string).collect();
            println!("{}", line.join(", "));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn show_charset(pattern: &str) -> Result<ExitCode> {
    let compiled =
        randtest::compile(pattern).with_context(|| format!("Invalid pattern '{}'", pattern))?;

    println!("{}: {}..={}", "Length".bold(), compiled.low(), compiled.high());
    println!("{}: {}", "Size".bold(), compiled.charset().len());
    println!("{}: {:?}", "Charset".bold(), compiled.charset_string());
    Ok(ExitCode::SUCCESS)
}

fn selfcheck(
    backend: BackendKind,
    seed: u64,
    run: &RunArgs,
    include_failing: bool,
) -> Result<ExitCode> {
    let config = TesterConfig::new(run.count, Some(seed), run.skips, run.verbosity(), run.progress)
        .context("Invalid run configuration")?;

    let mut tester = Tester::builder()
        .config(config)
        .backend(backend)
        .log(run.logger()?)
        .build()
        .context("Failed to build tester")?;

    let mut checks = suite::passing();
    if include_failing {
        checks.push(suite::failing());
    }

    let mut reports = Vec::with_capacity(checks.len());
    for check in &checks {
        let report = tester
            .test(Some(check.name), check.predicate, &check.descriptors())
            .with_context(|| format!("Property '{}' could not run", check.name))?;
        reports.push(report);
    }

    let failures = reports.iter().filter(|report| !report.is_success()).count();
    if run.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_totals(&reports, failures);
    }

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_totals(reports: &[RunReport], failures: usize) {
    let line = format!(
        "{} properties, {} passed, {} not passed",
        reports.len(),
        reports.len() - failures,
        failures
    );
    if failures == 0 {
        println!("{}", line.green().bold());
        return;
    }

    println!("{}", line.red().bold());
    for report in reports.iter().filter(|report| !report.is_success()) {
        if let Some(record) = report.first_failure() {
            println!(
                "{}",
                format!("Reproduce: randtest replay {:?} {}", report.name, record.seed)
                    .bright_black()
            );
        }
    }
}

fn replay(backend: BackendKind, seed: u64, property: &str, trial_seed: u64) -> Result<ExitCode> {
    let Some(check) = suite::find(property) else {
        bail!("Unknown property '{}'", property);
    };

    let mut tester = Tester::builder()
        .seed(seed)
        .backend(backend)
        .build()
        .context("Failed to build tester")?;
    let record = tester
        .replay(check.predicate, &check.descriptors(), trial_seed)
        .with_context(|| format!("Property '{}' could not run", check.name))?;

    let outcome = record.outcome.to_string();
    let outcome = if record.outcome.is_pass() {
        outcome.green()
    } else {
        outcome.red()
    };
    println!("{} seed={} {}", check.name.cyan().bold(), record.seed, outcome);
    for (index, value) in record.arguments.iter().enumerate() {
        println!("  arg[{}] = {}", index + 1, value);
    }

    Ok(if record.outcome.is_pass() || record.outcome.is_skip() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
