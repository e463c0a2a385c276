//! Basic usage examples demonstrating the core randtest API
//!
//! Runs a few properties with default and custom configuration, then replays a
//! failing trial from its logged seed.

use randtest::{
    Descriptor, Outcome, Tester, TesterConfig, Value, Verbosity, check, check_with_config,
    descriptors,
};

// Example 1: Simple property with default configuration
fn example_1_basic_property() {
    println!("=== Example 1: Basic Property Testing ===");

    let result = check(
        |args: &[Value]| {
            let (a, b) = (args[0].as_int().unwrap_or_default(), args[1].as_int().unwrap_or_default());
            a.wrapping_add(b) == b.wrapping_add(a)
        },
        &descriptors![-100, -100],
    );

    match result {
        Ok(report) => println!("✓ {} trials executed, status {}", report.executed(), report.status),
        Err(error) => println!("✗ Could not run: {}", error),
    }
}

// Example 2: Custom configuration and preconditions
fn example_2_custom_config() {
    println!("\n=== Example 2: Custom Configuration ===");

    let config = TesterConfig {
        count: 500,
        seed: Some(42),
        skips: 100,
        verbose: Verbosity::Quiet,
        progress: 50,
    };

    // Division only makes sense for a non-zero divisor; skip the rest
    let result = check_with_config(
        config,
        |args: &[Value]| {
            let (a, b) = (args[0].as_int().unwrap_or_default(), args[1].as_int().unwrap_or_default());
            if b == 0 {
                return Outcome::Skip;
            }
            Outcome::from((a / b) * b + a % b == a)
        },
        &descriptors![-1000, -10],
    );

    if let Ok(report) = result {
        println!("✓ passed={} skipped={}", report.passed, report.skipped);
    }
}

// Example 3: A failing property and its replay
fn example_3_replay() {
    println!("\n=== Example 3: Replaying a Failure ===");

    let descriptors = [Descriptor::pattern("0,12 %l"), Descriptor::int(100)];
    let property = |args: &[Value]| args[0].as_str().is_some_and(|s| s.len() < 10);

    let mut tester = match Tester::builder().count(50).seed(7).build() {
        Ok(tester) => tester,
        Err(error) => {
            println!("✗ Invalid configuration: {}", error);
            return;
        }
    };

    let Ok(report) = tester.test(Some("words are short"), property, &descriptors) else {
        return;
    };

    if let Some(failure) = report.first_failure()
        && let Ok(replayed) = tester.replay(property, &descriptors, failure.seed)
    {
        println!("Replayed seed {}:", replayed.seed);
        print!("{}", replayed);
    }
}

fn main() {
    example_1_basic_property();
    example_2_custom_config();
    example_3_replay();
}
