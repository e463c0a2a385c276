//! Seeded random sources and backend selection.
//!
//! Everything that draws random data goes through the [`RandomSource`] capability.
//! Two interchangeable backends implement it via [`SeededRng`]: the ChaCha based
//! [`StdRng`] and the faster [`SmallRng`]. Which one a [`Tester`](crate::Tester) gets
//! by default is decided once per process by [`BackendKind::detect`].

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{SmallRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};

use crate::error::{PatternError, RngError};
use crate::pattern;

/// Environment variable that overrides backend detection (`std` or `small`)
pub const BACKEND_ENV_VAR: &str = "RANDTEST_RNG";

/// Largest integer an `f64` holds without losing precision
pub const FLOAT_PRECISION_LIMIT: u64 = 1 << f64::MANTISSA_DIGITS;

/// Capability interface for a seedable uniform random source
///
/// Implementors only provide the seed handling and the two raw draws; the checked
/// `get_*` operations are derived from them so that every backend shares the same
/// bounds validation and the same bool/float construction.
pub trait RandomSource {
    /// The seed the current sequence was started from
    fn seed(&self) -> u64;

    /// Restart the sequence so that every later draw is determined by `seed`
    fn set_seed(&mut self, seed: u64);

    /// Maximum seed value this source reproduces faithfully
    fn limit(&self) -> u64;

    /// Short name of the backend, used in diagnostics
    fn backend_name(&self) -> &'static str;

    /// Uniform integer in `[low, high)`; callers guarantee `low < high`
    fn uniform(&mut self, low: i64, high: i64) -> i64;

    /// Uniform fraction in `[0, 1)`
    fn fraction(&mut self) -> f64;

    /// Uniform boolean, defined as `get_int(2) == 1`
    fn get_bool(&mut self) -> bool {
        matches!(self.get_int(2), Ok(1))
    }

    /// Integer in `[0, bound)`
    fn get_int(&mut self, bound: i64) -> Result<i64, RngError> {
        if bound <= 1 {
            return Err(RngError::invalid_argument(
                "get_int",
                format!("bound must be greater than 1, got {}", bound),
            ));
        }
        Ok(self.uniform(0, bound))
    }

    /// Integer in `[low, high)`
    fn get_int_range(&mut self, low: i64, high: i64) -> Result<i64, RngError> {
        if high <= low {
            return Err(RngError::invalid_argument(
                "get_int",
                format!("high ({}) must be greater than low ({})", high, low),
            ));
        }
        Ok(self.uniform(low, high))
    }

    /// Float in `[0, bound)`, built as an integer draw plus a uniform fraction
    fn get_float(&mut self, bound: i64) -> Result<f64, RngError> {
        let whole = self.get_int(bound)?;
        Ok(add_fraction(whole, self.fraction()))
    }

    /// Float in `[low, high)`, built as an integer draw plus a uniform fraction
    fn get_float_range(&mut self, low: i64, high: i64) -> Result<f64, RngError> {
        let whole = self.get_int_range(low, high)?;
        Ok(add_fraction(whole, self.fraction()))
    }

    /// Compile `spec` and generate one string from it
    fn get_string(&mut self, spec: &str) -> Result<String, PatternError> {
        let compiled = pattern::compile(spec)?;
        Ok(compiled.generate(self))
    }
}

/// `whole + fraction`, kept strictly below `whole + 1` when rounding would reach it
fn add_fraction(whole: i64, fraction: f64) -> f64 {
    let value = whole as f64 + fraction;
    let upper = (whole + 1) as f64;
    if value < upper {
        value
    } else if upper > 0.0 {
        f64::from_bits(upper.to_bits() - 1)
    } else if upper < 0.0 {
        f64::from_bits(upper.to_bits() + 1)
    } else {
        -f64::from_bits(1)
    }
}

/// A `rand` generator usable as a [`SeededRng`] backend
pub trait Backend: RngCore + SeedableRng {
    /// Name reported by [`RandomSource::backend_name`]
    const NAME: &'static str;
    /// Largest seed the backend is expected to reproduce
    const SEED_CAP: u64;
}

impl Backend for StdRng {
    const NAME: &'static str = "std";
    const SEED_CAP: u64 = u64::MAX;
}

impl Backend for SmallRng {
    const NAME: &'static str = "small";
    const SEED_CAP: u64 = u32::MAX as u64;
}

/// A [`RandomSource`] over any [`Backend`]
#[derive(Debug, Clone)]
pub struct SeededRng<B> {
    seed: u64,
    inner: B,
}

/// The preferred, ChaCha based source
pub type StdSource = SeededRng<StdRng>;

/// The fast fallback source
pub type SmallSource = SeededRng<SmallRng>;

impl<B: Backend> SeededRng<B> {
    /// Create a source positioned at the start of `seed`'s sequence
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: B::seed_from_u64(seed),
        }
    }
}

impl<B: Backend> RandomSource for SeededRng<B> {
    fn seed(&self) -> u64 {
        self.seed
    }

    fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.inner = B::seed_from_u64(seed);
    }

    fn limit(&self) -> u64 {
        FLOAT_PRECISION_LIMIT.min(B::SEED_CAP)
    }

    fn backend_name(&self) -> &'static str {
        B::NAME
    }

    fn uniform(&mut self, low: i64, high: i64) -> i64 {
        self.inner.gen_range(low..high)
    }

    fn fraction(&mut self) -> f64 {
        self.inner.r#gen::<f64>()
    }
}

/// The available backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// [`StdRng`], preferred
    Std,
    /// [`SmallRng`], fallback
    Small,
}

static DETECTED_BACKEND: OnceLock<BackendKind> = OnceLock::new();

impl BackendKind {
    /// Parse a backend name as accepted by [`BACKEND_ENV_VAR`]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "std" | "chacha" => Some(BackendKind::Std),
            "small" | "fast" => Some(BackendKind::Small),
            _ => None,
        }
    }

    /// The backend's short name
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Std => StdRng::NAME,
            BackendKind::Small => SmallRng::NAME,
        }
    }

    /// The process-wide default backend, probed on first use
    pub fn detect() -> Self {
        *DETECTED_BACKEND.get_or_init(|| {
            let kind = Self::probe(std::env::var(BACKEND_ENV_VAR).ok().as_deref());
            tracing::debug!(backend = kind.name(), "selected random backend");
            kind
        })
    }

    /// Pick a backend from an optional override, preferring [`BackendKind::Std`]
    pub fn probe(requested: Option<&str>) -> Self {
        match requested {
            Some(name) => Self::from_name(name).unwrap_or_else(|| {
                tracing::warn!(
                    requested = name,
                    "unknown random backend, falling back to std"
                );
                BackendKind::Std
            }),
            None => BackendKind::Std,
        }
    }

    /// Create a source of this kind
    pub fn create(self, seed: u64) -> Box<dyn RandomSource> {
        match self {
            BackendKind::Std => Box::new(StdSource::new(seed)),
            BackendKind::Small => Box::new(SmallSource::new(seed)),
        }
    }
}

/// Create a source on the detected default backend
pub fn default_source(seed: u64) -> Box<dyn RandomSource> {
    BackendKind::detect().create(seed)
}

/// A seed derived from the wall clock
pub fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_sequence(source: &mut dyn RandomSource) -> Vec<String> {
        vec![
            source.get_int(1000).unwrap().to_string(),
            source.get_int_range(-50, 50).unwrap().to_string(),
            source.get_float(10).unwrap().to_string(),
            source.get_bool().to_string(),
            source.get_string("3,8 a-z%d").unwrap(),
        ]
    }

    #[test]
    fn test_identical_seeds_produce_identical_sequences() {
        for kind in [BackendKind::Std, BackendKind::Small] {
            let mut first = kind.create(12345);
            let mut second = kind.create(12345);
            assert_eq!(draw_sequence(&mut *first), draw_sequence(&mut *second));
        }
    }

    #[test]
    fn test_set_seed_restarts_sequence() {
        let mut source = StdSource::new(1);
        let initial = draw_sequence(&mut source);

        source.set_seed(99);
        let _ = draw_sequence(&mut source);
        source.set_seed(1);

        assert_eq!(source.seed(), 1);
        assert_eq!(draw_sequence(&mut source), initial);
    }

    #[test]
    fn test_get_int_range_laws() {
        let mut source = StdSource::new(7);
        for _ in 0..1000 {
            let value = source.get_int(5).unwrap();
            assert!((0..5).contains(&value));

            let value = source.get_int_range(-3, 4).unwrap();
            assert!((-3..4).contains(&value));
        }
    }

    #[test]
    fn test_get_int_rejects_degenerate_bounds() {
        let mut source = StdSource::new(7);
        assert!(source.get_int(1).is_err());
        assert!(source.get_int(0).is_err());
        assert!(source.get_int(-4).is_err());
        assert!(source.get_int_range(3, 3).is_err());
        assert!(source.get_int_range(4, 3).is_err());
        assert!(source.get_float(1).is_err());
        assert!(source.get_float_range(2, -2).is_err());
    }

    #[test]
    fn test_get_float_stays_in_half_open_interval() {
        let mut source = SmallSource::new(3);
        for _ in 0..1000 {
            let value = source.get_float(3).unwrap();
            assert!((0.0..3.0).contains(&value));

            let value = source.get_float_range(-5, 5).unwrap();
            assert!((-5.0..5.0).contains(&value));
        }
    }

    #[test]
    fn test_add_fraction_never_reaches_next_integer() {
        let almost_one = 1.0 - f64::EPSILON / 2.0;
        assert!(add_fraction(2, almost_one) < 3.0);
        assert!(add_fraction(-3, almost_one) < -2.0);
        assert!(add_fraction(-1, almost_one) < 0.0);
        assert_eq!(add_fraction(4, 0.5), 4.5);
    }

    #[test]
    fn test_get_bool_produces_both_values() {
        let mut source = StdSource::new(11);
        let draws: Vec<bool> = (0..200).map(|_| source.get_bool()).collect();
        assert!(draws.contains(&true));
        assert!(draws.contains(&false));
    }

    #[test]
    fn test_limit_respects_float_precision_and_seed_cap() {
        assert_eq!(StdSource::new(0).limit(), FLOAT_PRECISION_LIMIT);
        assert_eq!(SmallSource::new(0).limit(), u32::MAX as u64);
    }

    #[test]
    fn test_backend_probe() {
        assert_eq!(BackendKind::probe(None), BackendKind::Std);
        assert_eq!(BackendKind::probe(Some("small")), BackendKind::Small);
        assert_eq!(BackendKind::probe(Some(" STD ")), BackendKind::Std);
        assert_eq!(BackendKind::probe(Some("mersenne")), BackendKind::Std);

        assert_eq!(BackendKind::Small.create(5).backend_name(), "small");
        assert_eq!(BackendKind::Std.create(5).backend_name(), "std");
    }

    #[test]
    fn test_default_source_is_stable_within_process() {
        let first = default_source(1).backend_name();
        let second = default_source(2).backend_name();
        assert_eq!(first, second);
        assert_eq!(BackendKind::detect(), BackendKind::detect());
    }
}
