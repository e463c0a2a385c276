//! Declarative macros for writing properties with less ceremony.

/// Build a `[Descriptor; N]` from anything convertible into a descriptor
///
/// ```rust
/// use randtest::{Descriptor, descriptors};
///
/// let args = descriptors![10, -2.5, "3,6 a-z", true];
/// assert_eq!(args.len(), 4);
/// assert!(matches!(args[3], Descriptor::Bool));
/// ```
#[macro_export]
macro_rules! descriptors {
    ($($descriptor:expr),* $(,)?) => {
        [$($crate::Descriptor::from($descriptor)),*]
    };
}

/// Run a predicate over the given descriptors and return the report
///
/// ```rust
/// use randtest::{Value, property};
///
/// let report = property!([100], count = 20, seed = 7, |args: &[Value]| {
///     args[0].as_int().is_some_and(|n| (0..100).contains(&n))
/// })
/// .unwrap();
/// assert!(report.is_success());
/// ```
#[macro_export]
macro_rules! property {
    ([$($descriptor:expr),* $(,)?], $predicate:expr) => {{
        $crate::check($predicate, &$crate::descriptors![$($descriptor),*])
    }};

    ([$($descriptor:expr),* $(,)?], count = $count:expr, $predicate:expr) => {{
        $crate::check_with_config(
            $crate::TesterConfig {
                count: $count,
                ..$crate::TesterConfig::default()
            },
            $predicate,
            &$crate::descriptors![$($descriptor),*],
        )
    }};

    ([$($descriptor:expr),* $(,)?], seed = $seed:expr, $predicate:expr) => {{
        $crate::check_with_config(
            $crate::TesterConfig {
                seed: Some($seed),
                ..$crate::TesterConfig::default()
            },
            $predicate,
            &$crate::descriptors![$($descriptor),*],
        )
    }};

    ([$($descriptor:expr),* $(,)?], count = $count:expr, seed = $seed:expr, $predicate:expr) => {{
        $crate::check_with_config(
            $crate::TesterConfig {
                count: $count,
                seed: Some($seed),
                ..$crate::TesterConfig::default()
            },
            $predicate,
            &$crate::descriptors![$($descriptor),*],
        )
    }};
}

/// Panic unless the property passes every trial
///
/// ```rust
/// use randtest::{Value, assert_property};
///
/// assert_property!(["1,8 %l"], |args: &[Value]| {
///     args[0].as_str().is_some_and(|s| s.chars().all(|c| c.is_ascii_lowercase()))
/// });
/// ```
#[macro_export]
macro_rules! assert_property {
    ([$($descriptor:expr),* $(,)?], $predicate:expr) => {
        $crate::assert_property!([$($descriptor),*], $predicate, "Property assertion failed")
    };

    ([$($descriptor:expr),* $(,)?], $predicate:expr, $msg:expr) => {{
        match $crate::property!([$($descriptor),*], $predicate) {
            Ok(report) if report.is_success() => {}
            Ok(report) => match report.first_failure() {
                Some(record) => panic!("{}: {}\n{}", $msg, report, record),
                None => panic!("{}: {}", $msg, report),
            },
            Err(error) => panic!("{}: {}", $msg, error),
        }
    }};
}

#[cfg(test)]
mod tests {
    use crate::{Descriptor, Outcome, RunStatus, Value};

    #[test]
    fn test_descriptors_macro() {
        let args = descriptors![5, 1.5, "2 ab", false, ()];
        assert!(matches!(args[0], Descriptor::Int(5)));
        assert!(matches!(args[1], Descriptor::Float(_)));
        assert!(matches!(args[2], Descriptor::Pattern(_)));
        assert!(matches!(args[3], Descriptor::Bool));
        assert!(matches!(args[4], Descriptor::Nil));
    }

    #[test]
    fn test_property_macro_forms() {
        let report = property!([10], count = 30, seed = 1, |args: &[Value]| {
            args[0].as_int().is_some_and(|n| (0..10).contains(&n))
        })
        .unwrap();
        assert_eq!(report.passed, 30);

        let report = property!([-3, "1 x"], seed = 2, |_: &[Value]| Outcome::Fail).unwrap();
        assert_eq!(report.status, RunStatus::Fail);
    }

    #[test]
    fn test_assert_property_passes() {
        assert_property!([true], |args: &[Value]| args[0].as_bool().is_some());
    }

    #[test]
    #[should_panic(expected = "sums overflow")]
    fn test_assert_property_panics_on_failure() {
        assert_property!([1000], |_: &[Value]| false, "sums overflow");
    }
}
