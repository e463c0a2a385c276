//! Built-in properties run by `randtest selfcheck`.

use randtest::{Descriptor, GenerationError, Outcome, RandomSource, Value};

/// A named property over fixed descriptors
pub struct SelfCheck {
    pub name: &'static str,
    pub predicate: fn(&[Value]) -> Outcome,
    descriptors: fn() -> Vec<Descriptor>,
}

impl SelfCheck {
    pub fn descriptors(&self) -> Vec<Descriptor> {
        (self.descriptors)()
    }
}

/// Every property that is expected to hold
pub fn passing() -> Vec<SelfCheck> {
    vec![
        SelfCheck {
            name: "integer range",
            predicate: integer_range,
            descriptors: || vec![Descriptor::int(-1000), Descriptor::int(1000)],
        },
        SelfCheck {
            name: "float range",
            predicate: float_range,
            descriptors: || vec![Descriptor::float(10.5)],
        },
        SelfCheck {
            name: "hex pattern",
            predicate: hex_pattern,
            descriptors: || vec![Descriptor::pattern("1,16 %x")],
        },
        SelfCheck {
            name: "reverse twice",
            predicate: reverse_twice,
            descriptors: || vec![Descriptor::pattern("0,24 %w %p")],
        },
        SelfCheck {
            name: "sort idempotent",
            predicate: sort_idempotent,
            descriptors: || vec![Descriptor::function(int_list)],
        },
        SelfCheck {
            name: "xor is inequality",
            predicate: xor_is_inequality,
            descriptors: || vec![Descriptor::boolean(), Descriptor::boolean()],
        },
    ]
}

/// A property that fails for some inputs, to show failure reports
pub fn failing() -> SelfCheck {
    SelfCheck {
        name: "words are short",
        predicate: words_are_short,
        descriptors: || vec![Descriptor::pattern("0,12 %l")],
    }
}

/// Look up a property by name, including the failing one
pub fn find(name: &str) -> Option<SelfCheck> {
    passing()
        .into_iter()
        .chain(std::iter::once(failing()))
        .find(|check| check.name == name)
}

fn int_list(rng: &mut dyn RandomSource) -> Result<Value, GenerationError> {
    let len = rng.get_int(20)?;
    let items = (0..len)
        .map(|_| rng.get_int_range(-50, 50).map(Value::Int))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::List(items))
}

fn integer_range(args: &[Value]) -> Outcome {
    let low = args[0].as_int().is_some_and(|n| (-1000..1000).contains(&n));
    let high = args[1].as_int().is_some_and(|n| (0..1000).contains(&n));
    Outcome::from(low && high)
}

fn float_range(args: &[Value]) -> Outcome {
    Outcome::from(args[0].as_float().is_some_and(|x| (0.0..10.0).contains(&x)))
}

fn hex_pattern(args: &[Value]) -> Outcome {
    Outcome::from(args[0].as_str().is_some_and(|s| {
        (1..=16).contains(&s.len()) && s.chars().all(|c| c.is_ascii_hexdigit())
    }))
}

fn reverse_twice(args: &[Value]) -> Outcome {
    let Some(text) = args[0].as_str() else {
        return Outcome::Error("expected a string".to_string());
    };
    if text.is_empty() {
        return Outcome::Skip;
    }
    let reversed: String = text.chars().rev().collect();
    Outcome::from(reversed.chars().rev().collect::<String>() == text)
}

fn sort_idempotent(args: &[Value]) -> Outcome {
    let Some(items) = args[0].as_list() else {
        return Outcome::Error("expected a list".to_string());
    };
    let mut once: Vec<i64> = items.iter().filter_map(Value::as_int).collect();
    once.sort_unstable();
    let mut twice = once.clone();
    twice.sort_unstable();
    Outcome::from(once == twice && once.len() == items.len())
}

fn xor_is_inequality(args: &[Value]) -> Outcome {
    match (args[0].as_bool(), args[1].as_bool()) {
        (Some(a), Some(b)) => Outcome::from((a ^ b) == (a != b)),
        _ => Outcome::Error("expected two booleans".to_string()),
    }
}

fn words_are_short(args: &[Value]) -> Outcome {
    Outcome::from(args[0].as_str().is_some_and(|s| s.len() < 10))
}
