//! Descriptor-driven generation of arbitrary argument values.
//!
//! A [`Descriptor`] states the random domain of one predicate argument. The shape of
//! the descriptor picks the generator: integers and floats produce numbers "shaped
//! like" the literal, strings are compiled as [patterns](crate::pattern), booleans
//! produce booleans, and functions or [`CustomGenerate`] implementors take over
//! generation entirely. New domains plug in through the last two without touching
//! the dispatcher.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::{GenerationError, PatternError, RngError};
use crate::pattern::{CompiledPattern, PatternCompiler};
use crate::rng::RandomSource;
use crate::value::Value;

/// A generator function usable as a descriptor
pub type GeneratorFn = Rc<dyn Fn(&mut dyn RandomSource) -> Result<Value, GenerationError>>;

/// Capability of a value that knows how to generate instances of its domain
pub trait CustomGenerate {
    fn custom_generate(&self, rng: &mut dyn RandomSource) -> Result<Value, GenerationError>;
}

/// An opaque domain object passed as a descriptor
///
/// Objects opt into generation by returning themselves from
/// [`as_custom_generate`](Domain::as_custom_generate); objects that do not are
/// rejected with [`GenerationError::MissingCapability`].
pub trait Domain: fmt::Debug {
    /// Name used in error messages
    fn shape(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn as_custom_generate(&self) -> Option<&dyn CustomGenerate> {
        None
    }
}

/// The random domain of one argument
#[derive(Clone)]
pub enum Descriptor {
    /// `n >= 0` draws from `[0, n)`, `n < 0` from `[n, -n)`
    Int(i64),
    /// Like [`Descriptor::Int`] over `floor(|x|)`, drawing floats
    Float(f64),
    /// A string pattern, see [`crate::pattern`]
    Pattern(String),
    Bool,
    Function(GeneratorFn),
    Custom(Rc<dyn CustomGenerate>),
    Object(Rc<dyn Domain>),
    /// The absent descriptor; always rejected
    Nil,
}

impl Descriptor {
    pub fn int(bound: i64) -> Self {
        Descriptor::Int(bound)
    }

    pub fn float(bound: f64) -> Self {
        Descriptor::Float(bound)
    }

    pub fn pattern(spec: impl Into<String>) -> Self {
        Descriptor::Pattern(spec.into())
    }

    pub fn boolean() -> Self {
        Descriptor::Bool
    }

    /// Use a closure as the generator
    pub fn function<F>(generator: F) -> Self
    where
        F: Fn(&mut dyn RandomSource) -> Result<Value, GenerationError> + 'static,
    {
        Descriptor::Function(Rc::new(generator))
    }

    pub fn custom(generator: impl CustomGenerate + 'static) -> Self {
        Descriptor::Custom(Rc::new(generator))
    }

    pub fn object(domain: impl Domain + 'static) -> Self {
        Descriptor::Object(Rc::new(domain))
    }

    /// Name of the descriptor's shape
    pub fn shape(&self) -> &'static str {
        match self {
            Descriptor::Int(_) => "integer",
            Descriptor::Float(_) => "float",
            Descriptor::Pattern(_) => "string",
            Descriptor::Bool => "boolean",
            Descriptor::Function(_) => "function",
            Descriptor::Custom(_) => "custom",
            Descriptor::Object(domain) => domain.shape(),
            Descriptor::Nil => "nil",
        }
    }

    /// Draw one value from this descriptor's domain
    pub fn generate(&self, rng: &mut dyn RandomSource) -> Result<Value, GenerationError> {
        generate(rng, self)
    }

    /// Compile any pattern up front so repeated draws skip the parser
    pub fn prepare(&self, compiler: &mut PatternCompiler) -> Result<PreparedDescriptor, PatternError> {
        let prepared = match self {
            Descriptor::Pattern(spec) => Prepared::Pattern(compiler.compile(spec)?),
            other => Prepared::Plain(other.clone()),
        };
        Ok(PreparedDescriptor(prepared))
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Int(bound) => f.debug_tuple("Int").field(bound).finish(),
            Descriptor::Float(bound) => f.debug_tuple("Float").field(bound).finish(),
            Descriptor::Pattern(spec) => f.debug_tuple("Pattern").field(spec).finish(),
            Descriptor::Bool => f.write_str("Bool"),
            Descriptor::Function(_) => f.write_str("Function(..)"),
            Descriptor::Custom(_) => f.write_str("Custom(..)"),
            Descriptor::Object(domain) => f.debug_tuple("Object").field(domain).finish(),
            Descriptor::Nil => f.write_str("Nil"),
        }
    }
}

/// Generate a value for `descriptor`
pub fn generate(
    rng: &mut dyn RandomSource,
    descriptor: &Descriptor,
) -> Result<Value, GenerationError> {
    match descriptor {
        Descriptor::Int(bound) => generate_int(rng, *bound),
        Descriptor::Float(bound) => generate_float(rng, *bound),
        Descriptor::Pattern(spec) => Ok(Value::Str(rng.get_string(spec)?)),
        Descriptor::Bool => Ok(Value::Bool(rng.get_bool())),
        Descriptor::Function(generator) => (**generator)(rng),
        Descriptor::Custom(generator) => generator.custom_generate(rng),
        Descriptor::Object(domain) => match domain.as_custom_generate() {
            Some(generator) => generator.custom_generate(rng),
            None => Err(GenerationError::MissingCapability {
                shape: domain.shape().to_string(),
            }),
        },
        Descriptor::Nil => Err(GenerationError::UnsupportedType {
            shape: descriptor.shape().to_string(),
        }),
    }
}

fn generate_int(rng: &mut dyn RandomSource, bound: i64) -> Result<Value, GenerationError> {
    let value = if bound < 0 {
        let high = bound.checked_neg().ok_or_else(|| {
            RngError::invalid_argument("generate", format!("bound {} cannot be mirrored", bound))
        })?;
        rng.get_int_range(bound, high)?
    } else {
        rng.get_int(bound)?
    };
    Ok(Value::Int(value))
}

fn generate_float(rng: &mut dyn RandomSource, bound: f64) -> Result<Value, GenerationError> {
    if !bound.is_finite() {
        return Err(RngError::invalid_argument(
            "generate",
            format!("float bound must be finite, got {}", bound),
        )
        .into());
    }

    let magnitude: i64 = num_traits::cast(bound.abs().floor()).ok_or_else(|| {
        RngError::invalid_argument(
            "generate",
            format!("float bound {} is outside the integer range", bound),
        )
    })?;
    let value = if bound < 0.0 {
        rng.get_float_range(-magnitude, magnitude)?
    } else {
        rng.get_float(magnitude)?
    };
    Ok(Value::Float(value))
}

#[derive(Clone)]
enum Prepared {
    Pattern(Arc<CompiledPattern>),
    Plain(Descriptor),
}

/// A descriptor whose pattern, if any, is already compiled
#[derive(Clone)]
pub struct PreparedDescriptor(Prepared);

impl PreparedDescriptor {
    /// Draw one value; identical to [`Descriptor::generate`] for the same RNG state
    pub fn generate(&self, rng: &mut dyn RandomSource) -> Result<Value, GenerationError> {
        match &self.0 {
            Prepared::Pattern(pattern) => Ok(Value::Str(pattern.generate(rng))),
            Prepared::Plain(descriptor) => generate(rng, descriptor),
        }
    }
}

impl fmt::Debug for PreparedDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Prepared::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
            Prepared::Plain(descriptor) => fmt::Debug::fmt(descriptor, f),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Descriptor {
                fn from(bound: $ty) -> Self {
                    Descriptor::Int(i64::from(bound))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Descriptor {
    fn from(bound: f32) -> Self {
        Descriptor::Float(f64::from(bound))
    }
}

impl From<f64> for Descriptor {
    fn from(bound: f64) -> Self {
        Descriptor::Float(bound)
    }
}

impl From<&str> for Descriptor {
    fn from(spec: &str) -> Self {
        Descriptor::Pattern(spec.to_string())
    }
}

impl From<String> for Descriptor {
    fn from(spec: String) -> Self {
        Descriptor::Pattern(spec)
    }
}

/// Any boolean selects the boolean domain
impl From<bool> for Descriptor {
    fn from(_: bool) -> Self {
        Descriptor::Bool
    }
}

impl From<()> for Descriptor {
    fn from(_: ()) -> Self {
        Descriptor::Nil
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::StdSource;

    #[derive(Debug)]
    struct Celsius;

    impl CustomGenerate for Celsius {
        fn custom_generate(&self, rng: &mut dyn RandomSource) -> Result<Value, GenerationError> {
            Ok(Value::Float(rng.get_float_range(-273, 1000)?))
        }
    }

    impl Domain for Celsius {
        fn as_custom_generate(&self) -> Option<&dyn CustomGenerate> {
            Some(self)
        }
    }

    #[derive(Debug)]
    struct Opaque;

    impl Domain for Opaque {}

    #[test]
    fn test_unsigned_int_descriptor() {
        let mut rng = StdSource::new(1);
        for _ in 0..500 {
            let value = generate(&mut rng, &Descriptor::from(5)).unwrap();
            assert!((0..5).contains(&value.as_int().unwrap()));
        }
    }

    #[test]
    fn test_signed_int_descriptor() {
        let mut rng = StdSource::new(2);
        let mut saw_negative = false;
        for _ in 0..500 {
            let value = generate(&mut rng, &Descriptor::from(-5)).unwrap().as_int().unwrap();
            assert!((-5..5).contains(&value));
            saw_negative |= value < 0;
        }
        assert!(saw_negative);
    }

    #[test]
    fn test_float_descriptors() {
        let mut rng = StdSource::new(3);
        for _ in 0..500 {
            let value = generate(&mut rng, &Descriptor::from(3.0)).unwrap();
            assert!(matches!(value, Value::Float(x) if (0.0..3.0).contains(&x)));

            let value = generate(&mut rng, &Descriptor::from(-3.0)).unwrap();
            assert!(matches!(value, Value::Float(x) if (-3.0..3.0).contains(&x)));

            let value = generate(&mut rng, &Descriptor::from(4.5)).unwrap();
            assert!(matches!(value, Value::Float(x) if (0.0..4.5).contains(&x)));
        }
    }

    #[test]
    fn test_degenerate_numeric_descriptors() {
        let mut rng = StdSource::new(4);
        assert!(matches!(
            generate(&mut rng, &Descriptor::Int(1)),
            Err(GenerationError::Rng(_))
        ));
        assert!(generate(&mut rng, &Descriptor::Int(0)).is_err());
        assert!(generate(&mut rng, &Descriptor::Int(i64::MIN)).is_err());
        assert!(generate(&mut rng, &Descriptor::Float(0.5)).is_err());
        assert!(generate(&mut rng, &Descriptor::Float(f64::NAN)).is_err());

        for bound in [1e300, -1e300, 9.3e18] {
            assert!(matches!(
                generate(&mut rng, &Descriptor::Float(bound)),
                Err(GenerationError::Rng(RngError::InvalidArgument { .. }))
            ));
        }
    }

    #[test]
    fn test_bool_and_pattern_descriptors() {
        let mut rng = StdSource::new(5);
        assert!(generate(&mut rng, &Descriptor::from(true)).unwrap().as_bool().is_some());
        assert!(generate(&mut rng, &Descriptor::from(false)).unwrap().as_bool().is_some());

        let value = generate(&mut rng, &Descriptor::from("4 xy")).unwrap();
        let text = value.as_str().unwrap();
        assert_eq!(text.len(), 4);
        assert!(text.chars().all(|c| c == 'x' || c == 'y'));

        assert!(matches!(
            generate(&mut rng, &Descriptor::from("4 9-0")),
            Err(GenerationError::Pattern(_))
        ));
    }

    #[test]
    fn test_function_descriptor() {
        let descriptor = Descriptor::function(|rng| {
            let length = rng.get_int_range(1, 4)?;
            let items = (0..length)
                .map(|_| rng.get_int(10).map(Value::Int))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(items))
        });

        let mut rng = StdSource::new(6);
        let value = descriptor.generate(&mut rng).unwrap();
        let items = value.as_list().unwrap();
        assert!((1..4).contains(&items.len()));
        assert_eq!(descriptor.shape(), "function");
    }

    #[test]
    fn test_custom_and_object_descriptors() {
        let mut rng = StdSource::new(7);

        let value = generate(&mut rng, &Descriptor::custom(Celsius)).unwrap();
        assert!((-273.0..1000.0).contains(&value.as_float().unwrap()));

        let value = generate(&mut rng, &Descriptor::object(Celsius)).unwrap();
        assert!(value.as_float().is_some());

        match generate(&mut rng, &Descriptor::object(Opaque)) {
            Err(GenerationError::MissingCapability { shape }) => assert!(shape.ends_with("Opaque")),
            other => panic!("expected missing capability, got {:?}", other),
        }
    }

    #[test]
    fn test_nil_descriptor_is_unsupported() {
        let mut rng = StdSource::new(8);
        assert_eq!(
            generate(&mut rng, &Descriptor::from(())),
            Err(GenerationError::UnsupportedType {
                shape: "nil".to_string()
            })
        );
    }

    #[test]
    fn test_prepared_descriptor_matches_direct_generation() {
        let mut compiler = PatternCompiler::new();
        let descriptors = [
            Descriptor::from("1,12 %w_"),
            Descriptor::from(100),
            Descriptor::from(-2.0),
            Descriptor::Bool,
        ];

        let mut direct = StdSource::new(99);
        let mut prepared = StdSource::new(99);
        for descriptor in &descriptors {
            let ready = descriptor.prepare(&mut compiler).unwrap();
            for _ in 0..20 {
                assert_eq!(
                    descriptor.generate(&mut direct).unwrap(),
                    ready.generate(&mut prepared).unwrap()
                );
            }
        }
        assert_eq!(compiler.len(), 1);
    }

    #[test]
    fn test_prepare_reports_pattern_errors() {
        let mut compiler = PatternCompiler::new();
        assert!(Descriptor::from("x abc").prepare(&mut compiler).is_err());
        assert!(Descriptor::Nil.prepare(&mut compiler).is_ok());
    }
}
