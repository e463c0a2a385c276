//! Compiler for the compact string pattern language.
//!
//! A pattern is a length specification followed by a single space and a charset
//! description:
//!
//! ```text
//! "8 abc"        exactly 8 characters drawn from a, b, c
//! "2,4 a-z"      2 to 4 lowercase letters
//! "1,10 %u%d_"   1 to 10 characters from uppercase letters, digits and '_'
//! ```
//!
//! In the charset description a `-` between two characters is an inclusive range
//! (a leading or trailing `-` is a literal dash) and `%` introduces a character
//! class. `%` followed by anything that is not a letter or digit escapes it, so
//! `%%` and `%-` are literals.
//!
//! ```rust
//! use randtest::pattern::compile;
//! use randtest::rng::StdSource;
//!
//! let pattern = compile("2,4 a-c").unwrap();
//! let mut rng = StdSource::new(42);
//! let text = pattern.generate(&mut rng);
//! assert!((2..=4).contains(&text.len()));
//! assert!(text.chars().all(|c| "abc".contains(c)));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::PatternError;
use crate::rng::RandomSource;

/// A named set of bytes selected with `%<tag>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// `%a`
    Letter,
    /// `%c`
    Control,
    /// `%d`
    Digit,
    /// `%g`, printable characters except space
    Graphic,
    /// `%l`
    Lower,
    /// `%p`
    Punctuation,
    /// `%s`
    Whitespace,
    /// `%u`
    Upper,
    /// `%w`
    Alphanumeric,
    /// `%x`
    HexDigit,
}

impl CharClass {
    /// Look up the class for a tag character
    pub fn from_tag(tag: char) -> Option<Self> {
        let class = match tag {
            'a' => CharClass::Letter,
            'c' => CharClass::Control,
            'd' => CharClass::Digit,
            'g' => CharClass::Graphic,
            'l' => CharClass::Lower,
            'p' => CharClass::Punctuation,
            's' => CharClass::Whitespace,
            'u' => CharClass::Upper,
            'w' => CharClass::Alphanumeric,
            'x' => CharClass::HexDigit,
            _ => return None,
        };
        Some(class)
    }

    /// Whether `byte` belongs to the class (C locale semantics)
    pub fn contains(self, byte: u8) -> bool {
        match self {
            CharClass::Letter => byte.is_ascii_alphabetic(),
            CharClass::Control => byte.is_ascii_control(),
            CharClass::Digit => byte.is_ascii_digit(),
            CharClass::Graphic => byte.is_ascii_graphic(),
            CharClass::Lower => byte.is_ascii_lowercase(),
            CharClass::Punctuation => byte.is_ascii_punctuation(),
            // isspace() also accepts vertical tab, which is_ascii_whitespace does not
            CharClass::Whitespace => matches!(byte, b' ' | b'\t'..=b'\r'),
            CharClass::Upper => byte.is_ascii_uppercase(),
            CharClass::Alphanumeric => byte.is_ascii_alphanumeric(),
            CharClass::HexDigit => byte.is_ascii_hexdigit(),
        }
    }

    /// Every byte value in the class, in ascending order
    pub fn members(self) -> impl Iterator<Item = char> {
        (0..=u8::MAX)
            .filter(move |byte| self.contains(*byte))
            .map(char::from)
    }
}

/// A compiled pattern: a length range and the charset to draw from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    low: usize,
    high: usize,
    charset: Vec<char>,
}

impl CompiledPattern {
    /// Minimum generated length
    pub fn low(&self) -> usize {
        self.low
    }

    /// Maximum generated length (inclusive)
    pub fn high(&self) -> usize {
        self.high
    }

    /// The compiled charset, duplicates included
    pub fn charset(&self) -> &[char] {
        &self.charset
    }

    /// The charset as a string
    pub fn charset_string(&self) -> String {
        self.charset.iter().collect()
    }

    /// Draw one character uniformly from the charset
    pub fn draw_char<R: RandomSource + ?Sized>(&self, rng: &mut R) -> char {
        let index = rng.uniform(0, self.charset.len() as i64) as usize;
        self.charset[index]
    }

    /// A reusable character generator borrowing this pattern
    pub fn char_generator(&self) -> impl Fn(&mut dyn RandomSource) -> char + '_ {
        move |rng| self.draw_char(rng)
    }

    /// Draw a length uniformly from `[low, high]`
    pub fn draw_length<R: RandomSource + ?Sized>(&self, rng: &mut R) -> usize {
        if self.low == self.high {
            self.low
        } else {
            rng.uniform(self.low as i64, self.high as i64 + 1) as usize
        }
    }

    /// Generate one string
    pub fn generate<R: RandomSource + ?Sized>(&self, rng: &mut R) -> String {
        let length = self.draw_length(rng);
        (0..length).map(|_| self.draw_char(rng)).collect()
    }
}

/// Compile a pattern such as `"2,4 a-z"`
pub fn compile(spec: &str) -> Result<CompiledPattern, PatternError> {
    let (count, body) = spec.split_once(' ').unwrap_or((spec, ""));
    let (low, high) = parse_count(spec, count)?;
    let charset = parse_charset(spec, body)?;

    Ok(CompiledPattern { low, high, charset })
}

fn parse_count(spec: &str, count: &str) -> Result<(usize, usize), PatternError> {
    if count.is_empty() {
        return Err(PatternError::MissingCount {
            spec: spec.to_string(),
        });
    }

    let malformed = || PatternError::MalformedCount {
        spec: spec.to_string(),
        count: count.to_string(),
    };
    let number = |digits: &str| -> Result<usize, PatternError> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        // Lengths are drawn from an inclusive i64 range, so the high end needs headroom
        let value: i64 = digits.parse().map_err(|_| malformed())?;
        if value == i64::MAX {
            return Err(malformed());
        }
        usize::try_from(value).map_err(|_| malformed())
    };

    let (low, high) = match count.split_once(',') {
        Some((low, high)) => (number(low)?, number(high)?),
        None => {
            let exact = number(count)?;
            (exact, exact)
        }
    };

    if low > high {
        return Err(PatternError::InvertedCount { low, high });
    }
    Ok((low, high))
}

fn parse_charset(spec: &str, body: &str) -> Result<Vec<char>, PatternError> {
    let chars: Vec<char> = body.chars().collect();
    let mut charset = Vec::new();
    // Last literal character, the only thing a following '-' can start a range from
    let mut range_start: Option<char> = None;
    let mut index = 0;

    while index < chars.len() {
        match (chars[index], range_start) {
            ('%', _) => {
                let tag = *chars
                    .get(index + 1)
                    .ok_or_else(|| PatternError::DanglingEscape {
                        spec: spec.to_string(),
                    })?;
                if tag.is_ascii_alphanumeric() {
                    let class =
                        CharClass::from_tag(tag).ok_or(PatternError::UnknownClass { tag })?;
                    charset.extend(class.members());
                    range_start = None;
                } else {
                    charset.push(tag);
                    range_start = Some(tag);
                }
                index += 2;
            }
            ('-', Some(from)) if index + 1 < chars.len() => {
                let to = chars[index + 1];
                if (to as u32) <= (from as u32) {
                    return Err(PatternError::InvalidRange { from, to });
                }
                // `from` itself was already pushed as a literal
                charset.extend((from as u32 + 1..=to as u32).filter_map(char::from_u32));
                range_start = None;
                index += 2;
            }
            (literal, _) => {
                charset.push(literal);
                range_start = Some(literal);
                index += 1;
            }
        }
    }

    if charset.is_empty() {
        return Err(PatternError::EmptyCharset {
            spec: spec.to_string(),
        });
    }
    Ok(charset)
}

/// A pattern compiler that remembers what it has already compiled
///
/// Compilation is a pure function of the spec, so caching never changes the
/// generated output.
#[derive(Debug, Default)]
pub struct PatternCompiler {
    cache: HashMap<String, Arc<CompiledPattern>>,
}

impl PatternCompiler {
    /// Create a compiler with an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `spec`, reusing an earlier compilation when available
    pub fn compile(&mut self, spec: &str) -> Result<Arc<CompiledPattern>, PatternError> {
        if let Some(compiled) = self.cache.get(spec) {
            return Ok(Arc::clone(compiled));
        }
        let compiled = Arc::new(compile(spec)?);
        self.cache.insert(spec.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Number of cached patterns
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether nothing has been compiled yet
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Forget every cached pattern
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
