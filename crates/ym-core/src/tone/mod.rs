//! Tone digits, tone-marked tokens and the 3-digit tone contexts used as
//! pronunciation keys.

mod context;
mod pattern;
mod sandhi;

pub use context::{build_contexts, ContextKey};
pub use pattern::WildcardPattern;
pub use sandhi::apply_third_tone_sandhi;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Syllable carried by sentinel tokens at run boundaries.
pub const SENTINEL_SYLLABLE: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("tone context must be exactly 3 characters: {0:?}")]
    Length(String),
    #[error("invalid tone character {ch:?} in {input:?}")]
    InvalidChar { input: String, ch: char },
    #[error("middle tone of {0:?} must be tone-bearing (1-5)")]
    BoundaryMiddle(String),
    #[error("line break in pronunciation field {0:?}")]
    LineBreak(String),
}

/// A tone digit: 0 marks a boundary or non-syllabic slot, 1-4 are the four
/// lexical tones and 5 is the neutral tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tone(u8);

impl Tone {
    pub const BOUNDARY: Tone = Tone(0);
    pub const FIRST: Tone = Tone(1);
    pub const SECOND: Tone = Tone(2);
    pub const THIRD: Tone = Tone(3);
    pub const FOURTH: Tone = Tone(4);
    pub const NEUTRAL: Tone = Tone(5);

    pub fn new(digit: u8) -> Option<Self> {
        (digit <= 5).then_some(Tone(digit))
    }

    pub fn from_char(c: char) -> Option<Self> {
        c.to_digit(10).and_then(|d| Tone::new(d as u8))
    }

    pub fn digit(self) -> u8 {
        self.0
    }

    pub fn as_char(self) -> char {
        (b'0' + self.0) as char
    }

    pub fn is_boundary(self) -> bool {
        self.0 == 0
    }

    /// All digits, boundary included.
    pub fn all() -> impl Iterator<Item = Tone> {
        (0..=5).map(Tone)
    }

    /// Tone-bearing digits only (1-5).
    pub fn bearing() -> impl Iterator<Item = Tone> {
        (1..=5).map(Tone)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A syllable with its tone, as produced by an annotator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneToken {
    pub syllable: String,
    pub tone: Tone,
}

impl ToneToken {
    pub fn new(syllable: impl Into<String>, tone: Tone) -> Self {
        Self {
            syllable: syllable.into(),
            tone,
        }
    }

    /// Boundary marker inserted at both ends of a sequence and between runs.
    pub fn sentinel() -> Self {
        Self::new(SENTINEL_SYLLABLE, Tone::BOUNDARY)
    }

    /// Parse the `TONE3` notation (`"hao3"`, `"ma5"`). A token without a
    /// trailing digit in 0-5 is treated as non-syllabic (tone 0).
    pub fn parse_numbered(s: &str) -> Self {
        match s.chars().last().and_then(Tone::from_char) {
            Some(tone) => Self::new(&s[..s.len() - 1], tone),
            None => Self::new(s, Tone::BOUNDARY),
        }
    }
}

/// Tone context key: previous, own and next tone digits.
///
/// Any digit combination is representable so that boundary slots can be
/// queried; only [`ToneContext::validate_entry`] contexts may be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToneContext([Tone; 3]);

impl ToneContext {
    pub fn new(prev: Tone, own: Tone, next: Tone) -> Self {
        Self([prev, own, next])
    }

    pub fn prev(self) -> Tone {
        self.0[0]
    }

    pub fn own(self) -> Tone {
        self.0[1]
    }

    pub fn next(self) -> Tone {
        self.0[2]
    }

    /// Reject contexts whose own tone is the boundary digit.
    pub fn validate_entry(self) -> Result<Self, FormatError> {
        if self.own().is_boundary() {
            return Err(FormatError::BoundaryMiddle(self.to_string()));
        }
        Ok(self)
    }

    /// Parse a context that is allowed to carry a lexical entry.
    pub fn parse_entry(s: &str) -> Result<Self, FormatError> {
        s.parse::<Self>()?.validate_entry()
    }

    /// Every insertable context: 6 × 5 × 6 = 180 combinations.
    pub fn all_valid() -> impl Iterator<Item = ToneContext> {
        Tone::all().flat_map(|p| {
            Tone::bearing().flat_map(move |o| Tone::all().map(move |n| ToneContext::new(p, o, n)))
        })
    }
}

impl FromStr for ToneContext {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 3 {
            return Err(FormatError::Length(s.to_string()));
        }
        let mut tones = [Tone::BOUNDARY; 3];
        for (slot, &ch) in tones.iter_mut().zip(&chars) {
            *slot = Tone::from_char(ch).ok_or_else(|| FormatError::InvalidChar {
                input: s.to_string(),
                ch,
            })?;
        }
        Ok(Self(tones))
    }
}

impl TryFrom<String> for ToneContext {
    type Error = FormatError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ToneContext> for String {
    fn from(ctx: ToneContext) -> Self {
        ctx.to_string()
    }
}

impl fmt::Display for ToneContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.0[0], self.0[1], self.0[2])
    }
}
