//! Lossless split of mixed text into alternating hanzi / non-hanzi runs.

use tracing::debug_span;

use crate::script::is_hanzi;

/// A fragment-count mismatch between two pipeline stages. Always a bug in an
/// upstream transform, never a user error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage}: expected {expected} fragments, got {actual}")]
pub struct InvariantViolation {
    pub stage: &'static str,
    pub expected: usize,
    pub actual: usize,
}

/// Result of [`divide`]: runs of each class in order of appearance, plus the
/// class of the final run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Division {
    pub hanzi: Vec<String>,
    pub other: Vec<String>,
    pub last_is_hanzi: bool,
}

/// Split `text` into maximal runs of hanzi and non-hanzi characters.
pub fn divide(text: &str) -> Division {
    let _span = debug_span!("divide", len = text.len()).entered();
    let mut out = Division::default();
    let Some(first) = text.chars().next() else {
        return out;
    };

    let mut basket_is_hanzi = is_hanzi(first);
    let mut start = 0;
    for (pos, c) in text.char_indices() {
        let current = is_hanzi(c);
        if current != basket_is_hanzi {
            out.push(&text[start..pos], basket_is_hanzi);
            start = pos;
            basket_is_hanzi = current;
        }
    }
    out.push(&text[start..], basket_is_hanzi);
    out.last_is_hanzi = basket_is_hanzi;
    out
}

impl Division {
    fn push(&mut self, run: &str, hanzi: bool) {
        if hanzi {
            self.hanzi.push(run.to_string());
        } else {
            self.other.push(run.to_string());
        }
    }

    /// Reassemble the runs unchanged.
    pub fn combine(&self) -> Result<String, InvariantViolation> {
        combine(&self.hanzi, &self.other, self.last_is_hanzi)
    }
}

/// Interleave independently transformed runs back into one string.
///
/// Equal counts alternate starting with the hanzi run unless the final run
/// was hanzi; otherwise the longer side opens and closes the sequence. Any
/// other count difference means a transform dropped or added fragments.
pub fn combine<H, O>(hanzi: &[H], other: &[O], last_is_hanzi: bool) -> Result<String, InvariantViolation>
where
    H: AsRef<str>,
    O: AsRef<str>,
{
    let (h, n) = (hanzi.len(), other.len());
    let mut out = String::new();
    let mut pair = |first: &str, second: &str| {
        out.push_str(first);
        out.push_str(second);
    };

    if h == n {
        for (hz, ot) in hanzi.iter().zip(other) {
            if last_is_hanzi {
                pair(ot.as_ref(), hz.as_ref());
            } else {
                pair(hz.as_ref(), ot.as_ref());
            }
        }
    } else if h == n + 1 {
        for (hz, ot) in hanzi.iter().zip(other) {
            pair(hz.as_ref(), ot.as_ref());
        }
        out.push_str(hanzi[h - 1].as_ref());
    } else if n == h + 1 {
        for (hz, ot) in hanzi.iter().zip(other) {
            pair(ot.as_ref(), hz.as_ref());
        }
        out.push_str(other[n - 1].as_ref());
    } else {
        return Err(InvariantViolation {
            stage: "combine",
            expected: h.max(n).saturating_sub(1),
            actual: h.min(n),
        });
    }
    Ok(out)
}
