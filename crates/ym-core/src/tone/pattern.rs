use std::fmt;
use std::str::FromStr;

use super::{FormatError, Tone, ToneContext};

/// A tone context with `*` wildcards, e.g. `"1*3"` or `"***"`.
///
/// `*` in the middle position stands for the tone-bearing digits 1-5 only;
/// in the outer positions it also covers the boundary digit 0. An explicit
/// `0` in the middle is rejected, the same as for stored entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WildcardPattern([Option<Tone>; 3]);

impl WildcardPattern {
    /// Resolve to the cross-product of the per-position expansions.
    pub fn expand(&self) -> Vec<ToneContext> {
        let outer = |slot: Option<Tone>| -> Vec<Tone> {
            slot.map_or_else(|| Tone::all().collect(), |t| vec![t])
        };
        let middle = self.0[1].map_or_else(|| Tone::bearing().collect(), |t| vec![t]);
        let prevs = outer(self.0[0]);
        let nexts = outer(self.0[2]);

        let mut out = Vec::with_capacity(prevs.len() * middle.len() * nexts.len());
        for &p in &prevs {
            for &o in &middle {
                for &n in &nexts {
                    out.push(ToneContext::new(p, o, n));
                }
            }
        }
        out
    }

    /// Membership test equivalent to `expand().contains(&ctx)`.
    pub fn matches(&self, ctx: ToneContext) -> bool {
        let tones = [ctx.prev(), ctx.own(), ctx.next()];
        if tones[1].is_boundary() {
            return false;
        }
        self.0
            .iter()
            .zip(tones)
            .all(|(slot, tone)| slot.map_or(true, |t| t == tone))
    }
}

impl FromStr for WildcardPattern {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 3 {
            return Err(FormatError::Length(s.to_string()));
        }
        let mut slots = [None; 3];
        for (slot, &ch) in slots.iter_mut().zip(&chars) {
            if ch == '*' {
                continue;
            }
            let tone = Tone::from_char(ch).ok_or_else(|| FormatError::InvalidChar {
                input: s.to_string(),
                ch,
            })?;
            *slot = Some(tone);
        }
        if slots[1] == Some(Tone::BOUNDARY) {
            return Err(FormatError::BoundaryMiddle(s.to_string()));
        }
        Ok(Self(slots))
    }
}

impl fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in self.0 {
            match slot {
                Some(t) => write!(f, "{t}")?,
                None => f.write_str("*")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(s: &str) -> Vec<String> {
        let p: WildcardPattern = s.parse().unwrap();
        p.expand().iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn expand_sizes() {
        assert_eq!(expand("***").len(), 180);
        assert_eq!(expand("*1*").len(), 36);
        assert_eq!(expand("1*3").len(), 5);
        assert_eq!(expand("123"), vec!["123"]);
    }

    #[test]
    fn middle_wildcard_never_yields_boundary() {
        let contexts = expand("1*3");
        assert_eq!(contexts, vec!["113", "123", "133", "143", "153"]);
    }

    #[test]
    fn outer_wildcard_includes_boundary() {
        let contexts = expand("*21");
        assert_eq!(contexts.first().map(String::as_str), Some("021"));
        assert_eq!(contexts.last().map(String::as_str), Some("521"));
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert!(matches!(
            "1*".parse::<WildcardPattern>(),
            Err(FormatError::Length(_))
        ));
        assert!(matches!(
            "1?3".parse::<WildcardPattern>(),
            Err(FormatError::InvalidChar { ch: '?', .. })
        ));
        assert!(matches!(
            "*0*".parse::<WildcardPattern>(),
            Err(FormatError::BoundaryMiddle(_))
        ));
    }

    #[test]
    fn matches_agrees_with_expand() {
        let p: WildcardPattern = "*3*".parse().unwrap();
        for ctx in ToneContext::all_valid() {
            assert_eq!(p.matches(ctx), p.expand().contains(&ctx), "{ctx}");
        }
    }

    #[test]
    fn display_roundtrip() {
        let p: WildcardPattern = "*4*".parse().unwrap();
        assert_eq!(p.to_string(), "*4*");
        let exact: WildcardPattern = "241".parse().unwrap();
        assert_eq!(exact.to_string(), "241");
    }
}
