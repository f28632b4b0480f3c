use tracing::trace;

use super::{Tone, ToneToken};

/// Grouping state for a chain of third-tone pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chain {
    /// Not inside a third-tone chain.
    Idle,
    /// The first pair of the chain has been seen.
    Opened,
    /// Two pairs have been seen: the chain currently reads as a
    /// three-syllable group.
    Triple,
}

/// Apply third-tone sandhi in place.
///
/// Consecutive third tones are grouped into two- and three-syllable units:
/// the first member of every 3-3 pair becomes a second tone. When a third
/// consecutive pair appears, the middle syllable of the preceding triple
/// (`i - 1`) is restored to third tone, so the chain regroups as pairs and
/// the current pair opens a fresh window. `3 3 3 3 3 3 2` therefore reads
/// `2 3 2 3 2 3 2`.
///
/// The caller bounds the sequence with boundary tokens; a boundary tone
/// breaks the chain. The last token is never the left side of a pair.
pub fn apply_third_tone_sandhi(tokens: &mut [ToneToken]) {
    let mut chain = Chain::Idle;
    for i in 0..tokens.len().saturating_sub(1) {
        if tokens[i].tone == Tone::THIRD && tokens[i + 1].tone == Tone::THIRD {
            chain = match chain {
                Chain::Idle => Chain::Opened,
                Chain::Opened => Chain::Triple,
                Chain::Triple => {
                    // i >= 2 here: reaching Triple takes two earlier pairs
                    tokens[i - 1].tone = Tone::THIRD;
                    trace!(index = i - 1, "regroup third-tone chain");
                    Chain::Opened
                }
            };
            tokens[i].tone = Tone::SECOND;
        } else {
            chain = Chain::Idle;
        }
    }
}
