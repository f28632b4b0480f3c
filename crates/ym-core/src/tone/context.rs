use super::{ToneContext, ToneToken, SENTINEL_SYLLABLE};

/// A pronunciation lookup key: a syllable in its tone context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey {
    pub syllable: String,
    pub context: ToneContext,
}

impl ContextKey {
    pub fn new(syllable: impl Into<String>, context: ToneContext) -> Self {
        Self {
            syllable: syllable.into(),
            context,
        }
    }

    /// Whether this key stands for a sentinel between two runs.
    pub fn is_run_boundary(&self) -> bool {
        self.syllable == SENTINEL_SYLLABLE && self.context.own().is_boundary()
    }
}

/// Build one key per interior token of a bounded sequence.
///
/// For a sequence of length `L` the output has `L - 2` keys; sequences with
/// no interior token yield nothing.
pub fn build_contexts(tokens: &[ToneToken]) -> Vec<ContextKey> {
    tokens
        .windows(3)
        .map(|w| {
            ContextKey::new(
                w[1].syllable.clone(),
                ToneContext::new(w[0].tone, w[1].tone, w[2].tone),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::Tone;

    fn seq(items: &[&str]) -> Vec<ToneToken> {
        items.iter().map(|s| ToneToken::parse_numbered(s)).collect()
    }

    #[test]
    fn keys_for_interior_tokens() {
        let keys = build_contexts(&seq(&["/0", "ni2", "hao3", "/0"]));
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].syllable, "ni");
        assert_eq!(keys[0].context.to_string(), "023");
        assert_eq!(keys[1].syllable, "hao");
        assert_eq!(keys[1].context.to_string(), "230");
    }

    #[test]
    fn output_length_is_len_minus_two() {
        for len in 2..10 {
            let tokens = vec![ToneToken::new("a", Tone::FIRST); len];
            assert_eq!(build_contexts(&tokens).len(), len - 2);
        }
        assert!(build_contexts(&[]).is_empty());
        assert!(build_contexts(&[ToneToken::sentinel()]).is_empty());
    }

    #[test]
    fn interior_sentinel_is_run_boundary() {
        let keys = build_contexts(&seq(&["/0", "han4", "/0", "zi4", "/0"]));
        assert_eq!(keys.len(), 3);
        assert!(!keys[0].is_run_boundary());
        assert!(keys[1].is_run_boundary());
        assert_eq!(keys[1].context.to_string(), "404");
        assert!(!keys[2].is_run_boundary());
    }
}
