//! Text → kana conversion pipeline.
//!
//! ```text
//! pre_process → divide ─┬─ hanzi runs ── annotate → sandhi → contexts → lookup_batch ─┬─ combine → post_process
//!                       └─ other runs ── non_hanzi_process ──────────────────────────┘
//! ```
//!
//! All hanzi runs of one input are annotated into a single token sequence
//! with a sentinel before, between and after the runs, so sandhi and tone
//! contexts stop at run boundaries and the whole input needs only one bulk
//! lookup.


use std::collections::HashMap;
use std::str::Utf8Error;

use tracing::{debug, debug_span};

use crate::annotate::{Annotator, Tokenizer};
use crate::non_hanzi::{non_hanzi_process, ModeError, NonHanziModes};
use crate::numeric::pre_process;
use crate::postprocess::post_process;
use crate::segment::{combine, divide, InvariantViolation};
use crate::settings::Settings;
use crate::store::{Fallback, PronunciationStore, StoreError};
use crate::tone::{apply_third_tone_sandhi, build_contexts, ToneToken};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("input is not valid UTF-8 text: {0}")]
    InvalidText(#[from] Utf8Error),
    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Per-conversion knobs.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub without_accent: bool,
    pub accent_markers: String,
    pub non_hanzi: NonHanziModes,
    /// Fallback policy for pinyin conversion (`"keep"` or a literal).
    pub pinyin_fallback: String,
    pub pinyin_punctuation: HashMap<String, String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            without_accent: false,
            accent_markers: "'/_".to_string(),
            non_hanzi: NonHanziModes::default(),
            pinyin_fallback: String::new(),
            pinyin_punctuation: [(",", "、"), (".", "。"), (";", ","), ("?", "?")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl ConvertOptions {
    pub fn from_settings(s: &Settings) -> Result<Self, ModeError> {
        Ok(Self {
            without_accent: s.convert.without_accent,
            accent_markers: s.convert.accent_markers.clone(),
            non_hanzi: NonHanziModes::from_settings(&s.non_hanzi)?,
            pinyin_fallback: s.convert.pinyin_fallback.clone(),
            pinyin_punctuation: s.pinyin_punctuation.clone(),
        })
    }

    pub fn without_accent(mut self, on: bool) -> Self {
        self.without_accent = on;
        self
    }
}

/// Borrowed view of everything one conversion needs.
#[derive(Clone, Copy)]
pub struct Converter<'a> {
    pub store: &'a PronunciationStore,
    pub annotator: &'a dyn Annotator,
    pub tokenizer: &'a dyn Tokenizer,
    pub options: &'a ConvertOptions,
}

impl<'a> Converter<'a> {
    pub fn new(
        store: &'a PronunciationStore,
        annotator: &'a dyn Annotator,
        tokenizer: &'a dyn Tokenizer,
        options: &'a ConvertOptions,
    ) -> Self {
        Self {
            store,
            annotator,
            tokenizer,
            options,
        }
    }

    /// Convert mixed text. Empty input returns an empty string without
    /// touching the store.
    pub fn convert(&self, text: &str) -> Result<String, ConvertError> {
        let _span = debug_span!("text_convert", len = text.len()).entered();
        if text.is_empty() {
            return Ok(String::new());
        }
        let text = pre_process(text);
        let division = divide(&text);
        let hanzi = self.hanzi_process(&division.hanzi)?;
        let other = non_hanzi_process(&division.other, &self.options.non_hanzi);
        let combined = combine(&hanzi, &other, division.last_is_hanzi)?;
        Ok(post_process(
            &combined,
            self.options.without_accent,
            &self.options.accent_markers,
        ))
    }

    /// [`convert`](Self::convert) for raw bytes that must hold UTF-8 text.
    pub fn convert_bytes(&self, bytes: &[u8]) -> Result<String, ConvertError> {
        self.convert(std::str::from_utf8(bytes)?)
    }

    /// Convert hanzi runs to kana, one output string per run.
    pub fn hanzi_process<S: AsRef<str>>(&self, runs: &[S]) -> Result<Vec<String>, ConvertError> {
        let _span = debug_span!("hanzi_process", runs = runs.len()).entered();
        if runs.is_empty() {
            return Ok(Vec::new());
        }

        let mut tokens = vec![ToneToken::sentinel()];
        for run in runs {
            for span in self.tokenizer.tokenize(run.as_ref()) {
                tokens.extend(self.annotator.annotate(span));
            }
            tokens.push(ToneToken::sentinel());
        }
        apply_third_tone_sandhi(&mut tokens);

        let keys = build_contexts(&tokens);
        let kana = self
            .store
            .lookup_batch(&keys, &Fallback::Literal(String::new()))?;
        if kana.len() != keys.len() {
            return Err(InvariantViolation {
                stage: "lookup_batch",
                expected: keys.len(),
                actual: kana.len(),
            }
            .into());
        }
        debug!(tokens = tokens.len(), keys = keys.len());

        let mut out = Vec::with_capacity(runs.len());
        let mut current = String::new();
        for (key, k) in keys.iter().zip(&kana) {
            if key.is_run_boundary() {
                out.push(std::mem::take(&mut current));
            } else {
                current.push_str(k);
            }
        }
        out.push(current);

        if out.len() != runs.len() {
            return Err(InvariantViolation {
                stage: "hanzi_process",
                expected: runs.len(),
                actual: out.len(),
            }
            .into());
        }
        Ok(out)
    }

    /// Convert whitespace-separated numbered pinyin (`"ni3 hao3 ,"`).
    ///
    /// No sandhi is applied: the tones are taken as written. Tokens without
    /// a trailing tone digit are non-syllabic and rendered through the
    /// punctuation map.
    pub fn convert_pinyin(&self, text: &str) -> Result<String, ConvertError> {
        let _span = debug_span!("pinyin_convert", len = text.len()).entered();
        if text.is_empty() {
            return Ok(String::new());
        }

        let mut tokens = vec![ToneToken::sentinel()];
        tokens.extend(text.split_whitespace().map(ToneToken::parse_numbered));
        tokens.push(ToneToken::sentinel());

        let keys = build_contexts(&tokens);
        let fallback = Fallback::from(self.options.pinyin_fallback.as_str());
        let kana = self.store.lookup_batch(&keys, &fallback)?;

        let mut out = String::new();
        for (key, k) in keys.iter().zip(&kana) {
            if key.context.own().is_boundary() {
                let mark = self
                    .options
                    .pinyin_punctuation
                    .get(&key.syllable)
                    .map(String::as_str)
                    .unwrap_or_else(|| fallback.resolve(&key.syllable));
                out.push_str(mark);
            } else {
                out.push_str(k);
            }
        }
        Ok(post_process(
            &out,
            self.options.without_accent,
            &self.options.accent_markers,
        ))
    }
}
