//! Pinyin annotation and span tokenization for hanzi runs.
//!
//! Both are capabilities injected into the converter. The defaults are
//! deterministic: [`PinyinAnnotator`] reads each character with the `pinyin`
//! crate, [`WholeRun`] hands the run over as a single span and
//! [`JiebaTokenizer`] splits it into words.

use std::collections::HashMap;

use jieba_rs::Jieba;
use pinyin::ToPinyin;

use crate::tone::{Tone, ToneToken};

/// Turns a hanzi span into syllable + tone tokens, in order.
pub trait Annotator: Send + Sync {
    fn annotate(&self, span: &str) -> Vec<ToneToken>;
}

/// Splits a hanzi run into lexical spans. The spans must concatenate back to
/// the run.
pub trait Tokenizer: Send + Sync {
    fn tokenize<'a>(&self, run: &'a str) -> Vec<&'a str>;
}

/// Per-character pinyin with phrase overrides for polyphonic words.
#[derive(Debug, Clone, Default)]
pub struct PinyinAnnotator {
    phrases: HashMap<String, Vec<ToneToken>>,
}

impl PinyinAnnotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the reading of `phrase`, e.g. `("银行", &["yin2", "hang2"])`.
    /// Spans equal to `phrase` use these tokens instead of per-character
    /// readings.
    pub fn with_phrase(mut self, phrase: &str, readings: &[&str]) -> Self {
        let tokens = readings
            .iter()
            .map(|r| ToneToken::parse_numbered(r))
            .collect();
        self.phrases.insert(phrase.to_string(), tokens);
        self
    }

    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.phrases.keys().map(String::as_str)
    }

    fn annotate_char(c: char) -> ToneToken {
        match c.to_pinyin() {
            Some(py) => from_tone_num_end(py.with_tone_num_end()),
            None => ToneToken::new(c.to_string(), Tone::BOUNDARY),
        }
    }
}

impl Annotator for PinyinAnnotator {
    fn annotate(&self, span: &str) -> Vec<ToneToken> {
        if let Some(tokens) = self.phrases.get(span) {
            return tokens.clone();
        }
        span.chars().map(Self::annotate_char).collect()
    }
}

/// `"hao3"` → `hao` / 3, `"lü4"` → `lv` / 4, `"ma"` → `ma` / 5.
fn from_tone_num_end(reading: &str) -> ToneToken {
    let numbered = reading.replace('ü', "v");
    match numbered.chars().last().and_then(Tone::from_char) {
        Some(tone) => ToneToken::new(&numbered[..numbered.len() - 1], tone),
        // neutral-tone readings carry no digit
        None => ToneToken::new(numbered, Tone::NEUTRAL),
    }
}

/// The whole run as one span.
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeRun;

impl Tokenizer for WholeRun {
    fn tokenize<'a>(&self, run: &'a str) -> Vec<&'a str> {
        if run.is_empty() {
            Vec::new()
        } else {
            vec![run]
        }
    }
}

/// Lexical segmentation with jieba's bundled dictionary, without HMM
/// guessing for unknown words.
pub struct JiebaTokenizer {
    jieba: Jieba,
}

impl JiebaTokenizer {
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }

    /// Register `phrases` as user words so they are never split.
    pub fn with_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for phrase in phrases {
            self.jieba.add_word(phrase.as_ref(), None, None);
        }
        self
    }

    /// Tokenizer that keeps every phrase override of `annotator` whole.
    pub fn for_annotator(annotator: &PinyinAnnotator) -> Self {
        Self::new().with_phrases(annotator.phrases())
    }
}

impl Default for JiebaTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for JiebaTokenizer {
    fn tokenize<'a>(&self, run: &'a str) -> Vec<&'a str> {
        if run.is_empty() {
            return Vec::new();
        }
        self.jieba.cut(run, false)
    }
}
