//! Transform of non-ideographic runs.
//!
//! Each run is split into maximal spans of one [`CharClass`]; every span is
//! rewritten by the [`Mode`] configured for its class.

use std::fmt;

use tracing::debug_span;

use crate::script::{katakana_to_hiragana, CharClass};
use crate::settings::NonHanziSettings;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModeError {
    #[error(
        "unknown non-hanzi mode {0:?} (expected ignore, keep, replace, clean_punctuation or normalize_kana)"
    )]
    Unknown(String),
}

/// How one class of characters is rewritten.
#[derive(Clone)]
pub enum Mode {
    /// Drop the span.
    Ignore,
    /// Emit the span verbatim.
    Keep,
    /// Emit a fixed literal instead of the span.
    Replace(String),
    /// Emit `f(span)`.
    Custom(fn(&str) -> String),
}

impl Mode {
    /// Resolve a configured mode name. `replace` is only used by the
    /// `replace` mode.
    pub fn from_name(name: &str, replace: &str) -> Result<Self, ModeError> {
        match name {
            "ignore" => Ok(Mode::Ignore),
            "keep" => Ok(Mode::Keep),
            "replace" => Ok(Mode::Replace(replace.to_string())),
            "clean_punctuation" => Ok(Mode::Custom(clean_punctuation)),
            "normalize_kana" => Ok(Mode::Custom(normalize_kana)),
            other => Err(ModeError::Unknown(other.to_string())),
        }
    }

    pub fn apply(&self, span: &str) -> String {
        match self {
            Mode::Ignore => String::new(),
            Mode::Keep => span.to_string(),
            Mode::Replace(s) => s.clone(),
            Mode::Custom(f) => f(span),
        }
    }
}

impl fmt::Debug for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Ignore => f.write_str("Ignore"),
            Mode::Keep => f.write_str("Keep"),
            Mode::Replace(s) => f.debug_tuple("Replace").field(s).finish(),
            Mode::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Mode per character class.
#[derive(Debug, Clone)]
pub struct NonHanziModes {
    pub latin: Mode,
    pub kana: Mode,
    pub punctuation: Mode,
    pub other: Mode,
}

impl Default for NonHanziModes {
    /// Pause marks survive as clean punctuation, kana is folded to hiragana,
    /// everything else is dropped.
    fn default() -> Self {
        Self {
            latin: Mode::Ignore,
            kana: Mode::Custom(normalize_kana),
            punctuation: Mode::Custom(clean_punctuation),
            other: Mode::Ignore,
        }
    }
}

impl NonHanziModes {
    /// The same mode for every class.
    pub fn uniform(mode: Mode) -> Self {
        Self {
            latin: mode.clone(),
            kana: mode.clone(),
            punctuation: mode.clone(),
            other: mode,
        }
    }

    pub fn from_settings(s: &NonHanziSettings) -> Result<Self, ModeError> {
        let mode = |class| {
            let (name, replace) = s.resolve(class);
            Mode::from_name(name, replace)
        };
        Ok(Self {
            latin: mode(&s.latin)?,
            kana: mode(&s.kana)?,
            punctuation: mode(&s.punctuation)?,
            other: mode(&s.other)?,
        })
    }

    pub fn with(mut self, class: CharClass, mode: Mode) -> Self {
        match class {
            CharClass::Latin => self.latin = mode,
            CharClass::Kana => self.kana = mode,
            CharClass::Punctuation => self.punctuation = mode,
            CharClass::Other => self.other = mode,
        }
        self
    }

    pub fn for_class(&self, class: CharClass) -> &Mode {
        match class {
            CharClass::Latin => &self.latin,
            CharClass::Kana => &self.kana,
            CharClass::Punctuation => &self.punctuation,
            CharClass::Other => &self.other,
        }
    }

    fn transform_run(&self, run: &str) -> String {
        let mut out = String::new();
        let mut chars = run.char_indices();
        let Some((_, first)) = chars.next() else {
            return out;
        };
        let mut class = CharClass::of(first);
        let mut start = 0;
        for (pos, c) in chars {
            let current = CharClass::of(c);
            if current != class {
                out.push_str(&self.for_class(class).apply(&run[start..pos]));
                start = pos;
                class = current;
            }
        }
        out.push_str(&self.for_class(class).apply(&run[start..]));
        out
    }
}

/// Transform every run; the output has one entry per input run.
pub fn non_hanzi_process<S: AsRef<str>>(runs: &[S], modes: &NonHanziModes) -> Vec<String> {
    let _span = debug_span!("non_hanzi_process", runs = runs.len()).entered();
    runs.iter()
        .map(|run| modes.transform_run(run.as_ref()))
        .collect()
}

/// Keep only pause marks, normalised to `、` `。` `,` `?`.
pub fn clean_punctuation(span: &str) -> String {
    span.chars()
        .filter_map(|c| match c {
            ',' | '，' | '、' | ';' | '；' | ':' | '：' | '~' | '-' | '—' | '…' | '－' | '·' => {
                Some('、')
            }
            '.' | '｡' | '。' | '!' | '！' => Some('。'),
            '(' | ')' | '（' | '）' | '[' | ']' | '【' | '】' | '「' | '」' | '『' | '』' => {
                Some(',')
            }
            '?' | '？' => Some('?'),
            _ => None,
        })
        .collect()
}

/// Full- and half-width katakana to hiragana.
pub fn normalize_kana(span: &str) -> String {
    katakana_to_hiragana(span)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(s: &str) -> String {
        s.to_uppercase()
    }

    #[test]
    fn default_modes() {
        let modes = NonHanziModes::default();
        let out = non_hanzi_process(&["。", "ゆっくりシテイッテネ!", "abc123", ""], &modes);
        assert_eq!(out, vec!["。", "ゆっくりしていってね。", "", ""]);
    }

    #[test]
    fn uniform_modes() {
        let runs = ["ゆっくり。", "ABC"];
        assert_eq!(
            non_hanzi_process(&runs, &NonHanziModes::uniform(Mode::Keep)),
            vec!["ゆっくり。", "ABC"]
        );
        assert_eq!(
            non_hanzi_process(&runs, &NonHanziModes::uniform(Mode::Ignore)),
            vec!["", ""]
        );
        assert_eq!(
            non_hanzi_process(&runs, &NonHanziModes::uniform(Mode::Replace("x".into()))),
            vec!["xx", "x"]
        );
    }

    #[test]
    fn per_class_modes() {
        let modes = NonHanziModes::uniform(Mode::Ignore)
            .with(CharClass::Latin, Mode::Custom(upper))
            .with(CharClass::Punctuation, Mode::Keep);
        let out = non_hanzi_process(&["hello, world 42!"], &modes);
        assert_eq!(out, vec!["HELLO,WORLD!"]);
    }

    #[test]
    fn from_names() {
        assert!(matches!(Mode::from_name("keep", ""), Ok(Mode::Keep)));
        assert!(matches!(
            Mode::from_name("replace", "*"),
            Ok(Mode::Replace(ref s)) if s == "*"
        ));
        assert!(matches!(
            Mode::from_name("normalize_kana", ""),
            Ok(Mode::Custom(_))
        ));
        assert_eq!(
            Mode::from_name("loud", "").unwrap_err(),
            ModeError::Unknown("loud".into())
        );
    }

    #[test]
    fn modes_from_default_settings() {
        let s = crate::settings::parse_settings_toml(crate::settings::DEFAULT_SETTINGS_TOML).unwrap();
        let modes = NonHanziModes::from_settings(&s.non_hanzi).unwrap();
        let out = non_hanzi_process(&["ｶﾞｲ、abc"], &modes);
        assert_eq!(out, vec!["がい、"]);
    }

    #[test]
    fn clean_punctuation_classes() {
        assert_eq!(clean_punctuation("，；…"), "、、、");
        assert_eq!(clean_punctuation("！。."), "。。。");
        assert_eq!(clean_punctuation("「」（）"), ",,,,");
        assert_eq!(clean_punctuation("？?"), "??");
        assert_eq!(clean_punctuation("\"#@*"), "");
    }
}
