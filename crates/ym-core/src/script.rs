//! Character-level script classification for mixed Chinese/Japanese text.

use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};

/// Basic CJK Unified Ideographs block (U+4E00..U+9FFF).
///
/// Extension blocks are deliberately excluded: the pinyin annotator and the
/// seed pronunciation tables only cover the basic block, so anything outside
/// it is routed through the non-hanzi transform instead.
pub fn is_hanzi(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// Full Hiragana block (U+3040..U+309F).
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Full Katakana block (U+30A0..U+30FF).
pub fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c)
}

/// Half-width katakana including the middle dot and sound marks (U+FF65..U+FF9F).
pub fn is_halfwidth_katakana(c: char) -> bool {
    ('\u{FF65}'..='\u{FF9F}').contains(&c)
}

pub fn is_kana(c: char) -> bool {
    is_hiragana(c) || is_katakana(c) || is_halfwidth_katakana(c)
}

pub fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// ASCII punctuation and symbols, plus every character in a Unicode
/// punctuation category (Pc, Pd, Ps, Pe, Pi, Pf, Po).
pub fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || c.general_category_group() == GeneralCategoryGroup::Punctuation
}

/// Class of a non-ideographic character, used to pick a transform mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Kana,
    Latin,
    Punctuation,
    Other,
}

impl CharClass {
    pub fn of(c: char) -> Self {
        if is_kana(c) {
            CharClass::Kana
        } else if is_latin(c) {
            CharClass::Latin
        } else if is_punctuation(c) {
            CharClass::Punctuation
        } else {
            CharClass::Other
        }
    }
}

/// Convert a katakana string (full- or half-width) to hiragana.
///
/// Half-width voiced (ﾞ) and semi-voiced (ﾟ) marks combine with the
/// preceding character when the combination exists. Characters without a
/// hiragana counterpart (ヵ, ヶ, ASCII, ...) pass through unchanged.
pub fn katakana_to_hiragana(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev: Option<char> = None;
    for c in s.chars() {
        if matches!(c, 'ﾞ' | 'ﾟ') {
            if let Some(composed) = prev.and_then(|p| halfwidth_voiced(p, c)) {
                out.pop();
                out.push(composed);
                prev = None;
                continue;
            }
        }
        out.push(to_hiragana(c));
        prev = Some(c);
    }
    out
}

fn to_hiragana(c: char) -> char {
    match c {
        // ァ..ヴ map to ぁ..ゔ at a fixed offset
        '\u{30A1}'..='\u{30F4}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        'ｰ' => 'ー',
        _ => halfwidth_plain(c).unwrap_or(c),
    }
}

const HALFWIDTH_PLAIN: [(char, char); 56] = [
    ('ｱ', 'あ'), ('ｲ', 'い'), ('ｳ', 'う'), ('ｴ', 'え'), ('ｵ', 'お'),
    ('ｶ', 'か'), ('ｷ', 'き'), ('ｸ', 'く'), ('ｹ', 'け'), ('ｺ', 'こ'),
    ('ｻ', 'さ'), ('ｼ', 'し'), ('ｽ', 'す'), ('ｾ', 'せ'), ('ｿ', 'そ'),
    ('ﾀ', 'た'), ('ﾁ', 'ち'), ('ﾂ', 'つ'), ('ﾃ', 'て'), ('ﾄ', 'と'),
    ('ﾅ', 'な'), ('ﾆ', 'に'), ('ﾇ', 'ぬ'), ('ﾈ', 'ね'), ('ﾉ', 'の'),
    ('ﾊ', 'は'), ('ﾋ', 'ひ'), ('ﾌ', 'ふ'), ('ﾍ', 'へ'), ('ﾎ', 'ほ'),
    ('ﾏ', 'ま'), ('ﾐ', 'み'), ('ﾑ', 'む'), ('ﾒ', 'め'), ('ﾓ', 'も'),
    ('ﾔ', 'や'), ('ﾕ', 'ゆ'), ('ﾖ', 'よ'),
    ('ﾗ', 'ら'), ('ﾘ', 'り'), ('ﾙ', 'る'), ('ﾚ', 'れ'), ('ﾛ', 'ろ'),
    ('ﾜ', 'わ'), ('ｦ', 'を'), ('ﾝ', 'ん'),
    ('ｧ', 'ぁ'), ('ｨ', 'ぃ'), ('ｩ', 'ぅ'), ('ｪ', 'ぇ'), ('ｫ', 'ぉ'),
    ('ｬ', 'ゃ'), ('ｭ', 'ゅ'), ('ｮ', 'ょ'), ('ｯ', 'っ'), ('ｰ', 'ー'),
];

fn halfwidth_plain(c: char) -> Option<char> {
    HALFWIDTH_PLAIN
        .iter()
        .find_map(|&(k, h)| (k == c).then_some(h))
}

fn halfwidth_voiced(base: char, mark: char) -> Option<char> {
    let plain = halfwidth_plain(base)?;
    match (mark, plain) {
        ('ﾞ', 'う') => Some('ゔ'),
        // か..ほ rows: voiced form is the next code point
        ('ﾞ', 'か' | 'き' | 'く' | 'け' | 'こ' | 'さ' | 'し' | 'す' | 'せ' | 'そ' | 'た'
            | 'ち' | 'つ' | 'て' | 'と' | 'は' | 'ひ' | 'ふ' | 'へ' | 'ほ') => {
            char::from_u32(plain as u32 + 1)
        }
        ('ﾟ', 'は' | 'ひ' | 'ふ' | 'へ' | 'ほ') => char::from_u32(plain as u32 + 2),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hanzi_is_basic_block_only() {
        assert!(is_hanzi('汉'));
        assert!(is_hanzi('\u{4E00}'));
        assert!(is_hanzi('\u{9FFF}'));
        assert!(!is_hanzi('\u{3400}'));
        assert!(!is_hanzi('あ'));
        assert!(!is_hanzi('A'));
        assert!(!is_hanzi('。'));
    }

    #[test]
    fn classify_non_hanzi() {
        for c in "あをぁアヲァｱｦ".chars() {
            assert_eq!(CharClass::of(c), CharClass::Kana, "{c}");
        }
        for c in "azAZ".chars() {
            assert_eq!(CharClass::of(c), CharClass::Latin, "{c}");
        }
        for c in "!！,，、;；:：~-—…－·.｡。()（）[]【】「」『』?？".chars() {
            assert_eq!(CharClass::of(c), CharClass::Punctuation, "{c}");
        }
        // Arabic comma, danda, vertical presentation forms
        for c in "\u{060C}\u{0964}\u{FE10}\u{FE17}\u{FE18}\u{FE19}".chars() {
            assert_eq!(CharClass::of(c), CharClass::Punctuation, "{c}");
        }
        for c in "Бβ一1 ©€".chars() {
            // 一 is hanzi and never reaches this classifier in practice
            assert_eq!(CharClass::of(c), CharClass::Other, "{c}");
        }
    }

    #[test]
    fn katakana_full_width() {
        assert_eq!(katakana_to_hiragana("ゆっくりシていってね"), "ゆっくりしていってね");
        assert_eq!(katakana_to_hiragana("ヴァイオリン"), "ゔぁいおりん");
        assert_eq!(katakana_to_hiragana("ラーメン"), "らーめん");
        assert_eq!(katakana_to_hiragana("abc"), "abc");
    }

    #[test]
    fn katakana_half_width_with_marks() {
        assert_eq!(katakana_to_hiragana("ｶﾞｯｺｳ"), "がっこう");
        assert_eq!(katakana_to_hiragana("ﾊﾟﾝ"), "ぱん");
        assert_eq!(katakana_to_hiragana("ｳﾞ"), "ゔ");
        assert_eq!(katakana_to_hiragana("ｱﾞ"), "あﾞ");
    }
}
