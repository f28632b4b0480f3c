use crate::script::katakana_to_hiragana;

/// Final pass over converted text.
///
/// With `without_accent`, every character in `accent_markers` is removed and
/// katakana is folded to hiragana; otherwise `text` is returned unchanged.
pub fn post_process(text: &str, without_accent: bool, accent_markers: &str) -> String {
    if !without_accent {
        return text.to_string();
    }
    let stripped: String = text
        .chars()
        .filter(|c| !accent_markers.contains(*c))
        .collect();
    katakana_to_hiragana(&stripped)
}
