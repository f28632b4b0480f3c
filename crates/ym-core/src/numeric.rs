//! Arabic numerals to Chinese numerals.
//!
//! Runs of ASCII digits in the input are rewritten as Chinese numerals so the
//! annotator can read them, and a few symbols (`+`, `=`, `#`) are spelled out.
//! Integers up to 13 digits use the positional reading with 十/百/千 and
//! 万/亿 grouping; everything else is read digit by digit.

const MAX_POSITIONAL_DIGITS: usize = 13;
const UNITS: [Option<char>; 4] = [None, Some('十'), Some('百'), Some('千')];

fn symbol(c: char) -> Option<&'static str> {
    match c {
        '+' => Some("加"),
        '=' => Some("等于"),
        '#' => Some("井"),
        _ => None,
    }
}

fn numeral(c: char) -> Option<char> {
    Some(match c {
        '0' => '零',
        '1' => '一',
        '2' => '二',
        '3' => '三',
        '4' => '四',
        '5' => '五',
        '6' => '六',
        '7' => '七',
        '8' => '八',
        '9' => '九',
        '.' => '点',
        _ => return None,
    })
}

/// Rewrite digit runs and readable symbols in `text`.
///
/// A digit run absorbs one directly following space (digit-by-digit reading)
/// or `%` (percentage). A `.` continues the run only when a digit follows it.
pub fn pre_process(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    let mut number = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        if !number.is_empty() {
            match c {
                ' ' | '%' => {
                    number.push(c);
                    out.push_str(&digit_to_chinese(&number));
                    number.clear();
                    continue;
                }
                '.' if chars.peek().is_some_and(char::is_ascii_digit) => {
                    number.push(c);
                    continue;
                }
                _ => {
                    out.push_str(&digit_to_chinese(&number));
                    number.clear();
                }
            }
        }
        match symbol(c) {
            Some(s) => out.push_str(s),
            None => out.push(c),
        }
    }
    if !number.is_empty() {
        out.push_str(&digit_to_chinese(&number));
    }
    out
}

/// Read one collected number (digits, optional decimal points, optional
/// trailing space or `%`).
pub fn digit_to_chinese(number: &str) -> String {
    if number.is_empty() {
        return String::new();
    }
    if let Some(rest) = number.strip_suffix('%') {
        return format!("百分之{}", digit_to_chinese(rest));
    }
    if number.ends_with(' ') || number.starts_with('0') {
        return digitwise(number);
    }
    if let Some((integral, fractional)) = number.split_once('.') {
        let integral = if integral.len() > MAX_POSITIONAL_DIGITS {
            digitwise(integral)
        } else {
            positional(integral)
        };
        return format!("{integral}点{}", digitwise(fractional));
    }
    if number.len() > MAX_POSITIONAL_DIGITS || number.len() == 1 {
        digitwise(number)
    } else {
        positional(number)
    }
}

/// `"2025"` → `"二零二五"`. Surrounding spaces are dropped.
fn digitwise(digits: &str) -> String {
    digits
        .trim()
        .chars()
        .map(|c| numeral(c).unwrap_or(c))
        .collect()
}

/// `"1234"` → `"一千二百三十四"`.
fn positional(digits: &str) -> String {
    // built back to front; `last()` is the leading character so far
    let mut rev: Vec<char> = Vec::with_capacity(digits.len() * 2);
    for (idx, d) in digits.chars().rev().enumerate() {
        if idx == 4 || idx == 12 {
            rev.push('万');
        }
        if idx == 8 {
            // 万 group was all zeros
            if rev.last() == Some(&'万') {
                rev.pop();
            }
            rev.push('亿');
        }
        if d == '0' {
            // no trailing zeros, one 零 per gap
            if rev.last().is_some_and(|c| !matches!(c, '零' | '万' | '亿')) {
                rev.push('零');
            }
        } else {
            if let Some(unit) = UNITS[idx % 4] {
                rev.push(unit);
            }
            rev.push(numeral(d).unwrap_or(d));
        }
    }
    let out: String = rev.into_iter().rev().collect();
    match out.strip_prefix("一十") {
        Some(rest) => format!("十{rest}"),
        None => out,
    }
}
