//! Reduces text to the characters that carry narration content: CJK
//! ideographs, ASCII letters and digits, lower-cased. Everything else is
//! removed, including bracketed annotations (pinyin readings, citation
//! markers) and link targets, so the same sentence compares equal whether it
//! came from the transcript or from the rendered document.

const MAX_GROUP_CHARS: usize = 256;

/// Normalized form of `text`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    scan(text, |c, _| out.push(c));
    out
}

/// Normalized form of `text` plus, for every normalized character, the char
/// index in `text` it came from.
pub fn normalize_with_positions(text: &str) -> (String, Vec<usize>) {
    let mut out = String::with_capacity(text.len());
    let mut positions = Vec::with_capacity(text.len());
    scan(text, |c, at| {
        out.push(c);
        positions.push(at);
    });
    (out, positions)
}

/// Whether a normalized string is long enough to be matched at all.
pub fn is_matchable(normalized: &str, min_len: usize) -> bool {
    normalized.chars().count() >= min_len
}

pub fn is_cjk_ideograph(c: char) -> bool {
    matches!(
        c as u32,
        0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0x20000..=0x2A6DF
    )
}

fn scan(text: &str, mut emit: impl FnMut(char, usize)) {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(close) = closing_bracket(c) {
            if let Some(end) = find_close(&chars, i, c, close) {
                let follows_link_text = i > 0 && chars[i - 1] == ']' && c == '(';
                if follows_link_text || is_annotation(&chars[i + 1..end]) {
                    i = end + 1;
                    continue;
                }
            }
            i += 1;
            continue;
        }

        if let Some(folded) = fold(c) {
            emit(folded, i);
        }
        i += 1;
    }
}

fn fold(c: char) -> Option<char> {
    if c.is_ascii_alphanumeric() {
        return Some(c.to_ascii_lowercase());
    }
    if is_cjk_ideograph(c) {
        return Some(c);
    }
    // Fullwidth ASCII variants (０-９, Ａ-Ｚ, ａ-ｚ) fold onto ASCII.
    let code = c as u32;
    if matches!(code, 0xFF10..=0xFF19 | 0xFF21..=0xFF3A | 0xFF41..=0xFF5A) {
        return char::from_u32(code - 0xFEE0).map(|a| a.to_ascii_lowercase());
    }
    None
}

fn closing_bracket(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '（' => Some('）'),
        '[' => Some(']'),
        '【' => Some('】'),
        '〔' => Some('〕'),
        _ => None,
    }
}

fn find_close(chars: &[char], open_at: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, &c) in chars[open_at..].iter().enumerate().take(MAX_GROUP_CHARS) {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(open_at + offset);
            }
        }
    }
    None
}

/// A bracket group with no ideographs whose content is a reading (accented
/// Latin such as pinyin) or a bare number (citation marker).
fn is_annotation(content: &[char]) -> bool {
    if content.iter().any(|&c| is_cjk_ideograph(c)) {
        return false;
    }
    let alnum: Vec<char> = content
        .iter()
        .copied()
        .filter(|c| c.is_alphanumeric())
        .collect();
    if alnum.is_empty() {
        return false;
    }
    alnum.iter().any(|c| c.is_alphabetic() && !c.is_ascii())
        || alnum.iter().all(|c| c.is_ascii_digit())
}
