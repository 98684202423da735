use std::cmp::Ordering;
use std::ffi::OsStr;
use std::path::Path;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::types::EntryKind;

/// Extension tables (lowercase, without the dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
pub const VIDEO_EXTENSIONS: &[&str] =
    &["mp4", "webm", "mkv", "mov", "avi", "mpg", "mpeg", "wmv", "flv"];
pub const TEXT_EXTENSIONS: &[&str] = &["txt"];

/// Classify a file by extension alone. Directories are classified by the caller.
pub fn classify_file(path: &Path) -> EntryKind {
    let Some(ext) = path.extension().and_then(OsStr::to_str) else {
        return EntryKind::Other;
    };
    let lower = ext.to_ascii_lowercase();
    let ext = lower.as_str();

    if IMAGE_EXTENSIONS.contains(&ext) {
        EntryKind::Image
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        EntryKind::Video
    } else if TEXT_EXTENSIONS.contains(&ext) {
        EntryKind::Text
    } else {
        EntryKind::Other
    }
}

/// Comparison key: lowercase with diacritics removed, so `Élan` and `elan` compare equal.
pub fn fold_name(name: &str) -> String {
    name.nfd().filter(|ch| !is_combining_mark(*ch)).flat_map(char::to_lowercase).collect()
}

/// Natural, case- and accent-insensitive comparison of display names.
pub fn natural_cmp_names(a: &str, b: &str) -> Ordering {
    natural_cmp(&fold_name(a), &fold_name(b)).then_with(|| a.cmp(b))
}

/// Collation-style comparison: whitespace and punctuation sort before digit runs, digit runs
/// before letters, and the end of a name before anything. Digit runs compare by value; the
/// digit count only breaks otherwise equal names (`a1` before `a01`).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    weights(a).cmp(&weights(b)).then_with(|| digit_lengths(a).cmp(&digit_lengths(b)))
}

/// ASCII punctuation and symbols in collation order. Whitespace ranks with the space.
const SYMBOL_ORDER: &str = " _-,;:!?.'\"()[]{}@*/\\&#%`^+<=>|~$";

/// Primary weight of one element of a name. Variant order is the class order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Weight {
    Symbol(u32),
    Digits(u128),
    Letter(char),
}

fn char_weight(ch: char) -> Weight {
    if ch.is_alphanumeric() {
        return Weight::Letter(ch);
    }
    if ch.is_whitespace() {
        return Weight::Symbol(0);
    }
    match SYMBOL_ORDER.find(ch) {
        Some(rank) => Weight::Symbol(rank as u32),
        None => Weight::Symbol(SYMBOL_ORDER.len() as u32 + ch as u32),
    }
}

fn weights(input: &str) -> Vec<Weight> {
    let mut out = Vec::with_capacity(input.len());
    for token in tokenize(input) {
        match token {
            Token::Number(_, value) => out.push(Weight::Digits(value)),
            Token::Text(text) => out.extend(text.chars().map(char_weight)),
        }
    }
    out
}

fn digit_lengths(input: &str) -> Vec<usize> {
    tokenize(input)
        .into_iter()
        .filter_map(|token| match token {
            Token::Number(digits, _) => Some(digits.len()),
            Token::Text(_) => None,
        })
        .collect()
}

#[derive(Debug, PartialEq)]
pub enum Token<'a> {
    Text(&'a str),
    Number(&'a str, u128),
}

/// Split into alternating runs of ASCII digits and everything else.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut chars = input.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !ch.is_ascii_digit() {
            continue;
        }
        if start < idx {
            tokens.push(Token::Text(&input[start..idx]));
        }
        let mut end = idx + ch.len_utf8();
        while let Some(&(next_idx, next)) = chars.peek() {
            if !next.is_ascii_digit() {
                break;
            }
            chars.next();
            end = next_idx + next.len_utf8();
        }
        let digits = &input[idx..end];
        // Runs too long for u128 saturate; the digit count still breaks ties.
        let value = digits.parse::<u128>().unwrap_or(u128::MAX);
        tokens.push(Token::Number(digits, value));
        start = end;
    }

    if start < input.len() {
        tokens.push(Token::Text(&input[start..]));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_lowercase_extension() {
        assert_eq!(classify_file(Path::new("a/b/IMG_0001.JPG")), EntryKind::Image);
        assert_eq!(classify_file(Path::new("clip.MkV")), EntryKind::Video);
        assert_eq!(classify_file(Path::new("notes.txt")), EntryKind::Text);
        assert_eq!(classify_file(Path::new("archive.zip")), EntryKind::Other);
        assert_eq!(classify_file(Path::new("Makefile")), EntryKind::Other);
        assert_eq!(classify_file(Path::new("cover.bmp")), EntryKind::Other);
    }

    #[test]
    fn folding_ignores_case_and_accents() {
        assert_eq!(fold_name("Élan"), "elan");
        assert_eq!(natural_cmp(&fold_name("Élan"), &fold_name("ELAN")), Ordering::Equal);
    }

    #[test]
    fn numbers_sort_before_text() {
        assert!(natural_cmp_names("2.png", "a.jpg").is_lt());
        assert!(natural_cmp_names("file2", "file10").is_lt());
        assert!(natural_cmp_names("B.txt", "a.jpg").is_gt());
    }

    #[test]
    fn punctuation_and_name_end_sort_before_digits() {
        assert!(natural_cmp_names("photo.jpg", "photo1.jpg").is_lt());
        assert!(natural_cmp_names("_cover.jpg", "10.jpg").is_lt());
        assert!(natural_cmp_names("photo", "photo 2").is_lt());
        assert!(natural_cmp_names("a-b", "a_b").is_gt());
    }

    #[test]
    fn leading_zeros_only_break_ties() {
        assert!(natural_cmp("a1", "a01").is_lt());
        assert!(natural_cmp("a01", "a2").is_lt());
    }
}
