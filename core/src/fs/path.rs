//! Conversion between native paths and the canonical [`AppPath`] form.
//!
//! `to_app_path` is a normalising, many-to-one map: any run of `/` or `\` becomes a single
//! [`APP_PATH_SEPARATOR`] and separators at either end are dropped. `to_native_path` is its
//! right inverse on canonical input and performs no normalisation of its own.

use std::path::MAIN_SEPARATOR;

use crate::types::AppPath;

/// Reserved separator joining the segments of an [`AppPath`].
pub const APP_PATH_SEPARATOR: char = '>';

fn is_native_separator(ch: char) -> bool {
    ch == '/' || ch == '\\'
}

/// Encode a native path string. Empty input yields an empty [`AppPath`].
pub fn to_app_path(native: &str) -> AppPath {
    let mut encoded = String::with_capacity(native.len());
    let mut in_separator_run = false;

    for ch in native.chars() {
        if is_native_separator(ch) {
            if !in_separator_run {
                encoded.push(APP_PATH_SEPARATOR);
                in_separator_run = true;
            }
        } else {
            encoded.push(ch);
            in_separator_run = false;
        }
    }

    let trimmed = encoded.trim_matches(APP_PATH_SEPARATOR);
    if trimmed.len() == encoded.len() {
        AppPath::from_canonical(encoded)
    } else {
        AppPath::from_canonical(trimmed.to_string())
    }
}

/// Decode an app path using the platform separator.
pub fn to_native_path(app_path: &str) -> String {
    to_native_path_with(app_path, MAIN_SEPARATOR)
}

/// Decode an app path with an explicit separator, independent of the host platform.
pub fn to_native_path_with(app_path: &str, separator: char) -> String {
    app_path.chars().map(|ch| if ch == APP_PATH_SEPARATOR { separator } else { ch }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_mixed_separator_runs() {
        assert_eq!(to_app_path("D:/folder1\\\\folder2//file.txt").as_str(), "D:>folder1>folder2>file.txt");
    }

    #[test]
    fn strips_leading_and_trailing_separators() {
        assert_eq!(to_app_path("//srv/share/").as_str(), "srv>share");
        assert_eq!(to_app_path("\\").as_str(), "");
        assert!(to_app_path("").is_empty());
    }

    #[test]
    fn native_decoding_does_not_normalise() {
        assert_eq!(to_native_path_with("a>>b>", '/'), "a//b/");
    }

    #[test]
    fn platform_decoding_uses_main_separator() {
        let expected = format!("home{MAIN_SEPARATOR}user");
        assert_eq!(to_native_path("home>user"), expected);
    }
}
