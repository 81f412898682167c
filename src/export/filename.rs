//! Archive entry names derived from a user pattern and a data row.
//!
//! `{Column}` tokens are replaced (case-insensitively) by the row's value,
//! then anything outside `[A-Za-z0-9 _-]` becomes `_` and `.png` is appended.

use crate::types::Record;

/// Extension of every rendered artifact.
pub const EXTENSION: &str = ".png";

/// The pattern actually used: the trimmed user pattern, or
/// `{<first column>}_Certificate` when it is blank.
pub fn effective_pattern(pattern: &str, columns: &[String]) -> String {
    let trimmed = pattern.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    match columns.first() {
        Some(first) => format!("{{{first}}}_Certificate"),
        None => "Certificate".to_string(),
    }
}

/// Full archive entry name for one row.
///
/// `headers` are applied in order, so a value that itself contains a later
/// `{Header}` token is substituted again.
pub fn derive_filename(pattern: &str, headers: &[String], row: &Record) -> String {
    let mut name = pattern.to_string();
    for header in headers {
        let token = format!("{{{header}}}");
        name = replace_ignore_case(&name, &token, &row.display(header));
    }
    let mut out = sanitize(&name);
    out.push_str(EXTENSION);
    out
}

/// Replace every character outside `[A-Za-z0-9 _-]` with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Replace all non-overlapping case-insensitive occurrences of `needle`.
fn replace_ignore_case(haystack: &str, needle: &str, replacement: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    let mut out = String::with_capacity(haystack.len());
    let mut rest = haystack;
    while !rest.is_empty() {
        if let Some(len) = prefix_len_ignore_case(rest, needle) {
            out.push_str(replacement);
            rest = rest.get(len..).unwrap_or_default();
            continue;
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

/// Byte length of the prefix of `text` matching `needle` ignoring case.
fn prefix_len_ignore_case(text: &str, needle: &str) -> Option<usize> {
    let mut consumed = 0;
    let mut text_chars = text.chars();
    for n in needle.chars() {
        let t = text_chars.next()?;
        if !t.to_lowercase().eq(n.to_lowercase()) {
            return None;
        }
        consumed += t.len_utf8();
    }
    Some(consumed)
}
