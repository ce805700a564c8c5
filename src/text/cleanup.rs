// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fragment text cleanup before display

use regex::Regex;
use std::sync::OnceLock;

fn markup_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid markup regex"))
}

fn leader_dots_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\.{5,}").expect("valid dots regex"))
}

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Normalize extracted PDF text for display
///
/// - Strips tag-like markup (`<...>`)
/// - Collapses table-of-contents leaders (5+ dots) to `...`
/// - Collapses whitespace runs to a single space and trims
///
/// Empty input is returned unchanged.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = markup_pattern().replace_all(text, "");
    let text = leader_dots_pattern().replace_all(&text, "...");
    let text = whitespace_pattern().replace_all(&text, " ");
    text.trim().to_string()
}
