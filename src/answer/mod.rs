// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bot answer formatting
//!
//! Turns scored fragments into the HTML shown in the chat transcript, and
//! holds the fixed messages shown when a search yields nothing usable.

use crate::text::clean_text;
use crate::vector::ScoredFragment;

/// Shown when formatting is asked to render an empty result list
pub const NOT_FOUND_MESSAGE: &str = "Информация не найдена. Попробуйте переформулировать запрос.";

/// Shown when the index returned nothing at all
pub const NO_RESULTS_MESSAGE: &str = "Ничего не найдено.";

/// Shown when every result scored below the relevance threshold
pub const LOW_RELEVANCE_MESSAGE: &str =
    "Результаты с низким совпадением. Попробуйте переформулировать вопрос.";

/// Longest fragment excerpt shown in a card, in characters
pub const MAX_EXCERPT_CHARS: usize = 300;

/// Prefix for errors shown inline
pub const ERROR_PREFIX: &str = "Ошибка: ";

/// Clean and shorten fragment text for display
pub fn excerpt(content: &str) -> String {
    let cleaned = clean_text(content);
    if cleaned.chars().count() > MAX_EXCERPT_CHARS {
        let truncated: String = cleaned.chars().take(MAX_EXCERPT_CHARS).collect();
        format!("{}...", truncated)
    } else {
        cleaned
    }
}

/// Score as a whole percentage, e.g. `0.834` → `83%`
pub fn format_percent(score: f32) -> String {
    format!("{:.0}%", (score * 100.0).clamp(0.0, 100.0))
}

/// One card per result: page, match percentage and an escaped excerpt
pub fn format_answer(results: &[ScoredFragment]) -> String {
    if results.is_empty() {
        return NOT_FOUND_MESSAGE.to_string();
    }

    let mut answer = String::new();
    for result in results {
        let content = ammonia::clean_text(&excerpt(&result.fragment.content));
        answer.push_str(&format!(
            r#"
<div class="result-card">
    <div class="result-meta">
        <span>Стр. {page}</span>
        <span>•</span>
        <span>{percent} совпадение</span>
    </div>
    <div class="result-content">{content}</div>
</div>"#,
            page = result.fragment.page,
            percent = format_percent(result.score),
            content = content,
        ));
    }

    answer
}

/// Pick the bot reply for a raw search result list
///
/// Results below `min_relevance` are dropped. If the search found nothing the
/// reply says so; if it found only weak matches the reply asks the user to
/// rephrase instead of showing an empty list.
pub fn answer_for(results: Vec<ScoredFragment>, min_relevance: f32) -> String {
    if results.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    let relevant: Vec<ScoredFragment> = results
        .into_iter()
        .filter(|r| r.score >= min_relevance)
        .collect();

    if relevant.is_empty() {
        LOW_RELEVANCE_MESSAGE.to_string()
    } else {
        format_answer(&relevant)
    }
}

/// Inline error text; bot content is rendered as HTML, so the error is escaped
pub fn error_message(error: &dyn std::fmt::Display) -> String {
    format!("{}{}", ERROR_PREFIX, ammonia::clean_text(&error.to_string()))
}
