//! Text heuristics for display statistics and conversation titles
//!
//! This module provides the rough token estimator used for per-message
//! statistics and the title extractor applied to the first user message of a
//! new conversation. Both are display heuristics: the token estimate is never
//! used for request limits or truncation.

/// Title used when no text is available to derive one from
pub const DEFAULT_TITLE: &str = "New conversation";

/// Estimate the token count of a piece of text
///
/// Counts characters in the CJK Unified Ideographs range (U+4E00..=U+9FA5)
/// at roughly two characters per token and every other character at roughly
/// four characters per token, then takes the ceiling of the weighted sum.
///
/// # Arguments
///
/// * `text` - Text to estimate
///
/// # Examples
///
/// ```
/// use kanava::text::estimate_tokens;
///
/// assert_eq!(estimate_tokens(""), 0);
/// assert_eq!(estimate_tokens("abcd"), 1);
/// assert_eq!(estimate_tokens("中文"), 1);
/// assert_eq!(estimate_tokens("abcd中文"), 2);
/// ```
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }

    let cjk = text
        .chars()
        .filter(|c| ('\u{4e00}'..='\u{9fa5}').contains(c))
        .count();
    let other = text.chars().count() - cjk;

    // ceil(other/4 + cjk/2) in integer arithmetic
    (other + 2 * cjk + 3) / 4
}

/// Extract a conversation title from free-form text
///
/// Takes the first sentence (split on `。`, `.`, `!`, `?`, `！`, `？`),
/// falls back to the whole trimmed text when the first sentence is too short
/// to be useful, and truncates to `max_chars` characters with an ellipsis.
///
/// # Arguments
///
/// * `text` - Source text, usually the first user message
/// * `max_chars` - Maximum title length in characters before truncation
///
/// # Examples
///
/// ```
/// use kanava::text::extract_title;
///
/// assert_eq!(extract_title("Explain lifetimes. In detail.", 30), "Explain lifetimes");
/// assert_eq!(extract_title("", 30), "New conversation");
/// ```
pub fn extract_title(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return DEFAULT_TITLE.to_string();
    }

    let mut title = trimmed
        .split(['。', '.', '!', '?', '！', '？'])
        .next()
        .unwrap_or("")
        .trim()
        .to_string();

    // Too short to stand alone as a title; use the whole text instead.
    if title.chars().count() < 5 {
        title = trimmed.to_string();
    }

    if title.chars().count() > max_chars {
        let truncated: String = title.chars().take(max_chars).collect();
        return format!("{}...", truncated);
    }

    title
}
