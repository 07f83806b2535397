//! Text normalization for extracted post content
//!
//! Feed markup interleaves the post body with engagement counters, relative
//! timestamps and action labels. [`clean_text`] strips those so that keyword
//! matching and previews only see what the author wrote.

use regex::Regex;
use std::sync::LazyLock;

// Pre-compiled regex patterns for performance
static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static COUNTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\s*(?:reactions?|comments?|reposts?)\b").unwrap());

static UI_WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:likes?|comments?|reposts?|send|share|follow|connect|ago)\b|•").unwrap()
});

static RELATIVE_TIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d+\s*(?:hr|min|sec|day|week|month)s?\b").unwrap());

/// Normalize extracted post text
///
/// Steps:
/// 1. Remove zero-width characters
/// 2. Collapse whitespace
/// 3. Strip reaction/comment/repost counters ("12 reactions")
/// 4. Strip UI action words ("Like", "Repost", "Follow", "•")
/// 5. Strip relative-time tokens ("3 hr", "2 weeks")
/// 6. Collapse whitespace again and trim
///
/// # Examples
///
/// ```
/// use leadscan::parser::sanitize::clean_text;
///
/// let raw = "Jane Doe • 3h\n  We are hiring a developer!  12 reactions  Like  Comment";
/// assert_eq!(clean_text(raw), "Jane Doe 3h We are hiring a developer!");
/// ```
pub fn clean_text(text: &str) -> String {
    let text = remove_zero_width(text);
    let text = WHITESPACE_REGEX.replace_all(&text, " ");
    let text = COUNTER_REGEX.replace_all(&text, "");
    let text = UI_WORD_REGEX.replace_all(&text, "");
    let text = RELATIVE_TIME_REGEX.replace_all(&text, "");
    WHITESPACE_REGEX.replace_all(&text, " ").trim().to_string()
}

/// Remove zero-width spaces and similar invisible characters
///
/// # Examples
///
/// ```
/// use leadscan::parser::sanitize::remove_zero_width;
///
/// assert_eq!(remove_zero_width("hi\u{200B}ring\u{FEFF}"), "hiring");
/// ```
pub fn remove_zero_width(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(*c,
                '\u{200B}'..='\u{200F}' |
                '\u{2028}'..='\u{202F}' |
                '\u{FEFF}'
            )
        })
        .collect()
}

/// Check whether trimmed text is longer than `min_len` characters
pub fn has_content(text: &str, min_len: usize) -> bool {
    text.trim().chars().count() > min_len
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(clean_text("  hiring \n\n\t developer  "), "hiring developer");
    }

    #[test]
    fn test_strips_counters() {
        assert_eq!(
            clean_text("Need a developer 42 reactions 7 comments 1 repost"),
            "Need a developer"
        );
    }

    #[test]
    fn test_strips_ui_words_case_insensitive() {
        assert_eq!(clean_text("LIKE Comment repost SEND Share"), "");
    }

    #[test]
    fn test_keeps_words_containing_ui_words() {
        assert_eq!(
            clean_text("Chicago startup likely shared plans"),
            "Chicago startup likely shared plans"
        );
    }

    #[test]
    fn test_strips_relative_time() {
        assert_eq!(clean_text("Posted 5 hr 2 weeks ago"), "Posted");
        assert_eq!(clean_text("3 days hiring"), "hiring");
    }

    #[test]
    fn test_strips_bullets() {
        assert_eq!(clean_text("Jane • Founder • hiring"), "Jane Founder hiring");
    }

    #[test]
    fn test_has_content_threshold() {
        assert!(!has_content("exactly twenty chars", 20));
        assert!(has_content("exactly twenty chars!", 20));
        assert!(!has_content("   padded   ", 6));
    }

    proptest! {
        #[test]
        fn clean_text_is_trimmed_and_single_spaced(input in ".{0,300}") {
            let cleaned = clean_text(&input);
            prop_assert_eq!(cleaned.trim(), cleaned.as_str());
            prop_assert!(!cleaned.contains("  "));
        }

        #[test]
        fn clean_text_keeps_plain_words(words in proptest::collection::vec("[a-np-z]{6,10}", 1..20)) {
            let input = words.join(" ");
            prop_assert_eq!(clean_text(&input), input);
        }
    }
}
