//! CSS selectors for feed and search-result markup
//!
//! Every list is ordered by priority: callers try entries front to back and
//! stop at the first usable match.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

/// A selector paired with its source text, for diagnostics
pub struct NamedSelector {
    pub css: &'static str,
    pub selector: Selector,
}

macro_rules! named_selector {
    ($s:expr) => {
        NamedSelector {
            css: $s,
            selector: parse_selector!($s),
        }
    };
}

lazy_static! {
    // Post container selectors
    static ref POST_CONTAINERS: Vec<NamedSelector> = vec![
        named_selector!(".feed-shared-update-v2"),
        named_selector!(r#"div[data-urn*="urn:li:activity"]"#),
        named_selector!(".occludable-update"),
        named_selector!("div.feed-shared-update-v2__description-wrapper"),
        named_selector!("article"),
        named_selector!(r#"[data-id^="urn:li:activity"]"#),
    ];

    // Containers used to collect a search batch
    static ref BATCH_CONTAINERS: Selector =
        parse_selector!(".feed-shared-update-v2, .occludable-update, article");

    // Primary post body containers
    static ref TEXT_CONTAINERS: Vec<NamedSelector> = vec![
        named_selector!(".feed-shared-update-v2__description"),
        named_selector!(".feed-shared-text"),
        named_selector!(".feed-shared-inline-show-more-text"),
        named_selector!(".feed-shared-update-v2__commentary"),
        named_selector!(r#"[data-test-id="main-feed-activity-card__commentary"]"#),
        named_selector!(".update-components-text"),
    ];

    static ref AUTHOR_NAME: Vec<Selector> = vec![
        parse_selector!(".update-components-actor__name"),
        parse_selector!(".feed-shared-actor__name"),
        parse_selector!(r#"span[dir="ltr"] span[aria-hidden="true"]"#),
    ];

    static ref PROFILE_LINK: Selector = parse_selector!(r#"a[href*="/in/"]"#);

    static ref DETAIL_LINK: Selector = parse_selector!(
        r#"a.app-aware-link[href*="/activity/"], a.app-aware-link[href*="/feed/update/"], a.feed-shared-mini-update-v2__link-to-detail"#
    );

    // Fallback discovery: any div holding both a post body and an author link
    static ref ANY_DIV: Selector = parse_selector!("div");
    static ref FALLBACK_BODY: Selector =
        parse_selector!(".feed-shared-text, .feed-shared-inline-show-more-text");

    // Marker for freshly rendered posts
    static ref NEW_POST_MARKER: Selector = parse_selector!(".feed-shared-update-v2");
}

/// Selectors used to find posts on a page and read their metadata
pub struct FeedSelectors {
    pub posts: &'static [NamedSelector],
    pub batch: &'static Selector,
    pub text: &'static [NamedSelector],
    pub author_name: &'static [Selector],
    pub profile_link: &'static Selector,
    pub detail_link: &'static Selector,
    pub any_div: &'static Selector,
    pub fallback_body: &'static Selector,
    pub new_post_marker: &'static Selector,
}

impl FeedSelectors {
    pub fn new() -> Self {
        Self {
            posts: &POST_CONTAINERS,
            batch: &BATCH_CONTAINERS,
            text: &TEXT_CONTAINERS,
            author_name: &AUTHOR_NAME,
            profile_link: &PROFILE_LINK,
            detail_link: &DETAIL_LINK,
            any_div: &ANY_DIV,
            fallback_body: &FALLBACK_BODY,
            new_post_marker: &NEW_POST_MARKER,
        }
    }
}

impl Default for FeedSelectors {
    fn default() -> Self {
        Self::new()
    }
}

/// Element names whose text is UI chrome rather than post content
pub const CHROME_TAGS: &[&str] = &["button", "script", "style"];

/// Short tokens that are UI vocabulary when they make up a whole text node
pub const UI_VOCABULARY: &[&str] = &[
    "like", "comment", "repost", "send", "share", "follow", "connect", "ago", "hr", "min", "sec",
    "day", "week", "month", "reactions", "comments",
];
