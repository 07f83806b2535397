//! Post text and metadata extraction
//!
//! Text extraction is a cascade of tiers tried in fixed order:
//! 1. Known post-body containers (first one with more than `min_text_len` chars)
//! 2. A text-node walk that skips UI chrome and UI vocabulary
//! 3. The node's full text
//!
//! Every tier's output is passed through [`clean_text`]. Extraction never
//! fails; the worst case is an empty string.

use scraper::ElementRef;

use crate::parser::sanitize::{clean_text, has_content};
use crate::parser::selectors::{FeedSelectors, CHROME_TAGS, UI_VOCABULARY};
use crate::utils::{absolutize, strip_query, truncate_chars};

/// Characters of inner markup used as a post identifier of last resort
pub const FALLBACK_ID_LEN: usize = 100;

/// One extraction tier: returns raw text when it found something usable
pub type TierFn = fn(&FeedSelectors, ElementRef<'_>, usize) -> Option<String>;

/// Named extraction tier
pub struct Tier {
    pub name: &'static str,
    pub extract: TierFn,
}

/// Extraction tiers in priority order
pub const TIERS: &[Tier] = &[
    Tier {
        name: "selector",
        extract: selector_tier,
    },
    Tier {
        name: "text-walk",
        extract: text_walk_tier,
    },
    Tier {
        name: "full-text",
        extract: full_text_tier,
    },
];

/// Tier 1: first known body container whose text is long enough
pub fn selector_tier(
    selectors: &FeedSelectors,
    node: ElementRef<'_>,
    min_len: usize,
) -> Option<String> {
    selectors.text.iter().find_map(|named| {
        let container = node.select(&named.selector).next()?;
        let text = container.text().collect::<String>();
        if has_content(&text, min_len) {
            tracing::trace!(selector = named.css, "Text matched body container");
            Some(text)
        } else {
            None
        }
    })
}

/// Tier 2: walk text nodes, skipping chrome elements and UI vocabulary
pub fn text_walk_tier(
    _selectors: &FeedSelectors,
    node: ElementRef<'_>,
    min_len: usize,
) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();

    for descendant in node.descendants() {
        let Some(text) = descendant.value().as_text() else {
            continue;
        };

        let inside_chrome = descendant
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take_while(|el| el.id() != node.id())
            .chain(std::iter::once(node))
            .any(|el| CHROME_TAGS.contains(&el.value().name()));
        if inside_chrome {
            continue;
        }

        let trimmed = text.trim();
        if trimmed.chars().count() > 3 && !is_ui_vocabulary(trimmed) {
            parts.push(trimmed);
        }
    }

    let joined = parts.join(" ");
    has_content(&joined, min_len).then_some(joined)
}

/// Tier 3: everything the node renders
pub fn full_text_tier(
    _selectors: &FeedSelectors,
    node: ElementRef<'_>,
    _min_len: usize,
) -> Option<String> {
    Some(node.text().collect::<String>())
}

fn is_ui_vocabulary(token: &str) -> bool {
    let lower = token.to_lowercase();
    UI_VOCABULARY.iter().any(|word| *word == lower)
}

/// Extracts normalized text and author/post metadata from post nodes
pub struct ContentExtractor {
    selectors: FeedSelectors,
    min_text_len: usize,
    site_origin: String,
}

impl ContentExtractor {
    #[must_use]
    pub fn new(min_text_len: usize, site_origin: impl Into<String>) -> Self {
        Self {
            selectors: FeedSelectors::new(),
            min_text_len,
            site_origin: site_origin.into(),
        }
    }

    pub fn min_text_len(&self) -> usize {
        self.min_text_len
    }

    pub fn selectors(&self) -> &FeedSelectors {
        &self.selectors
    }

    /// Normalized post text; never fails, may be empty
    pub fn extract_text(&self, node: ElementRef<'_>) -> String {
        self.extract_text_with_tier(node).0
    }

    /// Normalized post text together with the name of the tier that produced it
    pub fn extract_text_with_tier(&self, node: ElementRef<'_>) -> (String, &'static str) {
        for tier in TIERS {
            if let Some(raw) = (tier.extract)(&self.selectors, node, self.min_text_len) {
                tracing::debug!(tier = tier.name, "Post text extracted");
                return (clean_text(&raw), tier.name);
            }
        }
        (String::new(), "none")
    }

    /// Author display name
    pub fn author_name(&self, node: ElementRef<'_>) -> Option<String> {
        self.selectors.author_name.iter().find_map(|selector| {
            let text = node.select(selector).next()?.text().collect::<String>();
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
    }

    /// Absolute author profile URL without query string
    pub fn profile_url(&self, node: ElementRef<'_>) -> Option<String> {
        let href = node
            .select(self.selectors.profile_link)
            .next()?
            .value()
            .attr("href")?;
        Some(absolutize(strip_query(href), &self.site_origin))
    }

    /// Permalink of the post, preferring its URN
    pub fn post_url(&self, node: ElementRef<'_>) -> Option<String> {
        if let Some(url) = urn_attr(node).and_then(|urn| self.url_from_urn(urn)) {
            return Some(url);
        }

        let href = node
            .select(self.selectors.detail_link)
            .next()?
            .value()
            .attr("href")?;
        Some(absolutize(strip_query(href), &self.site_origin))
    }

    fn url_from_urn(&self, urn: &str) -> Option<String> {
        let origin = self.site_origin.trim_end_matches('/');
        ["activity", "share", "ugcPost"].iter().find_map(|kind| {
            let id = urn.split(&format!("{kind}:")).nth(1)?;
            Some(format!("{origin}/feed/update/urn:li:{kind}:{id}/"))
        })
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new(20, "https://www.linkedin.com")
    }
}

fn urn_attr<'a>(node: ElementRef<'a>) -> Option<&'a str> {
    let value = node.value();
    ["data-urn", "data-id"]
        .iter()
        .find_map(|name| value.attr(name).filter(|v| !v.is_empty()))
}

/// Post identifier: `data-urn`, else `data-id`, else a prefix of the markup
///
/// The markup prefix is not stable if the rendered content changes.
pub fn post_id(node: ElementRef<'_>) -> String {
    match urn_attr(node) {
        Some(urn) => urn.to_string(),
        None => truncate_chars(&node.inner_html(), FALLBACK_ID_LEN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn with_post<R>(html: &str, f: impl FnOnce(ElementRef<'_>) -> R) -> R {
        let doc = Html::parse_fragment(html);
        let selector = Selector::parse(".post").unwrap();
        let node = doc.select(&selector).next().expect("fixture has a .post node");
        f(node)
    }

    #[test]
    fn test_selector_tier_wins() {
        let html = r#"<div class="post">
            <span class="author">Jane</span>
            <div class="feed-shared-text">We are hiring developer for our startup</div>
            <button>Like</button>
        </div>"#;
        let extractor = ContentExtractor::default();
        let (text, tier) = with_post(html, |node| extractor.extract_text_with_tier(node));
        assert_eq!(tier, "selector");
        assert_eq!(text, "We are hiring developer for our startup");
    }

    #[test]
    fn test_selector_priority_order() {
        let html = r#"<div class="post">
            <div class="update-components-text">Lower priority body text that is long</div>
            <div class="feed-shared-update-v2__description">Top priority body text that is long</div>
        </div>"#;
        let extractor = ContentExtractor::default();
        let text = with_post(html, |node| extractor.extract_text(node));
        assert_eq!(text, "Top priority body text that is long");
    }

    #[test]
    fn test_short_container_falls_through() {
        let html = r#"<div class="post">
            <div class="feed-shared-text">too short</div>
            <p>Looking for a freelance developer to build my website</p>
            <button>Send a message to the author now</button>
            <span>like</span>
        </div>"#;
        let extractor = ContentExtractor::default();
        let (text, tier) = with_post(html, |node| extractor.extract_text_with_tier(node));
        assert_eq!(tier, "text-walk");
        assert!(text.contains("too short"));
        assert!(text.contains("Looking for a freelance developer to build my website"));
        assert!(!text.contains("message to the author"));
    }

    #[test]
    fn test_text_walk_skips_scripts_and_styles() {
        let html = r#"<div class="post">
            <script>var tracking = "hiring developer everywhere";</script>
            <style>.x { color: red; }</style>
            <p>Need a developer who knows Rust and Postgres</p>
        </div>"#;
        let extractor = ContentExtractor::default();
        let text = with_post(html, |node| extractor.extract_text(node));
        assert_eq!(text, "Need a developer who knows Rust and Postgres");
    }

    #[test]
    fn test_full_text_fallback() {
        let html = r#"<div class="post"><b>ok</b><i>hi</i></div>"#;
        let extractor = ContentExtractor::default();
        let (text, tier) = with_post(html, |node| extractor.extract_text_with_tier(node));
        assert_eq!(tier, "full-text");
        assert_eq!(text, "okhi");
    }

    #[test]
    fn test_empty_node() {
        let extractor = ContentExtractor::default();
        let text = with_post(r#"<div class="post"></div>"#, |node| extractor.extract_text(node));
        assert_eq!(text, "");
    }

    #[test]
    fn test_author_metadata() {
        let html = r#"<div class="post">
            <span class="feed-shared-actor__name">  Jane Doe  </span>
            <a href="/in/jane-doe?miniProfileUrn=abc">Jane</a>
        </div>"#;
        let extractor = ContentExtractor::default();
        with_post(html, |node| {
            assert_eq!(extractor.author_name(node).as_deref(), Some("Jane Doe"));
            assert_eq!(
                extractor.profile_url(node).as_deref(),
                Some("https://www.linkedin.com/in/jane-doe")
            );
        });
    }

    #[test]
    fn test_post_url_from_urn() {
        let extractor = ContentExtractor::default();
        let html = r#"<div class="post" data-urn="urn:li:activity:7123"></div>"#;
        let url = with_post(html, |node| extractor.post_url(node));
        assert_eq!(
            url.as_deref(),
            Some("https://www.linkedin.com/feed/update/urn:li:activity:7123/")
        );

        let html = r#"<div class="post" data-id="urn:li:ugcPost:99"></div>"#;
        let url = with_post(html, |node| extractor.post_url(node));
        assert_eq!(
            url.as_deref(),
            Some("https://www.linkedin.com/feed/update/urn:li:ugcPost:99/")
        );
    }

    #[test]
    fn test_post_url_from_detail_link() {
        let extractor = ContentExtractor::default();
        let html = r#"<div class="post">
            <a class="app-aware-link" href="/feed/update/urn:li:share:55/?trk=x">3h</a>
        </div>"#;
        let url = with_post(html, |node| extractor.post_url(node));
        assert_eq!(
            url.as_deref(),
            Some("https://www.linkedin.com/feed/update/urn:li:share:55/")
        );
    }

    #[test]
    fn test_post_id_fallbacks() {
        let id = with_post(
            r#"<div class="post" data-urn="urn:li:activity:1" data-id="other"></div>"#,
            post_id,
        );
        assert_eq!(id, "urn:li:activity:1");

        let id = with_post(r#"<div class="post" data-id="urn:li:activity:2"></div>"#, post_id);
        assert_eq!(id, "urn:li:activity:2");

        let body = "x".repeat(300);
        let id = with_post(&format!(r#"<div class="post"><p>{body}</p></div>"#), post_id);
        assert_eq!(id.chars().count(), FALLBACK_ID_LEN);
        assert!(id.starts_with("<p>"));
    }

    #[test]
    fn test_empty_attributes_are_skipped() {
        let id = with_post(
            r#"<div class="post" data-urn="" data-id="urn:li:activity:3"></div>"#,
            post_id,
        );
        assert_eq!(id, "urn:li:activity:3");

        let id = with_post(
            r#"<div class="post" data-urn="" data-id=""><p>Need a developer</p></div>"#,
            post_id,
        );
        assert_eq!(id, "<p>Need a developer</p>");

        let extractor = ContentExtractor::default();
        let url = with_post(
            r#"<div class="post" data-urn="" data-id="urn:li:activity:4"></div>"#,
            |node| extractor.post_url(node),
        );
        assert_eq!(
            url.as_deref(),
            Some("https://www.linkedin.com/feed/update/urn:li:activity:4/")
        );
    }
}
