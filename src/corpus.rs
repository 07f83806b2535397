//! Keyword corpus driving the auto-scan
//!
//! The corpus is an ordered list of search phrases; order defines the scan
//! sequence. Entries are assumed unique and are not deduplicated.

use url::Url;

/// Search phrases scanned by default, in scan order
pub const SEARCH_KEYWORDS: &[&str] = &[
    "looking for developer",
    "hiring developer",
    "need a developer",
    "build my website",
    "looking for agency",
    "freelance developer needed",
    "software engineer needed",
    "looking for web developer",
    "need app developer",
    "hiring react developer",
    "website development needed",
    "looking for programmer",
    "need a website built",
    "mobile app developer needed",
    "fullstack developer needed",
    "looking for software agency",
    "web development services needed",
    "need help building app",
    "who can build my website",
    "recommendations for developer",
];

/// Ordered, immutable list of search phrases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordCorpus {
    keywords: Vec<String>,
}

impl KeywordCorpus {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.keywords.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }
}

impl Default for KeywordCorpus {
    fn default() -> Self {
        Self::new(SEARCH_KEYWORDS.iter().copied())
    }
}

/// Build the keyword-scoped search view URL, sorted by latest
pub fn search_url(base: &str, keyword: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut()
        .clear()
        .append_pair("keywords", keyword)
        .append_pair("origin", "GLOBAL_SEARCH_HEADER")
        .append_pair("sortBy", "\"date_posted\"");
    Ok(url.to_string())
}

/// Recover the keyword from a search view URL
pub fn keyword_from_search_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(name, _)| name == "keywords")
        .map(|(_, value)| value.into_owned())
}

/// File-name friendly form of a keyword: `"need a developer"` -> `"need-a-developer"`
pub fn slug(keyword: &str) -> String {
    keyword
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Whether a page URL is a keyword search view
pub fn is_search_page(url: &str) -> bool {
    url.contains("/search/results/")
}
