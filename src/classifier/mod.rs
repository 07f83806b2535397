//! Hiring-post classification
//!
//! Two stages:
//! - a deterministic keyword gate that alone decides whether a post is a lead
//! - an optional [`HiringAnalyzer`] whose result is attached as advisory metadata

use async_trait::async_trait;
use std::sync::Arc;

use crate::llm::GeminiClient;
use crate::models::ClassificationResult;

/// Phrases whose presence marks a post as a hiring lead
pub const HIRING_KEYWORDS: &[&str] = &[
    // Developer/Engineer
    "hiring developer",
    "looking for developer",
    "need a developer",
    "need developer",
    "seeking developer",
    "freelance developer",
    "software engineer needed",
    "hiring software engineer",
    "looking for programmer",
    "need programmer",
    // Website/Web Development
    "build my website",
    "build a website",
    "need a website",
    "website developer",
    "web developer needed",
    "looking for web developer",
    "website development",
    "need website built",
    "looking to build website",
    "website redesign",
    // App Development
    "looking for app developer",
    "need app developer",
    "mobile app developer",
    "app development",
    "build my app",
    "build an app",
    "looking to build app",
    // Agency/Team
    "looking for agency",
    "need an agency",
    "software agency",
    "development agency",
    "web development agency",
    "looking for team",
    "need a team",
    // Project/Services
    "software project",
    "development project",
    "looking for services",
    "development services",
    "custom development",
    "looking for help with",
    "need help building",
    "who can build",
    "anyone build",
    "recommendations for developer",
    "recommend a developer",
    // Specific Tech
    "react developer",
    "nodejs developer",
    "python developer",
    "fullstack developer",
    "full stack developer",
    "frontend developer",
    "backend developer",
];

/// Probabilistic second opinion on post text
///
/// Implementations never fail: errors resolve to
/// [`ClassificationResult::fail_open`].
#[async_trait]
pub trait HiringAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> ClassificationResult;
}

#[async_trait]
impl HiringAnalyzer for GeminiClient {
    async fn analyze(&self, text: &str) -> ClassificationResult {
        self.analyze_post(text).await
    }
}

/// Outcome of classifying one post
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Keyword gate decision; the only thing that decides surfacing
    pub is_lead: bool,
    /// First hiring keyword found
    pub matched_keyword: Option<String>,
    /// Advisory AI metadata, present when an analyzer ran
    pub analysis: Option<ClassificationResult>,
}

/// Keyword gate plus optional AI augmentation
#[derive(Clone)]
pub struct Classifier {
    keywords: Vec<String>,
    analyzer: Option<Arc<dyn HiringAnalyzer>>,
}

impl Classifier {
    /// Classifier over the built-in hiring vocabulary, without AI stage
    pub fn new() -> Self {
        Self::with_keywords(HIRING_KEYWORDS.iter().copied())
    }

    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
            analyzer: None,
        }
    }

    /// Attach an AI analyzer consulted for keyword-positive posts
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: Arc<dyn HiringAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn has_analyzer(&self) -> bool {
        self.analyzer.is_some()
    }

    /// First vocabulary phrase contained in `text`, case-insensitively
    pub fn matched_keyword(&self, text: &str) -> Option<&str> {
        if text.is_empty() {
            return None;
        }
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lower.contains(k.as_str()))
            .map(String::as_str)
    }

    /// Deterministic keyword gate
    pub fn contains_hiring_keywords(&self, text: &str) -> bool {
        self.matched_keyword(text).is_some()
    }

    /// Run both stages; the analyzer only sees posts that passed the gate
    pub async fn classify(&self, text: &str) -> Verdict {
        let matched_keyword = self.matched_keyword(text).map(str::to_string);
        let is_lead = matched_keyword.is_some();

        let analysis = match (&self.analyzer, is_lead) {
            (Some(analyzer), true) => {
                let result = analyzer.analyze(text).await;
                tracing::debug!(
                    is_hiring = result.is_hiring,
                    confidence = result.confidence,
                    summary = %result.summary,
                    "AI analysis attached"
                );
                Some(result)
            }
            _ => None,
        };

        Verdict {
            is_lead,
            matched_keyword,
            analysis,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}
