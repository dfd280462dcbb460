//! Core domain types for the research-to-article pipeline.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one exported pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// A fixed content-type partition of the search backend's corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    Company,
    ResearchPaper,
    News,
    Tweet,
    PersonalSite,
    Pdf,
}

impl CategoryId {
    /// The full catalog, in the order categories are searched when `All` is requested.
    pub const CATALOG: [CategoryId; 6] = [
        CategoryId::Company,
        CategoryId::ResearchPaper,
        CategoryId::News,
        CategoryId::Tweet,
        CategoryId::PersonalSite,
        CategoryId::Pdf,
    ];

    /// Wire name sent to the search backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::ResearchPaper => "research_paper",
            Self::News => "news",
            Self::Tweet => "tweet",
            Self::PersonalSite => "personal_site",
            Self::Pdf => "pdf",
        }
    }

    /// Human-readable label for status output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Company => "Company Info",
            Self::ResearchPaper => "Research Papers",
            Self::News => "News",
            Self::Tweet => "Tweets",
            Self::PersonalSite => "Personal Sites",
            Self::Pdf => "PDFs",
        }
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CategoryId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::CATALOG
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown category '{s}' (expected one of: {})",
                    Self::CATALOG.map(|c| c.as_str()).join(", ")
                )
            })
    }
}

/// Which categories a search should cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySelection {
    /// Sentinel for the whole catalog.
    All,
    /// Exactly these categories.
    Only(Vec<CategoryId>),
}

impl CategorySelection {
    /// Parse a comma-separated list such as `news,pdf` or the literal `all`.
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let parts: Vec<&str> = s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if parts.iter().any(|p| p.eq_ignore_ascii_case("all")) {
            return Ok(Self::All);
        }

        parts
            .into_iter()
            .map(str::parse)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Self::Only)
    }
}

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// One hit from the search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    /// ISO-8601, possibly with fractional seconds and a trailing `Z`.
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub highlight_scores: Vec<f64>,
}

impl SearchResult {
    /// Score used for ranking; a missing score ranks as zero.
    pub fn rank_score(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }

    /// Whether the result carries a title or text worth offering as a source.
    pub fn has_content(&self) -> bool {
        let present = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.title) || present(&self.text)
    }
}

/// Search results ordered by descending score, ties kept in discovery order.
///
/// Positions handed out by this type are 1-based, matching how sources are
/// numbered for the user. Deserialized sets are re-ranked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RankedResultsFile")]
pub struct RankedResultSet {
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct RankedResultsFile {
    results: Vec<SearchResult>,
}

impl From<RankedResultsFile> for RankedResultSet {
    fn from(file: RankedResultsFile) -> Self {
        Self::from_discovered(file.results)
    }
}

impl RankedResultSet {
    /// Rank results given in discovery order.
    pub fn from_discovered(mut results: Vec<SearchResult>) -> Self {
        // `sort_by` is stable, so equal scores keep discovery order.
        results.sort_by(|a, b| {
            b.rank_score()
                .partial_cmp(&a.rank_score())
                .unwrap_or(Ordering::Equal)
        });
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result at a 1-based position.
    pub fn get(&self, position: usize) -> Option<&SearchResult> {
        position
            .checked_sub(1)
            .and_then(|index| self.results.get(index))
    }

    /// Iterate `(position, result)` pairs, positions starting at 1.
    pub fn positioned(&self) -> impl Iterator<Item = (usize, &SearchResult)> {
        self.results.iter().enumerate().map(|(i, r)| (i + 1, r))
    }

    /// Like [`positioned`](Self::positioned), but only results with a title or
    /// text. Positions keep their place in the full ranking.
    pub fn listable(&self) -> impl Iterator<Item = (usize, &SearchResult)> {
        self.positioned().filter(|(_, r)| r.has_content())
    }

    pub fn as_slice(&self) -> &[SearchResult] {
        &self.results
    }
}

/// Per-category result of a fan-out search.
#[derive(Debug, Clone)]
pub enum CategorySearchOutcome {
    Success {
        category: CategoryId,
        results: Vec<SearchResult>,
    },
    Failure {
        category: CategoryId,
        error: String,
    },
}

impl CategorySearchOutcome {
    pub fn category(&self) -> CategoryId {
        match self {
            Self::Success { category, .. } | Self::Failure { category, .. } => *category,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Ranked results of one search plus the per-category status summary.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub results: RankedResultSet,
    pub outcomes: Vec<CategorySearchOutcome>,
}

impl SearchReport {
    /// Categories that returned at least one result, in request order.
    pub fn succeeded(&self) -> Vec<CategoryId> {
        self.outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(CategorySearchOutcome::category)
            .collect()
    }

    /// Categories that failed or returned nothing, in request order.
    pub fn failed(&self) -> Vec<CategoryId> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(CategorySearchOutcome::category)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

/// Raw article text from the generation backend plus its extracted metadata.
///
/// `title` and `meta_description` are empty when the model never produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub content: String,
    pub title: String,
    pub meta_description: String,
    /// Whether a metadata backfill request was issued.
    #[serde(default)]
    pub backfilled: bool,
}

/// Metadata collected by the block converter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub title: String,
    pub meta_description: String,
    pub excerpt: String,
}

/// Heading depth supported by the block format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
}

impl HeadingLevel {
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::H1 => 1,
            Self::H2 => 2,
        }
    }
}

/// A typed unit of a block-format document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Heading { level: HeadingLevel, text: String },
    /// Plain text with embedded hyperlink spans.
    Paragraph { rich_text: String },
    MetadataField { name: String, value: String },
}
