//! Search backend contract.

use async_trait::async_trait;

use researchpress_shared::{CategoryId, Result, SearchResult};

/// One category-scoped request to the search backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub category: CategoryId,
    pub num_results: u32,
    /// Lower published-date bound, `%Y-%m-%dT%H:%M:%S%.3fZ`.
    pub start_published_date: String,
    /// Upper published-date bound; when present it is "now" at call time.
    pub end_published_date: Option<String>,
    pub use_autoprompt: bool,
    pub full_text: bool,
}

/// A web-search provider that can answer category-scoped queries.
///
/// An empty `Ok` vector is a valid answer; the aggregator decides what it means.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run one category-scoped search.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>>;

    /// Human-readable backend name for tracing.
    fn name(&self) -> &str;
}
