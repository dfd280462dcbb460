//! Multi-category search fan-out, ranking, and the Exa backend.
//!
//! A research query is sent to every requested content category of the search
//! backend. Categories are independent: one failing or coming back empty is
//! normal for sparse topics and never aborts the others. Whatever succeeded is
//! merged and ranked by score.

mod backend;
mod exa;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use researchpress_shared::{
    CategoryId, CategorySearchOutcome, CategorySelection, RankedResultSet, ResearchError, Result,
    SearchReport, SearchResult,
};

pub use backend::{SearchBackend, SearchRequest};
pub use exa::ExaClient;

/// Remediation hints returned when no category produced results.
pub const NO_RESULTS_SUGGESTIONS: [&str; 5] = [
    "Try a broader search query",
    "Increase the time window",
    "Select different categories",
    "Check if the query contains any special characters",
    "Try using more general keywords",
];

/// Timestamp format for published-date bounds (millisecond precision, literal `Z`).
const DATE_BOUND_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Fans a query out across categories and merges the results.
#[derive(Clone)]
pub struct SearchAggregator {
    backend: Arc<dyn SearchBackend>,
}

impl SearchAggregator {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Search every requested category and return the ranked, merged results.
    ///
    /// Fails fast on invalid input (empty query, zero counts, empty category
    /// set). Returns [`ResearchError::SearchExhausted`] when no category
    /// produced anything.
    pub async fn search(
        &self,
        query: &str,
        results_per_category: u32,
        lookback_hours: u32,
        categories: &CategorySelection,
    ) -> Result<SearchReport> {
        self.search_at(query, results_per_category, lookback_hours, categories, Utc::now())
            .await
    }

    /// Same as [`search`](Self::search) with an explicit "now".
    #[instrument(skip_all, fields(backend = self.backend.name(), query = %query))]
    pub async fn search_at(
        &self,
        query: &str,
        results_per_category: u32,
        lookback_hours: u32,
        categories: &CategorySelection,
        now: DateTime<Utc>,
    ) -> Result<SearchReport> {
        if query.trim().is_empty() {
            return Err(ResearchError::validation("search query is empty"));
        }
        if results_per_category == 0 {
            return Err(ResearchError::validation("results per category must be at least 1"));
        }
        if lookback_hours == 0 {
            return Err(ResearchError::validation("look-back window must be at least 1 hour"));
        }
        let categories = resolve_categories(categories)?;

        let (start, end) = time_window(now, lookback_hours);

        info!(
            categories = ?categories.iter().map(CategoryId::as_str).collect::<Vec<_>>(),
            results_per_category,
            lookback_hours,
            start = %start,
            "starting category fan-out"
        );

        let requests: Vec<SearchRequest> = categories
            .iter()
            .map(|&category| SearchRequest {
                query: query.to_string(),
                category,
                num_results: results_per_category,
                start_published_date: start.clone(),
                end_published_date: Some(end.clone()),
                use_autoprompt: true,
                full_text: true,
            })
            .collect();

        // join_all yields outcomes in request order, whatever order the calls finish in.
        let outcomes: Vec<CategorySearchOutcome> =
            join_all(requests.iter().map(|request| self.search_category(request))).await;

        let mut discovered: Vec<SearchResult> = Vec::new();
        for outcome in &outcomes {
            if let CategorySearchOutcome::Success { results, .. } = outcome {
                discovered.extend(results.iter().cloned());
            }
        }

        let report = SearchReport {
            results: RankedResultSet::from_discovered(discovered),
            outcomes,
        };

        log_summary(&report);

        if report.results.is_empty() {
            return Err(ResearchError::SearchExhausted {
                failed: report.failed(),
                suggestions: NO_RESULTS_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
            });
        }

        info!(total = report.results.len(), "search complete");
        Ok(report)
    }

    /// Run one category and fold every failure mode into an outcome.
    async fn search_category(&self, request: &SearchRequest) -> CategorySearchOutcome {
        let category = request.category;
        match self.backend.search(request).await {
            Ok(results) if results.is_empty() => {
                debug!(%category, "no results for category");
                CategorySearchOutcome::Failure {
                    category,
                    error: "no results".into(),
                }
            }
            Ok(results) => {
                debug!(%category, count = results.len(), "category succeeded");
                CategorySearchOutcome::Success { category, results }
            }
            Err(e) => {
                warn!(%category, error = %e, "category search failed");
                CategorySearchOutcome::Failure {
                    category,
                    error: e.to_string(),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Expand `All` to the catalog; keep an explicit list as given, minus duplicates.
pub fn resolve_categories(selection: &CategorySelection) -> Result<Vec<CategoryId>> {
    match selection {
        CategorySelection::All => Ok(CategoryId::CATALOG.to_vec()),
        CategorySelection::Only(list) if list.is_empty() => Err(ResearchError::validation(
            "at least one category is required",
        )),
        CategorySelection::Only(list) => {
            let mut resolved: Vec<CategoryId> = Vec::with_capacity(list.len());
            for category in list {
                if !resolved.contains(category) {
                    resolved.push(*category);
                }
            }
            Ok(resolved)
        }
    }
}

/// `(start, end)` published-date bounds ending at `now`.
fn time_window(now: DateTime<Utc>, lookback_hours: u32) -> (String, String) {
    let start = now - Duration::hours(i64::from(lookback_hours));
    (
        start.format(DATE_BOUND_FORMAT).to_string(),
        now.format(DATE_BOUND_FORMAT).to_string(),
    )
}

fn log_summary(report: &SearchReport) {
    let succeeded = report.succeeded();
    let failed = report.failed();

    if !succeeded.is_empty() {
        info!(
            categories = %join(&succeeded),
            "found results in categories"
        );
    }
    if !failed.is_empty() {
        warn!(categories = %join(&failed), "no results found in categories");
    }
}

fn join(categories: &[CategoryId]) -> String {
    categories
        .iter()
        .map(CategoryId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
