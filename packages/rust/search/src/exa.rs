//! HTTP client for the Exa neural search API.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use researchpress_shared::{ResearchError, Result, SearchConfig, SearchResult};

use crate::backend::{SearchBackend, SearchRequest};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("ResearchPress/", env!("CARGO_PKG_VERSION"));

/// Exa ranking mode; results are always ranked by embedding similarity.
const SEARCH_TYPE: &str = "neural";

/// How much of an error body ends up in the error message.
const ERROR_BODY_LIMIT: usize = 200;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaSearchBody<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    search_type: &'static str,
    num_results: u32,
    category: &'static str,
    use_autoprompt: bool,
    start_published_date: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_published_date: Option<&'a str>,
    contents: ExaContents,
}

#[derive(Debug, Serialize)]
struct ExaContents {
    text: bool,
}

#[derive(Debug, Deserialize)]
struct ExaSearchResponse {
    #[serde(default)]
    results: Vec<ExaResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExaResult {
    url: String,
    title: Option<String>,
    published_date: Option<String>,
    author: Option<String>,
    score: Option<f64>,
    text: Option<String>,
    highlights: Option<Vec<String>>,
    highlight_scores: Option<Vec<f64>>,
}

impl From<ExaResult> for SearchResult {
    fn from(r: ExaResult) -> Self {
        Self {
            title: r.title,
            url: r.url,
            published_date: r.published_date,
            author: r.author,
            score: r.score,
            text: r.text,
            highlights: r.highlights.unwrap_or_default(),
            highlight_scores: r.highlight_scores.unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Exa search client.
pub struct ExaClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for ExaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExaClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ExaClient {
    /// Build a client from the `[search]` config section and a resolved key.
    pub fn new(api_key: impl Into<String>, config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ResearchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl SearchBackend for ExaClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let url = format!("{}/search", self.base_url);
        let body = ExaSearchBody {
            query: &request.query,
            search_type: SEARCH_TYPE,
            num_results: request.num_results,
            category: request.category.as_str(),
            use_autoprompt: request.use_autoprompt,
            start_published_date: &request.start_published_date,
            end_published_date: request.end_published_date.as_deref(),
            contents: ExaContents {
                text: request.full_text,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ResearchError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(ResearchError::Network(format!("{url}: HTTP {status}: {snippet}")));
        }

        let parsed: ExaSearchResponse = response.json().await.map_err(|e| {
            ResearchError::parse(format!("invalid search response from {url}: {e}"))
        })?;

        debug!(
            category = %request.category,
            count = parsed.results.len(),
            "search backend responded"
        );

        Ok(parsed.results.into_iter().map(SearchResult::from).collect())
    }

    fn name(&self) -> &str {
        "exa"
    }
}
