//! End-to-end pipeline: query → search → selected sources → article → blocks.
//!
//! Each stage is a separate entry point so callers can stop after searching,
//! hand the ranked results to a user for selection, and resume later.

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::{info, instrument};

use researchpress_blocks::{BlockDocument, convert};
use researchpress_generation::ArticleGenerator;
use researchpress_search::SearchAggregator;
use researchpress_shared::{
    ArticleDraft, CategorySelection, RankedResultSet, ResearchError, Result, SearchReport,
    SearchResult,
};

use crate::prompt;

/// Parameters of one research run.
#[derive(Debug, Clone)]
pub struct ResearchQuery {
    pub query: String,
    pub results_per_category: u32,
    pub lookback_hours: u32,
    pub categories: CategorySelection,
}

/// Everything produced by the writing stage.
#[derive(Debug, Clone)]
pub struct WrittenArticle {
    /// Topic the article was written about.
    pub topic: String,
    /// Prompt sent to the generator.
    pub prompt: String,
    /// Sources included in the prompt, in position order.
    pub sources: Vec<SearchResult>,
    pub draft: ArticleDraft,
    /// Block-format rendition of the draft (absent when disabled).
    pub blocks: Option<BlockDocument>,
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the search stage produced results.
    fn search_done(&self, report: &SearchReport);
    /// Called when the article has been written.
    fn article_done(&self, article: &WrittenArticle);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn search_done(&self, _report: &SearchReport) {}
    fn article_done(&self, _article: &WrittenArticle) {}
}

/// Run the search stage.
#[instrument(skip_all, fields(query = %query.query))]
pub async fn research(
    aggregator: &SearchAggregator,
    query: &ResearchQuery,
    progress: &dyn ProgressReporter,
) -> Result<SearchReport> {
    progress.phase("Searching categories");
    let report = aggregator
        .search(
            &query.query,
            query.results_per_category,
            query.lookback_hours,
            &query.categories,
        )
        .await?;

    progress.search_done(&report);
    Ok(report)
}

/// Run the writing stage over the selected 1-based source positions.
///
/// Fails with a validation error if none of the selected positions exist, so
/// the generator is never called without sources.
#[instrument(skip_all, fields(topic = %topic, selected = selection.len()))]
pub async fn write_article(
    generator: &ArticleGenerator,
    results: &RankedResultSet,
    selection: &BTreeSet<usize>,
    topic: &str,
    with_blocks: bool,
    progress: &dyn ProgressReporter,
) -> Result<WrittenArticle> {
    let start = Instant::now();

    let sources: Vec<SearchResult> = selection
        .iter()
        .filter_map(|&position| results.get(position).cloned())
        .collect();
    if sources.is_empty() {
        return Err(ResearchError::validation(
            "select at least one source before generating an article",
        ));
    }

    progress.phase("Building research prompt");
    let prompt = prompt::build(results, selection);

    progress.phase("Generating article");
    let draft = generator.generate(&prompt, topic).await?;

    let blocks = if with_blocks {
        progress.phase("Converting to blocks");
        Some(convert(&draft.content, generator.template()))
    } else {
        None
    };

    let article = WrittenArticle {
        topic: topic.to_string(),
        prompt,
        sources,
        draft,
        blocks,
        elapsed: start.elapsed(),
    };

    info!(
        sources = article.sources.len(),
        title = %article.draft.title,
        elapsed_ms = article.elapsed.as_millis() as u64,
        "article written"
    );

    progress.article_done(&article);
    Ok(article)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use researchpress_generation::{ChatBackend, ChatRequest, GeneratorConfig};
    use researchpress_search::{SearchBackend, SearchRequest};
    use researchpress_shared::{ArticleTemplate, CategoryId, ContentBlock, Locale};
    use std::sync::{Arc, Mutex};

    struct FixtureSearch;

    #[async_trait]
    impl SearchBackend for FixtureSearch {
        async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
            if request.category != CategoryId::News {
                return Ok(vec![]);
            }
            let raw = std::fs::read_to_string(
                std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
                    .join("../../../fixtures/search/news.json"),
            )
            .unwrap();
            let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
            Ok(value["results"]
                .as_array()
                .unwrap()
                .iter()
                .map(|r| SearchResult {
                    title: r["title"].as_str().map(Into::into),
                    url: r["url"].as_str().unwrap().into(),
                    published_date: r["publishedDate"].as_str().map(Into::into),
                    author: None,
                    score: r["score"].as_f64(),
                    text: r["text"].as_str().map(Into::into),
                    highlights: vec![],
                    highlight_scores: vec![],
                })
                .collect())
        }

        fn name(&self) -> &str {
            "fixture"
        }
    }

    #[derive(Default)]
    struct EchoChat {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatBackend for EchoChat {
        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            let user = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            self.prompts.lock().unwrap().push(user);
            Ok("Title: Battery Boom\nMeta Description: Cheaper cells.\n# Battery Boom\n\n\
                Range grows (Source: [Example News](https://www.example-news.com/batteries/breakthrough))."
                .into())
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        phases: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.phases.lock().unwrap().push(name.to_string());
        }
        fn search_done(&self, _report: &SearchReport) {}
        fn article_done(&self, _article: &WrittenArticle) {}
    }

    fn generator(chat: &Arc<EchoChat>) -> ArticleGenerator {
        ArticleGenerator::new(
            chat.clone(),
            GeneratorConfig::default(),
            ArticleTemplate::for_locale(Locale::En),
        )
    }

    #[tokio::test]
    async fn search_then_write_produces_blocks() {
        let aggregator = SearchAggregator::new(Arc::new(FixtureSearch));
        let query = ResearchQuery {
            query: "solid-state batteries".into(),
            results_per_category: 5,
            lookback_hours: 24,
            categories: CategorySelection::Only(vec![CategoryId::News, CategoryId::Pdf]),
        };
        let progress = RecordingProgress::default();

        let report = research(&aggregator, &query, &progress).await.unwrap();
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.failed(), vec![CategoryId::Pdf]);

        let chat = Arc::new(EchoChat::default());
        let selection: BTreeSet<usize> = [1, 2].into_iter().collect();
        let article = write_article(
            &generator(&chat),
            &report.results,
            &selection,
            "batteries",
            true,
            &progress,
        )
        .await
        .unwrap();

        assert_eq!(article.sources.len(), 2);
        assert_eq!(article.draft.title, "Battery Boom");
        assert_eq!(chat.prompts.lock().unwrap().as_slice(), [article.prompt.clone()]);
        assert!(article.prompt.contains("Solid\\_state \\*battery\\* breakthrough"));

        let blocks = article.blocks.unwrap();
        assert_eq!(blocks.metadata.title, "Battery Boom");
        assert!(matches!(
            &blocks.blocks[1],
            ContentBlock::Paragraph { rich_text } if rich_text.contains(">Source: Example News</a>)")
        ));

        let phases = progress.phases.lock().unwrap().clone();
        assert_eq!(
            phases,
            [
                "Searching categories",
                "Building research prompt",
                "Generating article",
                "Converting to blocks",
            ]
        );
    }

    #[tokio::test]
    async fn selection_without_valid_sources_is_rejected() {
        let chat = Arc::new(EchoChat::default());
        let results = RankedResultSet::from_discovered(vec![]);
        let selection: BTreeSet<usize> = [1].into_iter().collect();

        let err = write_article(&generator(&chat), &results, &selection, "t", false, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, ResearchError::Validation { .. }));
        assert!(chat.prompts.lock().unwrap().is_empty());
    }
}
