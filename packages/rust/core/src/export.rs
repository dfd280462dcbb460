//! Article export and saved search results.
//!
//! Each exported run gets its own directory under the output root:
//! ```text
//! <output_root>/<run_id>/
//! ├── manifest.json
//! ├── article_20241001_120000.md
//! ├── article_20241001_120000.blocks.txt   (when blocks were produced)
//! └── sources.json                         (optional)
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use researchpress_shared::{Locale, RankedResultSet, ResearchError, Result, RunId};

use crate::pipeline::WrittenArticle;

pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Output settings for one export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Root directory; each run is written to `<output_root>/<run_id>/`.
    pub output_root: PathBuf,
    /// Model ID recorded in the manifest.
    pub model: String,
    pub locale: Locale,
    /// Also write the selected sources as `sources.json`.
    pub include_sources: bool,
}

/// Checksum record for one written file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Contents of `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub run_id: RunId,
    pub topic: String,
    pub model: String,
    pub locale: Locale,
    pub title: String,
    pub meta_description: String,
    /// Excerpt collected by the block converter, empty when absent.
    #[serde(default)]
    pub excerpt: String,
    pub metadata_backfilled: bool,
    pub source_urls: Vec<String>,
    pub files: Vec<ExportedFile>,
    pub created_at: DateTime<Utc>,
}

/// Output from a successful export.
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub run_dir: PathBuf,
    /// Path of the Markdown article.
    pub article_path: PathBuf,
    pub manifest: RunManifest,
}

/// Write the article, its block document, optional sources, and the manifest.
#[instrument(skip_all, fields(output_root = %config.output_root.display(), topic = %article.topic))]
pub fn export_article(
    config: &ExportConfig,
    article: &WrittenArticle,
    now: DateTime<Utc>,
) -> Result<ExportResult> {
    let run_id = RunId::new();
    let run_dir = config.output_root.join(run_id.to_string());
    std::fs::create_dir_all(&run_dir).map_err(|e| ResearchError::io(&run_dir, e))?;

    let stem = article_stem(now);
    let mut files = Vec::new();

    let article_name = format!("{stem}.md");
    files.push(write_atomic(&run_dir, &article_name, &article.draft.content)?);

    if let Some(blocks) = &article.blocks {
        files.push(write_atomic(
            &run_dir,
            &format!("{stem}.blocks.txt"),
            &blocks.to_block_markup(),
        )?);
    }

    if config.include_sources {
        let json = to_json(&article.sources)?;
        files.push(write_atomic(&run_dir, "sources.json", &json)?);
    }

    let manifest = RunManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        run_id,
        topic: article.topic.clone(),
        model: config.model.clone(),
        locale: config.locale,
        title: article.draft.title.clone(),
        meta_description: article.draft.meta_description.clone(),
        excerpt: article
            .blocks
            .as_ref()
            .map(|b| b.metadata.excerpt.clone())
            .unwrap_or_default(),
        metadata_backfilled: article.draft.backfilled,
        source_urls: article.sources.iter().map(|s| s.url.clone()).collect(),
        files,
        created_at: now,
    };
    write_atomic(&run_dir, "manifest.json", &to_json(&manifest)?)?;

    info!(
        path = %run_dir.display(),
        files = manifest.files.len(),
        "article exported"
    );

    Ok(ExportResult {
        article_path: run_dir.join(article_name),
        run_dir,
        manifest,
    })
}

/// `article_{YYYYmmdd_HHMMSS}`.
pub fn article_stem(now: DateTime<Utc>) -> String {
    format!("article_{}", now.format("%Y%m%d_%H%M%S"))
}

// ---------------------------------------------------------------------------
// Saved search results
// ---------------------------------------------------------------------------

/// Search results saved between the search and generate steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedResults {
    pub query: String,
    pub saved_at: DateTime<Utc>,
    pub results: RankedResultSet,
}

/// Save ranked results as pretty JSON.
pub fn save_results(path: &Path, saved: &SavedResults) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ResearchError::io(parent, e))?;
    }
    let json = to_json(saved)?;
    std::fs::write(path, json).map_err(|e| ResearchError::io(path, e))?;
    debug!(path = %path.display(), count = saved.results.len(), "saved search results");
    Ok(())
}

/// Load results written by [`save_results`].
pub fn load_results(path: &Path) -> Result<SavedResults> {
    let content = std::fs::read_to_string(path).map_err(|e| ResearchError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| {
        ResearchError::parse(format!("invalid results file {}: {e}", path.display()))
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn to_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| ResearchError::parse(format!("JSON serialization failed: {e}")))
}

/// Write via a temp file and rename, returning the file's checksum record.
fn write_atomic(dir: &Path, filename: &str, content: &str) -> Result<ExportedFile> {
    let target = dir.join(filename);
    let temp = dir.join(format!(".{filename}.tmp"));

    std::fs::write(&temp, content).map_err(|e| ResearchError::io(&temp, e))?;
    if let Err(e) = std::fs::rename(&temp, &target) {
        let _ = std::fs::remove_file(&temp);
        return Err(ResearchError::io(&target, e));
    }

    let hash = format!("{:x}", Sha256::digest(content.as_bytes()));
    debug!(file = %filename, size = content.len(), "wrote file");

    Ok(ExportedFile {
        filename: filename.to_string(),
        sha256: hash,
        size_bytes: content.len(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use researchpress_blocks::convert;
    use researchpress_shared::{ArticleDraft, ArticleTemplate, SearchResult};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rp-export-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 1, 12, 30, 5).unwrap()
    }

    fn source(url: &str) -> SearchResult {
        SearchResult {
            title: Some("A source".into()),
            url: url.into(),
            published_date: Some("2024-10-01T09:00:00.000Z".into()),
            author: None,
            score: Some(0.5),
            text: Some("text".into()),
            highlights: vec![],
            highlight_scores: vec![],
        }
    }

    fn article(with_blocks: bool) -> WrittenArticle {
        let content = "Title: Battery Boom\nMeta Description: Cheaper cells.\n# Battery Boom\n\nBody.";
        WrittenArticle {
            topic: "batteries".into(),
            prompt: "prompt".into(),
            sources: vec![source("https://a.test"), source("https://b.test")],
            draft: ArticleDraft {
                content: content.into(),
                title: "Battery Boom".into(),
                meta_description: "Cheaper cells.".into(),
                backfilled: false,
            },
            blocks: with_blocks.then(|| convert(content, &ArticleTemplate::default())),
            elapsed: std::time::Duration::from_millis(10),
        }
    }

    fn config(root: &Path, include_sources: bool) -> ExportConfig {
        ExportConfig {
            output_root: root.into(),
            model: "anthropic/claude-3.5-sonnet".into(),
            locale: Locale::En,
            include_sources,
        }
    }

    #[test]
    fn export_writes_all_files_with_checksums() {
        let tmp = temp_dir();
        let result = export_article(&config(&tmp, true), &article(true), now()).unwrap();

        assert!(result.run_dir.starts_with(&tmp));
        assert_eq!(result.article_path, result.run_dir.join("article_20241001_123005.md"));
        assert!(result.article_path.exists());
        assert!(result.run_dir.join("article_20241001_123005.blocks.txt").exists());
        assert!(result.run_dir.join("sources.json").exists());
        assert!(result.run_dir.join("manifest.json").exists());

        let names: Vec<&str> = result.manifest.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(
            names,
            ["article_20241001_123005.md", "article_20241001_123005.blocks.txt", "sources.json"]
        );
        assert!(result.manifest.files.iter().all(|f| f.sha256.len() == 64));

        let written = std::fs::read_to_string(&result.article_path).unwrap();
        assert_eq!(
            result.manifest.files[0].sha256,
            format!("{:x}", Sha256::digest(written.as_bytes()))
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn manifest_round_trips_from_disk() {
        let tmp = temp_dir();
        let result = export_article(&config(&tmp, false), &article(false), now()).unwrap();

        let raw = std::fs::read_to_string(result.run_dir.join("manifest.json")).unwrap();
        let manifest: RunManifest = serde_json::from_str(&raw).unwrap();

        assert_eq!(manifest.schema_version, MANIFEST_SCHEMA_VERSION);
        assert_eq!(manifest.run_id, result.manifest.run_id);
        assert_eq!(manifest.title, "Battery Boom");
        assert_eq!(manifest.source_urls, ["https://a.test", "https://b.test"]);
        assert_eq!(manifest.files.len(), 1);
        assert!(!result.run_dir.join("sources.json").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn no_temp_files_left_behind() {
        let tmp = temp_dir();
        let result = export_article(&config(&tmp, true), &article(true), now()).unwrap();

        let leftovers = std::fs::read_dir(&result.run_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let tmp = temp_dir();
        // A directory at the target path makes the rename fail.
        std::fs::create_dir_all(tmp.join("taken.md").join("inner")).unwrap();

        let err = write_atomic(&tmp, "taken.md", "body").unwrap_err();
        assert!(matches!(err, ResearchError::Io { .. }));
        assert!(!tmp.join(".taken.md.tmp").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn saved_results_round_trip() {
        let tmp = temp_dir();
        let path = tmp.join("nested").join("results.json");
        let saved = SavedResults {
            query: "batteries".into(),
            saved_at: now(),
            results: RankedResultSet::from_discovered(vec![source("https://a.test")]),
        };

        save_results(&path, &saved).unwrap();
        let loaded = load_results(&path).unwrap();
        assert_eq!(loaded.query, "batteries");
        assert_eq!(loaded.results, saved.results);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn loaded_results_are_reranked() {
        let tmp = temp_dir();
        let path = tmp.join("unsorted.json");
        std::fs::write(
            &path,
            r#"{
                "query": "batteries",
                "saved_at": "2024-10-01T12:00:00Z",
                "results": {"results": [
                    {"url": "https://low.test", "title": "Low", "score": 0.1},
                    {"url": "https://high.test", "title": "High", "score": 0.9}
                ]}
            }"#,
        )
        .unwrap();

        let loaded = load_results(&path).unwrap();
        assert_eq!(loaded.results.get(1).unwrap().url, "https://high.test");
        assert_eq!(loaded.results.get(2).unwrap().url, "https://low.test");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_results_file_is_parse_error() {
        let tmp = temp_dir();
        let path = tmp.join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_results(&path).unwrap_err();
        assert!(matches!(err, ResearchError::Parse { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
