//! Shared types, error model, and configuration for ResearchPress.
//!
//! This crate is the foundation depended on by all other ResearchPress crates.
//! It provides:
//! - [`ResearchError`], the unified error type
//! - Domain types ([`SearchResult`], [`RankedResultSet`], [`ArticleDraft`], [`ContentBlock`])
//! - Article templates ([`ArticleTemplate`], [`Locale`])
//! - Configuration ([`AppConfig`], config loading, credential lookup)

pub mod config;
pub mod error;
pub mod template;
pub mod text;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, MAX_RESULTS_PER_CATEGORY, OpenRouterConfig, SearchConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, openrouter_api_key,
    parse_lookback, resolve_api_key, search_api_key, validate_config,
};
pub use error::{ResearchError, Result};
pub use template::{ArticleTemplate, DEFAULT_CITATION_LABEL, Locale};
pub use text::strip_prefix_ci;
pub use types::{
    ArticleDraft, ArticleMetadata, CategoryId, CategorySearchOutcome, CategorySelection,
    ContentBlock, HeadingLevel, RankedResultSet, RunId, SearchReport, SearchResult,
};
