//! Error types for ResearchPress.
//!
//! Library crates use [`ResearchError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::CategoryId;

/// Top-level error type for all ResearchPress operations.
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    /// Configuration loading or validation error (including missing credentials).
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to the search backend.
    #[error("network error: {0}")]
    Network(String),

    /// Every requested category failed or came back empty.
    #[error("no results found in any category (failed: {})", join_categories(.failed))]
    SearchExhausted {
        /// Categories that failed, in request order.
        failed: Vec<CategoryId>,
        /// User-facing remediation hints.
        suggestions: Vec<String>,
    },

    /// The chat-completion backend could not be reached or rejected the request.
    #[error("generation error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Generation {
        status: Option<u16>,
        message: String,
    },

    /// Malformed backend payload or input file.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid caller input (empty category set, bad selection, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ResearchError>;

impl ResearchError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a generation error, optionally carrying the HTTP status.
    pub fn generation(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Generation {
            status,
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn join_categories(categories: &[CategoryId]) -> String {
    categories
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ResearchError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = ResearchError::validation("at least one category is required");
        assert!(err.to_string().contains("at least one category"));
    }

    #[test]
    fn generation_error_includes_status() {
        let err = ResearchError::generation(Some(429), "rate limited");
        assert_eq!(err.to_string(), "generation error (HTTP 429): rate limited");

        let err = ResearchError::generation(None, "connection refused");
        assert_eq!(err.to_string(), "generation error: connection refused");
    }

    #[test]
    fn search_exhausted_lists_categories() {
        let err = ResearchError::SearchExhausted {
            failed: vec![CategoryId::News, CategoryId::Pdf],
            suggestions: vec!["Try a broader search query".into()],
        };
        assert_eq!(
            err.to_string(),
            "no results found in any category (failed: news, pdf)"
        );
    }
}
