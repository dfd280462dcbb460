//! Article generation against a chat-completion backend.
//!
//! The generator sends the research prompt with a locale-specific system
//! instruction, pulls the title and meta description out of the reply, and
//! issues at most one follow-up request to recover whichever of the two the
//! model left out.

mod chat;
mod metadata;
mod openrouter;

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use researchpress_shared::{ArticleDraft, ArticleTemplate, OpenRouterConfig, Result};

pub use chat::{ChatBackend, ChatMessage, ChatRequest, Role};
pub use metadata::{META_DESCRIPTION_PREFIX, TITLE_PREFIX, extract_metadata};
pub use openrouter::OpenRouterClient;

/// System instruction for the metadata recovery request.
pub const METADATA_SYSTEM_PROMPT: &str = "You are an SEO expert. Return only the Title and Meta Description, each on a new line, prefixed with 'Title: ' and 'Meta Description: '.";

// ---------------------------------------------------------------------------
// Generator config
// ---------------------------------------------------------------------------

/// Model settings for generation requests.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Model ID sent to the backend.
    pub model: String,
    /// Sampling temperature for both requests.
    pub temperature: f32,
    /// Output token bound for the article request.
    pub max_tokens: u32,
}

impl From<&OpenRouterConfig> for GeneratorConfig {
    fn from(config: &OpenRouterConfig) -> Self {
        Self {
            model: config.default_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::from(&OpenRouterConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Turns a research prompt into an [`ArticleDraft`].
#[derive(Clone)]
pub struct ArticleGenerator {
    backend: Arc<dyn ChatBackend>,
    config: GeneratorConfig,
    template: ArticleTemplate,
}

impl ArticleGenerator {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        config: GeneratorConfig,
        template: ArticleTemplate,
    ) -> Self {
        Self {
            backend,
            config,
            template,
        }
    }

    pub fn template(&self) -> &ArticleTemplate {
        &self.template
    }

    /// Generate an article about `topic` from the research `prompt`.
    ///
    /// A failed article request is returned as-is with no retry. Missing
    /// metadata triggers one recovery request whose own failure is tolerated.
    #[instrument(skip_all, fields(backend = self.backend.name(), model = %self.config.model, topic = %topic))]
    pub async fn generate(&self, prompt: &str, topic: &str) -> Result<ArticleDraft> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(self.template.system_prompt(topic)),
                ChatMessage::user(prompt),
            ],
            temperature: self.config.temperature,
            max_tokens: Some(self.config.max_tokens),
        };

        info!(prompt_len = prompt.len(), "requesting article");
        let content = self.backend.complete(&request).await?;
        debug!(content_len = content.len(), "article received");

        let (title, meta_description) = extract_metadata(&content);
        let mut draft = ArticleDraft {
            content,
            title,
            meta_description,
            backfilled: false,
        };

        if draft.title.is_empty() || draft.meta_description.is_empty() {
            self.backfill_metadata(&mut draft).await;
        }

        info!(
            title = %draft.title,
            has_meta_description = !draft.meta_description.is_empty(),
            backfilled = draft.backfilled,
            "article generated"
        );

        Ok(draft)
    }

    /// One-shot recovery of missing title/meta description. Never recurses.
    async fn backfill_metadata(&self, draft: &mut ArticleDraft) {
        warn!(
            missing_title = draft.title.is_empty(),
            missing_meta_description = draft.meta_description.is_empty(),
            "article is missing metadata, requesting backfill"
        );
        draft.backfilled = true;

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(METADATA_SYSTEM_PROMPT),
                ChatMessage::user(metadata_prompt(&draft.content)),
            ],
            temperature: self.config.temperature,
            max_tokens: None,
        };

        let reply = match self.backend.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "metadata backfill failed, keeping empty fields");
                return;
            }
        };

        let (new_title, new_meta) = extract_metadata(&reply);
        let mut recovered = false;

        if draft.title.is_empty() && !new_title.is_empty() {
            draft.title = new_title;
            recovered = true;
        }
        if draft.meta_description.is_empty() && !new_meta.is_empty() {
            draft.meta_description = new_meta;
            recovered = true;
        }

        if recovered {
            draft.content = splice_header(&draft.title, &draft.meta_description, &draft.content);
        } else {
            warn!("metadata backfill returned no usable fields");
        }
    }
}

/// User prompt for the metadata recovery request.
fn metadata_prompt(article: &str) -> String {
    format!(
        "Based on this article content, generate a:\n1. Title (60 chars max)\n2. Meta description (160 chars max)\n\nArticle:\n{article}"
    )
}

/// Prepend the metadata header lines and the title heading to the article.
fn splice_header(title: &str, meta_description: &str, body: &str) -> String {
    format!("{TITLE_PREFIX} {title}\n{META_DESCRIPTION_PREFIX} {meta_description}\n# {title}\n\n{body}")
}
