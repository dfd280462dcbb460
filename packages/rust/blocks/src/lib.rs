//! Markdown article to block-format conversion.
//!
//! The converter walks the article line by line, collecting metadata lines,
//! emitting headings as they appear, and joining everything else into
//! paragraphs. Paragraph text goes through [`rewrite_inline`] on flush.
//! Conversion never fails: unexpected lines simply become paragraph text.

mod inline;
mod render;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use researchpress_shared::{
    ArticleMetadata, ArticleTemplate, ContentBlock, HeadingLevel, strip_prefix_ci,
};

pub use inline::{anchor, rewrite_inline};
pub use render::render_block;

/// Name of the metadata field block emitted for `Image Prompt:` lines.
pub const IMAGE_PROMPT_FIELD: &str = "Image Prompt";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A converted article: accumulated metadata plus blocks in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDocument {
    pub metadata: ArticleMetadata,
    pub blocks: Vec<ContentBlock>,
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Convert a generated Markdown article into a [`BlockDocument`].
#[instrument(skip_all, fields(locale = %template.locale, len = body.len()))]
pub fn convert(body: &str, template: &ArticleTemplate) -> BlockDocument {
    let mut converter = Converter::new(template);
    for line in body.lines() {
        converter.feed(line.trim());
    }
    let doc = converter.finish();

    debug!(blocks = doc.blocks.len(), "article converted");
    doc
}

struct Converter<'t> {
    template: &'t ArticleTemplate,
    metadata: ArticleMetadata,
    blocks: Vec<ContentBlock>,
    pending: Vec<String>,
}

impl<'t> Converter<'t> {
    fn new(template: &'t ArticleTemplate) -> Self {
        Self {
            template,
            metadata: ArticleMetadata::default(),
            blocks: Vec::new(),
            pending: Vec::new(),
        }
    }

    fn feed(&mut self, line: &str) {
        // Metadata lines never close an open paragraph.
        if self.absorb_metadata(line) {
            return;
        }

        if let Some(value) = strip_prefix_ci(line, "Image Prompt:") {
            self.flush();
            self.blocks.push(ContentBlock::MetadataField {
                name: IMAGE_PROMPT_FIELD.to_string(),
                value: value.to_string(),
            });
        } else if line.is_empty() {
            self.flush();
        } else if let Some(text) = line.strip_prefix("# ") {
            self.heading(HeadingLevel::H1, text);
        } else if let Some(text) = line.strip_prefix("## ") {
            self.heading(HeadingLevel::H2, text);
        } else {
            self.pending.push(line.to_string());
        }
    }

    /// Record a `Title:`/`Meta Description:`/`Excerpt:` line. First match wins.
    fn absorb_metadata(&mut self, line: &str) -> bool {
        let fields = [
            ("Title:", &mut self.metadata.title),
            ("Meta Description:", &mut self.metadata.meta_description),
            ("Excerpt:", &mut self.metadata.excerpt),
        ];

        for (prefix, slot) in fields {
            if let Some(value) = strip_prefix_ci(line, prefix) {
                if slot.is_empty() {
                    *slot = value.to_string();
                }
                return true;
            }
        }
        false
    }

    fn heading(&mut self, level: HeadingLevel, text: &str) {
        self.flush();
        self.blocks.push(ContentBlock::Heading {
            level,
            text: text.trim().to_string(),
        });
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = self.pending.join(" ");
        self.pending.clear();
        self.blocks.push(ContentBlock::Paragraph {
            rich_text: rewrite_inline(&text, self.template),
        });
    }

    fn finish(mut self) -> BlockDocument {
        self.flush();
        BlockDocument {
            metadata: self.metadata,
            blocks: self.blocks,
        }
    }
}
