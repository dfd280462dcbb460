//! WordPress block markup rendering.

use researchpress_shared::{ContentBlock, HeadingLevel};

use crate::BlockDocument;

impl BlockDocument {
    /// Plain-text header listing the non-empty metadata fields.
    pub fn metadata_header(&self) -> String {
        let fields = [
            ("Title", &self.metadata.title),
            ("Meta Description", &self.metadata.meta_description),
            ("Excerpt", &self.metadata.excerpt),
        ];

        let mut out = String::new();
        for (name, value) in fields {
            if !value.is_empty() {
                out.push_str(&format!("{name}: {value}\n"));
            }
        }
        out
    }

    /// Render the metadata header followed by every block in order.
    pub fn to_block_markup(&self) -> String {
        let mut out = self.metadata_header();
        if !out.is_empty() {
            out.push('\n');
        }

        let rendered: Vec<String> = self.blocks.iter().map(render_block).collect();
        out.push_str(&rendered.join("\n\n"));
        out.push('\n');
        out
    }
}

/// Render one block as a WordPress block comment pair.
pub fn render_block(block: &ContentBlock) -> String {
    match block {
        ContentBlock::Heading { level, text } => {
            let attrs = match level {
                HeadingLevel::H1 => r#" {"level":1}"#,
                HeadingLevel::H2 => "",
            };
            let n = level.as_u8();
            format!(
                "<!-- wp:heading{attrs} -->\n<h{n} class=\"wp-block-heading\">{text}</h{n}>\n<!-- /wp:heading -->"
            )
        }
        ContentBlock::Paragraph { rich_text } => paragraph(rich_text),
        ContentBlock::MetadataField { name, value } => {
            paragraph(&format!("<strong>{name}:</strong> {value}"))
        }
    }
}

fn paragraph(inner: &str) -> String {
    format!("<!-- wp:paragraph -->\n<p>{inner}</p>\n<!-- /wp:paragraph -->")
}

#[cfg(test)]
mod tests {
    use super::*;
    use researchpress_shared::ArticleMetadata;

    #[test]
    fn headings_carry_level_attribute_for_h1_only() {
        let h1 = render_block(&ContentBlock::Heading {
            level: HeadingLevel::H1,
            text: "Title".into(),
        });
        let h2 = render_block(&ContentBlock::Heading {
            level: HeadingLevel::H2,
            text: "Section".into(),
        });

        assert_eq!(
            h1,
            "<!-- wp:heading {\"level\":1} -->\n<h1 class=\"wp-block-heading\">Title</h1>\n<!-- /wp:heading -->"
        );
        assert!(h2.starts_with("<!-- wp:heading -->\n<h2"));
    }

    #[test]
    fn metadata_field_renders_bold_label() {
        let out = render_block(&ContentBlock::MetadataField {
            name: "Image Prompt".into(),
            value: "a wind farm at dusk".into(),
        });
        assert_eq!(
            out,
            "<!-- wp:paragraph -->\n<p><strong>Image Prompt:</strong> a wind farm at dusk</p>\n<!-- /wp:paragraph -->"
        );
    }

    #[test]
    fn document_markup_starts_with_metadata_header() {
        let doc = BlockDocument {
            metadata: ArticleMetadata {
                title: "Foo".into(),
                meta_description: String::new(),
                excerpt: "Short.".into(),
            },
            blocks: vec![ContentBlock::Paragraph {
                rich_text: "Body".into(),
            }],
        };

        let markup = doc.to_block_markup();
        assert!(markup.starts_with("Title: Foo\nExcerpt: Short.\n\n<!-- wp:paragraph -->"));
        assert!(!markup.contains("Meta Description"));
    }
}
