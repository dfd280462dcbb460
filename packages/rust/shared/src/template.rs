//! Article templates: the output locale and the prompt wording that goes with it.
//!
//! One pipeline serves every locale. A template decides the article language,
//! the citation label the model is asked to use, and whether the model must
//! also emit `Excerpt:` and `Image Prompt:` lines for block publishing.

use serde::{Deserialize, Serialize};

/// Supported output locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Nl,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "nl" | "dutch" => Ok(Self::Nl),
            other => Err(format!("unknown locale '{other}' (expected 'en' or 'nl')")),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::En => f.write_str("en"),
            Self::Nl => f.write_str("nl"),
        }
    }
}

/// Label every citation marker starts with, regardless of locale.
pub const DEFAULT_CITATION_LABEL: &str = "Source";

/// Output-locale configuration shared by the generator and the block converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleTemplate {
    pub locale: Locale,
    /// Language the article is written in, as named in the prompt.
    pub language: &'static str,
    /// Citation label, e.g. `Source` or `Bron`.
    pub citation_label: &'static str,
    /// Ask for `Excerpt:` and `Image Prompt:` lines.
    pub block_metadata: bool,
}

impl ArticleTemplate {
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => Self {
                locale,
                language: "English",
                citation_label: DEFAULT_CITATION_LABEL,
                block_metadata: false,
            },
            Locale::Nl => Self {
                locale,
                language: "Dutch",
                citation_label: "Bron",
                block_metadata: true,
            },
        }
    }

    /// Citation prefixes recognized when normalizing citations (`Source` plus the localized one).
    pub fn citation_prefixes(&self) -> Vec<&'static str> {
        if self.citation_label == DEFAULT_CITATION_LABEL {
            vec![DEFAULT_CITATION_LABEL]
        } else {
            vec![DEFAULT_CITATION_LABEL, self.citation_label]
        }
    }

    /// System instruction for the article request.
    pub fn system_prompt(&self, topic: &str) -> String {
        let label = self.citation_label;
        let language = self.language;

        let header_lines = if self.block_metadata {
            "   - **Title:** [60 characters max]\n\
             \x20  - **Meta Description:** [160 characters max]\n\
             \x20  - **Excerpt:** [one or two sentences summarizing the article]\n\
             \x20  - **Image Prompt:** [a short description of a fitting header image]\n\
             \x20  - **# [Title repeated]**"
        } else {
            "   - **Title:** [60 characters max]\n\
             \x20  - **Meta Description:** [160 characters max]\n\
             \x20  - **# [Title repeated]**"
        };

        format!(
            r#"
You are an expert journalist with extensive knowledge in the area of '{topic}'. Your task is to create a detailed, well-researched, and insightful article in {language} based on the provided research.

**STRICT FORMAT REQUIREMENTS:**

1. **First lines must be exactly (keep the English prefixes):**
{header_lines}

2. **Structure:**
   - **Table of Contents:** Use a simple bullet list.
   - **Use only '##' for section headings.**
   - **Plain paragraphs:** No styling, bold, italic, special characters, emojis, or fancy formatting.
   - **Single newline between paragraphs.**
   - **Citations:** Use the given URLs as in-paragraph citations where appropriate, formatted as [{label}: Brand Name](URL)

3. **Content Guidelines:**
   - **Tone:** Write in a professional and engaging tone suitable for a knowledgeable audience.
   - **Clarity:** Use clear and accessible language, explaining technical terms for readers who may not have advanced knowledge.
   - **Originality and Depth:** Ensure originality and depth in your analysis, offering unique insights and critical thinking.
   - **Structure:** Divide the article into sections with '##' headings, covering 3-5 key aspects or viewpoints of the topic.
   - **In-Depth Analysis:** For each section, provide 3-5 paragraphs of in-depth analysis. Include specific examples, data, and references from the research snippets where relevant.
   - **Balanced Perspectives:** Discuss multiple viewpoints, including both positive and negative impacts, and provide critical insights.
   - **Theoretical Frameworks:** Incorporate relevant theories, frameworks, or models where appropriate.
   - **Controversies and Debates:** Address any controversies or debates related to the topic.
   - **Conclusion:** End with a conclusion that summarizes key points, reflects on implications, and emphasizes the importance of understanding the topic.

4. **Additional Requirements:**
   - **Avoid Plagiarism:** Do not copy text verbatim from the research snippets unless properly quoted and cited.
   - **Value to the Reader:** Focus on adding value to the reader by providing thoughtful analysis and synthesis of the information.
   - **No Filler Content:** Ensure every sentence contributes meaningfully to the article.
"#
        )
    }
}

impl Default for ArticleTemplate {
    fn default() -> Self {
        Self::for_locale(Locale::default())
    }
}
