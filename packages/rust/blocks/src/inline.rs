//! Inline rewriting of paragraph text: Markdown links and citation markers.
//!
//! Both passes are applied to every paragraph through [`rewrite_inline`], in
//! order, so all flush paths produce identical markup.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use researchpress_shared::ArticleTemplate;

/// Render a hyperlink span the way the block format expects it.
pub fn anchor(href: &str, text: &str) -> String {
    format!(r#"<a href="{href}" target="_blank" rel="noopener">{text}</a>"#)
}

/// Rewrite links and citation markers in one paragraph of text.
pub fn rewrite_inline(text: &str, template: &ArticleTemplate) -> String {
    let linked = rewrite_links(text);
    normalize_citations(&linked, template)
}

// ---------------------------------------------------------------------------
// Pass 1: Markdown links
// ---------------------------------------------------------------------------

/// `[text](url)` → anchor.
fn rewrite_links(text: &str) -> String {
    static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("valid regex")
    });

    LINK_RE
        .replace_all(text, |caps: &Captures| anchor(&caps[2], &caps[1]))
        .to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Citation markers
// ---------------------------------------------------------------------------

/// Move citation labels inside their link.
///
/// Handles `(Label: <a href="u" ...>text</a>)` as produced by pass 1 and the
/// bare `(Label: text, https://u)` form, where `text` may contain commas.
/// Every marker is rewritten on its own; markers with an unknown label or no
/// link are left as they are.
fn normalize_citations(text: &str, template: &ArticleTemplate) -> String {
    static ANCHOR_CITATION_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r#"\((\p{L}+):\s*<a href="([^"]+)" target="_blank" rel="noopener">([^<]+)</a>\s*\)"#,
        )
        .expect("valid regex")
    });
    static BARE_CITATION_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\((\p{L}+):\s*([^()<>]+?),\s*(https?://[^\s()]+)\s*\)").expect("valid regex")
    });

    let prefixes = template.citation_prefixes();
    let label = template.citation_label;

    let rewrite = |caps: &Captures, href: &str, source: &str| {
        if prefixes.iter().any(|p| p.eq_ignore_ascii_case(&caps[1])) {
            format!("({})", anchor(href, &format!("{label}: {}", source.trim())))
        } else {
            caps[0].to_string()
        }
    };

    let anchored = ANCHOR_CITATION_RE.replace_all(text, |caps: &Captures| {
        rewrite(caps, &caps[2], &caps[3])
    });

    BARE_CITATION_RE
        .replace_all(&anchored, |caps: &Captures| rewrite(caps, &caps[3], &caps[2]))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use researchpress_shared::Locale;

    fn en() -> ArticleTemplate {
        ArticleTemplate::for_locale(Locale::En)
    }

    fn nl() -> ArticleTemplate {
        ArticleTemplate::for_locale(Locale::Nl)
    }

    #[test]
    fn links_become_anchors() {
        let out = rewrite_inline("Hello [link](http://x.test) world", &en());
        assert_eq!(
            out,
            r#"Hello <a href="http://x.test" target="_blank" rel="noopener">link</a> world"#
        );
    }

    #[test]
    fn text_without_links_is_unchanged() {
        let text = "Plain text (with parentheses) and [brackets].";
        assert_eq!(rewrite_inline(text, &en()), text);
    }

    #[test]
    fn direct_citation_link_keeps_its_label() {
        let out = rewrite_inline("Prices fell [Source: Acme](https://acme.test/r).", &en());
        assert_eq!(
            out,
            r#"Prices fell <a href="https://acme.test/r" target="_blank" rel="noopener">Source: Acme</a>."#
        );
    }

    #[test]
    fn anchor_citation_moves_label_inside() {
        let out = rewrite_inline("Prices fell (Source: [Acme](https://acme.test/r)).", &en());
        assert_eq!(
            out,
            r#"Prices fell (<a href="https://acme.test/r" target="_blank" rel="noopener">Source: Acme</a>)."#
        );
    }

    #[test]
    fn bare_citation_becomes_anchor() {
        let out = rewrite_inline("Prices fell (Source: Acme Labs, https://acme.test/r).", &en());
        assert_eq!(
            out,
            r#"Prices fell (<a href="https://acme.test/r" target="_blank" rel="noopener">Source: Acme Labs</a>)."#
        );
    }

    #[test]
    fn bare_citation_label_may_contain_commas() {
        let out = rewrite_inline("Revenue rose (Source: Acme, Inc., https://acme.test/q3).", &en());
        assert_eq!(
            out,
            r#"Revenue rose (<a href="https://acme.test/q3" target="_blank" rel="noopener">Source: Acme, Inc.</a>)."#
        );
    }

    #[test]
    fn every_citation_in_a_paragraph_is_rewritten() {
        let text = "A (Source: [One](https://one.test)) and B (Source: Two, https://two.test) \
                    and C (Source: [Three](https://three.test)).";
        let out = rewrite_inline(text, &en());

        assert!(out.contains(r#"(<a href="https://one.test" target="_blank" rel="noopener">Source: One</a>)"#));
        assert!(out.contains(r#"(<a href="https://two.test" target="_blank" rel="noopener">Source: Two</a>)"#));
        assert!(out.contains(r#"(<a href="https://three.test" target="_blank" rel="noopener">Source: Three</a>)"#));
        assert!(!out.contains("(Source:"));
    }

    #[test]
    fn localized_label_is_recognized_and_used() {
        let out = rewrite_inline(
            "Zie (Bron: [NOS](https://nos.test)) en (Source: RTL, https://rtl.test).",
            &nl(),
        );
        assert_eq!(
            out,
            r#"Zie (<a href="https://nos.test" target="_blank" rel="noopener">Bron: NOS</a>) en (<a href="https://rtl.test" target="_blank" rel="noopener">Bron: RTL</a>)."#
        );
    }

    #[test]
    fn unknown_label_is_left_alone() {
        let out = rewrite_inline("(Bron: NOS, https://nos.test)", &en());
        assert_eq!(out, "(Bron: NOS, https://nos.test)");
    }

    #[test]
    fn marker_without_link_is_left_alone() {
        let text = "(Source: internal survey)";
        assert_eq!(rewrite_inline(text, &en()), text);
    }
}
