//! Research prompt assembly from selected sources.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use researchpress_shared::{RankedResultSet, ResearchError, Result};

/// First line of every research prompt.
pub const PROMPT_INSTRUCTION: &str =
    "Create a markdown article about the researched topic, using the relevant URLs as citations where necessary:";

/// Build the research prompt from the sources at the selected 1-based positions.
///
/// Positions are visited in ascending order; positions outside the result set
/// are skipped.
pub fn build(results: &RankedResultSet, selected_positions: &BTreeSet<usize>) -> String {
    let mut prompt = format!("{PROMPT_INSTRUCTION}\n\n");
    let mut included = 0usize;

    for &position in selected_positions {
        let Some(result) = results.get(position) else {
            warn!(position, available = results.len(), "selected position out of range, skipping");
            continue;
        };

        let title = escape_markdown(result.title.as_deref().unwrap_or_default());
        let text = escape_markdown(result.text.as_deref().unwrap_or_default());
        prompt.push_str(&format!("Title: {title}\nURL: {}\nText: {text}\n\n", result.url));
        included += 1;
    }

    debug!(sources = included, len = prompt.len(), "research prompt built");
    prompt
}

/// Backslash-escape the Markdown emphasis characters `_` and `*`.
pub fn escape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '_' || c == '*' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Inverse of [`escape_markdown`].
pub fn unescape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && matches!(chars.peek(), Some('_' | '*')) {
            continue;
        }
        out.push(c);
    }
    out
}

/// Parse a source selection such as `1,3,5-7` or `all` into 1-based positions.
///
/// `all` expands to every listable result, skipping hits with neither title
/// nor text.
pub fn parse_selection(input: &str, results: &RankedResultSet) -> Result<BTreeSet<usize>> {
    let input = input.trim();
    let len = results.len();
    if input.eq_ignore_ascii_case("all") {
        return Ok(results.listable().map(|(position, _)| position).collect());
    }

    let mut positions = BTreeSet::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_position(start)?;
                let end = parse_position(end)?;
                if start > end {
                    return Err(ResearchError::validation(format!(
                        "invalid selection range '{part}'"
                    )));
                }
                positions.extend(start..=end);
            }
            None => {
                positions.insert(parse_position(part)?);
            }
        }
    }

    if positions.is_empty() {
        return Err(ResearchError::validation("no sources selected"));
    }
    if let Some(&max) = positions.last() {
        if max > len {
            return Err(ResearchError::validation(format!(
                "selection includes source {max}, but only {len} are available"
            )));
        }
    }

    Ok(positions)
}

fn parse_position(s: &str) -> Result<usize> {
    match s.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(ResearchError::validation(format!(
            "invalid source number '{}' (sources are numbered from 1)",
            s.trim()
        ))),
        Ok(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use researchpress_shared::SearchResult;

    fn result(title: Option<&str>, url: &str, text: Option<&str>, score: f64) -> SearchResult {
        SearchResult {
            title: title.map(Into::into),
            url: url.into(),
            published_date: None,
            author: None,
            score: Some(score),
            text: text.map(Into::into),
            highlights: vec![],
            highlight_scores: vec![],
        }
    }

    fn results() -> RankedResultSet {
        RankedResultSet::from_discovered(vec![
            result(Some("First_one"), "https://a.test/x_y", Some("*bold* claim"), 0.9),
            result(None, "https://b.test", None, 0.8),
            result(Some("Third"), "https://c.test", Some("plain"), 0.7),
        ])
    }

    #[test]
    fn empty_selection_yields_only_instruction() {
        let prompt = build(&results(), &BTreeSet::new());
        assert_eq!(prompt, format!("{PROMPT_INSTRUCTION}\n\n"));
    }

    #[test]
    fn selected_sources_are_escaped_in_position_order() {
        let selection: BTreeSet<usize> = [3, 1].into_iter().collect();
        let prompt = build(&results(), &selection);

        let expected = format!(
            "{PROMPT_INSTRUCTION}\n\n\
             Title: First\\_one\nURL: https://a.test/x_y\nText: \\*bold\\* claim\n\n\
             Title: Third\nURL: https://c.test\nText: plain\n\n"
        );
        assert_eq!(prompt, expected);
    }

    #[test]
    fn missing_fields_become_empty() {
        let selection: BTreeSet<usize> = [2].into_iter().collect();
        let prompt = build(&results(), &selection);
        assert!(prompt.ends_with("Title: \nURL: https://b.test\nText: \n\n"));
    }

    #[test]
    fn out_of_range_positions_are_skipped() {
        let selection: BTreeSet<usize> = [0, 2, 9].into_iter().collect();
        let prompt = build(&results(), &selection);
        assert_eq!(prompt.matches("URL: ").count(), 1);
    }

    #[test]
    fn escape_round_trips() {
        for s in ["", "plain", "snake_case *and* __dunder__", "a\\b", "**"] {
            assert_eq!(unescape_markdown(&escape_markdown(s)), s);
        }
        assert_eq!(escape_markdown("a_b*c"), "a\\_b\\*c");
    }

    fn scored(n: usize) -> RankedResultSet {
        RankedResultSet::from_discovered(
            (1..=n)
                .map(|i| result(Some("t"), &format!("https://{i}.test"), None, 1.0))
                .collect(),
        )
    }

    #[test]
    fn selection_parsing() {
        assert_eq!(parse_selection("all", &scored(3)).unwrap(), [1, 2, 3].into_iter().collect());
        assert_eq!(
            parse_selection("1, 3,5-7", &scored(8)).unwrap(),
            [1, 3, 5, 6, 7].into_iter().collect()
        );
        assert!(parse_selection("0", &scored(3)).is_err());
        assert!(parse_selection("4", &scored(3)).is_err());
        assert!(parse_selection("3-1", &scored(3)).is_err());
        assert!(parse_selection("x", &scored(3)).is_err());
        assert!(parse_selection("", &scored(3)).is_err());
    }

    #[test]
    fn all_skips_results_without_title_or_text() {
        let selection = parse_selection("all", &results()).unwrap();
        assert_eq!(selection, [1, 3].into_iter().collect());

        let prompt = build(&results(), &selection);
        assert!(!prompt.contains("URL: https://b.test"));
        assert_eq!(prompt.matches("URL: ").count(), 2);
    }
}
