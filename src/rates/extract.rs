// src/rates/extract.rs
//! Locate the pricing section of the membership page and turn its content
//! block into one string per visual line.
//!
//! Flattening an element tree to text collapses `<br>` into a plain space, so
//! the work happens in two explicit phases:
//! 1. `mark_line_breaks` flattens the block and drops a sentinel right before every `<br>`;
//! 2. `split_marked` splits on that sentinel, trims, and drops empty segments.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use thiserror::Error;

/// Private-use code points never show up in page text.
pub const LINE_BREAK_SENTINEL: &str = "\u{E000}BR\u{E000}";

static HEADINGS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").expect("static selector"));

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Layout changes on the page. Both abort the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("section heading not found: {heading}")]
    HeadingNotFound { heading: String },
    #[error("no content after the heading: {heading}")]
    ContentBlockMissing { heading: String },
}

/// Lines of the block that follows the heading labelled `heading`.
///
/// Headings of every level are scanned in document order; the first whose
/// normalized text matches wins. The content block is the heading's next
/// element sibling.
pub fn extract_lines(document: &Html, heading: &str) -> Result<Vec<String>, ExtractError> {
    let wanted = normalize_heading(heading);

    let found = document
        .select(&HEADINGS)
        .find(|h| normalize_heading(&h.text().collect::<String>()) == wanted)
        .ok_or_else(|| ExtractError::HeadingNotFound {
            heading: heading.to_string(),
        })?;

    let block = found
        .next_siblings()
        .find_map(ElementRef::wrap)
        .ok_or_else(|| ExtractError::ContentBlockMissing {
            heading: heading.to_string(),
        })?;

    let lines = split_marked(&mark_line_breaks(block));
    tracing::debug!(
        heading,
        block = block.value().name(),
        lines = lines.len(),
        "extracted rate block"
    );
    Ok(lines)
}

/// Phase 1: plain text of `block` with a sentinel before each `<br>`.
/// Whitespace runs (including `&nbsp;`) collapse to a single space.
pub fn mark_line_breaks(block: ElementRef<'_>) -> String {
    let mut out = String::new();
    flatten_into(block, &mut out);
    RE_WS.replace_all(&out, " ").into_owned()
}

fn flatten_into(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => {
                let name = e.name();
                if name.eq_ignore_ascii_case("br") {
                    out.push_str(LINE_BREAK_SENTINEL);
                    continue;
                }
                if matches!(name, "script" | "style" | "template") {
                    continue;
                }
                let Some(inner) = ElementRef::wrap(child) else {
                    continue;
                };
                // block-level boundaries read as word breaks, not line breaks
                let spaced = is_block_level(name);
                if spaced {
                    out.push(' ');
                }
                flatten_into(inner, out);
                if spaced {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn is_block_level(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "li"
            | "ul"
            | "ol"
            | "tr"
            | "td"
            | "th"
            | "table"
            | "section"
            | "article"
            | "blockquote"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
    )
}

/// Phase 2: split on the sentinel, trim, drop empties. Order preserved.
pub fn split_marked(text: &str) -> Vec<String> {
    text.split(LINE_BREAK_SENTINEL)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collapse whitespace, trim, lowercase. Punctuation is significant.
fn normalize_heading(s: &str) -> String {
    RE_WS.replace_all(s.trim(), " ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADING: &str = "Dragon Con 5-Day Membership Rates";

    fn lines_of(html: &str) -> Result<Vec<String>, ExtractError> {
        extract_lines(&Html::parse_document(html), HEADING)
    }

    #[test]
    fn splits_on_br_with_inline_markup() {
        let html = r#"<html><body>
            <h3>Dragon Con 5-Day Membership Rates</h3>
            <p><strong>$110</strong>&nbsp;through 9/15/2025
             <br>
             <strong>$125</strong>&nbsp;through 12/12/2025<br/>
             <strong>TBA</strong>&nbsp;through show time.</p>
        </body></html>"#;
        let lines = lines_of(html).unwrap();
        assert_eq!(
            lines,
            vec![
                "$110 through 9/15/2025",
                "$125 through 12/12/2025",
                "TBA through show time.",
            ]
        );
    }

    #[test]
    fn heading_match_ignores_case_level_and_padding() {
        let html = "<h1>Other</h1><p>nope</p><h5>  dragon con 5-day   MEMBERSHIP rates </h5><div>$1 through 1/1/2026</div>";
        assert_eq!(lines_of(html).unwrap(), vec!["$1 through 1/1/2026"]);
    }

    #[test]
    fn first_matching_heading_wins() {
        let html = "<h2>Dragon Con 5-Day Membership Rates</h2><p>first</p>\
                    <h2>Dragon Con 5-Day Membership Rates</h2><p>second</p>";
        assert_eq!(lines_of(html).unwrap(), vec!["first"]);
    }

    #[test]
    fn missing_heading_is_an_error() {
        let err = lines_of("<p>$100 through 12/31/2025</p>").unwrap_err();
        assert!(matches!(err, ExtractError::HeadingNotFound { .. }));
        assert!(err.to_string().contains("section heading"));
    }

    #[test]
    fn trailing_colon_does_not_match() {
        let html = "<h3>Dragon Con 5-Day Membership Rates:</h3><p>$100 through 12/31/2025</p>";
        let err = lines_of(html).unwrap_err();
        assert!(matches!(err, ExtractError::HeadingNotFound { .. }));

        let html = "<h3>Dragon Con 5-Day Membership Rates</h3><p>$100 through 12/31/2025</p>";
        let err = extract_lines(&Html::parse_document(html), "Dragon Con 5-Day Membership Rates:")
            .unwrap_err();
        assert!(matches!(err, ExtractError::HeadingNotFound { .. }));
    }

    #[test]
    fn missing_sibling_is_an_error() {
        let err = lines_of("<div><h2>Dragon Con 5-Day Membership Rates</h2></div>").unwrap_err();
        assert!(matches!(err, ExtractError::ContentBlockMissing { .. }));
        assert!(err.to_string().contains("content after the heading"));
    }

    #[test]
    fn empty_segments_are_dropped() {
        let html = "<h2>Dragon Con 5-Day Membership Rates</h2><p><br>one<br> <br>two<br></p>";
        assert_eq!(lines_of(html).unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn n_breaks_give_n_plus_one_lines() {
        let html = "<h2>Dragon Con 5-Day Membership Rates</h2><p>a<br>b<br>c<br>d</p>";
        assert_eq!(lines_of(html).unwrap().len(), 4);
    }

    #[test]
    fn split_marked_trims_segments() {
        let text = format!("  a {s} b{s}{s} c ", s = LINE_BREAK_SENTINEL);
        assert_eq!(split_marked(&text), vec!["a", "b", "c"]);
    }
}
