//! Section parsing for numbered documents.
//!
//! Splits a document's paragraphs into numbered sections: a paragraph that
//! starts with a decimal integer, a literal dot, and optional whitespace
//! opens a new section; everything after it accumulates as the section body
//! until the next header.

use crate::error::{Error, Result};
use crate::types::{Section, SectionParagraph, SourceParagraph, TextRun};
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Pattern matching a section header: leading digits, a dot, optional
/// whitespace, then the title text.
static SECTION_HEADER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s*(.*)$").unwrap());

/// Parser turning raw document paragraphs into ordered `Section`s.
#[derive(Debug, Clone, Default)]
pub struct SectionParser;

impl SectionParser {
    /// Create a new section parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse formatted source paragraphs into sections, in document order.
    ///
    /// Paragraphs before the first header are discarded (document preambles
    /// are expected, not an error). Duplicate section numbers are kept as
    /// distinct sections; `source_order` reflects document position and is
    /// the ordering key downstream.
    pub fn parse_paragraphs(&self, paragraphs: &[SourceParagraph]) -> Result<Vec<Section>> {
        let mut sections: Vec<Section> = Vec::new();
        let mut current: Option<Section> = None;
        let mut next_order = 0usize;

        for paragraph in paragraphs {
            let text = paragraph.text.trim();
            if text.is_empty() {
                continue;
            }

            if let Some((number, title)) = match_header(text) {
                if let Some(done) = current.take() {
                    sections.push(done);
                }
                current = Some(Section {
                    number,
                    title,
                    body: Vec::new(),
                    source_order: next_order,
                });
                next_order += 1;
            } else if let Some(section) = current.as_mut() {
                section.body.push(body_paragraph(paragraph));
            } else {
                log::debug!("discarding preamble paragraph: {:.40}", text);
            }
        }

        if let Some(done) = current.take() {
            sections.push(done);
        }

        if sections.is_empty() {
            return Err(Error::Parse(format!(
                "none of the {} paragraphs matches the numbered header pattern",
                paragraphs.len()
            )));
        }

        log::debug!("parsed {} sections", sections.len());
        Ok(sections)
    }

    /// Parse plain text, treating each non-empty line as an unstyled
    /// paragraph.
    pub fn parse_text(&self, raw_text: &str) -> Result<Vec<Section>> {
        let paragraphs: Vec<SourceParagraph> =
            raw_text.lines().map(SourceParagraph::plain).collect();
        self.parse_paragraphs(&paragraphs)
    }
}

/// Match a paragraph against the header pattern, returning the section
/// number and NFC-normalized title. Numbers too large for `u32` are not
/// headers.
fn match_header(text: &str) -> Option<(u32, String)> {
    let caps = SECTION_HEADER_REGEX.captures(text)?;
    let number: u32 = caps[1].parse().ok()?;
    let title: String = caps[2].trim().nfc().collect();
    Some((number, title))
}

/// Turn a source paragraph into a body paragraph, keeping per-run
/// formatting. Runs with no text are dropped; a paragraph that carries text
/// but no runs (plain-text sources) gets a single unstyled run.
fn body_paragraph(paragraph: &SourceParagraph) -> SectionParagraph {
    let mut runs: Vec<TextRun> = paragraph
        .runs
        .iter()
        .filter(|r| !r.text.is_empty())
        .cloned()
        .collect();

    if runs.is_empty() {
        runs.push(TextRun::plain(paragraph.text.trim()));
    }

    SectionParagraph { runs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RgbColor;

    #[test]
    fn test_match_header_basic() {
        assert_eq!(match_header("1. Intro"), Some((1, "Intro".to_string())));
        assert_eq!(match_header("12.Details"), Some((12, "Details".to_string())));
        assert_eq!(match_header("3. "), Some((3, String::new())));
        assert_eq!(match_header("Intro"), None);
        assert_eq!(match_header("1 Intro"), None);
        assert_eq!(match_header(".1 Intro"), None);
    }

    #[test]
    fn test_header_number_overflow_is_body_text() {
        // 99999999999999999999 does not fit in u32; not a header.
        assert_eq!(match_header("99999999999999999999. Huge"), None);
    }

    #[test]
    fn test_parse_text_two_sections() {
        let parser = SectionParser::new();
        let sections = parser
            .parse_text("1. Intro\nHello world\n2. Details\nMore text\n")
            .unwrap();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].number, 1);
        assert_eq!(sections[0].title, "Intro");
        assert_eq!(sections[0].source_order, 0);
        assert_eq!(sections[0].body_text(), "Hello world");
        assert_eq!(sections[1].number, 2);
        assert_eq!(sections[1].title, "Details");
        assert_eq!(sections[1].source_order, 1);
        assert_eq!(sections[1].body_text(), "More text");
    }

    #[test]
    fn test_source_order_matches_document_position() {
        let parser = SectionParser::new();
        // Numbers out of order and non-contiguous; order comes from position.
        let sections = parser.parse_text("7. Seven\n3. Three\n9. Nine").unwrap();
        assert_eq!(sections.len(), 3);
        for (i, section) in sections.iter().enumerate() {
            assert_eq!(section.source_order, i);
        }
        assert_eq!(sections[0].number, 7);
        assert_eq!(sections[1].number, 3);
        assert_eq!(sections[2].number, 9);
    }

    #[test]
    fn test_duplicate_numbers_kept_distinct() {
        let parser = SectionParser::new();
        let sections = parser.parse_text("2. First\n2. Second").unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].number, 2);
        assert_eq!(sections[1].number, 2);
        assert_eq!(sections[0].title, "First");
        assert_eq!(sections[1].title, "Second");
    }

    #[test]
    fn test_preamble_discarded() {
        let parser = SectionParser::new();
        let sections = parser
            .parse_text("Preamble line one\nPreamble line two\n1. Start\nBody")
            .unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].body_text(), "Body");
    }

    #[test]
    fn test_empty_body_is_valid() {
        let parser = SectionParser::new();
        let sections = parser.parse_text("1. Alone\n2. After").unwrap();
        assert_eq!(sections.len(), 2);
        assert!(sections[0].body.is_empty());
    }

    #[test]
    fn test_single_section_no_trailing_text() {
        let parser = SectionParser::new();
        let sections = parser.parse_text("3. Only Section").unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].number, 3);
        assert_eq!(sections[0].title, "Only Section");
        assert!(sections[0].body.is_empty());
    }

    #[test]
    fn test_no_headers_is_parse_error() {
        let parser = SectionParser::new();
        let err = parser.parse_text("just some text\nno numbering here").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        let parser = SectionParser::new();
        assert!(matches!(parser.parse_text(""), Err(Error::Parse(_))));
    }

    #[test]
    fn test_body_runs_preserve_formatting() {
        let parser = SectionParser::new();
        let bold_run = TextRun {
            bold: true,
            color: Some(RgbColor::new(255, 0, 0)),
            ..TextRun::plain("bold bit")
        };
        let paragraphs = vec![
            SourceParagraph::plain("1. Styled"),
            SourceParagraph {
                text: "plain bit bold bit".into(),
                runs: vec![TextRun::plain("plain bit "), bold_run.clone()],
            },
        ];

        let sections = parser.parse_paragraphs(&paragraphs).unwrap();
        assert_eq!(sections.len(), 1);
        let body = &sections[0].body;
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].runs.len(), 2);
        assert_eq!(body[0].runs[1], bold_run);
    }

    #[test]
    fn test_body_paragraph_boundaries_preserved() {
        let parser = SectionParser::new();
        let sections = parser
            .parse_text("1. Multi\nfirst line\nsecond line\nthird line")
            .unwrap();
        assert_eq!(sections[0].body.len(), 3);
        assert_eq!(sections[0].body_text(), "first line\nsecond line\nthird line");
    }

    #[test]
    fn test_title_nfc_normalized() {
        let parser = SectionParser::new();
        // "e" + combining acute accent composes to "é".
        let sections = parser.parse_text("1. Cafe\u{0301}").unwrap();
        assert_eq!(sections[0].title, "Café");
    }
}
