//! DOCX file reader implementation.
//!
//! Streams `word/document.xml` and collects paragraphs in document order,
//! keeping each run's font name, size, color, and emphasis so heterogeneous
//! formatting inside one paragraph survives the conversion.

use deck_core::{Error, Result, RgbColor, SourceParagraph, TextRun};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Reader for DOCX (WordprocessingML) files.
#[derive(Debug, Clone, Default)]
pub struct DocxReader;

impl DocxReader {
    /// Create a new DOCX reader.
    pub fn new() -> Self {
        Self
    }

    /// Read a DOCX file from disk.
    pub fn read_path(&self, path: &Path) -> Result<Vec<SourceParagraph>> {
        let file = File::open(path)?;
        self.read(BufReader::new(file))
    }

    /// Read a DOCX file from a reader.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<Vec<SourceParagraph>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::Zip(format!("Failed to open ZIP: {}", e)))?;

        let content = read_file_from_archive(&mut archive, "word/document.xml")?;
        parse_document_xml(&content)
    }
}

/// Parse the main document part into paragraphs with formatted runs.
fn parse_document_xml(xml_content: &str) -> Result<Vec<SourceParagraph>> {
    let mut paragraphs = Vec::new();
    let mut reader = Reader::from_str(xml_content);

    let mut current_para: Option<SourceParagraph> = None;
    let mut current_run: Option<TextRun> = None;
    let mut in_run_props = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"p" => {
                    current_para = Some(SourceParagraph::default());
                }
                b"r" if current_para.is_some() => {
                    current_run = Some(TextRun::default());
                }
                b"rPr" if current_run.is_some() => {
                    in_run_props = true;
                }
                b"t" if current_run.is_some() => {
                    in_text = true;
                }
                other => {
                    if in_run_props {
                        apply_run_property(current_run.as_mut().unwrap(), other, e);
                    }
                }
            },
            Ok(Event::Empty(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"p" => {
                        paragraphs.push(SourceParagraph::default());
                    }
                    b"br" | b"cr" => {
                        if let Some(run) = current_run.as_mut() {
                            run.text.push('\n');
                        }
                    }
                    b"tab" => {
                        if let Some(run) = current_run.as_mut() {
                            run.text.push('\t');
                        }
                    }
                    other => {
                        if in_run_props {
                            if let Some(run) = current_run.as_mut() {
                                apply_run_property(run, other, e);
                            }
                        }
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_text {
                    let text = e.unescape().unwrap_or_default();
                    if let Some(run) = current_run.as_mut() {
                        run.text.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"p" => {
                    if let Some(para) = current_para.take() {
                        paragraphs.push(para);
                    }
                }
                b"r" => {
                    if let (Some(para), Some(run)) = (current_para.as_mut(), current_run.take()) {
                        if !run.text.is_empty() {
                            para.text.push_str(&run.text);
                            para.runs.push(run);
                        }
                    }
                }
                b"rPr" => {
                    in_run_props = false;
                }
                b"t" => {
                    in_text = false;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing document.xml: {}", e)));
            }
            _ => {}
        }
    }

    log::debug!("read {} paragraphs from document", paragraphs.len());
    Ok(paragraphs)
}

/// Apply one `w:rPr` child element to the run being built.
fn apply_run_property(run: &mut TextRun, name: &[u8], e: &BytesStart) {
    match name {
        b"b" => run.bold = flag_value(e),
        b"i" => run.italic = flag_value(e),
        b"u" => {
            let val = attr_value(e, b"val");
            run.underline = match val.as_deref() {
                Some("none") | Some("0") | Some("false") => false,
                _ => true,
            };
        }
        b"sz" => {
            // Word stores sizes in half-points.
            if let Some(val) = attr_value(e, b"val") {
                if let Ok(half_points) = val.parse::<f32>() {
                    run.font_size = Some(half_points / 2.0);
                }
            }
        }
        b"color" => {
            if let Some(val) = attr_value(e, b"val") {
                if val != "auto" {
                    run.color = RgbColor::from_hex(&val);
                }
            }
        }
        b"rFonts" => {
            if let Some(ascii) = attr_value(e, b"ascii") {
                run.font_name = Some(ascii);
            }
        }
        _ => {}
    }
}

/// A toggle property like `<w:b/>` is on unless its `w:val` says otherwise.
fn flag_value(e: &BytesStart) -> bool {
    match attr_value(e, b"val").as_deref() {
        Some("0") | Some("false") | Some("none") => false,
        _ => true,
    }
}

/// Look up an attribute by local name, ignoring the namespace prefix.
fn attr_value(e: &BytesStart, name: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == name {
            return Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    None
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Read a file from the ZIP archive.
fn read_file_from_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::Format(format!("not a DOCX file, missing '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::Zip(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>{}</w:body>
</w:document>"#,
            body
        )
    }

    #[test]
    fn test_plain_paragraphs() {
        let xml = doc(
            "<w:p><w:r><w:t>1. Intro</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Hello world</w:t></w:r></w:p>",
        );
        let paragraphs = parse_document_xml(&xml).unwrap();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].text, "1. Intro");
        assert_eq!(paragraphs[1].text, "Hello world");
        assert_eq!(paragraphs[1].runs.len(), 1);
    }

    #[test]
    fn test_run_formatting_captured() {
        let xml = doc(
            r#"<w:p><w:r><w:rPr><w:b/><w:i/><w:sz w:val="36"/><w:color w:val="FF0000"/><w:rFonts w:ascii="Calibri"/></w:rPr><w:t>styled</w:t></w:r></w:p>"#,
        );
        let paragraphs = parse_document_xml(&xml).unwrap();
        let run = &paragraphs[0].runs[0];
        assert!(run.bold);
        assert!(run.italic);
        assert!(!run.underline);
        assert_eq!(run.font_size, Some(18.0));
        assert_eq!(run.color, Some(RgbColor::new(255, 0, 0)));
        assert_eq!(run.font_name.as_deref(), Some("Calibri"));
    }

    #[test]
    fn test_toggle_flag_false_values() {
        let xml = doc(
            r#"<w:p><w:r><w:rPr><w:b w:val="0"/><w:u w:val="none"/></w:rPr><w:t>off</w:t></w:r></w:p>"#,
        );
        let paragraphs = parse_document_xml(&xml).unwrap();
        let run = &paragraphs[0].runs[0];
        assert!(!run.bold);
        assert!(!run.underline);
    }

    #[test]
    fn test_underline_single() {
        let xml =
            doc(r#"<w:p><w:r><w:rPr><w:u w:val="single"/></w:rPr><w:t>under</w:t></w:r></w:p>"#);
        let paragraphs = parse_document_xml(&xml).unwrap();
        assert!(paragraphs[0].runs[0].underline);
    }

    #[test]
    fn test_multiple_runs_in_paragraph() {
        let xml = doc(
            r#"<w:p><w:r><w:t xml:space="preserve">plain </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r></w:p>"#,
        );
        let paragraphs = parse_document_xml(&xml).unwrap();
        assert_eq!(paragraphs[0].runs.len(), 2);
        assert_eq!(paragraphs[0].text, "plain bold");
        assert_eq!(paragraphs[0].runs[0].text, "plain ");
        assert!(!paragraphs[0].runs[0].bold);
        assert!(paragraphs[0].runs[1].bold);
    }

    #[test]
    fn test_auto_color_ignored() {
        let xml = doc(
            r#"<w:p><w:r><w:rPr><w:color w:val="auto"/></w:rPr><w:t>x</w:t></w:r></w:p>"#,
        );
        let paragraphs = parse_document_xml(&xml).unwrap();
        assert_eq!(paragraphs[0].runs[0].color, None);
    }

    #[test]
    fn test_break_becomes_newline() {
        let xml = doc(r#"<w:p><w:r><w:t>one</w:t><w:br/><w:t>two</w:t></w:r></w:p>"#);
        let paragraphs = parse_document_xml(&xml).unwrap();
        assert_eq!(paragraphs[0].text, "one\ntwo");
    }

    #[test]
    fn test_empty_paragraph_kept() {
        let xml = doc("<w:p/><w:p><w:r><w:t>next</w:t></w:r></w:p>");
        let paragraphs = parse_document_xml(&xml).unwrap();
        // Empty paragraphs survive reading; the section parser skips them.
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].text.is_empty());
    }
}
