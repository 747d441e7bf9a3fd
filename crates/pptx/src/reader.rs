//! PPTX template reader implementation.
//!
//! Resolves slide order through the presentation relationships, then parses
//! each slide's XML into a shape tree: text-bearing shapes are fully
//! modeled (geometry, paragraphs, runs, default run properties); pictures
//! and other shapes keep their source fragment verbatim so clones can
//! re-emit them untouched. The slide background is captured as an opaque
//! fragment reference without copying pixel data.

use deck_core::{
    BackgroundRef, Error, Geometry, Result, RgbColor, Shape, ShapeKind, ShapeParagraph, Slide,
    TextRunStyle,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;
use zip::ZipArchive;

/// Synthetic ids for shapes whose fragment is never looked inside start
/// here, well above anything PowerPoint assigns on a single slide.
const RAW_SHAPE_ID_BASE: u32 = 0x0100_0000;

/// Reader for PPTX (Office Open XML) template decks.
#[derive(Debug, Clone, Default)]
pub struct PptxReader;

impl PptxReader {
    /// Create a new PPTX reader.
    pub fn new() -> Self {
        Self
    }

    /// Read a deck from disk.
    pub fn read_path(&self, path: &Path) -> Result<Vec<Slide>> {
        let file = File::open(path)?;
        self.read(BufReader::new(file))
    }

    /// Read a deck from a reader, returning its slides in presentation
    /// order. Fails with `Error::Format` when the deck has no slides.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<Vec<Slide>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::Zip(format!("Failed to open ZIP: {}", e)))?;

        let slide_paths = slide_paths_in_order(&mut archive)?;
        if slide_paths.is_empty() {
            return Err(Error::Format("presentation contains no slides".into()));
        }

        let mut slides = Vec::with_capacity(slide_paths.len());
        for path in &slide_paths {
            let content = read_file_from_archive(&mut archive, path)?;
            slides.push(parse_slide_xml(&content)?);
        }

        log::debug!("read {} slides from deck", slides.len());
        Ok(slides)
    }
}

/// One entry of a relationships part.
#[derive(Debug, Clone)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

impl Relationship {
    /// Whether this relationship points at a slide part (not a layout or
    /// master).
    pub fn is_slide(&self) -> bool {
        self.rel_type.contains("/slide")
            && !self.rel_type.contains("slideLayout")
            && !self.rel_type.contains("slideMaster")
    }
}

/// Parse a relationships part into its entries.
pub(crate) fn parse_relationships(xml_content: &str) -> Result<Vec<Relationship>> {
    let mut rels = Vec::new();
    let mut reader = Reader::from_str(xml_content);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                rels.push(Relationship {
                    id: attr_value(e, b"Id").unwrap_or_default(),
                    rel_type: attr_value(e, b"Type").unwrap_or_default(),
                    target: attr_value(e, b"Target").unwrap_or_default(),
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// Get the ordered list of slide paths from the presentation relationships.
pub(crate) fn slide_paths_in_order<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<Vec<String>> {
    let rels_content = read_file_from_archive(archive, "ppt/_rels/presentation.xml.rels")?;
    let rels = parse_relationships(&rels_content)?;

    let mut slides: Vec<(String, Option<usize>)> = rels
        .iter()
        .filter(|r| r.is_slide())
        .map(|r| {
            let order = extract_slide_number(&r.id).or_else(|| extract_slide_number(&r.target));
            let full_path = if let Some(stripped) = r.target.strip_prefix('/') {
                stripped.to_string()
            } else {
                format!("ppt/{}", r.target)
            };
            (full_path, order)
        })
        .collect();

    // Sort slides by their number; unnumbered ones go last, by path.
    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    Ok(slides.into_iter().map(|(path, _)| path).collect())
}

/// Parse one slide part into a shape tree with a background reference.
pub(crate) fn parse_slide_xml(xml_content: &str) -> Result<Slide> {
    let mut reader = Reader::from_str(xml_content);
    let mut shapes: Vec<Shape> = Vec::new();
    let mut background: Option<Arc<BackgroundRef>> = None;
    let mut raw_count = 0u32;

    loop {
        let fragment_start = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"bg" => {
                        let end = e.to_end().into_owned();
                        reader
                            .read_to_end(end.name())
                            .map_err(|e| Error::Xml(format!("Error reading background: {}", e)))?;
                        let raw = &xml_content[fragment_start..reader.buffer_position()];
                        background = Some(Arc::new(BackgroundRef::new(raw)));
                    }
                    b"sp" => {
                        shapes.push(parse_sp(&mut reader, xml_content, fragment_start)?);
                    }
                    b"pic" | b"graphicFrame" | b"grpSp" | b"cxnSp" => {
                        let kind = if local_name(name.as_ref()) == b"pic" {
                            ShapeKind::Picture
                        } else {
                            ShapeKind::Other
                        };
                        let end = e.to_end().into_owned();
                        reader
                            .read_to_end(end.name())
                            .map_err(|e| Error::Xml(format!("Error reading shape: {}", e)))?;
                        let raw = &xml_content[fragment_start..reader.buffer_position()];
                        raw_count += 1;
                        shapes.push(raw_shape(RAW_SHAPE_ID_BASE + raw_count, kind, raw));
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing slide: {}", e)));
            }
            _ => {}
        }
    }

    Ok(Slide { shapes, background })
}

fn raw_shape(id: u32, kind: ShapeKind, raw: &str) -> Shape {
    Shape {
        id,
        name: String::new(),
        kind,
        geometry: None,
        paragraphs: Vec::new(),
        default_style: TextRunStyle::default(),
        raw_xml: Some(raw.to_string()),
    }
}

/// Parse one `<p:sp>` element, the reader being positioned just past its
/// start tag. A shape without a text body comes back as a raw fragment;
/// a shape with one is fully modeled.
fn parse_sp(reader: &mut Reader<&[u8]>, xml_content: &str, sp_start: usize) -> Result<Shape> {
    let mut id = 0u32;
    let mut name = String::new();
    let mut placeholder: Option<(Option<String>, Option<u32>)> = None;
    let mut offset: Option<(i64, i64)> = None;
    let mut extent: Option<(i64, i64)> = None;

    let mut has_tx_body = false;
    let mut in_sp_pr = false;
    let mut in_tx_body = false;
    let mut in_run_props = false;
    let mut in_default_props = false;
    let mut default_captured = false;
    let mut in_text = false;

    let mut default_style = TextRunStyle::default();
    let mut paragraphs: Vec<ShapeParagraph> = Vec::new();
    let mut current_para: Option<ShapeParagraph> = None;
    let mut current_run: Option<(TextRunStyle, String)> = None;

    loop {
        match reader.read_event() {
            Ok(ref ev @ (Event::Start(_) | Event::Empty(_))) => {
                let (e, is_start) = match ev {
                    Event::Start(e) => (e, true),
                    Event::Empty(e) => (e, false),
                    _ => unreachable!(),
                };
                match local_name(e.name().as_ref()) {
                    b"cNvPr" => {
                        if let Some(v) = attr_value(e, b"id") {
                            id = v.parse().unwrap_or(0);
                        }
                        if let Some(v) = attr_value(e, b"name") {
                            name = v;
                        }
                    }
                    b"ph" => {
                        placeholder = Some((
                            attr_value(e, b"type"),
                            attr_value(e, b"idx").and_then(|v| v.parse().ok()),
                        ));
                    }
                    b"spPr" => {
                        if is_start {
                            in_sp_pr = true;
                        }
                    }
                    b"off" if in_sp_pr => {
                        offset = parse_coord_pair(e, b"x", b"y");
                    }
                    b"ext" if in_sp_pr => {
                        extent = parse_coord_pair(e, b"cx", b"cy");
                    }
                    b"txBody" => {
                        has_tx_body = true;
                        if is_start {
                            in_tx_body = true;
                        }
                    }
                    b"p" if in_tx_body => {
                        if is_start {
                            current_para = Some(ShapeParagraph::default());
                        } else {
                            paragraphs.push(ShapeParagraph::default());
                        }
                    }
                    b"r" if current_para.is_some() && is_start => {
                        current_run = Some((TextRunStyle::default(), String::new()));
                    }
                    b"rPr" if current_run.is_some() => {
                        apply_style_attrs(e, &mut current_run.as_mut().unwrap().0);
                        if is_start {
                            in_run_props = true;
                        }
                    }
                    b"defRPr" if in_tx_body && !default_captured => {
                        apply_style_attrs(e, &mut default_style);
                        if is_start {
                            in_default_props = true;
                        } else {
                            default_captured = true;
                        }
                    }
                    b"srgbClr" => {
                        if let Some(color) = attr_value(e, b"val").and_then(|v| RgbColor::from_hex(&v)) {
                            if in_run_props {
                                current_run.as_mut().unwrap().0.color = Some(color);
                            } else if in_default_props {
                                default_style.color = Some(color);
                            }
                        }
                    }
                    b"latin" => {
                        if let Some(typeface) = attr_value(e, b"typeface") {
                            if in_run_props {
                                current_run.as_mut().unwrap().0.font_name = Some(typeface);
                            } else if in_default_props {
                                default_style.font_name = Some(typeface);
                            }
                        }
                    }
                    b"t" if current_run.is_some() && is_start => {
                        in_text = true;
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_text {
                    let text = e.unescape().unwrap_or_default();
                    if let Some((_, run_text)) = current_run.as_mut() {
                        run_text.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => break,
                b"spPr" => in_sp_pr = false,
                b"txBody" => in_tx_body = false,
                b"rPr" => in_run_props = false,
                b"defRPr" => {
                    if in_default_props {
                        in_default_props = false;
                        default_captured = true;
                    }
                }
                b"t" => in_text = false,
                b"r" => {
                    if let (Some(para), Some((style, text))) =
                        (current_para.as_mut(), current_run.take())
                    {
                        if !text.is_empty() {
                            para.runs.push(style.styled_run(text));
                        }
                    }
                }
                b"p" => {
                    if let Some(para) = current_para.take() {
                        paragraphs.push(para);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => {
                return Err(Error::Xml("unexpected end of slide inside shape".into()));
            }
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing shape: {}", e)));
            }
            _ => {}
        }
    }

    if !has_tx_body {
        let raw = &xml_content[sp_start..reader.buffer_position()];
        let mut shape = raw_shape(id, ShapeKind::Other, raw);
        shape.name = name;
        return Ok(shape);
    }

    let kind = match placeholder {
        Some((ph_type, index)) => ShapeKind::Placeholder { ph_type, index },
        None => ShapeKind::TextBox,
    };
    let geometry = match (offset, extent) {
        (Some((left, top)), Some((width, height))) => Some(Geometry {
            left,
            top,
            width,
            height,
        }),
        _ => None,
    };

    Ok(Shape {
        id,
        name,
        kind,
        geometry,
        paragraphs,
        default_style,
        raw_xml: None,
    })
}

fn parse_coord_pair(e: &BytesStart, a: &[u8], b: &[u8]) -> Option<(i64, i64)> {
    let first = attr_value(e, a)?.parse().ok()?;
    let second = attr_value(e, b)?.parse().ok()?;
    Some((first, second))
}

/// Apply `a:rPr`/`a:defRPr` attributes (size in centipoints, emphasis
/// flags) to a style.
fn apply_style_attrs(e: &BytesStart, style: &mut TextRunStyle) {
    if let Some(sz) = attr_value(e, b"sz") {
        if let Ok(centipoints) = sz.parse::<f32>() {
            style.font_size = Some(centipoints / 100.0);
        }
    }
    if let Some(v) = attr_value(e, b"b") {
        style.bold = v == "1" || v == "true";
    }
    if let Some(v) = attr_value(e, b"i") {
        style.italic = v == "1" || v == "true";
    }
    if let Some(v) = attr_value(e, b"u") {
        style.underline = v != "none";
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
pub(crate) fn read_file_from_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::Format(format!("missing part '{}' in archive: {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::Zip(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
