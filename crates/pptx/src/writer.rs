//! PPTX deck writer implementation.
//!
//! Writes a generated deck by rewriting the template package: every part of
//! the template ZIP is copied through except the slides themselves, which
//! are replaced by the generated drafts. Each generated slide reuses the
//! template slide's relationships part, so relationship ids inside kept
//! fragments (background images, layout references) stay valid.

use crate::reader::{read_file_from_archive, slide_paths_in_order};
use deck_core::{Error, Result, Shape, ShapeKind, SlideDraft, TextRun};
use quick_xml::escape::escape;
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use std::sync::LazyLock;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

static SLIDE_PART_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/slides/slide\d+\.xml$").unwrap());

static SLIDE_RELS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/slides/_rels/slide\d+\.xml\.rels$").unwrap());

static SLIDE_REL_ENTRY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<Relationship [^>]*Type="[^"]*/slide"[^>]*/>"#).unwrap()
});

static RID_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Id="rId(\d+)""#).unwrap());

static SLD_ID_LST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<p:sldIdLst[^>]*>.*?</p:sldIdLst>|<p:sldIdLst[^>]*/>").unwrap()
});

static SLIDE_OVERRIDE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<Override [^>]*PartName="/ppt/slides/slide\d+\.xml"[^>]*/>"#).unwrap()
});

const SLIDE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

/// Writer that emits a generated deck on top of a template package.
#[derive(Debug, Clone, Default)]
pub struct PptxWriter;

impl PptxWriter {
    /// Create a new PPTX writer.
    pub fn new() -> Self {
        Self
    }

    /// Write `slides` to `output`, reusing everything else from the
    /// template package at `template`.
    pub fn write_path(&self, template: &Path, output: &Path, slides: &[SlideDraft]) -> Result<()> {
        let file = File::open(template)?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .map_err(|e| Error::Zip(format!("Failed to open ZIP: {}", e)))?;

        let out = File::create(output)?;
        self.write(&mut archive, BufWriter::new(out), slides)
    }

    /// Write `slides` into `out` as a complete PPTX package.
    pub fn write<R: Read + Seek, W: Write + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        out: W,
        slides: &[SlideDraft],
    ) -> Result<()> {
        if slides.is_empty() {
            return Err(Error::Template("no slides to write".into()));
        }

        // The first template slide's relationships part is duplicated for
        // every generated slide.
        let template_slides = slide_paths_in_order(archive)?;
        let first_slide = template_slides
            .first()
            .ok_or_else(|| Error::Template("template contains no slides".into()))?;
        let template_rels = read_file_from_archive(archive, &rels_path_for(first_slide)).ok();

        let mut zip = ZipWriter::new(out);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| Error::Zip(format!("Failed to read archive entry: {}", e)))?;
            let name = entry.name().to_string();
            if entry.is_dir()
                || SLIDE_PART_REGEX.is_match(&name)
                || SLIDE_RELS_REGEX.is_match(&name)
                || name == "ppt/presentation.xml"
                || name == "ppt/_rels/presentation.xml.rels"
                || name == "[Content_Types].xml"
            {
                continue;
            }
            zip.start_file(name, options)
                .map_err(|e| Error::Zip(format!("Failed to write archive entry: {}", e)))?;
            std::io::copy(&mut entry, &mut zip)?;
        }

        for (i, draft) in slides.iter().enumerate() {
            let n = i + 1;
            zip.start_file(format!("ppt/slides/slide{}.xml", n), options)
                .map_err(|e| Error::Zip(format!("Failed to write slide: {}", e)))?;
            zip.write_all(serialize_slide_xml(draft).as_bytes())?;

            if let Some(rels) = &template_rels {
                zip.start_file(format!("ppt/slides/_rels/slide{}.xml.rels", n), options)
                    .map_err(|e| Error::Zip(format!("Failed to write slide rels: {}", e)))?;
                zip.write_all(rels.as_bytes())?;
            }
        }

        let rels = read_file_from_archive(archive, "ppt/_rels/presentation.xml.rels")?;
        let (rels, first_rid) = rewrite_presentation_rels(&rels, slides.len())?;
        zip.start_file("ppt/_rels/presentation.xml.rels", options)
            .map_err(|e| Error::Zip(format!("Failed to write presentation rels: {}", e)))?;
        zip.write_all(rels.as_bytes())?;

        let presentation = read_file_from_archive(archive, "ppt/presentation.xml")?;
        let presentation = rewrite_presentation_xml(&presentation, slides.len(), first_rid)?;
        zip.start_file("ppt/presentation.xml", options)
            .map_err(|e| Error::Zip(format!("Failed to write presentation.xml: {}", e)))?;
        zip.write_all(presentation.as_bytes())?;

        let content_types = read_file_from_archive(archive, "[Content_Types].xml")?;
        let content_types = rewrite_content_types(&content_types, slides.len())?;
        zip.start_file("[Content_Types].xml", options)
            .map_err(|e| Error::Zip(format!("Failed to write content types: {}", e)))?;
        zip.write_all(content_types.as_bytes())?;

        zip.finish()
            .map_err(|e| Error::Zip(format!("Failed to finish ZIP: {}", e)))?;

        log::debug!("wrote {} slides to deck", slides.len());
        Ok(())
    }
}

/// The relationships part path for a slide part path.
fn rels_path_for(slide_path: &str) -> String {
    match slide_path.rfind('/') {
        Some(pos) => format!(
            "{}/_rels/{}.rels",
            &slide_path[..pos],
            &slide_path[pos + 1..]
        ),
        None => format!("_rels/{}.rels", slide_path),
    }
}

/// Drop the template's slide relationships and append one per generated
/// slide, with fresh ids above everything the template already uses.
/// Returns the rewritten part and the first new rId number.
fn rewrite_presentation_rels(rels: &str, count: usize) -> Result<(String, u32)> {
    let stripped = SLIDE_REL_ENTRY_REGEX.replace_all(rels, "");

    let max_rid = RID_NUMBER_REGEX
        .captures_iter(&stripped)
        .filter_map(|c| c[1].parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    let first_rid = max_rid + 1;

    let close = stripped
        .rfind("</Relationships>")
        .ok_or_else(|| Error::Template("malformed presentation relationships".into()))?;

    let mut entries = String::new();
    for i in 0..count {
        entries.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
            first_rid + i as u32,
            i + 1,
        ));
    }

    let mut result = String::with_capacity(stripped.len() + entries.len());
    result.push_str(&stripped[..close]);
    result.push_str(&entries);
    result.push_str(&stripped[close..]);
    Ok((result, first_rid))
}

/// Replace the slide id list with one entry per generated slide.
fn rewrite_presentation_xml(xml: &str, count: usize, first_rid: u32) -> Result<String> {
    let m = SLD_ID_LST_REGEX
        .find(xml)
        .ok_or_else(|| Error::Template("presentation.xml has no slide list".into()))?;

    let mut list = String::from("<p:sldIdLst>");
    for i in 0..count {
        // Slide ids live in their own 256-based space, separate from rIds.
        list.push_str(&format!(
            r#"<p:sldId id="{}" r:id="rId{}"/>"#,
            256 + i as u32,
            first_rid + i as u32,
        ));
    }
    list.push_str("</p:sldIdLst>");

    let mut result = String::with_capacity(xml.len() + list.len());
    result.push_str(&xml[..m.start()]);
    result.push_str(&list);
    result.push_str(&xml[m.end()..]);
    Ok(result)
}

/// Replace the slide part overrides with one per generated slide.
fn rewrite_content_types(xml: &str, count: usize) -> Result<String> {
    let stripped = SLIDE_OVERRIDE_REGEX.replace_all(xml, "");

    let close = stripped
        .rfind("</Types>")
        .ok_or_else(|| Error::Template("malformed [Content_Types].xml".into()))?;

    let mut overrides = String::new();
    for i in 0..count {
        overrides.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="{}"/>"#,
            i + 1,
            SLIDE_CONTENT_TYPE,
        ));
    }

    let mut result = String::with_capacity(stripped.len() + overrides.len());
    result.push_str(&stripped[..close]);
    result.push_str(&overrides);
    result.push_str(&stripped[close..]);
    Ok(result)
}

/// Serialize a slide draft into a complete slide part.
pub(crate) fn serialize_slide_xml(draft: &SlideDraft) -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld>"#);

    if let Some(bg) = &draft.background {
        xml.push_str(bg.as_str());
    }

    xml.push_str(r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#);

    for shape in &draft.shapes {
        match &shape.raw_xml {
            Some(raw) => xml.push_str(raw),
            None => serialize_sp(&mut xml, shape),
        }
    }

    xml.push_str(r#"</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#);
    xml
}

fn serialize_sp(xml: &mut String, shape: &Shape) {
    xml.push_str("<p:sp><p:nvSpPr>");
    xml.push_str(&format!(
        r#"<p:cNvPr id="{}" name="{}"/>"#,
        shape.id,
        escape(&shape.name),
    ));

    match &shape.kind {
        ShapeKind::Placeholder { ph_type, index } => {
            xml.push_str("<p:cNvSpPr/><p:nvPr><p:ph");
            if let Some(t) = ph_type {
                xml.push_str(&format!(r#" type="{}""#, escape(t)));
            }
            if let Some(idx) = index {
                xml.push_str(&format!(r#" idx="{}""#, idx));
            }
            xml.push_str("/></p:nvPr>");
        }
        _ => {
            xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/>"#);
        }
    }
    xml.push_str("</p:nvSpPr><p:spPr>");

    if let Some(geo) = &shape.geometry {
        xml.push_str(&format!(
            r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            geo.left, geo.top, geo.width, geo.height,
        ));
    }

    xml.push_str(r#"</p:spPr><p:txBody><a:bodyPr wrap="square"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#);

    for para in &shape.paragraphs {
        if para.runs.is_empty() {
            xml.push_str("<a:p/>");
            continue;
        }
        xml.push_str("<a:p>");
        for run in &para.runs {
            serialize_run(xml, run);
        }
        xml.push_str("</a:p>");
    }
    if shape.paragraphs.is_empty() {
        xml.push_str("<a:p/>");
    }

    xml.push_str("</p:txBody></p:sp>");
}

fn serialize_run(xml: &mut String, run: &TextRun) {
    xml.push_str(r#"<a:r><a:rPr lang="en-US""#);
    if let Some(size) = run.font_size {
        xml.push_str(&format!(r#" sz="{}""#, (size * 100.0).round() as u32));
    }
    if run.bold {
        xml.push_str(r#" b="1""#);
    }
    if run.italic {
        xml.push_str(r#" i="1""#);
    }
    if run.underline {
        xml.push_str(r#" u="sng""#);
    }
    xml.push('>');
    if let Some(color) = run.color {
        xml.push_str(&format!(
            r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
            color.to_hex(),
        ));
    }
    if let Some(font) = &run.font_name {
        xml.push_str(&format!(r#"<a:latin typeface="{}"/>"#, escape(font)));
    }
    xml.push_str("</a:rPr>");
    xml.push_str(&format!("<a:t>{}</a:t>", escape(&run.text)));
    xml.push_str("</a:r>");
}
