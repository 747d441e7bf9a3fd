//! Domain types for representing source sections, template slides, and
//! generated slide drafts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// An RGB color triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    /// Create a new color from components.
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a six-digit hex string like "1F4E79".
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Format as an uppercase six-digit hex string.
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// One contiguous span of uniformly formatted text within a paragraph.
///
/// `font_name`, `font_size`, and `color` are `None` when the run does not
/// set them explicitly and inherits from its surroundings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content of the run.
    pub text: String,

    /// Explicit font name, if any.
    pub font_name: Option<String>,

    /// Explicit font size in points, if any.
    pub font_size: Option<f32>,

    /// Explicit font color, if any.
    pub color: Option<RgbColor>,

    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl TextRun {
    /// Create an unstyled run carrying only text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// The reusable style of a text run, without the text itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRunStyle {
    pub font_name: Option<String>,
    pub font_size: Option<f32>,
    pub color: Option<RgbColor>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl TextRunStyle {
    /// Capture the style of a run.
    pub fn from_run(run: &TextRun) -> Self {
        Self {
            font_name: run.font_name.clone(),
            font_size: run.font_size,
            color: run.color,
            bold: run.bold,
            italic: run.italic,
            underline: run.underline,
        }
    }

    /// Overlay a run's explicit properties on top of this style.
    /// Fields the run sets win; unset fields fall back to `self`.
    pub fn overlaid_with(&self, run: &TextRun) -> Self {
        Self {
            font_name: run.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: run.font_size.or(self.font_size),
            color: run.color.or(self.color),
            bold: run.bold || self.bold,
            italic: run.italic || self.italic,
            underline: run.underline || self.underline,
        }
    }

    /// Materialize this style into a run carrying the given text.
    pub fn styled_run(&self, text: impl Into<String>) -> TextRun {
        TextRun {
            text: text.into(),
            font_name: self.font_name.clone(),
            font_size: self.font_size,
            color: self.color,
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
        }
    }
}

/// One paragraph of a source document, with its text and formatted runs.
///
/// This is what the document reader yields; `runs` may be empty for
/// plain-text sources, in which case `text` is all there is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceParagraph {
    pub text: String,
    pub runs: Vec<TextRun>,
}

impl SourceParagraph {
    /// Create a paragraph from bare text with no run formatting.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            runs: Vec::new(),
        }
    }
}

/// One paragraph of a section body, preserving per-run formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionParagraph {
    pub runs: Vec<TextRun>,
}

impl SectionParagraph {
    /// The concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// One numbered unit of source text (header + body), destined for exactly
/// one output slide.
///
/// `number` is the parsed header number; numbers need not be contiguous or
/// sorted, and duplicates are kept as distinct sections. `source_order` is
/// the 0-based document position and is the only key used for slide
/// ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub number: u32,
    pub title: String,
    pub body: Vec<SectionParagraph>,
    pub source_order: usize,
}

impl Section {
    /// The body as plain text, one line per paragraph.
    pub fn body_text(&self) -> String {
        self.body
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Position and size of a shape, in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

/// The role a shape plays on a generated slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeRole {
    Title,
    Body,
}

/// What kind of shape this is, as far as the conversion cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeKind {
    /// A plain text box.
    TextBox,
    /// A layout placeholder, with its placeholder type and index.
    Placeholder {
        ph_type: Option<String>,
        index: Option<u32>,
    },
    /// A picture. Carried through cloning verbatim.
    Picture,
    /// Anything else (autoshapes, connectors, graphic frames).
    Other,
}

/// One paragraph inside a shape's text frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeParagraph {
    pub runs: Vec<TextRun>,
}

impl ShapeParagraph {
    /// The concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A shape on a slide.
///
/// Text-bearing shapes (`TextBox`, `Placeholder`) are fully modeled through
/// `paragraphs` and `default_style`. Non-text shapes keep their original
/// XML fragment in `raw_xml` so cloning and re-emission preserve them
/// byte-for-byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Shape id, unique within the slide.
    pub id: u32,
    pub name: String,
    pub kind: ShapeKind,
    pub geometry: Option<Geometry>,
    pub paragraphs: Vec<ShapeParagraph>,
    /// Default run properties of the shape, used as the fallback baseline
    /// when a run is written without explicit styling.
    pub default_style: TextRunStyle,
    /// Verbatim source fragment for non-text shapes.
    pub raw_xml: Option<String>,
}

impl Shape {
    /// Whether this shape can carry text.
    pub fn is_text_bearing(&self) -> bool {
        matches!(self.kind, ShapeKind::TextBox | ShapeKind::Placeholder { .. })
    }

    /// Total number of characters across all paragraphs.
    pub fn char_count(&self) -> usize {
        self.paragraphs
            .iter()
            .map(|p| p.runs.iter().map(|r| r.text.chars().count()).sum::<usize>())
            .sum()
    }

    /// The first run of the first non-empty paragraph, if any.
    pub fn first_run(&self) -> Option<&TextRun> {
        self.paragraphs.iter().find_map(|p| p.runs.first())
    }

    /// The style that represents this shape: the first run's explicit
    /// properties overlaid on the shape's default run properties. Falls
    /// back to the defaults alone when the shape holds no text.
    pub fn representative_style(&self) -> TextRunStyle {
        match self.first_run() {
            Some(run) => self.default_style.overlaid_with(run),
            None => self.default_style.clone(),
        }
    }

    /// All text in the shape, one line per paragraph.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Opaque reference to a template slide's background. The conversion never
/// looks inside it; it only asks clones to reuse it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundRef {
    raw: String,
}

impl BackgroundRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// A slide read from a deck: an ordered shape tree plus a background
/// reference. The template slide is one of these and is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub shapes: Vec<Shape>,
    pub background: Option<Arc<BackgroundRef>>,
}

impl Slide {
    /// Find a shape by id.
    pub fn shape_by_id(&self, id: u32) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Indices of text-bearing shapes, in shape order.
    pub fn text_shape_indices(&self) -> Vec<usize> {
        self.shapes
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_text_bearing())
            .map(|(i, _)| i)
            .collect()
    }
}

/// The working structural clone of a template slide. Owns its own shape
/// tree; the background is shared read-only with the template.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideDraft {
    pub shapes: Vec<Shape>,
    pub background: Option<Arc<BackgroundRef>>,
}

impl SlideDraft {
    /// Find a shape by id.
    pub fn shape_by_id(&self, id: u32) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Find a shape by id, mutably.
    pub fn shape_by_id_mut(&mut self, id: u32) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    /// View this draft as a slide, e.g. for re-fingerprinting.
    pub fn as_slide(&self) -> Slide {
        Slide {
            shapes: self.shapes.clone(),
            background: self.background.clone(),
        }
    }
}

/// Where a role resolves on generated slides: which shape, and its
/// captured position and size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleTarget {
    pub shape_id: u32,
    pub geometry: Option<Geometry>,
}

/// The captured, immutable description of a template's title/body text
/// style and slide geometry. Extracted once, then shared read-only across
/// every generated slide.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleFingerprint {
    pub title_style: TextRunStyle,
    pub body_style: TextRunStyle,
    pub shape_geometry: BTreeMap<ShapeRole, RoleTarget>,
    pub background: Option<Arc<BackgroundRef>>,
}

impl StyleFingerprint {
    /// The role target for a role, if captured.
    pub fn target(&self, role: ShapeRole) -> Option<&RoleTarget> {
        self.shape_geometry.get(&role)
    }
}

/// The user-facing result of a conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// Whether any slides were produced at all.
    pub success: bool,
    /// Number of sections found in the source document.
    pub total_sections: usize,
    /// Number of slides actually created.
    pub slides_created: usize,
    /// Section numbers that could not be written.
    pub failed_sections: Vec<u32>,
    /// Path of the written deck, when one was written.
    pub output_file: Option<String>,
    /// Fatal error message, when the conversion failed outright.
    pub error: Option<String>,
}

impl ConversionOutcome {
    /// An outcome for a conversion that failed before any slide work.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            total_sections: 0,
            slides_created: 0,
            failed_sections: Vec::new(),
            output_file: None,
            error: Some(error.into()),
        }
    }

    /// Whether every section made it onto a slide.
    pub fn is_complete(&self) -> bool {
        self.success && self.failed_sections.is_empty()
    }

    /// A one-line human-readable summary distinguishing full success,
    /// partial success, and outright failure.
    pub fn summary(&self) -> String {
        if !self.success {
            format!(
                "conversion failed before any slide was produced: {}",
                self.error.as_deref().unwrap_or("unknown error")
            )
        } else if self.failed_sections.is_empty() {
            format!("created {} slides from {} sections", self.slides_created, self.total_sections)
        } else {
            format!(
                "partially succeeded: {} of {} sections failed (sections {:?})",
                self.failed_sections.len(),
                self.total_sections,
                self.failed_sections
            )
        }
    }
}
