//! Content replacement engine.
//!
//! For each section, clones the template slide, writes the section title
//! into the title-role shape and the body run-by-run into the body-role
//! shape, applying the style fingerprint. A section that cannot be written
//! is recorded and skipped; the batch continues.

use crate::clone::clone_slide;
use crate::error::{Error, Result};
use crate::types::{
    Section, ShapeParagraph, ShapeRole, Slide, SlideDraft, StyleFingerprint, TextRun,
};

/// Progress/cancellation callback: `(current, total, message)`. Returning
/// `false` aborts the batch at the next section boundary.
pub type ProgressFn<'a> = dyn FnMut(usize, usize, &str) -> bool + 'a;

/// Outcome of a build: the drafts produced, the section numbers that could
/// not be written, and whether the caller cancelled mid-batch.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub drafts: Vec<SlideDraft>,
    pub failed_sections: Vec<u32>,
    pub cancelled: bool,
}

/// Engine producing one populated `SlideDraft` per section.
#[derive(Debug, Clone, Default)]
pub struct ReplacementEngine;

impl ReplacementEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self
    }

    /// Build one draft per section, in ascending `source_order`.
    pub fn build(
        &self,
        sections: &[Section],
        template_slide: &Slide,
        fingerprint: &StyleFingerprint,
    ) -> Result<BuildReport> {
        self.build_with_progress(sections, template_slide, fingerprint, &mut |_, _, _| true)
    }

    /// Like [`build`](Self::build), reporting progress once per section.
    /// The callback is consulted exactly once per section boundary, never
    /// mid-write; returning `false` stops the batch cooperatively.
    pub fn build_with_progress(
        &self,
        sections: &[Section],
        template_slide: &Slide,
        fingerprint: &StyleFingerprint,
        progress: &mut ProgressFn<'_>,
    ) -> Result<BuildReport> {
        let mut ordered: Vec<&Section> = sections.iter().collect();
        ordered.sort_by_key(|s| s.source_order);

        let total = ordered.len();
        let mut report = BuildReport::default();

        for (i, section) in ordered.iter().enumerate() {
            let message = format!("section {}", section.number);
            if !progress(i + 1, total, &message) {
                log::info!("build cancelled at section boundary {}/{}", i + 1, total);
                report.cancelled = true;
                break;
            }

            let mut draft = clone_slide(template_slide);
            match populate_draft(&mut draft, section, fingerprint) {
                Ok(()) => report.drafts.push(draft),
                Err(Error::Replacement { number, reason }) => {
                    log::warn!("skipping section {}: {}", number, reason);
                    report.failed_sections.push(number);
                }
                Err(other) => return Err(other),
            }
        }

        log::debug!(
            "built {} drafts, {} sections failed",
            report.drafts.len(),
            report.failed_sections.len()
        );
        Ok(report)
    }
}

/// Write one section's title and body into a freshly cloned draft.
fn populate_draft(
    draft: &mut SlideDraft,
    section: &Section,
    fingerprint: &StyleFingerprint,
) -> Result<()> {
    let title_id = role_shape_id(fingerprint, ShapeRole::Title, section.number)?;
    let body_id = role_shape_id(fingerprint, ShapeRole::Body, section.number)?;

    {
        let title_shape = resolve_shape(draft, title_id, section.number)?;
        title_shape.paragraphs = vec![ShapeParagraph {
            runs: vec![fingerprint.title_style.styled_run(section.title.clone())],
        }];
    }

    // Body paragraphs map one-to-one onto shape paragraphs; when the body
    // shape is the title shape (single-shape fallback) they follow the
    // title paragraph.
    let body_shape = resolve_shape(draft, body_id, section.number)?;
    for paragraph in &section.body {
        let runs: Vec<TextRun> = paragraph
            .runs
            .iter()
            .filter(|run| !run.text.is_empty())
            .map(|run| body_run(run, fingerprint))
            .collect();
        if runs.is_empty() {
            continue;
        }
        body_shape.paragraphs.push(ShapeParagraph { runs });
    }

    Ok(())
}

/// A body run: the source run's text and emphasis, with font, size, and
/// color falling back per-field to the fingerprint's body style.
fn body_run(run: &TextRun, fingerprint: &StyleFingerprint) -> TextRun {
    let style = fingerprint.body_style.overlaid_with(run);
    let mut out = style.styled_run(run.text.clone());
    // Emphasis comes from the source run itself, not the template.
    out.bold = run.bold;
    out.italic = run.italic;
    out.underline = run.underline;
    out
}

fn role_shape_id(fingerprint: &StyleFingerprint, role: ShapeRole, number: u32) -> Result<u32> {
    fingerprint
        .target(role)
        .map(|t| t.shape_id)
        .ok_or_else(|| Error::Replacement {
            number,
            reason: format!("fingerprint has no {:?} role target", role),
        })
}

fn resolve_shape(draft: &mut SlideDraft, shape_id: u32, number: u32) -> Result<&mut crate::types::Shape> {
    if draft.shape_by_id(shape_id).is_none() {
        return Err(Error::Replacement {
            number,
            reason: format!("target shape {} cannot be resolved on the clone", shape_id),
        });
    }
    Ok(draft.shape_by_id_mut(shape_id).unwrap())
}
