//! Style fingerprint extraction from a template slide.
//!
//! Classifies the template's text-bearing shapes into title and body roles
//! and captures the per-role run style, shape geometry, and background
//! reference. The fingerprint is immutable and shared across every
//! generated slide.

use crate::error::{Error, Result};
use crate::types::{RoleTarget, ShapeRole, Slide, StyleFingerprint};
use std::collections::BTreeMap;

/// Extractor deriving a reusable `StyleFingerprint` from a template slide.
#[derive(Debug, Clone, Default)]
pub struct FingerprintExtractor;

impl FingerprintExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract the fingerprint from the template slide.
    ///
    /// Role heuristic: the text-bearing shape with the largest
    /// representative font size is the title; of the remaining text-bearing
    /// shapes, the one with the most characters is the body (ties go to the
    /// earlier shape). With a single text-bearing shape, both roles resolve
    /// to it. Fails with `Error::Template` only when the slide has no
    /// text-bearing shapes at all.
    pub fn extract(&self, template_slide: &Slide) -> Result<StyleFingerprint> {
        let text_shapes = template_slide.text_shape_indices();
        if text_shapes.is_empty() {
            return Err(Error::Template(
                "template slide has no text-bearing shapes".into(),
            ));
        }

        let title_idx = classify_title(template_slide, &text_shapes);
        let body_idx = classify_body(template_slide, &text_shapes, title_idx);

        let title_shape = &template_slide.shapes[title_idx];
        let body_shape = &template_slide.shapes[body_idx];

        log::debug!(
            "template roles: title=shape {} ({:?} pt), body=shape {} ({} chars)",
            title_shape.id,
            title_shape.representative_style().font_size,
            body_shape.id,
            body_shape.char_count()
        );

        let mut shape_geometry = BTreeMap::new();
        shape_geometry.insert(
            ShapeRole::Title,
            RoleTarget {
                shape_id: title_shape.id,
                geometry: title_shape.geometry,
            },
        );
        shape_geometry.insert(
            ShapeRole::Body,
            RoleTarget {
                shape_id: body_shape.id,
                geometry: body_shape.geometry,
            },
        );

        Ok(StyleFingerprint {
            title_style: title_shape.representative_style(),
            body_style: body_shape.representative_style(),
            shape_geometry,
            background: template_slide.background.clone(),
        })
    }
}

/// Index of the text-bearing shape with the largest representative font
/// size. Ties keep the earlier shape.
fn classify_title(slide: &Slide, text_shapes: &[usize]) -> usize {
    let mut best = text_shapes[0];
    let mut best_size = shape_font_size(slide, best);
    for &idx in &text_shapes[1..] {
        let size = shape_font_size(slide, idx);
        if size > best_size {
            best = idx;
            best_size = size;
        }
    }
    best
}

/// Index of the body shape: among text-bearing shapes other than the
/// title, the one with the most characters; ties keep the earlier shape.
/// Falls back to the title shape when it is the only candidate.
fn classify_body(slide: &Slide, text_shapes: &[usize], title_idx: usize) -> usize {
    let mut best: Option<usize> = None;
    let mut best_chars = 0usize;
    for &idx in text_shapes {
        if idx == title_idx {
            continue;
        }
        let chars = slide.shapes[idx].char_count();
        if best.is_none() || chars > best_chars {
            best = Some(idx);
            best_chars = chars;
        }
    }
    best.unwrap_or(title_idx)
}

fn shape_font_size(slide: &Slide, idx: usize) -> f32 {
    slide.shapes[idx]
        .representative_style()
        .font_size
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Shape, ShapeKind, ShapeParagraph, TextRun, TextRunStyle};

    fn text_shape(id: u32, size: f32, text: &str) -> Shape {
        Shape {
            id,
            name: format!("Shape {}", id),
            kind: ShapeKind::TextBox,
            geometry: None,
            paragraphs: vec![ShapeParagraph {
                runs: vec![TextRun {
                    font_size: Some(size),
                    ..TextRun::plain(text)
                }],
            }],
            default_style: TextRunStyle::default(),
            raw_xml: None,
        }
    }

    fn picture_shape(id: u32) -> Shape {
        Shape {
            id,
            name: format!("Picture {}", id),
            kind: ShapeKind::Picture,
            geometry: None,
            paragraphs: Vec::new(),
            default_style: TextRunStyle::default(),
            raw_xml: Some("<p:pic/>".into()),
        }
    }

    #[test]
    fn test_largest_font_is_title() {
        let slide = Slide {
            shapes: vec![
                text_shape(1, 18.0, "a longer body text here"),
                text_shape(2, 40.0, "Title"),
            ],
            background: None,
        };
        let fp = FingerprintExtractor::new().extract(&slide).unwrap();
        assert_eq!(fp.target(ShapeRole::Title).unwrap().shape_id, 2);
        assert_eq!(fp.target(ShapeRole::Body).unwrap().shape_id, 1);
        assert_eq!(fp.title_style.font_size, Some(40.0));
        assert_eq!(fp.body_style.font_size, Some(18.0));
    }

    #[test]
    fn test_body_is_most_characters() {
        let slide = Slide {
            shapes: vec![
                text_shape(1, 40.0, "Title"),
                text_shape(2, 18.0, "short"),
                text_shape(3, 18.0, "a much longer stretch of body text"),
            ],
            background: None,
        };
        let fp = FingerprintExtractor::new().extract(&slide).unwrap();
        assert_eq!(fp.target(ShapeRole::Body).unwrap().shape_id, 3);
    }

    #[test]
    fn test_body_tie_breaks_to_first() {
        let slide = Slide {
            shapes: vec![
                text_shape(1, 40.0, "Title"),
                text_shape(2, 18.0, "same"),
                text_shape(3, 18.0, "same"),
            ],
            background: None,
        };
        let fp = FingerprintExtractor::new().extract(&slide).unwrap();
        assert_eq!(fp.target(ShapeRole::Body).unwrap().shape_id, 2);
    }

    #[test]
    fn test_single_shape_serves_both_roles() {
        let slide = Slide {
            shapes: vec![picture_shape(9), text_shape(1, 24.0, "everything")],
            background: None,
        };
        let fp = FingerprintExtractor::new().extract(&slide).unwrap();
        assert_eq!(fp.target(ShapeRole::Title).unwrap().shape_id, 1);
        assert_eq!(fp.target(ShapeRole::Body).unwrap().shape_id, 1);
    }

    #[test]
    fn test_no_text_shapes_is_template_error() {
        let slide = Slide {
            shapes: vec![picture_shape(1)],
            background: None,
        };
        let err = FingerprintExtractor::new().extract(&slide).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn test_defaults_used_when_shape_has_no_runs() {
        let mut shape = text_shape(1, 0.0, "");
        shape.paragraphs.clear();
        shape.default_style.font_size = Some(32.0);
        let slide = Slide {
            shapes: vec![shape],
            background: None,
        };
        let fp = FingerprintExtractor::new().extract(&slide).unwrap();
        assert_eq!(fp.title_style.font_size, Some(32.0));
    }
}
