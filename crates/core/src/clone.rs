//! Structural cloning of template slides.
//!
//! A clone duplicates the shape tree and keeps the background link, but
//! carries none of the template's text. Cloning never touches the template,
//! so producing slide N is independent of slide N-1's clone.

use crate::types::{Shape, Slide, SlideDraft};

/// Produce a structural duplicate of the template slide.
///
/// Shape order, ids, names, kinds, and geometry are preserved. Text-bearing
/// shapes come back empty, with their `default_style` seeded from the
/// template shape's representative style so a run written without explicit
/// styling still inherits the template baseline. Non-text shapes are carried
/// over verbatim.
pub fn clone_slide(template_slide: &Slide) -> SlideDraft {
    let shapes = template_slide
        .shapes
        .iter()
        .map(|shape| {
            if shape.is_text_bearing() {
                Shape {
                    id: shape.id,
                    name: shape.name.clone(),
                    kind: shape.kind.clone(),
                    geometry: shape.geometry,
                    paragraphs: Vec::new(),
                    default_style: shape.representative_style(),
                    raw_xml: None,
                }
            } else {
                shape.clone()
            }
        })
        .collect();

    SlideDraft {
        shapes,
        background: template_slide.background.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::FingerprintExtractor;
    use crate::types::{
        BackgroundRef, Geometry, ShapeKind, ShapeParagraph, TextRun, TextRunStyle,
    };
    use std::sync::Arc;

    fn template() -> Slide {
        Slide {
            shapes: vec![
                Shape {
                    id: 1,
                    name: "Title 1".into(),
                    kind: ShapeKind::Placeholder {
                        ph_type: Some("title".into()),
                        index: None,
                    },
                    geometry: Some(Geometry {
                        left: 100,
                        top: 200,
                        width: 3000,
                        height: 400,
                    }),
                    paragraphs: vec![ShapeParagraph {
                        runs: vec![TextRun {
                            font_size: Some(40.0),
                            bold: true,
                            ..TextRun::plain("Template Title")
                        }],
                    }],
                    default_style: TextRunStyle::default(),
                    raw_xml: None,
                },
                Shape {
                    id: 2,
                    name: "Body 1".into(),
                    kind: ShapeKind::TextBox,
                    geometry: Some(Geometry {
                        left: 100,
                        top: 800,
                        width: 3000,
                        height: 2000,
                    }),
                    paragraphs: vec![ShapeParagraph {
                        runs: vec![TextRun {
                            font_size: Some(18.0),
                            ..TextRun::plain("Template body text goes here")
                        }],
                    }],
                    default_style: TextRunStyle::default(),
                    raw_xml: None,
                },
                Shape {
                    id: 3,
                    name: "Picture 1".into(),
                    kind: ShapeKind::Picture,
                    geometry: None,
                    paragraphs: Vec::new(),
                    default_style: TextRunStyle::default(),
                    raw_xml: Some("<p:pic><p:blipFill/></p:pic>".into()),
                },
            ],
            background: Some(Arc::new(BackgroundRef::new("<p:bg/>"))),
        }
    }

    #[test]
    fn test_clone_preserves_structure_without_text() {
        let slide = template();
        let draft = clone_slide(&slide);

        assert_eq!(draft.shapes.len(), 3);
        for (original, cloned) in slide.shapes.iter().zip(&draft.shapes) {
            assert_eq!(original.id, cloned.id);
            assert_eq!(original.kind, cloned.kind);
            assert_eq!(original.geometry, cloned.geometry);
        }
        // Text cleared on text-bearing shapes.
        assert!(draft.shapes[0].paragraphs.is_empty());
        assert!(draft.shapes[1].paragraphs.is_empty());
        // Non-text shape carried verbatim.
        assert_eq!(draft.shapes[2], slide.shapes[2]);
    }

    #[test]
    fn test_clone_keeps_default_style_baseline() {
        let draft = clone_slide(&template());
        assert_eq!(draft.shapes[0].default_style.font_size, Some(40.0));
        assert!(draft.shapes[0].default_style.bold);
        assert_eq!(draft.shapes[1].default_style.font_size, Some(18.0));
    }

    #[test]
    fn test_clone_shares_background_link() {
        let slide = template();
        let draft = clone_slide(&slide);
        let original = slide.background.as_ref().unwrap();
        let cloned = draft.background.as_ref().unwrap();
        assert!(Arc::ptr_eq(original, cloned));
    }

    #[test]
    fn test_clone_does_not_mutate_template() {
        let slide = template();
        let before = slide.clone();
        let _ = clone_slide(&slide);
        let _ = clone_slide(&slide);
        assert_eq!(slide, before);
    }

    #[test]
    fn test_fingerprint_round_trips_through_clone() {
        let slide = template();
        let extractor = FingerprintExtractor::new();
        let original = extractor.extract(&slide).unwrap();
        let cloned = extractor.extract(&clone_slide(&slide).as_slide()).unwrap();
        assert_eq!(original, cloned);
    }
}
