//! Core section-to-slide mapping and format-preserving replacement engine
//! for document-to-deck conversion.

pub mod clone;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod parser;
pub mod types;

pub use clone::clone_slide;
pub use engine::{BuildReport, ProgressFn, ReplacementEngine};
pub use error::{Error, Result};
pub use fingerprint::FingerprintExtractor;
pub use parser::SectionParser;
pub use types::{
    BackgroundRef, ConversionOutcome, Geometry, RgbColor, RoleTarget, Section, SectionParagraph,
    Shape, ShapeKind, ShapeParagraph, ShapeRole, Slide, SlideDraft, SourceParagraph,
    StyleFingerprint, TextRun, TextRunStyle,
};
