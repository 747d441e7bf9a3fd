//! Error types for document-to-deck conversion.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during document-to-deck conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read a file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The source document contains no recognizable numbered sections.
    #[error("No numbered sections found: {0}")]
    Parse(String),

    /// The template slide has no usable title/body shapes.
    #[error("Unusable template: {0}")]
    Template(String),

    /// A single section could not be written to its slide. Recoverable:
    /// the engine records the section number and continues.
    #[error("Section {number} could not be written: {reason}")]
    Replacement { number: u32, reason: String },

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    Format(String),

    /// ZIP archive error (DOCX/PPTX containers).
    #[error("ZIP error: {0}")]
    Zip(String),

    /// XML parsing error (DOCX/PPTX parts).
    #[error("XML parsing error: {0}")]
    Xml(String),
}
