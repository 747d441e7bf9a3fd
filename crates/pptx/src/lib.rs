//! PPTX (Office Open XML) backend for document-to-deck conversion.
//!
//! Reads template decks (.pptx files are ZIP archives containing XML
//! documents) into slide shape trees, and writes generated decks by
//! rewriting the template package.

pub mod reader;
pub mod writer;

pub use reader::PptxReader;
pub use writer::PptxWriter;
