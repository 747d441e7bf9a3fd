//! DOCX (WordprocessingML) reader backend for document-to-deck conversion.
//!
//! Reads .docx files, which are ZIP archives containing XML documents, and
//! yields ordered paragraphs with per-run formatting.

pub mod reader;

pub use reader::DocxReader;
