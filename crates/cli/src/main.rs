//! CLI tool for converting numbered documents into slide decks.

use anyhow::{Context, Result};
use clap::Parser;
use deck_core::{ConversionOutcome, FingerprintExtractor, ReplacementEngine, SectionParser};
use deck_docx::DocxReader;
use deck_pptx::{PptxReader, PptxWriter};
use std::path::{Path, PathBuf};

/// Convert a numbered document into a slide deck styled after a template.
#[derive(Parser, Debug)]
#[command(name = "deck-convert")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source document (.docx or .txt) with numbered section headers
    source: PathBuf,

    /// Template presentation (.pptx); its first slide sets the style
    template: PathBuf,

    /// Output file (default: source name with a _slides.pptx suffix)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// How to read sections out of the source file, picked by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Docx,
    Text,
}

impl SourceKind {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "docx" => Some(Self::Docx),
            "txt" | "md" => Some(Self::Text),
            _ => None,
        }
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let outcome = match convert(&args) {
        Ok(outcome) => outcome,
        Err(e) => ConversionOutcome::failed(format!("{:#}", e)),
    };

    println!("{}", outcome.summary());

    if !outcome.success {
        std::process::exit(1);
    }
    if !outcome.is_complete() {
        std::process::exit(2);
    }
}

/// Run the whole conversion: parse sections, fingerprint the template,
/// build one slide per section, write the deck.
fn convert(args: &Args) -> Result<ConversionOutcome> {
    let sections = read_sections(&args.source, args.verbose)?;

    let slides = PptxReader::new()
        .read_path(&args.template)
        .with_context(|| format!("Failed to read template {}", args.template.display()))?;
    let template_slide = &slides[0];

    let fingerprint = FingerprintExtractor::new()
        .extract(template_slide)
        .context("Failed to extract template style")?;

    let verbose = args.verbose;
    let total_sections = sections.len();
    let report = ReplacementEngine::new().build_with_progress(
        &sections,
        template_slide,
        &fingerprint,
        &mut |current, total, message| {
            if verbose {
                eprintln!("  [{}/{}] {}", current, total, message);
            }
            true
        },
    )?;

    if report.drafts.is_empty() {
        return Ok(ConversionOutcome {
            success: false,
            total_sections,
            slides_created: 0,
            failed_sections: report.failed_sections,
            output_file: None,
            error: Some("no section could be written to a slide".into()),
        });
    }

    let output_path = get_output_path(&args.source, args.output.as_ref());
    PptxWriter::new()
        .write_path(&args.template, &output_path, &report.drafts)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    if verbose {
        eprintln!("Written to: {}", output_path.display());
    }

    Ok(ConversionOutcome {
        success: true,
        total_sections,
        slides_created: report.drafts.len(),
        failed_sections: report.failed_sections,
        output_file: Some(output_path.display().to_string()),
        error: None,
    })
}

/// Read the source file and split it into numbered sections.
fn read_sections(source: &Path, verbose: bool) -> Result<Vec<deck_core::Section>> {
    let kind = source
        .extension()
        .and_then(|e| e.to_str())
        .and_then(SourceKind::from_extension)
        .ok_or_else(|| anyhow::anyhow!("Unsupported source format: {}", source.display()))?;

    let parser = SectionParser::new();
    let sections = match kind {
        SourceKind::Docx => {
            log::debug!("Parsing source as DOCX");
            let paragraphs = DocxReader::new()
                .read_path(source)
                .with_context(|| format!("Failed to read {}", source.display()))?;
            parser.parse_paragraphs(&paragraphs)?
        }
        SourceKind::Text => {
            log::debug!("Parsing source as plain text");
            let content = std::fs::read_to_string(source)
                .with_context(|| format!("Failed to read {}", source.display()))?;
            parser.parse_text(&content)?
        }
    };

    if verbose {
        eprintln!("  Found {} sections", sections.len());
    }

    Ok(sections)
}

/// Determine the output path for a conversion.
fn get_output_path(source: &Path, output: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = output {
        return path.clone();
    }

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let filename = format!("{}_slides.pptx", stem);

    match source.parent() {
        Some(parent) => parent.join(filename),
        None => PathBuf::from(filename),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_from_extension() {
        assert_eq!(SourceKind::from_extension("docx"), Some(SourceKind::Docx));
        assert_eq!(SourceKind::from_extension("DOCX"), Some(SourceKind::Docx));
        assert_eq!(SourceKind::from_extension("txt"), Some(SourceKind::Text));
        assert_eq!(SourceKind::from_extension("pptx"), None);
    }

    #[test]
    fn test_default_output_path_sits_next_to_source() {
        let path = get_output_path(Path::new("/docs/report.docx"), None);
        assert_eq!(path, PathBuf::from("/docs/report_slides.pptx"));
    }

    #[test]
    fn test_explicit_output_path_wins() {
        let explicit = PathBuf::from("/tmp/deck.pptx");
        let path = get_output_path(Path::new("report.docx"), Some(&explicit));
        assert_eq!(path, explicit);
    }
}
