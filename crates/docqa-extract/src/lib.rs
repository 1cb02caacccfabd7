//! docqa-extract
//!
//! Document sources for extraction jobs: plain text files with form-feed page
//! breaks, and PDF through MuPDF when built with the `pdf` feature.

use std::path::Path;
use std::sync::Arc;

use docqa_core::{Document, DocumentSource};

pub mod text;
#[cfg(feature = "pdf")]
pub mod pdf;

pub use text::{split_pages, PlainTextSource};
#[cfg(feature = "pdf")]
pub use pdf::PdfSource;

/// Picks a source by file extension.
#[derive(Default)]
pub struct AutoSource {
    text: PlainTextSource,
    #[cfg(feature = "pdf")]
    pdf: PdfSource,
}

impl AutoSource {
    pub fn new() -> Self { Self::default() }
}

fn is_pdf(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()).map(|ext| ext.eq_ignore_ascii_case("pdf")).unwrap_or(false)
}

impl DocumentSource for AutoSource {
    fn open(&self, path: &Path) -> anyhow::Result<Box<dyn Document>> {
        if is_pdf(path) {
            #[cfg(feature = "pdf")]
            return self.pdf.open(path);
            #[cfg(not(feature = "pdf"))]
            anyhow::bail!("PDF support is not compiled in (rebuild with the `pdf` feature)");
        }
        self.text.open(path)
    }
}

pub fn default_source() -> Arc<dyn DocumentSource> { Arc::new(AutoSource::new()) }
