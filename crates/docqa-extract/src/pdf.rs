//! PDF documents through MuPDF.

use anyhow::Result;
use std::path::Path;
use tracing::debug;

use docqa_core::{Document, DocumentSource, Error};

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfSource;

struct PdfDocument {
    doc: mupdf::Document,
    page_count: usize,
}

impl DocumentSource for PdfSource {
    fn open(&self, path: &Path) -> Result<Box<dyn Document>> {
        if !path.is_file() {
            return Err(Error::NotFound(path.display().to_string()).into());
        }
        let path_str = path.to_string_lossy();
        let doc = mupdf::Document::open(&*path_str)?;
        let page_count = usize::try_from(doc.page_count()?)?;
        debug!(path = %path.display(), pages = page_count, "opened pdf");
        Ok(Box::new(PdfDocument { doc, page_count }))
    }
}

impl Document for PdfDocument {
    fn page_count(&self) -> usize { self.page_count }

    fn extract_page(&self, index: usize) -> Result<String> {
        let page = self.doc.load_page(i32::try_from(index)?)?;
        Ok(page.to_text()?)
    }
}
