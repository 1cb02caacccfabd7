use std::path::Path;

/// An opened document, consumed page by page on the thread that opened it.
pub trait Document {
    fn page_count(&self) -> usize;
    fn extract_page(&self, index: usize) -> anyhow::Result<String>;
}

/// Opens documents for extraction jobs.
pub trait DocumentSource: Send + Sync {
    fn open(&self, path: &Path) -> anyhow::Result<Box<dyn Document>>;
}

/// Answers a question about a document text.
///
/// Calls may block for an unbounded time and cannot be interrupted.
pub trait Inferencer: Send + Sync {
    fn infer(&self, context: &str, question: &str) -> anyhow::Result<String>;
}
