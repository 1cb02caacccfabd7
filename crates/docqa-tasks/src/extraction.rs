use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use docqa_core::{DocumentSource, JobError};

use crate::reporter::{panic_message, ExtractionReporter};

fn page_fraction(done: usize, total: usize) -> f32 { done as f32 / total as f32 }

/// Read every page of the document at `path`, in order.
///
/// `on_progress` receives `(i + 1) / pages` after each page. The final `1.0`
/// is reported only once the text is known to be usable, so a full progress
/// bar always precedes success. A page fault aborts the remaining pages and
/// discards what was read so far.
pub fn extract_document(source: &dyn DocumentSource, path: &Path, mut on_progress: impl FnMut(f32)) -> Result<String, JobError> {
    let document = source.open(path).map_err(|e| JobError::open_fault(path, &e))?;
    let total = document.page_count();
    if total == 0 { return Err(JobError::EmptyDocument); }

    let mut text = String::new();
    for index in 0..total {
        let page = document.extract_page(index).map_err(|e| JobError::page_fault(index, &e))?;
        text.push_str(&page);
        if index + 1 < total { on_progress(page_fraction(index + 1, total)); }
    }

    let trimmed = text.trim();
    if trimmed.is_empty() { return Err(JobError::no_readable_text()); }
    on_progress(1.0);
    Ok(trimmed.to_string())
}

/// One extraction job, run to completion on a blocking thread.
pub struct ExtractionWorker {
    source: Arc<dyn DocumentSource>,
    path: PathBuf,
    reporter: ExtractionReporter,
}

impl ExtractionWorker {
    pub fn new(source: Arc<dyn DocumentSource>, path: PathBuf, reporter: ExtractionReporter) -> Self {
        Self { source, path, reporter }
    }

    pub fn run(self) {
        let Self { source, path, reporter } = self;
        let job = reporter.job();
        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            extract_document(source.as_ref(), &path, |fraction| reporter.progress(fraction))
        }));
        let result = outcome.unwrap_or_else(|payload| {
            Err(JobError::UnreadableDocument(format!("extraction crashed: {}", panic_message(payload.as_ref()))))
        });
        match &result {
            Ok(text) => info!(job = %job, chars = text.len(), ms = start.elapsed().as_millis() as u64, "📄 extraction finished"),
            Err(err) => warn!(job = %job, path = %path.display(), "extraction failed: {}", err),
        }
        reporter.finish(result);
    }
}
