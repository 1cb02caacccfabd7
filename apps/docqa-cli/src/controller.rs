use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use docqa_core::{JobError, JobId};
use docqa_tasks::{TaskObserver, TaskSupervisor};

pub const STATUS_IDLE: &str = "Load a document to get started.";
pub const STATUS_LOADED: &str = "Document loaded. Ask a question.";
pub const STATUS_MISSING_INPUT: &str = "Load a document and enter a question first.";
pub const STATUS_THINKING: &str = "Thinking...";
pub const STATUS_ANSWERED: &str = "Answer ready.";

/// Something the renderer should show, queued in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Progress(f32),
    Answer(String),
    Status(String),
}

/// Owns everything the user sees. Lives on the interactive thread and is
/// only mutated by its own requests and by events the supervisor delivers.
pub struct InteractiveController {
    document: Option<Arc<str>>,
    document_path: Option<PathBuf>,
    loading_path: Option<PathBuf>,
    answer: Option<String>,
    progress: Option<f32>,
    status: String,
    updates: VecDeque<UiUpdate>,
}

impl Default for InteractiveController {
    fn default() -> Self { Self::new() }
}

impl InteractiveController {
    pub fn new() -> Self {
        Self {
            document: None,
            document_path: None,
            loading_path: None,
            answer: None,
            progress: None,
            status: STATUS_IDLE.to_string(),
            updates: VecDeque::new(),
        }
    }

    pub fn document(&self) -> Option<&str> { self.document.as_deref() }
    pub fn document_path(&self) -> Option<&Path> { self.document_path.as_deref() }
    pub fn answer(&self) -> Option<&str> { self.answer.as_deref() }
    /// `Some` while an extraction is in flight.
    pub fn progress(&self) -> Option<f32> { self.progress }
    pub fn status(&self) -> &str { &self.status }

    /// Updates queued since the last call, oldest first.
    pub fn drain_updates(&mut self) -> Vec<UiUpdate> { self.updates.drain(..).collect() }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.updates.push_back(UiUpdate::Status(self.status.clone()));
    }

    pub fn load_document(&mut self, supervisor: &mut TaskSupervisor, path: impl Into<PathBuf>) -> JobId {
        let path = path.into();
        self.progress = Some(0.0);
        self.updates.push_back(UiUpdate::Progress(0.0));
        self.set_status(format!("Loading {}...", path.display()));
        let job = supervisor.start_extraction(path.clone());
        self.loading_path = Some(path);
        job
    }

    /// Ask about the currently loaded text. Rejected here, without starting a
    /// job, when there is no document or the question is blank.
    pub fn ask(&mut self, supervisor: &mut TaskSupervisor, question: &str) -> Result<JobId, JobError> {
        let Some(document) = self.document.clone() else {
            self.set_status(STATUS_MISSING_INPUT);
            return Err(JobError::InvalidRequest("no document loaded".to_string()));
        };
        if question.trim().is_empty() {
            self.set_status(STATUS_MISSING_INPUT);
            return Err(JobError::InvalidRequest("question is empty".to_string()));
        }
        match supervisor.start_inference(document, question) {
            Ok(job) => {
                self.set_status(STATUS_THINKING);
                Ok(job)
            }
            Err(err) => {
                self.set_status(STATUS_MISSING_INPUT);
                Err(err)
            }
        }
    }
}

impl TaskObserver for InteractiveController {
    fn on_extraction_progress(&mut self, job: JobId, fraction: f32) {
        debug!(job = %job, fraction, "progress");
        self.progress = Some(fraction);
        self.updates.push_back(UiUpdate::Progress(fraction));
    }

    fn on_extraction_result(&mut self, job: JobId, result: Result<String, JobError>) {
        self.progress = None;
        let path = self.loading_path.take();
        match result {
            Ok(text) => {
                info!(job = %job, chars = text.len(), "document replaced");
                self.document = Some(Arc::from(text));
                self.document_path = path;
                self.set_status(STATUS_LOADED);
            }
            Err(err) => self.set_status(format!("Failed to load document: {}", err)),
        }
    }

    fn on_inference_result(&mut self, job: JobId, result: Result<String, JobError>) {
        match result {
            Ok(answer) => {
                debug!(job = %job, "answer replaced");
                self.answer = Some(answer.clone());
                self.updates.push_back(UiUpdate::Answer(answer));
                self.set_status(STATUS_ANSWERED);
            }
            Err(err) => self.set_status(format!("Inference failed: {}", err)),
        }
    }
}
