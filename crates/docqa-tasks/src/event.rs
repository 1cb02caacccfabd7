use docqa_core::{JobError, JobId, Lane};

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionEvent {
    Progress(f32),
    Completed(String),
    Failed(JobError),
}

/// Inference has no intermediate progress.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceEvent {
    Completed(String),
    Failed(JobError),
}

/// One message on the marshaling queue, tagged with the job that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Extraction { job: JobId, event: ExtractionEvent },
    Inference { job: JobId, event: InferenceEvent },
}

impl Envelope {
    pub fn job(&self) -> JobId {
        match self {
            Envelope::Extraction { job, .. } | Envelope::Inference { job, .. } => *job,
        }
    }

    pub fn lane(&self) -> Lane {
        match self {
            Envelope::Extraction { .. } => Lane::Extraction,
            Envelope::Inference { .. } => Lane::Inference,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Envelope::Extraction { event: ExtractionEvent::Progress(_), .. })
    }
}

/// Everything the interactive side hears from the supervisor.
///
/// Calls arrive on the thread that drains the supervisor, one at a time, and
/// only for the latest job of each lane.
pub trait TaskObserver {
    fn on_extraction_progress(&mut self, job: JobId, fraction: f32);
    fn on_extraction_result(&mut self, job: JobId, result: Result<String, JobError>);
    fn on_inference_result(&mut self, job: JobId, result: Result<String, JobError>);
}
