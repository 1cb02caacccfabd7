//! Worker-side handles onto the marshaling queue.
//!
//! A reporter is bound to one job. `finish` consumes it, so a worker cannot
//! emit a second terminal event; a reporter dropped without finishing (the
//! worker unwound past it) still emits a failure so the job never goes silent.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace, warn};

use docqa_core::{JobError, JobId};

use crate::event::{Envelope, ExtractionEvent, InferenceEvent};

/// Latest job id issued on a lane, shared with that lane's workers.
#[derive(Debug, Default, Clone)]
pub(crate) struct LatestJob(Arc<AtomicU64>);

impl LatestJob {
    pub(crate) fn set(&self, job: JobId) { self.0.store(job.get(), Ordering::Release); }
    pub(crate) fn is(&self, job: JobId) -> bool { self.0.load(Ordering::Acquire) == job.get() }
}

fn post(tx: &UnboundedSender<Envelope>, envelope: Envelope) {
    if tx.send(envelope).is_err() { debug!("supervisor is gone; event dropped"); }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub struct ExtractionReporter {
    job: JobId,
    latest: LatestJob,
    tx: Option<UnboundedSender<Envelope>>,
}

impl ExtractionReporter {
    pub(crate) fn new(job: JobId, latest: LatestJob, tx: UnboundedSender<Envelope>) -> Self {
        Self { job, latest, tx: Some(tx) }
    }

    pub fn job(&self) -> JobId { self.job }

    /// False once a newer extraction has been started.
    pub fn is_current(&self) -> bool { self.latest.is(self.job) }

    pub fn progress(&self, fraction: f32) {
        if fraction.is_nan() { return; }
        // Early drop only; the supervisor re-checks on the interactive thread.
        if !self.is_current() {
            trace!(job = %self.job, "skipping progress of superseded extraction");
            return;
        }
        if let Some(tx) = &self.tx {
            post(tx, Envelope::Extraction { job: self.job, event: ExtractionEvent::Progress(fraction.clamp(0.0, 1.0)) });
        }
    }

    pub fn finish(mut self, result: Result<String, JobError>) {
        let event = match result {
            Ok(text) => ExtractionEvent::Completed(text),
            Err(err) => ExtractionEvent::Failed(err),
        };
        if let Some(tx) = self.tx.take() {
            post(&tx, Envelope::Extraction { job: self.job, event });
        }
    }
}

impl Drop for ExtractionReporter {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            warn!(job = %self.job, "extraction worker stopped without a result");
            let err = JobError::UnreadableDocument("extraction stopped unexpectedly".to_string());
            post(&tx, Envelope::Extraction { job: self.job, event: ExtractionEvent::Failed(err) });
        }
    }
}

pub struct InferenceReporter {
    job: JobId,
    latest: LatestJob,
    tx: Option<UnboundedSender<Envelope>>,
}

impl InferenceReporter {
    pub(crate) fn new(job: JobId, latest: LatestJob, tx: UnboundedSender<Envelope>) -> Self {
        Self { job, latest, tx: Some(tx) }
    }

    pub fn job(&self) -> JobId { self.job }

    pub fn is_current(&self) -> bool { self.latest.is(self.job) }

    pub fn finish(mut self, result: Result<String, JobError>) {
        let event = match result {
            Ok(text) => InferenceEvent::Completed(text),
            Err(err) => InferenceEvent::Failed(err),
        };
        if let Some(tx) = self.tx.take() {
            post(&tx, Envelope::Inference { job: self.job, event });
        }
    }
}

impl Drop for InferenceReporter {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            warn!(job = %self.job, "inference worker stopped without a result");
            let err = JobError::InferenceFailure("inference stopped unexpectedly".to_string());
            post(&tx, Envelope::Inference { job: self.job, event: InferenceEvent::Failed(err) });
        }
    }
}
