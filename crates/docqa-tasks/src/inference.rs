use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use docqa_core::{Inferencer, JobError};

use crate::reporter::{panic_message, InferenceReporter};

/// One question-answering call, run to completion on a blocking thread.
///
/// The model call cannot be interrupted. A superseded worker keeps running and
/// its answer is discarded by the supervisor.
pub struct InferenceWorker {
    model: Arc<dyn Inferencer>,
    context: Arc<str>,
    question: String,
    reporter: InferenceReporter,
}

impl InferenceWorker {
    pub fn new(model: Arc<dyn Inferencer>, context: Arc<str>, question: String, reporter: InferenceReporter) -> Self {
        Self { model, context, question, reporter }
    }

    pub fn run(self) {
        let Self { model, context, question, reporter } = self;
        let job = reporter.job();
        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| model.infer(&context, &question)));
        let result = match outcome {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err(fault)) => Err(JobError::inference(&fault)),
            Err(payload) => Err(JobError::InferenceFailure(format!("inference crashed: {}", panic_message(payload.as_ref())))),
        };
        match &result {
            Ok(answer) => info!(job = %job, chars = answer.len(), ms = start.elapsed().as_millis() as u64, current = reporter.is_current(), "💬 inference finished"),
            Err(err) => warn!(job = %job, current = reporter.is_current(), "inference failed: {}", err),
        }
        reporter.finish(result);
    }
}
