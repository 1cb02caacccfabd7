use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use docqa_core::{DocumentSource, Inferencer, JobError, JobId, JobState, Lane};

use crate::event::{Envelope, ExtractionEvent, InferenceEvent, TaskObserver};
use crate::extraction::ExtractionWorker;
use crate::inference::InferenceWorker;
use crate::reporter::{ExtractionReporter, InferenceReporter, LatestJob};

/// Finished or superseded jobs remembered per lane for `job_state`.
const HISTORY_LIMIT: usize = 64;

/// Bookkeeping for one job as seen from the interactive thread.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: JobId,
    pub lane: Lane,
    pub state: JobState,
    /// Last delivered progress; extraction only.
    pub progress: f32,
    /// Document path or question.
    pub subject: String,
}

impl JobRecord {
    fn new(id: JobId, lane: Lane, subject: String) -> Self {
        Self { id, lane, state: JobState::Running, progress: 0.0, subject }
    }
}

struct LaneState {
    lane: Lane,
    latest: LatestJob,
    current: Option<JobRecord>,
    history: VecDeque<JobRecord>,
}

impl LaneState {
    fn new(lane: Lane) -> Self {
        Self { lane, latest: LatestJob::default(), current: None, history: VecDeque::new() }
    }

    fn begin(&mut self, record: JobRecord) {
        if let Some(mut previous) = self.current.take() {
            if previous.state == JobState::Running {
                previous.state = JobState::Superseded;
                info!(lane = %self.lane, job = %previous.id, by = %record.id, "job superseded");
            }
            if self.history.len() == HISTORY_LIMIT { self.history.pop_front(); }
            self.history.push_back(previous);
        }
        self.latest.set(record.id);
        self.current = Some(record);
    }

    /// The lane's current job, if `id` names it and it has not ended yet.
    fn running_mut(&mut self, id: JobId) -> Option<&mut JobRecord> {
        self.current.as_mut().filter(|job| job.id == id && job.state == JobState::Running)
    }

    fn record(&self, id: JobId) -> Option<&JobRecord> {
        self.current.iter().chain(self.history.iter().rev()).find(|job| job.id == id)
    }

    fn running(&self) -> Option<JobId> {
        self.current.as_ref().filter(|job| job.state == JobState::Running).map(|job| job.id)
    }
}

/// Owns the two job lanes and the queue their workers report through.
///
/// Every method is meant to be called from the interactive thread. Workers
/// run on the runtime's blocking pool and only ever talk back through the
/// queue; `deliver` decides, on the interactive thread, whether an event
/// still belongs to the latest job of its lane before handing it to the
/// observer.
pub struct TaskSupervisor {
    runtime: Handle,
    source: Arc<dyn DocumentSource>,
    model: Arc<dyn Inferencer>,
    tx: UnboundedSender<Envelope>,
    rx: UnboundedReceiver<Envelope>,
    last_id: u64,
    extraction: LaneState,
    inference: LaneState,
}

impl TaskSupervisor {
    pub fn new(runtime: Handle, source: Arc<dyn DocumentSource>, model: Arc<dyn Inferencer>) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            runtime,
            source,
            model,
            tx,
            rx,
            last_id: 0,
            extraction: LaneState::new(Lane::Extraction),
            inference: LaneState::new(Lane::Inference),
        }
    }

    fn next_id(&mut self) -> JobId {
        self.last_id += 1;
        JobId::new(self.last_id)
    }

    /// Start extracting `path`, superseding any extraction still running.
    /// Returns immediately.
    pub fn start_extraction(&mut self, path: impl Into<PathBuf>) -> JobId {
        let path = path.into();
        let id = self.next_id();
        self.extraction.begin(JobRecord::new(id, Lane::Extraction, path.display().to_string()));
        info!(job = %id, path = %path.display(), "extraction started");

        let reporter = ExtractionReporter::new(id, self.extraction.latest.clone(), self.tx.clone());
        let worker = ExtractionWorker::new(Arc::clone(&self.source), path, reporter);
        let _detached = self.runtime.spawn_blocking(move || worker.run());
        id
    }

    /// Start answering `question` about `context`, superseding any inference
    /// still running. Blank inputs are rejected without starting a worker.
    pub fn start_inference(&mut self, context: Arc<str>, question: &str) -> Result<JobId, JobError> {
        if context.trim().is_empty() {
            return Err(JobError::InvalidRequest("no document text to ask about".to_string()));
        }
        let question = question.trim();
        if question.is_empty() {
            return Err(JobError::InvalidRequest("question is empty".to_string()));
        }

        let id = self.next_id();
        self.inference.begin(JobRecord::new(id, Lane::Inference, question.to_string()));
        info!(job = %id, context_chars = context.len(), "inference started");

        let reporter = InferenceReporter::new(id, self.inference.latest.clone(), self.tx.clone());
        let worker = InferenceWorker::new(Arc::clone(&self.model), context, question.to_string(), reporter);
        let _detached = self.runtime.spawn_blocking(move || worker.run());
        Ok(id)
    }

    /// Wait for the next worker event. Cancel safe, so it can sit in a
    /// `tokio::select!` next to user input.
    pub async fn recv(&mut self) -> Option<Envelope> { self.rx.recv().await }

    /// Hand `envelope` to `observer` if it belongs to the running job of its
    /// lane. Returns whether it was forwarded.
    pub fn deliver<O: TaskObserver + ?Sized>(&mut self, envelope: Envelope, observer: &mut O) -> bool {
        match envelope {
            Envelope::Extraction { job, event } => {
                let Some(record) = self.extraction.running_mut(job) else {
                    debug!(job = %job, "dropping stale extraction event");
                    return false;
                };
                match event {
                    ExtractionEvent::Progress(fraction) => {
                        let fraction = fraction.max(record.progress).min(1.0);
                        record.progress = fraction;
                        observer.on_extraction_progress(job, fraction);
                    }
                    ExtractionEvent::Completed(text) => {
                        record.state = JobState::Completed;
                        record.progress = 1.0;
                        info!(job = %job, "extraction delivered");
                        observer.on_extraction_result(job, Ok(text));
                    }
                    ExtractionEvent::Failed(err) => {
                        record.state = JobState::Failed;
                        warn!(job = %job, "extraction failure delivered: {}", err);
                        observer.on_extraction_result(job, Err(err));
                    }
                }
                true
            }
            Envelope::Inference { job, event } => {
                let Some(record) = self.inference.running_mut(job) else {
                    debug!(job = %job, "dropping stale inference event");
                    return false;
                };
                match event {
                    InferenceEvent::Completed(answer) => {
                        record.state = JobState::Completed;
                        info!(job = %job, "answer delivered");
                        observer.on_inference_result(job, Ok(answer));
                    }
                    InferenceEvent::Failed(err) => {
                        record.state = JobState::Failed;
                        warn!(job = %job, "inference failure delivered: {}", err);
                        observer.on_inference_result(job, Err(err));
                    }
                }
                true
            }
        }
    }

    /// Deliver everything already queued without waiting. For loops that
    /// poll once per frame instead of awaiting `recv`.
    pub fn pump<O: TaskObserver + ?Sized>(&mut self, observer: &mut O) -> usize {
        let mut delivered = 0;
        while let Ok(envelope) = self.rx.try_recv() {
            if self.deliver(envelope, observer) { delivered += 1; }
        }
        delivered
    }

    fn lane(&self, lane: Lane) -> &LaneState {
        match lane {
            Lane::Extraction => &self.extraction,
            Lane::Inference => &self.inference,
        }
    }

    pub fn job_state(&self, id: JobId) -> Option<JobState> {
        self.extraction.record(id).or_else(|| self.inference.record(id)).map(|job| job.state)
    }

    /// The lane's job that is still running, if any.
    pub fn running(&self, lane: Lane) -> Option<JobId> { self.lane(lane).running() }

    /// The most recently started job of the lane, whatever its state.
    pub fn current(&self, lane: Lane) -> Option<&JobRecord> { self.lane(lane).current.as_ref() }
}
