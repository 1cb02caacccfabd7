//! docqa-tasks
//!
//! Background job orchestration for the interactive front end. Extraction and
//! inference each run on their own lane: starting a job supersedes the lane's
//! previous one, workers run on tokio's blocking pool, and every event they
//! produce is marshaled back through a single queue that only the interactive
//! thread drains.

pub mod event;
pub mod extraction;
pub mod inference;
pub mod reporter;
pub mod supervisor;

pub use event::{Envelope, ExtractionEvent, InferenceEvent, TaskObserver};
pub use extraction::{extract_document, ExtractionWorker};
pub use inference::InferenceWorker;
pub use reporter::{ExtractionReporter, InferenceReporter};
pub use supervisor::{JobRecord, TaskSupervisor};
