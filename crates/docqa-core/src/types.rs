//! Job bookkeeping shared by the supervisor and its consumers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one background job.
///
/// Ids come from a single monotonically increasing counter owned by the
/// supervisor. A larger id always means a later start request, which is what
/// supersession compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(u64);

impl JobId {
    pub const fn new(raw: u64) -> Self { Self(raw) }
    pub const fn get(self) -> u64 { self.0 }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

/// An independent track holding at most one running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    Extraction,
    Inference,
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lane::Extraction => f.write_str("extraction"),
            Lane::Inference => f.write_str("inference"),
        }
    }
}

/// `Running -> Completed | Failed | Superseded`; nothing leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Running,
    Completed,
    Failed,
    Superseded,
}

impl JobState {
    pub fn is_terminal(self) -> bool { !matches!(self, JobState::Running) }
}
