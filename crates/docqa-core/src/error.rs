use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reason a background job ended in `Failed`.
///
/// The `Display` output is the human-readable reason handed to the
/// interactive surface, so variants carrying a collaborator fault print it
/// verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("{0}")]
    UnreadableDocument(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    InferenceFailure(String),
}

impl JobError {
    pub const NO_READABLE_TEXT: &'static str = "document has no readable text";

    pub fn no_readable_text() -> Self { Self::UnreadableDocument(Self::NO_READABLE_TEXT.to_string()) }

    pub fn page_fault(page_index: usize, fault: &anyhow::Error) -> Self {
        Self::UnreadableDocument(format!("failed to read page {}: {:#}", page_index + 1, fault))
    }

    pub fn open_fault(path: &std::path::Path, fault: &anyhow::Error) -> Self {
        Self::UnreadableDocument(format!("cannot open {}: {:#}", path.display(), fault))
    }

    pub fn inference(fault: &anyhow::Error) -> Self { Self::InferenceFailure(format!("{:#}", fault)) }
}
