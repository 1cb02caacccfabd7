#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{Config, DevicePreference, ModelSettings};
pub use error::{Error, JobError, Result};
pub use traits::{Document, DocumentSource, Inferencer};
pub use types::{JobId, JobState, Lane};
