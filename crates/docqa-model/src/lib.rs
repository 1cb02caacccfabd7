//! docqa-model
//!
//! The question-answering model behind inference jobs: a local Llama-family
//! model run with candle, or `FakeModel` for development and tests.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use docqa_core::config::expand_path;
use docqa_core::{Error, Inferencer, ModelSettings};

pub mod device;
pub mod fake;
pub mod llama;
pub mod prompt;

pub use device::select_device;
pub use fake::FakeModel;
pub use llama::LlamaModel;
pub use prompt::render_prompt;

const DEFAULT_MODEL_DIR: &str = "models/llama-3.2-3b";

fn env_flag(name: &str) -> bool {
    std::env::var(name).ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Build the process-wide model handle. Called once, before any job starts.
pub fn load_model(settings: &ModelSettings) -> Result<Arc<dyn Inferencer>> {
    if settings.use_fake || env_flag("APP_USE_FAKE_MODEL") {
        info!("🧪 Using FakeModel");
        return Ok(Arc::new(FakeModel));
    }
    let dir = resolve_model_dir(settings)?;
    Ok(Arc::new(LlamaModel::load(&dir, settings)?))
}

/// First existing directory among `APP_MODEL_DIR`, `MODEL_DIR`, `model.dir`
/// and the bundled default location.
pub fn resolve_model_dir(settings: &ModelSettings) -> Result<PathBuf> {
    let mut candidates: Vec<(&str, PathBuf)> = Vec::new();
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { candidates.push(("APP_MODEL_DIR", expand_path(dir))); }
    if let Ok(dir) = std::env::var("MODEL_DIR") { candidates.push(("MODEL_DIR", expand_path(dir))); }
    if let Some(dir) = &settings.dir { candidates.push(("model.dir", expand_path(dir))); }
    candidates.push(("default", Path::new(DEFAULT_MODEL_DIR).to_path_buf()));

    for (origin, path) in &candidates {
        if path.is_dir() {
            info!("📦 Using model dir from {}: {}", origin, path.display());
            return Ok(path.clone());
        }
    }
    let tried = candidates.iter().map(|(_, p)| p.display().to_string()).collect::<Vec<_>>().join(", ");
    Err(Error::NotFound(format!("model directory (tried {})", tried)).into())
}
