//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys use `__`, e.g. `APP_MODEL__TEMPERATURE`).

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.model_settings()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self { Self { figment } }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// The `[model]` section, defaulted field by field and validated.
    pub fn model_settings(&self) -> anyhow::Result<ModelSettings> {
        let settings: ModelSettings = if self.figment.contains("model") { self.get("model")? } else { ModelSettings::default() };
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Auto,
    Cpu,
    Gpu,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Directory holding `config.json`, `tokenizer.json` and safetensors weights.
    pub dir: Option<String>,
    pub max_new_tokens: usize,
    pub temperature: f64,
    pub top_p: f64,
    pub seed: u64,
    /// Budget for the document part of the prompt, in tokens.
    pub max_context_tokens: usize,
    pub use_fake: bool,
    pub device: DevicePreference,
    pub prompt_template: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            dir: None,
            max_new_tokens: 300,
            temperature: 0.7,
            top_p: 0.9,
            seed: 299_792_458,
            max_context_tokens: 3072,
            use_fake: false,
            device: DevicePreference::Auto,
            prompt_template: "Document: {context}\n\nQuestion: {question}\nAnswer:".to_string(),
        }
    }
}

impl ModelSettings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.max_new_tokens == 0 {
            return Err(Error::InvalidConfig("model.max_new_tokens must be positive".into()));
        }
        if self.temperature.is_nan() || self.temperature < 0.0 {
            return Err(Error::InvalidConfig(format!("model.temperature must be >= 0, got {}", self.temperature)));
        }
        if self.top_p.is_nan() || self.top_p <= 0.0 || self.top_p > 1.0 {
            return Err(Error::InvalidConfig(format!("model.top_p must be in (0, 1], got {}", self.top_p)));
        }
        if self.max_context_tokens == 0 {
            return Err(Error::InvalidConfig("model.max_context_tokens must be positive".into()));
        }
        for placeholder in ["{context}", "{question}"] {
            if !self.prompt_template.contains(placeholder) {
                return Err(Error::InvalidConfig(format!("model.prompt_template is missing {}", placeholder)));
            }
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
