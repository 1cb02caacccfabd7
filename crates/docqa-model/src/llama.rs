use anyhow::{anyhow, bail, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::{LogitsProcessor, Sampling};
use candle_transformers::models::llama::{Cache, Config as LlamaRuntimeConfig, Llama, LlamaConfig, LlamaEosToks};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use docqa_core::{Inferencer, ModelSettings};

use crate::device::select_device;
use crate::prompt::render_prompt;

/// A local Llama-family causal LM loaded from a Hugging Face style directory.
///
/// The weights are shared; every `infer` call owns its KV cache and sampler,
/// so a superseded call still running in the background never touches the
/// state of a newer one.
pub struct LlamaModel {
    model: Llama,
    config: LlamaRuntimeConfig,
    tokenizer: Tokenizer,
    device: Device,
    dtype: DType,
    eos: Vec<u32>,
    settings: ModelSettings,
}

impl LlamaModel {
    pub fn load(model_dir: &Path, settings: &ModelSettings) -> Result<Self> {
        let device = select_device(settings.device);
        let dtype = if device.is_cpu() { DType::F32 } else { DType::F16 };
        info!("🔄 Loading model from {}", model_dir.display());

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path).with_context(|| format!("reading {}", config_path.display()))?;
        let config = serde_json::from_str::<LlamaConfig>(&raw)?.into_config(false);

        let weights = weight_files(model_dir)?;
        debug!(files = weights.len(), ?dtype, "mapping safetensors");
        // SAFETY: the weight files are memory-mapped read-only and must not be modified while the model is alive.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&weights, dtype, &device)? };
        let model = Llama::load(vb, &config)?;
        let eos = eos_tokens(&config, &tokenizer);
        info!("✅ Model loaded ({} layers, eos ids {:?})", config.num_hidden_layers, eos);

        Ok(Self { model, config, tokenizer, device, dtype, eos, settings: settings.clone() })
    }

    /// Cut the document down to `max_context_tokens` tokens.
    fn fit_context(&self, context: &str) -> Result<String> {
        let enc = self.tokenizer.encode(context, false).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let ids = enc.get_ids();
        let budget = self.settings.max_context_tokens;
        if ids.len() <= budget { return Ok(context.to_string()); }
        warn!(tokens = ids.len(), budget, "document context truncated to fit the model window");
        self.tokenizer.decode(&ids[..budget], false).map_err(|e| anyhow!("Detokenization failed: {}", e))
    }

    fn sampler(&self) -> LogitsProcessor {
        let sampling = if self.settings.temperature <= 0.0 {
            Sampling::ArgMax
        } else {
            Sampling::TopP { p: self.settings.top_p, temperature: self.settings.temperature }
        };
        LogitsProcessor::from_sampling(self.settings.seed, sampling)
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let enc = self.tokenizer.encode(prompt, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut tokens = enc.get_ids().to_vec();
        let prompt_len = tokens.len();
        if prompt_len + self.settings.max_new_tokens > self.config.max_position_embeddings {
            bail!("prompt of {} tokens leaves no room for {} new tokens (window {})", prompt_len, self.settings.max_new_tokens, self.config.max_position_embeddings);
        }

        let mut cache = Cache::new(true, self.dtype, &self.config, &self.device)?;
        let mut sampler = self.sampler();
        let mut index_pos = 0usize;
        for step in 0..self.settings.max_new_tokens {
            let context_size = if step > 0 { 1 } else { tokens.len() };
            let ctxt = &tokens[tokens.len() - context_size..];
            let input = Tensor::new(ctxt, &self.device)?.unsqueeze(0)?;
            let logits = self.model.forward(&input, index_pos, &mut cache)?.squeeze(0)?;
            index_pos += ctxt.len();
            let next = sampler.sample(&logits)?;
            if self.eos.contains(&next) { break; }
            tokens.push(next);
        }

        let generated = &tokens[prompt_len..];
        let text = self.tokenizer.decode(generated, true).map_err(|e| anyhow!("Detokenization failed: {}", e))?;
        let elapsed = start.elapsed();
        debug!(prompt_tokens = prompt_len, new_tokens = generated.len(), ms = elapsed.as_millis() as u64, "generation finished");
        if !generated.is_empty() && elapsed.as_secs_f64() > 0.0 {
            info!("⏱️  {:.1} tokens/s", generated.len() as f64 / elapsed.as_secs_f64());
        }

        let answer = text.trim();
        if answer.is_empty() { bail!("model produced an empty answer"); }
        Ok(answer.to_string())
    }
}

impl Inferencer for LlamaModel {
    fn infer(&self, context: &str, question: &str) -> Result<String> {
        let context = self.fit_context(context)?;
        let prompt = render_prompt(&self.settings.prompt_template, &context, question);
        self.generate(&prompt)
    }
}

/// Safetensors shards listed by `model.safetensors.index.json`, or the single
/// `model.safetensors` file.
pub fn weight_files(model_dir: &Path) -> Result<Vec<PathBuf>> {
    let index_path = model_dir.join("model.safetensors.index.json");
    if index_path.exists() {
        let index: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&index_path)?)?;
        let weight_map = index
            .get("weight_map")
            .and_then(|m| m.as_object())
            .ok_or_else(|| anyhow!("{} has no weight_map", index_path.display()))?;
        let shards: BTreeSet<&str> = weight_map.values().filter_map(|v| v.as_str()).collect();
        if shards.is_empty() { bail!("{} lists no shards", index_path.display()); }
        return Ok(shards.into_iter().map(|f| model_dir.join(f)).collect());
    }
    let single = model_dir.join("model.safetensors");
    if single.exists() { return Ok(vec![single]); }
    Err(anyhow!("No safetensors weights found in {}", model_dir.display()))
}

fn eos_tokens(config: &LlamaRuntimeConfig, tokenizer: &Tokenizer) -> Vec<u32> {
    let mut ids = match &config.eos_token_id {
        Some(LlamaEosToks::Single(id)) => vec![*id],
        Some(LlamaEosToks::Multiple(ids)) => ids.clone(),
        None => Vec::new(),
    };
    for token in ["<|eot_id|>", "<|end_of_text|>", "</s>"] {
        if let Some(id) = tokenizer.token_to_id(token) {
            if !ids.contains(&id) { ids.push(id); }
        }
    }
    ids
}
