//! Config file loading and command-line overrides.
//!
//! Precedence, lowest first: built-in defaults, the TOML file, flags.

use std::path::Path;

use anyhow::{Context, Result};
use docqa_rag::RagConfig;

use crate::cli::ConfigOverrides;

/// Read a [`RagConfig`] from a TOML file. Missing keys keep their defaults.
pub fn load_file(path: &Path) -> Result<RagConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))
}

impl ConfigOverrides {
    /// Overwrite every field of `config` that was given on the command line.
    pub fn apply(&self, config: &mut RagConfig) {
        if let Some(size) = self.chunk_size {
            config.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.chunk_overlap = overlap;
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(model) = &self.embedding_model {
            config.embedding_model = model.clone();
        }
        if let Some(model) = &self.generation_model {
            config.generation_model = model.clone();
        }
        if let Some(secs) = self.timeout {
            config.request_timeout_secs = secs;
        }
        if let Some(concurrency) = self.concurrency {
            config.embedding_concurrency = concurrency;
        }
        if let Some(size) = self.batch_size {
            config.embedding_batch_size = size;
        }
        if let Some(segmentation) = self.segmentation {
            config.segmentation = segmentation.into();
        }
        if let Some(similarity) = self.similarity {
            config.similarity = similarity.into();
        }
    }
}

/// Resolve the effective config and validate it.
pub fn resolve(
    file: Option<&Path>,
    overrides: &ConfigOverrides,
    top_k: Option<usize>,
) -> Result<RagConfig> {
    let mut config = match file {
        Some(path) => load_file(path)?,
        None => RagConfig::default(),
    };
    overrides.apply(&mut config);
    if let Some(k) = top_k {
        config.top_k = k;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}
