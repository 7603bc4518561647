use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::BYTES_PER_MB;

pub const DEFAULT_CHUNK_SIZE_MB: usize = 2;
pub const MIN_CHUNK_SIZE_MB: usize = 1;
pub const MAX_CHUNK_SIZE_MB: usize = 64;
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    pub chunk_size_mb: usize,
    pub history_file: PathBuf,
    /// Oldest entries are pruned past this count; 0 keeps everything.
    pub history_capacity: usize,
    pub output_directory: PathBuf,
    pub verbosity: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            chunk_size_mb: DEFAULT_CHUNK_SIZE_MB,
            history_file: PathBuf::from("history.json"),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            output_directory: PathBuf::from("reports"),
            verbosity: "normal".to_string(),
        }
    }
}

impl ValidatorConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size_mb < MIN_CHUNK_SIZE_MB || self.chunk_size_mb > MAX_CHUNK_SIZE_MB {
            return Err(anyhow::anyhow!(
                "Chunk size must be between {} and {} MB",
                MIN_CHUNK_SIZE_MB,
                MAX_CHUNK_SIZE_MB
            ));
        }

        if self.history_file.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("History file path must not be empty"));
        }

        Ok(())
    }

    pub fn chunk_size_bytes(&self) -> usize {
        self.chunk_size_mb * BYTES_PER_MB
    }

    pub fn history_capacity(&self) -> Option<usize> {
        if self.history_capacity == 0 {
            None
        } else {
            Some(self.history_capacity)
        }
    }
}
