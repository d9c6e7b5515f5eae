//! Configuration for reading a file sequence

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::stream::MultiFileReader;
use crate::{DadaSeqError, Result};

/// Default buffer size for streaming copies (1 MiB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Sequence configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Files in read order
    pub files: Vec<PathBuf>,
    /// Header size in bytes; parsed from the first file when absent
    #[serde(default)]
    pub header_size: Option<u64>,
    /// Buffer size for streaming copies
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

impl Config {
    /// Configuration for `files` with header detection and default buffering
    #[must_use]
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            header_size: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Load configuration from TOML file
    ///
    /// Relative file paths are resolved against the directory holding the
    /// configuration file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DadaSeqError::Configuration(format!("Failed to read config file: {e}"))
        })?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| DadaSeqError::Configuration(format!("Failed to parse config: {e}")))?;

        if let Some(base) = path.parent() {
            for file in &mut config.files {
                if file.is_relative() {
                    *file = base.join(&*file);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if no files are listed or the buffer size is zero
    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(DadaSeqError::Configuration(
                "At least one file must be configured".to_string(),
            ));
        }

        if self.buffer_size == 0 {
            return Err(DadaSeqError::Configuration(
                "buffer_size must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Build and open a reader for the configured sequence
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the sequence cannot
    /// be opened
    pub fn open_reader(&self) -> Result<MultiFileReader> {
        self.validate()?;
        let reader = MultiFileReader::new(&self.files, self.header_size)?;
        reader.open()?;
        Ok(reader)
    }
}
