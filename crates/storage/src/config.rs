//! Spool configuration

use battlerec_core::{Error, Result};
use std::path::PathBuf;

/// Default size of the spool's write and read buffers (1 MiB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Smallest accepted buffer size
pub const MIN_BUFFER_SIZE: usize = 4 * 1024;

/// Rounds a single spool accepts; higher round indices are rejected
pub const MAX_ROUNDS: u32 = 1 << 16;

/// Where and how the spool file is kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoolConfig {
    /// Directory for the transient file; the system temp dir when `None`
    pub dir: Option<PathBuf>,
    /// Buffer size for the write channel and each reader
    pub buffer_size: usize,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            dir: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl SpoolConfig {
    /// Create a config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the spool file in `dir`
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Set the buffer size
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Small buffers, for tests
    pub fn for_testing() -> Self {
        Self {
            dir: None,
            buffer_size: MIN_BUFFER_SIZE,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size < MIN_BUFFER_SIZE {
            return Err(Error::config(format!(
                "spool buffer_size must be at least {} bytes, got {}",
                MIN_BUFFER_SIZE, self.buffer_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SpoolConfig::default();
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(config.dir.is_none());
        assert!(config.validate().is_ok());
        assert!(SpoolConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_tiny_buffer_rejected() {
        let config = SpoolConfig::new().with_buffer_size(16);
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }
}
