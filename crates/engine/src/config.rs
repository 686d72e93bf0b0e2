//! Recording configuration via `battlerec.toml`
//!
//! A default `battlerec.toml` is written on first use. To change settings,
//! edit the file; it is read again when the next recording starts.

use battlerec_core::{Error, OutputOptions, RecordFormat, Result};
use battlerec_durability::ExportOptions;
use battlerec_storage::{SpoolConfig, DEFAULT_BUFFER_SIZE, MIN_BUFFER_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name
pub const CONFIG_FILE_NAME: &str = "battlerec.toml";

/// Accepted zstd levels
pub const COMPRESSION_LEVELS: std::ops::RangeInclusive<i32> = 1..=22;

/// Recording configuration loaded from `battlerec.toml`.
///
/// # Example
///
/// ```toml
/// enabled = true
/// format = "binary_zip"
/// # spool_dir = "/var/tmp/battlerec"
/// trim_precision = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Record battles at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Format used when exporting without an explicit one
    #[serde(default = "default_format")]
    pub format: String,
    /// Directory for the spool file; the system temp dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spool_dir: Option<PathBuf>,
    /// Spool buffer size in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// zstd level for compressed formats
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
    /// Reduce floats to two decimals
    #[serde(default)]
    pub trim_precision: bool,
    /// Use compact XML attribute names
    #[serde(default)]
    pub short_attributes: bool,
    /// Drop robot console output and debug properties
    #[serde(default)]
    pub skip_debug: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_format() -> String {
    RecordFormat::BinaryZip.as_str().to_string()
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_compression_level() -> i32 {
    3
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            format: default_format(),
            spool_dir: None,
            buffer_size: default_buffer_size(),
            compression_level: default_compression_level(),
            trim_precision: false,
            short_attributes: false,
            skip_debug: false,
        }
    }
}

impl RecordConfig {
    /// Small spool buffers, for tests
    pub fn for_testing() -> Self {
        Self {
            buffer_size: MIN_BUFFER_SIZE,
            ..Self::default()
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Battle recording configuration
#
# Record battles (default: true)
enabled = true

# Default export format: "binary", "binary_zip", "xml", "xml_zip" or "csv"
format = "binary_zip"

# Directory for the transient spool file (default: system temp dir)
# spool_dir = "/var/tmp/battlerec"

# Spool buffer size in bytes (default: 1 MiB, minimum 4 KiB)
buffer_size = 1048576

# zstd level for compressed formats, 1..=22 (default: 3)
compression_level = 3

# Reduce floats to two decimals on export
trim_precision = false

# Compact XML attribute names (battleRecordS.xsd)
short_attributes = false

# Drop robot console output and debug properties on export
skip_debug = false
"#
    }

    /// Read, parse and validate config from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: RecordConfig = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, writing the commented default first if it is missing.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Self::from_file(path)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Check value ranges and the format name
    pub fn validate(&self) -> Result<()> {
        self.record_format()?;
        self.spool_config().validate()?;
        if !COMPRESSION_LEVELS.contains(&self.compression_level) {
            return Err(Error::config(format!(
                "compression_level must be within {}..={}, got {}",
                COMPRESSION_LEVELS.start(),
                COMPRESSION_LEVELS.end(),
                self.compression_level
            )));
        }
        Ok(())
    }

    /// Parse the default export format.
    pub fn record_format(&self) -> Result<RecordFormat> {
        self.format.parse().map_err(|_| {
            Error::config(format!(
                "Invalid format '{}' in {}. Expected one of binary, binary_zip, xml, xml_zip, csv.",
                self.format, CONFIG_FILE_NAME
            ))
        })
    }

    /// Output options for exports
    pub fn output_options(&self) -> OutputOptions {
        OutputOptions::new()
            .with_trim_precision(self.trim_precision)
            .with_short_attributes(self.short_attributes)
            .with_skip_debug(self.skip_debug)
    }

    /// Export options with `output` and the configured compression level
    pub fn export_options(&self, output: OutputOptions) -> ExportOptions {
        ExportOptions::new(output).with_compression_level(self.compression_level)
    }

    /// Spool settings
    pub fn spool_config(&self) -> SpoolConfig {
        let config = SpoolConfig::new().with_buffer_size(self.buffer_size);
        match &self.spool_dir {
            Some(dir) => config.with_dir(dir),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = RecordConfig::default();
        assert!(config.enabled);
        assert_eq!(config.record_format().unwrap(), RecordFormat::BinaryZip);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.output_options(), OutputOptions::new());
        config.validate().unwrap();
    }

    #[test]
    fn test_default_toml_parses_to_default() {
        let config: RecordConfig = toml::from_str(RecordConfig::default_toml()).unwrap();
        assert_eq!(config, RecordConfig::default());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "").unwrap();
        assert_eq!(RecordConfig::from_file(&path).unwrap(), RecordConfig::default());
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = RecordConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, RecordConfig::default());
    }

    #[test]
    fn test_load_or_create_keeps_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "format = \"xml\"\ntrim_precision = true\n").unwrap();
        let config = RecordConfig::load_or_create(&path).unwrap();
        assert_eq!(config.record_format().unwrap(), RecordFormat::Xml);
        assert!(config.output_options().trim_precision);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_format: RecordConfig = toml::from_str("format = \"pdf\"").unwrap();
        assert!(matches!(bad_format.validate(), Err(Error::ConfigError(_))));

        let small_buffer: RecordConfig = toml::from_str("buffer_size = 16").unwrap();
        assert!(matches!(small_buffer.validate(), Err(Error::ConfigError(_))));

        let bad_level: RecordConfig = toml::from_str("compression_level = 40").unwrap();
        assert!(matches!(bad_level.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_write_to_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = RecordConfig {
            format: "xml_zip".to_string(),
            spool_dir: Some(dir.path().join("spool")),
            short_attributes: true,
            ..RecordConfig::default()
        };
        config.write_to_file(&path).unwrap();
        let loaded = RecordConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.spool_config().dir, Some(dir.path().join("spool")));
    }
}
