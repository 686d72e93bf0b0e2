//! Format dispatch for persisting a record
//!
//! [`RecordExporter`] writes one record in any [`RecordFormat`] to a path.
//! Single-file formats are written atomically; CSV writes four table files
//! next to the destination.

use crate::archive::{self, DEFAULT_COMPRESSION_LEVEL};
use crate::binary;
use crate::csv::export_csv_files;
use crate::fs::write_atomically;
use crate::xml::write_xml_record;
use battlerec_core::{
    BattleRecordHeader, Error, OutputOptions, RecordFormat, Result, TurnSource,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Options for writing a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Precision, attribute and debug-detail options
    pub output: OutputOptions,
    /// zstd level for the archived formats
    pub compression_level: i32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output: OutputOptions::default(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ExportOptions {
    /// Options with the given output options and the default compression level
    pub fn new(output: OutputOptions) -> Self {
        Self {
            output,
            ..Self::default()
        }
    }

    /// Set the compression level (builder pattern)
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }
}

/// What an export produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportInfo {
    /// Destination path as given
    pub path: PathBuf,
    /// Format written
    pub format: RecordFormat,
    /// Turns written
    pub turns: u64,
    /// Bytes on disk, summed over every file written
    pub bytes: u64,
}

/// Writes records to files
#[derive(Debug, Clone)]
pub struct RecordExporter {
    options: ExportOptions,
    version: String,
}

impl RecordExporter {
    /// Create an exporter stamping `version` into CSV rows
    pub fn new(options: ExportOptions, version: impl Into<String>) -> Self {
        Self {
            options,
            version: version.into(),
        }
    }

    /// Options in use
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Write `header` and the turns of `source` to `dest` as `format`
    pub fn export(
        &self,
        dest: &Path,
        format: RecordFormat,
        header: &BattleRecordHeader,
        source: &dyn TurnSource,
    ) -> Result<ExportInfo> {
        if header.turn_counts().is_none() {
            return Err(Error::invalid_operation(
                "record has no per-round turn counts to export",
            ));
        }
        let output = self.options.output;
        let level = self.options.compression_level;

        let (turns, bytes) = match format {
            RecordFormat::Binary => {
                let (stats, bytes) = write_atomically(dest, |w| {
                    binary::write_record(w, header, source, output)
                })?;
                (stats.turns, bytes)
            }
            RecordFormat::BinaryZip => {
                let name = archive::entry_name(format);
                let (stats, bytes) = write_atomically(dest, |w| {
                    archive::write_single_entry(w, &name, level, |entry| {
                        binary::write_record(entry, header, source, output)
                    })
                    .map(|(_, stats)| stats)
                })?;
                (stats.turns, bytes)
            }
            RecordFormat::Xml => {
                let (stats, bytes) = write_atomically(dest, |w| {
                    write_xml_record(w, header, source, output, true)
                })?;
                (stats.turns, bytes)
            }
            RecordFormat::XmlZip => {
                let name = archive::entry_name(format);
                let (stats, bytes) = write_atomically(dest, |w| {
                    archive::write_single_entry(w, &name, level, |entry| {
                        write_xml_record(entry, header, source, output, false)
                    })
                    .map(|(_, stats)| stats)
                })?;
                (stats.turns, bytes)
            }
            RecordFormat::Csv => {
                let base = csv_base(dest);
                let (_, bytes) =
                    export_csv_files(&base, header, source, output, &self.version)?;
                (header.total_turns(), bytes)
            }
        };

        info!(
            target: "battlerec::format",
            path = %dest.display(),
            format = %format,
            turns,
            bytes,
            "Record exported"
        );
        Ok(ExportInfo {
            path: dest.to_path_buf(),
            format,
            turns,
            bytes,
        })
    }
}

/// `battle.csv` and `battle` both name the `battle.<table>.csv` family
fn csv_base(dest: &Path) -> PathBuf {
    match dest.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => dest.with_extension(""),
        _ => dest.to_path_buf(),
    }
}

/// Default file name for a record saved now: `<yyyyMMdd-HHmmss>-battle<ext>`
pub fn default_record_name(format: RecordFormat) -> String {
    format!(
        "{}-battle{}",
        chrono::Local::now().format("%Y%m%d-%H%M%S"),
        format.file_extension()
    )
}
