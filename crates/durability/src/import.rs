//! Format dispatch for loading a record back into a spool

use crate::archive;
use crate::binary::BinaryRecordReader;
use crate::fs::{StagedFile, WRITE_BUFFER_SIZE};
use crate::xml::import_xml;
use battlerec_core::{BattleRecordHeader, Error, RecordFormat, Result, TurnSink};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// What an import loaded
#[derive(Debug, Clone, PartialEq)]
pub struct ImportInfo {
    /// Source path
    pub path: PathBuf,
    /// Format read
    pub format: RecordFormat,
    /// Header of the record, frozen
    pub header: BattleRecordHeader,
    /// Turns appended to the sink
    pub turns: u64,
}

/// Reads records from files into a [`TurnSink`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordImporter;

impl RecordImporter {
    /// Create an importer
    pub fn new() -> Self {
        Self
    }

    /// Load `source`, stored as `format`, into `sink`
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` for CSV, which cannot be imported
    /// - `FormatIncompatible` for records in a legacy layout
    /// - `InvalidFormat` for content that is not a record of `format`
    pub fn import(
        &self,
        source: &Path,
        format: RecordFormat,
        sink: &mut dyn TurnSink,
    ) -> Result<ImportInfo> {
        let header = match format {
            RecordFormat::Binary => BinaryRecordReader::open(buffered(source)?)?.import_into(sink)?,
            RecordFormat::BinaryZip => archive::read_single_entry(File::open(source)?, |entry| {
                BinaryRecordReader::open(entry)?.import_into(sink)
            })?,
            RecordFormat::Xml => import_xml(buffered(source)?, sink, None)?.header,
            RecordFormat::XmlZip => archive::read_single_entry(File::open(source)?, |entry| {
                Ok(import_xml(BufReader::new(entry), sink, None)?.header)
            })?,
            RecordFormat::Csv => {
                return Err(Error::invalid_operation("csv records cannot be imported"))
            }
        };

        let turns = header.total_turns();
        info!(
            target: "battlerec::format",
            path = %source.display(),
            format = %format,
            battle_id = %header.battle_id,
            turns,
            "Record imported"
        );
        Ok(ImportInfo {
            path: source.to_path_buf(),
            format,
            header,
            turns,
        })
    }

    /// Import an XML record into `sink` and write it as a binary record to
    /// `dest` in the same pass
    ///
    /// `compressed` says whether `source` is an XML archive; `dest` is
    /// written uncompressed.
    pub fn convert_xml_to_binary(
        &self,
        source: &Path,
        compressed: bool,
        dest: &Path,
        sink: &mut dyn TurnSink,
    ) -> Result<ImportInfo> {
        let format = if compressed {
            RecordFormat::XmlZip
        } else {
            RecordFormat::Xml
        };
        let file = File::open(source)?;
        let mut staged = StagedFile::create(dest)?;

        let imported = {
            let copy: &mut dyn Write = staged.writer()?;
            let mut run = |input: &mut dyn Read| {
                import_xml(BufReader::with_capacity(WRITE_BUFFER_SIZE, input), sink, Some(copy))
            };
            if compressed {
                archive::read_single_entry(file, run)?
            } else {
                let mut file = file;
                run(&mut file)?
            }
        };
        let bytes = staged.commit()?;

        info!(
            target: "battlerec::format",
            source = %source.display(),
            dest = %dest.display(),
            turns = imported.turns,
            bytes,
            "XML record converted to binary"
        );
        Ok(ImportInfo {
            path: source.to_path_buf(),
            format,
            turns: imported.turns,
            header: imported.header,
        })
    }
}

fn buffered(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::with_capacity(WRITE_BUFFER_SIZE, File::open(path)?))
}
