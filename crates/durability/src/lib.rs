//! Persistent record formats
//!
//! A spooled battle is persisted in one of five formats:
//!
//! - Binary: framed header and turns (`.br`)
//! - BinaryZip: a binary record inside a single-entry tar+zstd archive
//! - Xml: a `record` document with one `turn` element per snapshot
//! - XmlZip: an XML record inside a single-entry archive
//! - Csv: four relational tables, export only
//!
//! Writers stream turns from a [`battlerec_core::TurnSource`]; readers
//! append them to a [`battlerec_core::TurnSink`]. Neither side holds the
//! whole battle in memory.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod archive;
pub mod binary;
pub mod csv;
pub mod export;
pub mod fs;
pub mod import;
pub mod xml;

pub use binary::{BinaryRecordReader, BinaryRecordWriter, BinaryStats};
pub use crate::csv::{export_csv_files, generate_csv, CsvSinks, CsvStats, TurnHook};
pub use export::{default_record_name, ExportInfo, ExportOptions, RecordExporter};
pub use import::{ImportInfo, RecordImporter};
pub use xml::{import_xml, write_xml_record, XmlImport, XmlSerializable};
