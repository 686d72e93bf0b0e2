//! Identifier and format types
//!
//! - [`BattleId`]: opaque unique identifier for one recorded battle
//! - [`RecordFormat`]: persistent representation selected by the caller

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a battle
///
/// Wraps a UUID v4. Displayed in the hyphenated form, which is also what
/// every persisted format stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleId(Uuid);

impl BattleId {
    /// Create a new random battle id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a battle id from its string form
    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| Error::invalid_input(format!("invalid battle id '{}': {}", s, e)))
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BattleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistent record formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFormat {
    /// Framed MessagePack stream
    Binary,
    /// Binary stream inside a single-entry compressed archive
    BinaryZip,
    /// Self-describing XML document
    Xml,
    /// XML document inside a single-entry compressed archive
    XmlZip,
    /// Four relational CSV tables (export only)
    Csv,
}

impl RecordFormat {
    /// All formats, in declaration order
    pub const ALL: [RecordFormat; 5] = [
        RecordFormat::Binary,
        RecordFormat::BinaryZip,
        RecordFormat::Xml,
        RecordFormat::XmlZip,
        RecordFormat::Csv,
    ];

    /// Canonical lower-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordFormat::Binary => "binary",
            RecordFormat::BinaryZip => "binary_zip",
            RecordFormat::Xml => "xml",
            RecordFormat::XmlZip => "xml_zip",
            RecordFormat::Csv => "csv",
        }
    }

    /// True if the payload is wrapped in a compressed archive entry
    pub fn is_compressed(&self) -> bool {
        matches!(self, RecordFormat::BinaryZip | RecordFormat::XmlZip)
    }

    /// True for the two binary variants
    pub fn is_binary(&self) -> bool {
        matches!(self, RecordFormat::Binary | RecordFormat::BinaryZip)
    }

    /// True for the two XML variants
    pub fn is_xml(&self) -> bool {
        matches!(self, RecordFormat::Xml | RecordFormat::XmlZip)
    }

    /// True if an importer exists for this format
    pub fn is_importable(&self) -> bool {
        !matches!(self, RecordFormat::Csv)
    }

    /// Extension of the payload entry inside a compressed archive
    pub fn entry_extension(&self) -> &'static str {
        if self.is_xml() {
            "xml"
        } else {
            "br"
        }
    }

    /// Conventional file extension, including the leading dot
    pub fn file_extension(&self) -> &'static str {
        match self {
            RecordFormat::Binary => ".br",
            RecordFormat::BinaryZip => ".br.tar.zst",
            RecordFormat::Xml => ".xml",
            RecordFormat::XmlZip => ".xml.tar.zst",
            RecordFormat::Csv => ".csv",
        }
    }
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        RecordFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "unknown record format '{}'. Expected one of: binary, binary_zip, xml, xml_zip, csv",
                    s
                ))
            })
    }
}
