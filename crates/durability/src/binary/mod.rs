//! Compact binary record format
//!
//! ## Layout
//!
//! ```text
//! [magic: "BATTLEREC"][version: u16 LE]
//! [frame: header]
//! [frame: turn]*
//! ```
//!
//! Frames use the shared codec (length prefix, MessagePack payload, CRC32).
//! Turns appear in round order; the header's per-round turn counts say how
//! many belong to each round.

mod reader;
mod writer;

pub use reader::BinaryRecordReader;
pub use writer::{write_record, BinaryRecordWriter, BinaryStats};

/// File magic
pub const MAGIC: &[u8; 9] = b"BATTLEREC";

/// Current layout version
pub const FORMAT_VERSION: u16 = 2;

/// Stream prefix of records written by the 1.x serializer
pub const LEGACY_STREAM_MAGIC: [u8; 2] = [0xAC, 0xED];
