//! Core types and traits for battle recording
//!
//! This crate defines the foundational types used throughout the system:
//! - Snapshot model: TurnSnapshot, RobotSnapshot, BulletSnapshot, ScoreSnapshot
//! - BattleRecordHeader: battle metadata and per-round turn counts
//! - BattleRules / BattleResults: collaborator data carried by records
//! - BattleId / RecordFormat: identifiers and persistent format selection
//! - OutputOptions: precision trimming, short attributes, debug stripping
//! - Error: Error type hierarchy
//! - Traits: TurnSource, TurnSink, VersionProvider
//! - Codec: length-prefixed, CRC-checked MessagePack frames

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod header;
pub mod options;
pub mod rules;
pub mod snapshot;
pub mod traits;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use header::BattleRecordHeader;
pub use options::{format_decimal, round_decimal, OutputOptions, TRIMMED_DECIMALS};
pub use rules::{BattleResults, BattleRules};
pub use snapshot::{
    BulletSnapshot, BulletState, DebugProperty, RobotSnapshot, RobotState, ScoreSnapshot,
    TurnSnapshot,
};
pub use traits::{ReplaySummary, StaticVersion, TurnConsumer, TurnSink, TurnSource, VersionProvider};
pub use types::{BattleId, RecordFormat};
