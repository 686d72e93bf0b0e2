//! battlerec - battle recording, spooling, export and replay
//!
//! Records the per-turn state of a turn-based arena battle into a transient
//! spool, persists it as a binary, XML or CSV record, and loads records back
//! for turn-by-turn replay.
//!
//! # Quick Start
//!
//! ```ignore
//! use battlerec::{
//!     BattleEvent, BattleEventDispatcher, BattleRecorder, RecordConfig, RecordFormat,
//!     RecordManager, StaticVersion,
//! };
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! let manager = RecordManager::new(RecordConfig::default(), Arc::new(StaticVersion::current()))?;
//! let manager = Arc::new(Mutex::new(manager));
//!
//! let dispatcher = Arc::new(BattleEventDispatcher::new());
//! let mut recorder = BattleRecorder::new(Arc::clone(&manager));
//! recorder.attach(&dispatcher);
//!
//! // ... the simulation dispatches BattleStarted, TurnEnded, BattleCompleted ...
//!
//! manager.lock().export(path, RecordFormat::BinaryZip, Default::default())?;
//! ```
//!
//! # Architecture
//!
//! - `battlerec-core`: snapshot model, header, options, formats, errors
//! - `battlerec-storage`: the spool
//! - `battlerec-durability`: persistent formats
//! - `battlerec-engine`: record manager, recorder, events, configuration

pub use battlerec_core::{
    BattleId, BattleRecordHeader, BattleResults, BattleRules, BulletSnapshot, BulletState,
    DebugProperty, Error, ErrorKind, OutputOptions, RecordFormat, ReplaySummary, Result,
    RobotSnapshot, RobotState, ScoreSnapshot, StaticVersion, TurnConsumer, TurnSink,
    TurnSnapshot, TurnSource, VersionProvider,
};
pub use battlerec_durability::{
    CsvSinks, CsvStats, ExportInfo, ExportOptions, ImportInfo, RecordExporter, RecordImporter,
    TurnHook,
};
pub use battlerec_engine::{
    BattleEvent, BattleEventDispatcher, BattleListener, BattleRecorder, ExportOutcome,
    ImportOutcome, ListenerId, RecordConfig, RecordManager, CONFIG_FILE_NAME,
};
pub use battlerec_storage::{SpoolConfig, SpoolStore};
