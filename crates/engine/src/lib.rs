//! Battle recording engine
//!
//! This crate ties the lower layers together:
//! - RecordManager: header plus spool for one battle, export and import
//! - BattleRecorder: forwards battle lifecycle events to a manager
//! - BattleEventDispatcher: ordered listener registry for battle events
//! - RecordConfig: settings loaded from `battlerec.toml`
//!
//! The engine is the only component that knows about:
//! - The battle lifecycle (begin, turns, finalize, close)
//! - Recovery after spool or export failures

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod events;
pub mod manager;
pub mod recorder;

pub use config::{RecordConfig, CONFIG_FILE_NAME};
pub use events::{BattleEvent, BattleEventDispatcher, BattleListener, ListenerId};
pub use manager::{ExportOutcome, ImportOutcome, RecordManager};
pub use recorder::BattleRecorder;
