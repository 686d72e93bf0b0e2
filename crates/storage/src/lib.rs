//! Spool storage for battle recording
//!
//! The spool is a transient, append-only file of framed turn records with no
//! index of its own. The record header's per-round turn counts are what drive
//! replay.
//!
//! - SpoolStore: append channel with per-round ordering enforcement
//! - SpoolReader: sequential, independent read handles
//! - NameArena: per-round interning of robot names
//! - replay_spool / SpoolReplay: count-driven replay into a consumer
//!
//! The backing file is reference counted: it is removed once the store and
//! every reader created from it have been dropped.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backing;
pub mod config;
pub mod intern;
pub mod reader;
pub mod record;
pub mod replay;
pub mod store;

pub use backing::SpoolBacking;
pub use config::{SpoolConfig, DEFAULT_BUFFER_SIZE, MAX_ROUNDS, MIN_BUFFER_SIZE};
pub use intern::{NameArena, NameRef};
pub use reader::SpoolReader;
pub use replay::{replay_spool, SpoolReplay};
pub use store::{SpoolStats, SpoolStore};
