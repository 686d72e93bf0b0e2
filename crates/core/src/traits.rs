//! Core traits at the seams of the record subsystem
//!
//! - [`TurnSource`]: anything that can replay an ordered turn sequence
//!   (the spool, or a test fixture). Exporters only depend on this.
//! - [`TurnSink`]: anything that accepts an ordered turn sequence (the
//!   spool). Importers only depend on this.
//! - [`VersionProvider`]: supplies the product version stamped into records.

use crate::error::Result;
use crate::snapshot::TurnSnapshot;
use std::ops::ControlFlow;

/// Callback receiving replayed turns
///
/// Returning `ControlFlow::Break(())` stops the replay early without error.
pub type TurnConsumer<'a> = dyn FnMut(TurnSnapshot) -> Result<ControlFlow<()>> + 'a;

/// Outcome of a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Snapshots delivered to the consumer
    pub turns: u64,
    /// Rounds from which at least one snapshot was delivered
    pub rounds: u32,
    /// True if the consumer asked to stop before the end
    pub stopped_early: bool,
}

/// Sequential, ordered source of recorded turns
pub trait TurnSource {
    /// Deliver every recorded turn, in round/turn order, to `consumer`
    ///
    /// Implementations verify that turn indices are dense within each round;
    /// a mismatch is reported as `Error::OrderingViolation`.
    fn replay_turns(&self, consumer: &mut TurnConsumer<'_>) -> Result<ReplaySummary>;
}

/// Sequential, append-only destination for recorded turns
pub trait TurnSink {
    /// Discard prior content and open a fresh append channel
    fn begin_write(&mut self) -> Result<()>;

    /// Append one snapshot; `time` must be the next turn index for `round`
    fn append(&mut self, turn: &TurnSnapshot, round: u32, time: u32) -> Result<()>;

    /// Flush and close the append channel
    fn finish_write(&mut self) -> Result<()>;
}

/// Supplies the product version string recorded into every record
pub trait VersionProvider: Send + Sync {
    /// Current product version
    fn version(&self) -> String;
}

/// Fixed version string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticVersion(String);

impl StaticVersion {
    /// Use the given version string
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Version of this crate
    pub fn current() -> Self {
        Self(env!("CARGO_PKG_VERSION").to_string())
    }
}

impl Default for StaticVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl VersionProvider for StaticVersion {
    fn version(&self) -> String {
        self.0.clone()
    }
}
