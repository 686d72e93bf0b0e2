//! Append channel of the spool
//!
//! ## Ordering
//!
//! Turns arrive round by round; within a round the turn index must equal the
//! number of turns already appended for that round. Any other index is an
//! ordering violation. After a violation the store refuses further appends
//! until `begin_write` starts over, because the count-driven replay could no
//! longer line records up with rounds.

use crate::backing::SpoolBacking;
use crate::config::{SpoolConfig, MAX_ROUNDS};
use crate::intern::NameArena;
use crate::reader::SpoolReader;
use crate::record::SpoolRecord;
use battlerec_core::{codec, Error, Result, TurnSink, TurnSnapshot};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Counters for the current write session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpoolStats {
    /// Turns appended
    pub turns_written: u64,
    /// Bytes appended, frame overhead included
    pub bytes_written: u64,
    /// Round-first turns appended
    pub rounds_started: u32,
}

/// Transient, append-only store of turn records
pub struct SpoolStore {
    config: SpoolConfig,
    backing: Arc<SpoolBacking>,
    writer: Option<BufWriter<File>>,
    round_counts: Vec<u32>,
    arena: NameArena,
    poisoned: Option<String>,
    stats: SpoolStats,
}

impl SpoolStore {
    /// Create a store backed by a fresh, uniquely named file
    ///
    /// No append channel is open until [`SpoolStore::begin_write`].
    pub fn create(config: SpoolConfig) -> Result<Self> {
        config.validate()?;
        let backing = Arc::new(SpoolBacking::create(config.dir.as_deref())?);
        Ok(Self {
            config,
            backing,
            writer: None,
            round_counts: Vec::new(),
            arena: NameArena::new(),
            poisoned: None,
            stats: SpoolStats::default(),
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &SpoolConfig {
        &self.config
    }

    /// Location of the current backing file
    pub fn path(&self) -> &Path {
        self.backing.path()
    }

    /// Discard all prior content and open a fresh append channel
    ///
    /// Readers opened before this call keep the previous file alive and keep
    /// reading the previous content.
    pub fn begin_write(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!(target: "battlerec::spool", error = %e, "Failed to flush previous spool content");
            }
        }

        let backing = Arc::new(SpoolBacking::create(self.config.dir.as_deref())?);
        let file = backing.open_write()?;
        self.backing = backing;
        self.writer = Some(BufWriter::with_capacity(self.config.buffer_size, file));
        self.round_counts.clear();
        self.arena.reset();
        self.poisoned = None;
        self.stats = SpoolStats::default();

        debug!(target: "battlerec::spool", path = %self.backing.path().display(), "Spool write channel opened");
        Ok(())
    }

    /// Number of turns already appended for `round`, i.e. the next valid `time`
    pub fn expected_turn(&self, round: u32) -> u32 {
        self.round_counts.get(round as usize).copied().unwrap_or(0)
    }

    /// Append one snapshot at (`round`, `time`)
    ///
    /// # Errors
    ///
    /// - `OrderingViolation` if `time` is not the next index for `round`;
    ///   the store is poisoned afterwards
    /// - `Unrecoverable` once poisoned
    /// - `InvalidInput` if `round` is not below [`MAX_ROUNDS`]
    /// - `InvalidOperation` if no append channel is open
    /// - `IoError` / `SerializationError` from the write itself
    pub fn append(&mut self, turn: &TurnSnapshot, round: u32, time: u32) -> Result<()> {
        if let Some(reason) = &self.poisoned {
            return Err(Error::unrecoverable(format!(
                "spool refused append after earlier failure: {}",
                reason
            )));
        }

        if round >= MAX_ROUNDS {
            return Err(Error::invalid_input(format!(
                "round {} exceeds the spool limit of {} rounds",
                round, MAX_ROUNDS
            )));
        }

        let expected = self.expected_turn(round);
        if time != expected {
            let err = Error::OrderingViolation {
                round,
                expected,
                found: time,
            };
            warn!(target: "battlerec::spool", round, expected, found = time, "Turn ordering violation, spool poisoned");
            self.poisoned = Some(err.to_string());
            return Err(err);
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("spool write channel is not open"))?;

        let reset = time == 0;
        if reset {
            self.arena.reset();
        }
        let record = SpoolRecord::encode(turn, reset, &mut self.arena);
        let bytes = codec::write_value_frame(writer, &record)?;

        let slot = round as usize;
        if self.round_counts.len() <= slot {
            self.round_counts.resize(slot + 1, 0);
        }
        self.round_counts[slot] += 1;
        self.stats.turns_written += 1;
        self.stats.bytes_written += bytes;
        if reset {
            self.stats.rounds_started += 1;
            debug!(target: "battlerec::spool", round, "Round started");
        }
        trace!(target: "battlerec::spool", round, time, bytes, "Turn appended");
        Ok(())
    }

    /// Push buffered appends to the file so readers can see them
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Flush and close the append channel
    pub fn finish_write(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            debug!(
                target: "battlerec::spool",
                turns = self.stats.turns_written,
                bytes = self.stats.bytes_written,
                "Spool write channel closed"
            );
        }
        Ok(())
    }

    /// Open an independent reader at the start of the spool
    ///
    /// Only flushed appends are visible to the reader.
    pub fn begin_read(&self) -> Result<SpoolReader> {
        SpoolReader::open(Arc::clone(&self.backing), self.config.buffer_size)
    }

    /// True while an append channel is open
    pub fn is_writing(&self) -> bool {
        self.writer.is_some()
    }

    /// True after an ordering violation, until the next `begin_write`
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    /// Turns appended per round in this session
    pub fn round_counts(&self) -> &[u32] {
        &self.round_counts
    }

    /// Counters for this session
    pub fn stats(&self) -> SpoolStats {
        self.stats
    }

    /// Live references to the current backing file (the store plus readers)
    pub fn open_handles(&self) -> usize {
        Arc::strong_count(&self.backing)
    }
}

impl TurnSink for SpoolStore {
    fn begin_write(&mut self) -> Result<()> {
        SpoolStore::begin_write(self)
    }

    fn append(&mut self, turn: &TurnSnapshot, round: u32, time: u32) -> Result<()> {
        SpoolStore::append(self, turn, round, time)
    }

    fn finish_write(&mut self) -> Result<()> {
        SpoolStore::finish_write(self)
    }
}

impl std::fmt::Debug for SpoolStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpoolStore")
            .field("path", &self.backing.path())
            .field("writing", &self.writer.is_some())
            .field("poisoned", &self.poisoned)
            .field("stats", &self.stats)
            .finish()
    }
}
