//! Count-driven replay of the spool
//!
//! The spool has no index. Replay opens a fresh reader and, for each round in
//! order, reads exactly as many snapshots as the header's turn counts say,
//! checking that each one carries the expected round and turn index.

use crate::store::SpoolStore;
use battlerec_core::{Error, ReplaySummary, Result, TurnConsumer, TurnSource};
use tracing::debug;

/// Replay the spool's content into `consumer`
///
/// # Errors
///
/// - `OrderingViolation` if a snapshot's turn index differs from the
///   expected counter for its round
/// - `Corruption` if the spool ends early or a snapshot belongs to another round
/// - any error returned by `consumer`
pub fn replay_spool(
    store: &SpoolStore,
    turn_counts: &[u32],
    consumer: &mut TurnConsumer<'_>,
) -> Result<ReplaySummary> {
    let mut reader = store.begin_read()?;
    let mut summary = ReplaySummary::default();

    for (round, &count) in turn_counts.iter().enumerate() {
        let round = round as u32;
        if count == 0 {
            continue;
        }
        for expected in 0..count {
            let snapshot = reader.next_turn()?.ok_or_else(|| {
                Error::corruption(format!(
                    "spool ended at round {} turn {} of {}",
                    round, expected, count
                ))
            })?;
            if snapshot.round != round {
                return Err(Error::corruption(format!(
                    "expected a turn of round {} but read one of round {}",
                    round, snapshot.round
                )));
            }
            if snapshot.turn != expected {
                return Err(Error::OrderingViolation {
                    round,
                    expected,
                    found: snapshot.turn,
                });
            }

            if expected == 0 {
                summary.rounds += 1;
            }
            summary.turns += 1;
            if consumer(snapshot)?.is_break() {
                summary.stopped_early = true;
                debug!(target: "battlerec::spool", round, turn = expected, "Replay stopped by consumer");
                return Ok(summary);
            }
        }
    }

    debug!(target: "battlerec::spool", turns = summary.turns, rounds = summary.rounds, "Replay complete");
    Ok(summary)
}

/// A spool paired with the turn counts that describe it
pub struct SpoolReplay<'a> {
    store: &'a SpoolStore,
    turn_counts: &'a [u32],
}

impl<'a> SpoolReplay<'a> {
    /// Flush pending appends and borrow the store for replay
    pub fn new(store: &'a mut SpoolStore, turn_counts: &'a [u32]) -> Result<Self> {
        store.flush()?;
        Ok(Self { store, turn_counts })
    }

    /// Turn counts driving the replay
    pub fn turn_counts(&self) -> &[u32] {
        self.turn_counts
    }
}

impl TurnSource for SpoolReplay<'_> {
    fn replay_turns(&self, consumer: &mut TurnConsumer<'_>) -> Result<ReplaySummary> {
        replay_spool(self.store, self.turn_counts, consumer)
    }
}
