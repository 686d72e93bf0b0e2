//! Battle record header
//!
//! The header is the only piece of a record that lives in memory for the
//! whole battle. It carries the per-round turn counts that drive replay: the
//! spool itself has no index, so these counts are what tells a reader how
//! many snapshots belong to each round.

use crate::error::{Error, Result};
use crate::rules::{BattleResults, BattleRules};
use crate::types::BattleId;
use serde::{Deserialize, Serialize};

/// Metadata describing one recorded battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRecordHeader {
    /// Battle identifier
    pub battle_id: BattleId,
    /// Rules the battle was fought under
    pub rules: BattleRules,
    /// Number of robots taking part
    pub robot_count: u32,
    /// Furthest round that received a turn, plus one
    pub rounds_count: u32,
    /// Turns recorded per round; `None` when absent or invalidated
    pub turns_in_rounds: Option<Vec<u32>>,
    /// Final per-robot results, attached by finalize
    pub results: Vec<BattleResults>,
    /// Product version that recorded the battle
    pub version: String,
    #[serde(skip)]
    frozen: bool,
}

impl BattleRecordHeader {
    /// Create a header with every per-round turn count at zero
    pub fn new(
        battle_id: BattleId,
        rules: BattleRules,
        robot_count: u32,
        version: impl Into<String>,
    ) -> Self {
        let turns_in_rounds = vec![0; rules.num_rounds as usize];
        Self {
            battle_id,
            rules,
            robot_count,
            rounds_count: 0,
            turns_in_rounds: Some(turns_in_rounds),
            results: Vec::new(),
            version: version.into(),
            frozen: false,
        }
    }

    /// Per-round turn counts, if set
    pub fn turn_counts(&self) -> Option<&[u32]> {
        self.turns_in_rounds.as_deref()
    }

    /// Turns recorded in `round` (0 when out of range or unset)
    pub fn turns_in_round(&self, round: u32) -> u32 {
        self.turn_counts()
            .and_then(|counts| counts.get(round as usize).copied())
            .unwrap_or(0)
    }

    /// Total turns over all rounds
    pub fn total_turns(&self) -> u64 {
        self.turn_counts()
            .map(|counts| counts.iter().map(|&c| c as u64).sum())
            .unwrap_or(0)
    }

    /// Number of rounds that recorded at least one turn
    pub fn recorded_rounds(&self) -> usize {
        self.turn_counts()
            .map(|counts| counts.iter().filter(|&&c| c > 0).count())
            .unwrap_or(0)
    }

    /// Account for one more turn in `round`
    ///
    /// Returns the new count for the round.
    pub fn record_turn(&mut self, round: u32) -> Result<u32> {
        if self.frozen {
            return Err(Error::invalid_operation(
                "record header is finalized; no more turns can be added",
            ));
        }
        let counts = self
            .turns_in_rounds
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("record header has no turn counts"))?;
        let len = counts.len();
        let slot = counts.get_mut(round as usize).ok_or_else(|| {
            Error::invalid_input(format!(
                "round {} is outside the battle's {} rounds",
                round, len
            ))
        })?;
        *slot += 1;
        let count = *slot;
        self.rounds_count = self.rounds_count.max(round + 1);
        Ok(count)
    }

    /// Freeze the turn counts; later increments are rejected
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// True once the header has been finalized or loaded
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Drop the turn counts, marking the record as unusable for export
    pub fn invalidate(&mut self) {
        self.turns_in_rounds = None;
    }

    /// Check the structural invariant `len(turn_counts) == num_rounds`
    pub fn validate(&self) -> Result<()> {
        if let Some(counts) = self.turn_counts() {
            if counts.len() != self.rules.num_rounds as usize {
                return Err(Error::invalid_format(format!(
                    "header lists {} rounds of turn counts but rules declare {} rounds",
                    counts.len(),
                    self.rules.num_rounds
                )));
            }
        }
        Ok(())
    }
}
