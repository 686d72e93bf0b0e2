//! Battle rules and final per-robot results
//!
//! Both are produced by the external rules engine and only carried by the
//! record subsystem; nothing here validates or derives them.

use serde::{Deserialize, Serialize};

/// Rules the battle was fought under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRules {
    /// Arena width in units
    pub battlefield_width: u32,
    /// Arena height in units
    pub battlefield_height: u32,
    /// Number of rounds in the battle
    pub num_rounds: u32,
    /// Gun heat dissipated per turn
    pub gun_cooling_rate: f64,
    /// Turns without damage before inactivity penalties start
    pub inactivity_time: u64,
    /// Width of the border zone reserved for sentry robots
    #[serde(default)]
    pub sentry_border_size: u32,
    /// Whether enemy names are hidden from robots
    #[serde(default)]
    pub hide_enemy_names: bool,
}

impl Default for BattleRules {
    fn default() -> Self {
        Self {
            battlefield_width: 800,
            battlefield_height: 600,
            num_rounds: 10,
            gun_cooling_rate: 0.1,
            inactivity_time: 450,
            sentry_border_size: 100,
            hide_enemy_names: false,
        }
    }
}

impl BattleRules {
    /// Rules with the given round count and default arena settings
    pub fn with_rounds(num_rounds: u32) -> Self {
        Self {
            num_rounds,
            ..Self::default()
        }
    }
}

/// Aggregate results for one robot (or team leader) over the whole battle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BattleResults {
    /// Robot name, or team leader name for team battles
    pub team_leader_name: String,
    /// Final rank, 1-based
    pub rank: u32,
    /// Total score
    pub score: f64,
    /// Survival score
    pub survival: f64,
    /// Bonus for being the last survivor
    pub last_survivor_bonus: f64,
    /// Damage dealt by bullets
    pub bullet_damage: f64,
    /// Bonus for bullet kills
    pub bullet_damage_bonus: f64,
    /// Damage dealt by ramming
    pub ram_damage: f64,
    /// Bonus for ramming kills
    pub ram_damage_bonus: f64,
    /// Number of rounds finished first
    pub firsts: u32,
    /// Number of rounds finished second
    pub seconds: u32,
    /// Number of rounds finished third
    pub thirds: u32,
}
