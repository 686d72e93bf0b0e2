//! Per-turn snapshot model
//!
//! A [`TurnSnapshot`] is produced by the simulation once per tick. It is
//! immutable for the purposes of recording: the spool serializes it as-is and
//! exporters only ever see copies read back from the spool.

use crate::options::{round_decimal, OutputOptions};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a robot within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RobotState {
    /// Alive and moving freely
    #[default]
    Active,
    /// Collided with a wall this turn
    HitWall,
    /// Collided with another robot this turn
    HitRobot,
    /// Destroyed
    Dead,
}

impl RobotState {
    /// Upper-case tag used by the text formats
    pub fn as_str(&self) -> &'static str {
        match self {
            RobotState::Active => "ACTIVE",
            RobotState::HitWall => "HIT_WALL",
            RobotState::HitRobot => "HIT_ROBOT",
            RobotState::Dead => "DEAD",
        }
    }

    /// Parse an upper-case tag
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(RobotState::Active),
            "HIT_WALL" => Some(RobotState::HitWall),
            "HIT_ROBOT" => Some(RobotState::HitRobot),
            "DEAD" => Some(RobotState::Dead),
            _ => None,
        }
    }
}

/// Lifecycle state of a bullet within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BulletState {
    /// Fired this turn
    #[default]
    Fired,
    /// In flight
    Moving,
    /// Hit a robot
    HitVictim,
    /// Hit another bullet
    HitBullet,
    /// Hit a wall
    HitWall,
    /// Explosion animation
    Exploded,
    /// No longer on the battlefield
    Inactive,
}

impl BulletState {
    /// Upper-case tag used by the text formats
    pub fn as_str(&self) -> &'static str {
        match self {
            BulletState::Fired => "FIRED",
            BulletState::Moving => "MOVING",
            BulletState::HitVictim => "HIT_VICTIM",
            BulletState::HitBullet => "HIT_BULLET",
            BulletState::HitWall => "HIT_WALL",
            BulletState::Exploded => "EXPLODED",
            BulletState::Inactive => "INACTIVE",
        }
    }

    /// Parse an upper-case tag
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FIRED" => Some(BulletState::Fired),
            "MOVING" => Some(BulletState::Moving),
            "HIT_VICTIM" => Some(BulletState::HitVictim),
            "HIT_BULLET" => Some(BulletState::HitBullet),
            "HIT_WALL" => Some(BulletState::HitWall),
            "EXPLODED" => Some(BulletState::Exploded),
            "INACTIVE" => Some(BulletState::Inactive),
            _ => None,
        }
    }
}

/// Running score totals for one robot in the current round
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    /// Current total score
    pub current_score: f64,
    /// Survival component
    pub survival_score: f64,
    /// Bullet damage component
    pub bullet_damage_score: f64,
    /// Bullet kill bonus component
    pub bullet_kill_bonus: f64,
    /// Ramming damage component
    pub ramming_damage_score: f64,
    /// Ramming kill bonus component
    pub ramming_kill_bonus: f64,
}

impl ScoreSnapshot {
    fn round_values(&mut self) {
        self.current_score = round_decimal(self.current_score);
        self.survival_score = round_decimal(self.survival_score);
        self.bullet_damage_score = round_decimal(self.bullet_damage_score);
        self.bullet_kill_bonus = round_decimal(self.bullet_kill_bonus);
        self.ramming_damage_score = round_decimal(self.ramming_damage_score);
        self.ramming_kill_bonus = round_decimal(self.ramming_kill_bonus);
    }
}

/// A key/value pair published by a robot for debugging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugProperty {
    /// Property key
    pub key: String,
    /// Property value
    pub value: String,
}

/// State of one robot at the end of a turn
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RobotSnapshot {
    /// Full robot name (including version)
    pub name: String,
    /// Short name without package and version
    pub short_name: String,
    /// Index of the robot within the battle
    pub robot_index: u32,
    /// Team index, if the robot is part of a team
    pub team_index: Option<u32>,
    /// Lifecycle state
    pub state: RobotState,
    /// Remaining energy
    pub energy: f64,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Body heading in radians
    pub body_heading: f64,
    /// Gun heading in radians
    pub gun_heading: f64,
    /// Radar heading in radians
    pub radar_heading: f64,
    /// Velocity in units per turn
    pub velocity: f64,
    /// Current gun heat
    pub gun_heat: f64,
    /// Running score
    pub score: ScoreSnapshot,
    /// Console output produced this turn
    pub output_text: String,
    /// Debug properties published this turn
    pub debug_properties: Vec<DebugProperty>,
}

impl RobotSnapshot {
    /// Create a robot snapshot with identity set and everything else zeroed
    pub fn new(name: impl Into<String>, robot_index: u32) -> Self {
        let name = name.into();
        let short_name = name
            .split_whitespace()
            .next()
            .and_then(|class_name| class_name.rsplit('.').next())
            .unwrap_or_default()
            .to_string();
        Self {
            name,
            short_name,
            robot_index,
            ..Self::default()
        }
    }

    /// True if the robot has been destroyed
    pub fn is_dead(&self) -> bool {
        self.state == RobotState::Dead
    }

    fn strip_details(&mut self, options: &OutputOptions) {
        if options.skip_debug {
            self.output_text.clear();
            self.debug_properties.clear();
        }
        if options.trim_precision {
            self.energy = round_decimal(self.energy);
            self.x = round_decimal(self.x);
            self.y = round_decimal(self.y);
            self.body_heading = round_decimal(self.body_heading);
            self.gun_heading = round_decimal(self.gun_heading);
            self.radar_heading = round_decimal(self.radar_heading);
            self.velocity = round_decimal(self.velocity);
            self.gun_heat = round_decimal(self.gun_heat);
            self.score.round_values();
        }
    }
}

/// State of one bullet at the end of a turn
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BulletSnapshot {
    /// Bullet identifier, unique within a round
    pub bullet_id: u32,
    /// Index of the robot that fired it
    pub owner_index: u32,
    /// Lifecycle state
    pub state: BulletState,
    /// Firing power
    pub power: f64,
    /// Heading in radians
    pub heading: f64,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Index of the robot that was hit, `None` while no victim yet
    pub victim_index: Option<u32>,
}

impl BulletSnapshot {
    fn strip_details(&mut self, options: &OutputOptions) {
        if options.trim_precision {
            self.power = round_decimal(self.power);
            self.heading = round_decimal(self.heading);
            self.x = round_decimal(self.x);
            self.y = round_decimal(self.y);
        }
    }
}

/// Everything the simulation knows at the end of one turn
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TurnSnapshot {
    /// Round index, 0-based
    pub round: u32,
    /// Turn index within the round, 0-based and dense
    pub turn: u32,
    /// Robots, ordered by robot index
    pub robots: Vec<RobotSnapshot>,
    /// Bullets currently on the battlefield
    pub bullets: Vec<BulletSnapshot>,
}

impl TurnSnapshot {
    /// Create an empty snapshot for the given position
    pub fn new(round: u32, turn: u32) -> Self {
        Self {
            round,
            turn,
            robots: Vec::new(),
            bullets: Vec::new(),
        }
    }

    /// Look up a robot by its index
    pub fn robot(&self, index: u32) -> Option<&RobotSnapshot> {
        self.robots
            .get(index as usize)
            .filter(|r| r.robot_index == index)
            .or_else(|| self.robots.iter().find(|r| r.robot_index == index))
    }

    /// Remove rarely-needed detail before persisting
    ///
    /// `skip_debug` drops console output and debug properties,
    /// `trim_precision` rounds every float to the trimmed precision.
    pub fn strip_details(&mut self, options: &OutputOptions) {
        for robot in &mut self.robots {
            robot.strip_details(options);
        }
        for bullet in &mut self.bullets {
            bullet.strip_details(options);
        }
    }
}
