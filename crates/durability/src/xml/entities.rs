//! XML mapping of every persisted entity
//!
//! Element and attribute names are fixed here. Each attribute has a full and
//! a compact spelling; readers accept either.

use super::tree::{attr, Attr, XmlNode, XmlSerializable, XmlTreeWriter};
use battlerec_core::{
    BattleId, BattleRecordHeader, BattleResults, BattleRules, BulletSnapshot, BulletState,
    DebugProperty, Error, OutputOptions, Result, RobotSnapshot, RobotState, ScoreSnapshot,
    TurnSnapshot,
};
use std::io::Write;

pub(crate) const RECORD_INFO: &str = "recordInfo";
pub(crate) const TURN: &str = "turn";
const RULES: &str = "rules";
const ROUNDS: &str = "rounds";
const ROUND: &str = "round";
const RESULTS: &str = "results";
const RESULT: &str = "result";
const ROBOTS: &str = "robots";
const ROBOT: &str = "robot";
const SCORE: &str = "score";
const DEBUG: &str = "debug";
const BULLETS: &str = "bullets";
const BULLET: &str = "bullet";

mod names {
    use super::{attr, Attr};

    pub const BATTLE_ID: Attr = attr("battleId", "id");
    pub const ROBOT_COUNT: Attr = attr("robotCount", "rc");
    pub const ROUNDS_COUNT: Attr = attr("roundsCount", "rn");
    pub const VERSION: Attr = attr("version", "ver");

    pub const WIDTH: Attr = attr("battlefieldWidth", "w");
    pub const HEIGHT: Attr = attr("battlefieldHeight", "h");
    pub const NUM_ROUNDS: Attr = attr("numRounds", "n");
    pub const GUN_COOLING_RATE: Attr = attr("gunCoolingRate", "g");
    pub const INACTIVITY_TIME: Attr = attr("inactivityTime", "i");
    pub const SENTRY_BORDER: Attr = attr("sentryBorderSize", "sb");
    pub const HIDE_NAMES: Attr = attr("hideEnemyNames", "he");

    pub const TURNS: Attr = attr("turns", "t");

    pub const LEADER: Attr = attr("teamLeaderName", "n");
    pub const RANK: Attr = attr("rank", "r");
    pub const TOTAL: Attr = attr("score", "s");
    pub const SURVIVAL: Attr = attr("survival", "sv");
    pub const LAST_SURVIVOR: Attr = attr("lastSurvivorBonus", "ls");
    pub const BULLET_DAMAGE: Attr = attr("bulletDamage", "bd");
    pub const BULLET_BONUS: Attr = attr("bulletDamageBonus", "bb");
    pub const RAM_DAMAGE: Attr = attr("ramDamage", "rd");
    pub const RAM_BONUS: Attr = attr("ramDamageBonus", "rb");
    pub const FIRSTS: Attr = attr("firsts", "f1");
    pub const SECONDS: Attr = attr("seconds", "f2");
    pub const THIRDS: Attr = attr("thirds", "f3");

    pub const ROUND_INDEX: Attr = attr("round", "r");
    pub const TURN_INDEX: Attr = attr("turn", "t");

    pub const NAME: Attr = attr("name", "n");
    pub const SHORT_NAME: Attr = attr("shortName", "sn");
    pub const ROBOT_INDEX: Attr = attr("robotIndex", "ri");
    pub const TEAM_INDEX: Attr = attr("teamIndex", "ti");
    pub const STATE: Attr = attr("state", "s");
    pub const ENERGY: Attr = attr("energy", "e");
    pub const X: Attr = attr("x", "x");
    pub const Y: Attr = attr("y", "y");
    pub const BODY_HEADING: Attr = attr("bodyHeading", "bh");
    pub const GUN_HEADING: Attr = attr("gunHeading", "gh");
    pub const RADAR_HEADING: Attr = attr("radarHeading", "rh");
    pub const VELOCITY: Attr = attr("velocity", "v");
    pub const GUN_HEAT: Attr = attr("gunHeat", "gt");
    pub const OUTPUT: Attr = attr("output", "o");

    pub const CURRENT: Attr = attr("current", "c");
    pub const SURVIVAL_SCORE: Attr = attr("survival", "s");
    pub const BULLET_DAMAGE_SCORE: Attr = attr("bulletDamage", "bd");
    pub const BULLET_KILL_BONUS: Attr = attr("bulletKillBonus", "bk");
    pub const RAMMING_DAMAGE: Attr = attr("rammingDamage", "rd");
    pub const RAMMING_KILL_BONUS: Attr = attr("rammingKillBonus", "rk");

    pub const KEY: Attr = attr("key", "k");
    pub const VALUE: Attr = attr("value", "v");

    pub const BULLET_ID: Attr = attr("id", "i");
    pub const OWNER: Attr = attr("owner", "o");
    pub const POWER: Attr = attr("power", "p");
    pub const HEADING: Attr = attr("heading", "h");
    pub const VICTIM: Attr = attr("victim", "vi");
}

use names::*;

impl XmlSerializable for BattleRules {
    fn write_xml<W: Write>(&self, w: &mut XmlTreeWriter<W>, o: &OutputOptions) -> Result<()> {
        w.start(RULES)?;
        w.attr_display(WIDTH, self.battlefield_width, o)?;
        w.attr_display(HEIGHT, self.battlefield_height, o)?;
        w.attr_display(NUM_ROUNDS, self.num_rounds, o)?;
        w.attr_f64(GUN_COOLING_RATE, self.gun_cooling_rate, o)?;
        w.attr_display(INACTIVITY_TIME, self.inactivity_time, o)?;
        w.attr_display(SENTRY_BORDER, self.sentry_border_size, o)?;
        w.attr_display(HIDE_NAMES, self.hide_enemy_names, o)?;
        w.end()
    }

    fn from_xml(node: &XmlNode) -> Result<Self> {
        let defaults = BattleRules::default();
        Ok(Self {
            battlefield_width: node.parse_or(WIDTH, defaults.battlefield_width)?,
            battlefield_height: node.parse_or(HEIGHT, defaults.battlefield_height)?,
            num_rounds: node.parse_required(NUM_ROUNDS)?,
            gun_cooling_rate: node.parse_or(GUN_COOLING_RATE, defaults.gun_cooling_rate)?,
            inactivity_time: node.parse_or(INACTIVITY_TIME, defaults.inactivity_time)?,
            sentry_border_size: node.parse_or(SENTRY_BORDER, defaults.sentry_border_size)?,
            hide_enemy_names: node.parse_or(HIDE_NAMES, defaults.hide_enemy_names)?,
        })
    }
}

impl XmlSerializable for BattleResults {
    fn write_xml<W: Write>(&self, w: &mut XmlTreeWriter<W>, o: &OutputOptions) -> Result<()> {
        w.start(RESULT)?;
        w.attr(LEADER, &self.team_leader_name, o)?;
        w.attr_display(RANK, self.rank, o)?;
        w.attr_f64(TOTAL, self.score, o)?;
        w.attr_f64(SURVIVAL, self.survival, o)?;
        w.attr_f64(LAST_SURVIVOR, self.last_survivor_bonus, o)?;
        w.attr_f64(BULLET_DAMAGE, self.bullet_damage, o)?;
        w.attr_f64(BULLET_BONUS, self.bullet_damage_bonus, o)?;
        w.attr_f64(RAM_DAMAGE, self.ram_damage, o)?;
        w.attr_f64(RAM_BONUS, self.ram_damage_bonus, o)?;
        w.attr_display(FIRSTS, self.firsts, o)?;
        w.attr_display(SECONDS, self.seconds, o)?;
        w.attr_display(THIRDS, self.thirds, o)?;
        w.end()
    }

    fn from_xml(node: &XmlNode) -> Result<Self> {
        Ok(Self {
            team_leader_name: node.get(LEADER).unwrap_or_default().to_string(),
            rank: node.parse_or(RANK, 0)?,
            score: node.parse_or(TOTAL, 0.0)?,
            survival: node.parse_or(SURVIVAL, 0.0)?,
            last_survivor_bonus: node.parse_or(LAST_SURVIVOR, 0.0)?,
            bullet_damage: node.parse_or(BULLET_DAMAGE, 0.0)?,
            bullet_damage_bonus: node.parse_or(BULLET_BONUS, 0.0)?,
            ram_damage: node.parse_or(RAM_DAMAGE, 0.0)?,
            ram_damage_bonus: node.parse_or(RAM_BONUS, 0.0)?,
            firsts: node.parse_or(FIRSTS, 0)?,
            seconds: node.parse_or(SECONDS, 0)?,
            thirds: node.parse_or(THIRDS, 0)?,
        })
    }
}

impl XmlSerializable for BattleRecordHeader {
    fn write_xml<W: Write>(&self, w: &mut XmlTreeWriter<W>, o: &OutputOptions) -> Result<()> {
        w.start(RECORD_INFO)?;
        w.attr_display(BATTLE_ID, &self.battle_id, o)?;
        w.attr_display(ROBOT_COUNT, self.robot_count, o)?;
        w.attr_display(ROUNDS_COUNT, self.rounds_count, o)?;
        w.attr(VERSION, &self.version, o)?;

        self.rules.write_xml(w, o)?;
        if let Some(counts) = self.turn_counts() {
            w.start(ROUNDS)?;
            for count in counts {
                w.start(ROUND)?;
                w.attr_display(TURNS, count, o)?;
                w.end()?;
            }
            w.end()?;
        }
        w.start(RESULTS)?;
        for result in &self.results {
            result.write_xml(w, o)?;
        }
        w.end()?;
        w.end()
    }

    fn from_xml(node: &XmlNode) -> Result<Self> {
        let rules_node = node.child(RULES).ok_or_else(|| {
            Error::invalid_format(format!("'{}' has no '{}' element", RECORD_INFO, RULES))
        })?;
        let rules = BattleRules::from_xml(rules_node)?;
        let battle_id = match node.get(BATTLE_ID) {
            Some(raw) => BattleId::parse(raw)
                .map_err(|e| Error::invalid_format(format!("bad battle id: {}", e)))?,
            None => BattleId::new(),
        };

        let mut header = BattleRecordHeader::new(
            battle_id,
            rules,
            node.parse_or(ROBOT_COUNT, 0)?,
            node.get(VERSION).unwrap_or_default(),
        );
        header.turns_in_rounds = node
            .child(ROUNDS)
            .map(|rounds| {
                rounds
                    .children_named(ROUND)
                    .map(|round| round.parse_or(TURNS, 0u32))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;
        let recorded = header
            .turn_counts()
            .and_then(|counts| counts.iter().rposition(|&c| c > 0))
            .map(|last| last as u32 + 1)
            .unwrap_or(0);
        header.rounds_count = node.parse_or(ROUNDS_COUNT, recorded)?;
        if let Some(results) = node.child(RESULTS) {
            header.results = results
                .children_named(RESULT)
                .map(BattleResults::from_xml)
                .collect::<Result<_>>()?;
        }
        Ok(header)
    }
}

impl XmlSerializable for ScoreSnapshot {
    fn write_xml<W: Write>(&self, w: &mut XmlTreeWriter<W>, o: &OutputOptions) -> Result<()> {
        w.start(SCORE)?;
        w.attr_f64(CURRENT, self.current_score, o)?;
        w.attr_f64(SURVIVAL_SCORE, self.survival_score, o)?;
        w.attr_f64(BULLET_DAMAGE_SCORE, self.bullet_damage_score, o)?;
        w.attr_f64(BULLET_KILL_BONUS, self.bullet_kill_bonus, o)?;
        w.attr_f64(RAMMING_DAMAGE, self.ramming_damage_score, o)?;
        w.attr_f64(RAMMING_KILL_BONUS, self.ramming_kill_bonus, o)?;
        w.end()
    }

    fn from_xml(node: &XmlNode) -> Result<Self> {
        Ok(Self {
            current_score: node.parse_or(CURRENT, 0.0)?,
            survival_score: node.parse_or(SURVIVAL_SCORE, 0.0)?,
            bullet_damage_score: node.parse_or(BULLET_DAMAGE_SCORE, 0.0)?,
            bullet_kill_bonus: node.parse_or(BULLET_KILL_BONUS, 0.0)?,
            ramming_damage_score: node.parse_or(RAMMING_DAMAGE, 0.0)?,
            ramming_kill_bonus: node.parse_or(RAMMING_KILL_BONUS, 0.0)?,
        })
    }
}

impl XmlSerializable for DebugProperty {
    fn write_xml<W: Write>(&self, w: &mut XmlTreeWriter<W>, o: &OutputOptions) -> Result<()> {
        w.start(DEBUG)?;
        w.attr(KEY, &self.key, o)?;
        w.attr(VALUE, &self.value, o)?;
        w.end()
    }

    fn from_xml(node: &XmlNode) -> Result<Self> {
        Ok(Self {
            key: node.get(KEY).unwrap_or_default().to_string(),
            value: node.get(VALUE).unwrap_or_default().to_string(),
        })
    }
}

impl XmlSerializable for RobotSnapshot {
    fn write_xml<W: Write>(&self, w: &mut XmlTreeWriter<W>, o: &OutputOptions) -> Result<()> {
        w.start(ROBOT)?;
        w.attr(NAME, &self.name, o)?;
        w.attr(SHORT_NAME, &self.short_name, o)?;
        w.attr_display(ROBOT_INDEX, self.robot_index, o)?;
        if let Some(team) = self.team_index {
            w.attr_display(TEAM_INDEX, team, o)?;
        }
        w.attr(STATE, self.state.as_str(), o)?;
        w.attr_f64(ENERGY, self.energy, o)?;
        w.attr_f64(X, self.x, o)?;
        w.attr_f64(Y, self.y, o)?;
        w.attr_f64(BODY_HEADING, self.body_heading, o)?;
        w.attr_f64(GUN_HEADING, self.gun_heading, o)?;
        w.attr_f64(RADAR_HEADING, self.radar_heading, o)?;
        w.attr_f64(VELOCITY, self.velocity, o)?;
        w.attr_f64(GUN_HEAT, self.gun_heat, o)?;
        if !o.skip_debug && !self.output_text.is_empty() {
            w.attr(OUTPUT, &self.output_text, o)?;
        }

        self.score.write_xml(w, o)?;
        if !o.skip_debug {
            for property in &self.debug_properties {
                property.write_xml(w, o)?;
            }
        }
        w.end()
    }

    fn from_xml(node: &XmlNode) -> Result<Self> {
        let name = node.get(NAME).unwrap_or_default();
        let mut robot = RobotSnapshot::new(name, node.parse_required(ROBOT_INDEX)?);
        if let Some(short) = node.get(SHORT_NAME) {
            robot.short_name = short.to_string();
        }
        robot.team_index = node.parse_opt(TEAM_INDEX)?;
        robot.state = match node.get(STATE) {
            Some(raw) => RobotState::parse(raw).ok_or_else(|| {
                Error::invalid_format(format!("unknown robot state '{}'", raw))
            })?,
            None => RobotState::default(),
        };
        robot.energy = node.parse_or(ENERGY, 0.0)?;
        robot.x = node.parse_or(X, 0.0)?;
        robot.y = node.parse_or(Y, 0.0)?;
        robot.body_heading = node.parse_or(BODY_HEADING, 0.0)?;
        robot.gun_heading = node.parse_or(GUN_HEADING, 0.0)?;
        robot.radar_heading = node.parse_or(RADAR_HEADING, 0.0)?;
        robot.velocity = node.parse_or(VELOCITY, 0.0)?;
        robot.gun_heat = node.parse_or(GUN_HEAT, 0.0)?;
        robot.output_text = node.get(OUTPUT).unwrap_or_default().to_string();
        if let Some(score) = node.child(SCORE) {
            robot.score = ScoreSnapshot::from_xml(score)?;
        }
        robot.debug_properties = node
            .children_named(DEBUG)
            .map(DebugProperty::from_xml)
            .collect::<Result<_>>()?;
        Ok(robot)
    }
}

impl XmlSerializable for BulletSnapshot {
    fn write_xml<W: Write>(&self, w: &mut XmlTreeWriter<W>, o: &OutputOptions) -> Result<()> {
        w.start(BULLET)?;
        w.attr_display(BULLET_ID, self.bullet_id, o)?;
        w.attr_display(OWNER, self.owner_index, o)?;
        w.attr(STATE, self.state.as_str(), o)?;
        w.attr_f64(POWER, self.power, o)?;
        w.attr_f64(HEADING, self.heading, o)?;
        w.attr_f64(X, self.x, o)?;
        w.attr_f64(Y, self.y, o)?;
        if let Some(victim) = self.victim_index {
            w.attr_display(VICTIM, victim, o)?;
        }
        w.end()
    }

    fn from_xml(node: &XmlNode) -> Result<Self> {
        let state = match node.get(STATE) {
            Some(raw) => BulletState::parse(raw).ok_or_else(|| {
                Error::invalid_format(format!("unknown bullet state '{}'", raw))
            })?,
            None => BulletState::default(),
        };
        Ok(Self {
            bullet_id: node.parse_or(BULLET_ID, 0)?,
            owner_index: node.parse_or(OWNER, 0)?,
            state,
            power: node.parse_or(POWER, 0.0)?,
            heading: node.parse_or(HEADING, 0.0)?,
            x: node.parse_or(X, 0.0)?,
            y: node.parse_or(Y, 0.0)?,
            victim_index: node.parse_opt(VICTIM)?,
        })
    }
}

impl XmlSerializable for TurnSnapshot {
    fn write_xml<W: Write>(&self, w: &mut XmlTreeWriter<W>, o: &OutputOptions) -> Result<()> {
        w.start(TURN)?;
        w.attr_display(ROUND_INDEX, self.round, o)?;
        w.attr_display(TURN_INDEX, self.turn, o)?;
        w.start(ROBOTS)?;
        for robot in &self.robots {
            robot.write_xml(w, o)?;
        }
        w.end()?;
        w.start(BULLETS)?;
        for bullet in &self.bullets {
            bullet.write_xml(w, o)?;
        }
        w.end()?;
        w.end()
    }

    fn from_xml(node: &XmlNode) -> Result<Self> {
        let mut turn = TurnSnapshot::new(
            node.parse_required(ROUND_INDEX)?,
            node.parse_required(TURN_INDEX)?,
        );
        if let Some(robots) = node.child(ROBOTS) {
            turn.robots = robots
                .children_named(ROBOT)
                .map(RobotSnapshot::from_xml)
                .collect::<Result<_>>()?;
        }
        if let Some(bullets) = node.child(BULLETS) {
            turn.bullets = bullets
                .children_named(BULLET)
                .map(BulletSnapshot::from_xml)
                .collect::<Result<_>>()?;
        }
        Ok(turn)
    }
}
