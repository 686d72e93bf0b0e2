//! On-spool representation of a turn
//!
//! A spool record is a [`TurnSnapshot`] with robot names replaced by
//! [`NameRef`]s. The `reset` flag marks the first turn of a round, telling
//! the reader to clear its arena before resolving names.

use crate::intern::{NameArena, NameRef};
use battlerec_core::{
    BulletSnapshot, DebugProperty, Result, RobotSnapshot, RobotState, ScoreSnapshot, TurnSnapshot,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// One robot inside a spool record
#[derive(Debug, Serialize, Deserialize)]
pub struct SpoolRobot<'a> {
    name: NameRef<'a>,
    short_name: NameRef<'a>,
    robot_index: u32,
    team_index: Option<u32>,
    state: RobotState,
    energy: f64,
    x: f64,
    y: f64,
    body_heading: f64,
    gun_heading: f64,
    radar_heading: f64,
    velocity: f64,
    gun_heat: f64,
    score: ScoreSnapshot,
    output_text: Cow<'a, str>,
    debug_properties: Cow<'a, [DebugProperty]>,
}

/// One turn as framed into the spool
#[derive(Debug, Serialize, Deserialize)]
pub struct SpoolRecord<'a> {
    /// Round boundary: reader clears its name arena first
    pub reset: bool,
    /// Round index
    pub round: u32,
    /// Turn index within the round
    pub turn: u32,
    robots: Vec<SpoolRobot<'a>>,
    bullets: Cow<'a, [BulletSnapshot]>,
}

impl<'a> SpoolRecord<'a> {
    /// Borrow `snapshot` into a record, interning names through `arena`
    ///
    /// The caller resets `arena` before encoding a round's first turn.
    pub fn encode(snapshot: &'a TurnSnapshot, reset: bool, arena: &mut NameArena) -> Self {
        let robots = snapshot
            .robots
            .iter()
            .map(|robot| SpoolRobot {
                name: arena.intern(&robot.name),
                short_name: arena.intern(&robot.short_name),
                robot_index: robot.robot_index,
                team_index: robot.team_index,
                state: robot.state,
                energy: robot.energy,
                x: robot.x,
                y: robot.y,
                body_heading: robot.body_heading,
                gun_heading: robot.gun_heading,
                radar_heading: robot.radar_heading,
                velocity: robot.velocity,
                gun_heat: robot.gun_heat,
                score: robot.score,
                output_text: Cow::Borrowed(robot.output_text.as_str()),
                debug_properties: Cow::Borrowed(robot.debug_properties.as_slice()),
            })
            .collect();

        Self {
            reset,
            round: snapshot.round,
            turn: snapshot.turn,
            robots,
            bullets: Cow::Borrowed(snapshot.bullets.as_slice()),
        }
    }

    /// Rebuild the snapshot, resolving names through `arena`
    pub fn decode(self, arena: &mut NameArena) -> Result<TurnSnapshot> {
        if self.reset {
            arena.reset();
        }
        let mut robots = Vec::with_capacity(self.robots.len());
        for robot in self.robots {
            robots.push(RobotSnapshot {
                name: arena.resolve(robot.name)?,
                short_name: arena.resolve(robot.short_name)?,
                robot_index: robot.robot_index,
                team_index: robot.team_index,
                state: robot.state,
                energy: robot.energy,
                x: robot.x,
                y: robot.y,
                body_heading: robot.body_heading,
                gun_heading: robot.gun_heading,
                radar_heading: robot.radar_heading,
                velocity: robot.velocity,
                gun_heat: robot.gun_heat,
                score: robot.score,
                output_text: robot.output_text.into_owned(),
                debug_properties: robot.debug_properties.into_owned(),
            });
        }

        Ok(TurnSnapshot {
            round: self.round,
            turn: self.turn,
            robots,
            bullets: self.bullets.into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battlerec_core::codec;

    fn snapshot(turn: u32) -> TurnSnapshot {
        let mut snapshot = TurnSnapshot::new(0, turn);
        let mut walls = RobotSnapshot::new("sample.Walls", 0);
        walls.output_text = "hello".to_string();
        walls.debug_properties.push(DebugProperty {
            key: "k".to_string(),
            value: "v".to_string(),
        });
        snapshot.robots.push(walls);
        snapshot.robots.push(RobotSnapshot::new("sample.Crazy", 1));
        snapshot.bullets.push(BulletSnapshot {
            bullet_id: 4,
            owner_index: 1,
            power: 2.5,
            ..Default::default()
        });
        snapshot
    }

    #[test]
    fn test_record_survives_framing() {
        let mut writer_arena = NameArena::new();
        let mut reader_arena = NameArena::new();

        let mut buf = Vec::new();
        for turn in 0..3 {
            let original = snapshot(turn);
            let record = SpoolRecord::encode(&original, turn == 0, &mut writer_arena);
            codec::write_value_frame(&mut buf, &record).unwrap();
        }

        let mut cursor = std::io::Cursor::new(buf);
        for turn in 0..3 {
            let record: SpoolRecord<'static> =
                codec::read_value_frame(&mut cursor).unwrap().unwrap();
            assert_eq!(record.turn, turn);
            let decoded = record.decode(&mut reader_arena).unwrap();
            assert_eq!(decoded, snapshot(turn));
        }
    }

    #[test]
    fn test_later_turns_share_names() {
        let mut arena = NameArena::new();
        let first = snapshot(0);
        let second = snapshot(1);
        let _ = SpoolRecord::encode(&first, true, &mut arena);
        let record = SpoolRecord::encode(&second, false, &mut arena);
        assert!(record
            .robots
            .iter()
            .all(|r| matches!(r.name, NameRef::Shared(_))));
    }
}
