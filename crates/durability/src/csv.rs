//! Relational CSV export
//!
//! A record is exported as four tables:
//!
//! | table   | one row per                    |
//! |---------|--------------------------------|
//! | results | final result entry             |
//! | rounds  | round with at least one turn   |
//! | robots  | robot per turn                 |
//! | bullets | bullet per turn                |
//!
//! Every row starts with the product version and the battle id so tables
//! from several battles can be concatenated. There is no CSV importer.

use crate::fs::StagedFile;
use battlerec_core::{
    BattleRecordHeader, Error, OutputOptions, Result, TurnSnapshot, TurnSource,
};
use csv::{Writer, WriterBuilder};
use std::ffi::OsString;
use std::io::Write;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Header row of the results table
pub const RESULTS_HEADER: &[&str] = &[
    "version", "battleId", "roundsCount", "robotCount", "battlefieldWidth", "battlefieldHeight",
    "gunCoolingRate", "inactivityTime", "teamLeaderName", "rank", "score", "survival",
    "lastSurvivorBonus", "bulletDamage", "bulletDamageBonus", "ramDamage", "ramDamageBonus",
    "firsts", "seconds", "thirds",
];

/// Header row of the rounds table
pub const ROUNDS_HEADER: &[&str] = &[
    "version", "battleId", "roundIndex", "robotCount", "battlefieldWidth", "battlefieldHeight",
    "gunCoolingRate", "inactivityTime", "turnsInRound",
];

/// Header row of the robots table
pub const ROBOTS_HEADER: &[&str] = &[
    "version", "battleId", "roundIndex", "turnIndex", "robotIndex", "robotName", "energy", "x",
    "y", "bodyHeading", "gunHeading", "radarHeading", "gunHeat", "velocity", "score",
    "survivalScore", "bulletDamageScore", "bulletKillBonus", "rammingDamageScore",
    "rammingKillBonus",
];

/// Header row of the bullets table
pub const BULLETS_HEADER: &[&str] = &[
    "version", "battleId", "roundIndex", "turnIndex", "bulletId", "ownerIndex", "ownerName",
    "state", "heading", "x", "y", "victimIndex", "victimName",
];

/// Table suffixes, in the order results, rounds, robots, bullets
pub const TABLES: [&str; 4] = ["results", "rounds", "robots", "bullets"];

/// Hook run for every turn before its rows are written
pub type TurnHook<'a> = dyn FnMut(&TurnSnapshot) -> Result<()> + 'a;

/// Output streams of the four tables
pub struct CsvSinks<'a> {
    /// Results table
    pub results: &'a mut dyn Write,
    /// Rounds table
    pub rounds: &'a mut dyn Write,
    /// Robots table
    pub robots: &'a mut dyn Write,
    /// Bullets table
    pub bullets: &'a mut dyn Write,
}

/// Data rows written per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CsvStats {
    /// Rows in the results table
    pub results: u64,
    /// Rows in the rounds table
    pub rounds: u64,
    /// Rows in the robots table
    pub robots: u64,
    /// Rows in the bullets table
    pub bullets: u64,
}

fn csv_err(e: csv::Error) -> Error {
    Error::csv(e.to_string())
}

fn table<W: Write>(out: W, header: &[&str]) -> Result<Writer<W>> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(header).map_err(csv_err)?;
    Ok(writer)
}

/// Write the four tables for `header` and the turns of `source`
pub fn generate_csv(
    sinks: CsvSinks<'_>,
    header: &BattleRecordHeader,
    source: &dyn TurnSource,
    options: OutputOptions,
    version: &str,
    mut hook: Option<&mut TurnHook<'_>>,
) -> Result<CsvStats> {
    let counts = header
        .turn_counts()
        .ok_or_else(|| Error::invalid_operation("record has no per-round turn counts"))?;
    let battle_id = header.battle_id.to_string();
    let rules = &header.rules;
    let float = |v: f64| options.format_f64(v);
    let mut stats = CsvStats::default();

    let mut results = table(sinks.results, RESULTS_HEADER)?;
    for result in &header.results {
        results
            .write_record([
                version.to_string(),
                battle_id.clone(),
                counts.len().to_string(),
                header.robot_count.to_string(),
                rules.battlefield_width.to_string(),
                rules.battlefield_height.to_string(),
                float(rules.gun_cooling_rate),
                rules.inactivity_time.to_string(),
                result.team_leader_name.clone(),
                result.rank.to_string(),
                float(result.score),
                float(result.survival),
                float(result.last_survivor_bonus),
                float(result.bullet_damage),
                float(result.bullet_damage_bonus),
                float(result.ram_damage),
                float(result.ram_damage_bonus),
                result.firsts.to_string(),
                result.seconds.to_string(),
                result.thirds.to_string(),
            ])
            .map_err(csv_err)?;
        stats.results += 1;
    }
    results.flush()?;

    let mut rounds = table(sinks.rounds, ROUNDS_HEADER)?;
    for (round, &turns) in counts.iter().enumerate().filter(|&(_, &turns)| turns > 0) {
        rounds
            .write_record([
                version.to_string(),
                battle_id.clone(),
                round.to_string(),
                header.robot_count.to_string(),
                rules.battlefield_width.to_string(),
                rules.battlefield_height.to_string(),
                float(rules.gun_cooling_rate),
                rules.inactivity_time.to_string(),
                turns.to_string(),
            ])
            .map_err(csv_err)?;
        stats.rounds += 1;
    }
    rounds.flush()?;

    let mut robots = table(sinks.robots, ROBOTS_HEADER)?;
    let mut bullets = table(sinks.bullets, BULLETS_HEADER)?;
    source.replay_turns(&mut |turn| {
        if let Some(hook) = hook.as_mut() {
            hook(&turn)?;
        }
        let round = turn.round.to_string();
        let time = turn.turn.to_string();

        for robot in &turn.robots {
            robots
                .write_record([
                    version.to_string(),
                    battle_id.clone(),
                    round.clone(),
                    time.clone(),
                    robot.robot_index.to_string(),
                    robot.name.clone(),
                    float(robot.energy),
                    float(robot.x),
                    float(robot.y),
                    float(robot.body_heading),
                    float(robot.gun_heading),
                    float(robot.radar_heading),
                    float(robot.gun_heat),
                    float(robot.velocity),
                    float(robot.score.current_score),
                    float(robot.score.survival_score),
                    float(robot.score.bullet_damage_score),
                    float(robot.score.bullet_kill_bonus),
                    float(robot.score.ramming_damage_score),
                    float(robot.score.ramming_kill_bonus),
                ])
                .map_err(csv_err)?;
            stats.robots += 1;
        }

        for bullet in &turn.bullets {
            let owner = robot_name(&turn, Some(bullet.owner_index));
            let victim = robot_name(&turn, bullet.victim_index);
            let victim_index = bullet
                .victim_index
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-1".to_string());
            bullets
                .write_record([
                    version.to_string(),
                    battle_id.clone(),
                    round.clone(),
                    time.clone(),
                    bullet.bullet_id.to_string(),
                    bullet.owner_index.to_string(),
                    owner,
                    bullet.state.as_str().to_string(),
                    float(bullet.heading),
                    float(bullet.x),
                    float(bullet.y),
                    victim_index,
                    victim,
                ])
                .map_err(csv_err)?;
            stats.bullets += 1;
        }
        Ok(ControlFlow::Continue(()))
    })?;
    robots.flush()?;
    bullets.flush()?;

    debug!(
        target: "battlerec::format",
        results = stats.results,
        rounds = stats.rounds,
        robots = stats.robots,
        bullets = stats.bullets,
        "CSV tables written"
    );
    Ok(stats)
}

fn robot_name(turn: &TurnSnapshot, index: Option<u32>) -> String {
    index
        .and_then(|i| turn.robot(i))
        .map(|r| r.name.clone())
        .unwrap_or_default()
}

/// Path of one table: `<base>.<table>.csv`
pub fn table_path(base: &Path, table: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!(".{}.csv", table));
    PathBuf::from(name)
}

/// Write the four table files next to `base`
///
/// All four files are staged and only moved into place once every table
/// has been written. Returns the row counts and the combined file size.
pub fn export_csv_files(
    base: &Path,
    header: &BattleRecordHeader,
    source: &dyn TurnSource,
    options: OutputOptions,
    version: &str,
) -> Result<(CsvStats, u64)> {
    let [results_path, rounds_path, robots_path, bullets_path] =
        TABLES.map(|table| table_path(base, table));
    let mut results = StagedFile::create(&results_path)?;
    let mut rounds = StagedFile::create(&rounds_path)?;
    let mut robots = StagedFile::create(&robots_path)?;
    let mut bullets = StagedFile::create(&bullets_path)?;

    let stats = generate_csv(
        CsvSinks {
            results: results.writer()?,
            rounds: rounds.writer()?,
            robots: robots.writer()?,
            bullets: bullets.writer()?,
        },
        header,
        source,
        options,
        version,
        None,
    )?;

    let mut size = 0;
    for staged in [results, rounds, robots, bullets] {
        size += staged.commit()?;
    }
    Ok((stats, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use battlerec_core::{
        BattleId, BattleResults, BattleRules, BulletSnapshot, ReplaySummary, RobotSnapshot,
        TurnConsumer,
    };

    struct Turns(Vec<TurnSnapshot>);

    impl TurnSource for Turns {
        fn replay_turns(&self, consumer: &mut TurnConsumer<'_>) -> Result<ReplaySummary> {
            for turn in &self.0 {
                if consumer(turn.clone())?.is_break() {
                    break;
                }
            }
            Ok(ReplaySummary {
                turns: self.0.len() as u64,
                ..Default::default()
            })
        }
    }

    fn battle() -> (BattleRecordHeader, Turns) {
        let mut header =
            BattleRecordHeader::new(BattleId::new(), BattleRules::with_rounds(3), 2, "1.9.5");
        let mut turns = Vec::new();
        for (round, count) in [(0u32, 2u32), (2, 1)] {
            for time in 0..count {
                let mut turn = TurnSnapshot::new(round, time);
                turn.robots.push(RobotSnapshot::new("sample.Walls", 0));
                turn.robots.push(RobotSnapshot::new("sample.Crazy", 1));
                turn.bullets.push(BulletSnapshot {
                    bullet_id: 1,
                    owner_index: 0,
                    victim_index: if time == 0 { Some(1) } else { None },
                    heading: 1.23456,
                    ..Default::default()
                });
                turns.push(turn);
                header.record_turn(round).unwrap();
            }
        }
        header.results.push(BattleResults {
            team_leader_name: "sample.Walls".to_string(),
            rank: 1,
            score: 120.126,
            ..Default::default()
        });
        header.results.push(BattleResults {
            team_leader_name: "sample.Crazy".to_string(),
            rank: 2,
            ..Default::default()
        });
        (header, Turns(turns))
    }

    fn render(options: OutputOptions) -> ([String; 4], CsvStats) {
        let (header, source) = battle();
        let mut outs: [Vec<u8>; 4] = Default::default();
        let [a, b, c, d] = &mut outs;
        let stats = generate_csv(
            CsvSinks {
                results: a,
                rounds: b,
                robots: c,
                bullets: d,
            },
            &header,
            &source,
            options,
            "1.9.5",
            None,
        )
        .unwrap();
        (outs.map(|o| String::from_utf8(o).unwrap()), stats)
    }

    #[test]
    fn test_row_counts() {
        let (tables, stats) = render(OutputOptions::new());
        assert_eq!(stats.results, 2);
        assert_eq!(stats.rounds, 2);
        assert_eq!(stats.robots, 3 * 2);
        assert_eq!(stats.bullets, 3);
        for (text, rows) in tables.iter().zip([2, 2, 6, 3]) {
            assert_eq!(text.lines().count(), rows + 1);
        }
    }

    #[test]
    fn test_header_rows() {
        let (tables, _) = render(OutputOptions::new());
        assert!(tables[0].starts_with("version,battleId,roundsCount,robotCount,"));
        assert!(tables[1].starts_with("version,battleId,roundIndex,robotCount,"));
        assert!(tables[2].lines().next().unwrap().ends_with("rammingKillBonus"));
        assert!(tables[3].lines().next().unwrap().ends_with("victimIndex,victimName"));
    }

    #[test]
    fn test_rounds_without_turns_are_skipped() {
        let (tables, _) = render(OutputOptions::new());
        let round_indices: Vec<_> = tables[1]
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(2).unwrap().to_string())
            .collect();
        assert_eq!(round_indices, vec!["0", "2"]);
    }

    #[test]
    fn test_bullet_victims() {
        let (tables, _) = render(OutputOptions::new());
        let rows: Vec<_> = tables[3].lines().skip(1).collect();
        assert!(rows[0].ends_with(",1,sample.Crazy"));
        assert!(rows[1].ends_with(",-1,"));
        assert!(rows[0].contains(",sample.Walls,"));
    }

    #[test]
    fn test_trimmed_floats() {
        let (tables, _) = render(OutputOptions::new().with_trim_precision(true));
        assert!(tables[3].contains(",1.23,"));
        assert!(tables[0].contains(",120.13,"));
        let (untrimmed, _) = render(OutputOptions::new());
        assert!(untrimmed[3].contains(",1.23456,"));
    }

    #[test]
    fn test_hook_sees_every_turn() {
        let (header, source) = battle();
        let mut seen = Vec::new();
        let mut hook = |turn: &TurnSnapshot| -> Result<()> {
            seen.push((turn.round, turn.turn));
            Ok(())
        };
        let mut sinks: [Vec<u8>; 4] = Default::default();
        let [a, b, c, d] = &mut sinks;
        generate_csv(
            CsvSinks {
                results: a,
                rounds: b,
                robots: c,
                bullets: d,
            },
            &header,
            &source,
            OutputOptions::new(),
            "1.9.5",
            Some(&mut hook),
        )
        .unwrap();
        assert_eq!(seen, vec![(0, 0), (0, 1), (2, 0)]);
    }

    #[test]
    fn test_export_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("battle");
        let (header, source) = battle();
        let (stats, size) =
            export_csv_files(&base, &header, &source, OutputOptions::new(), "1.9.5").unwrap();
        assert_eq!(stats.robots, 6);
        assert!(size > 0);
        for table in TABLES {
            assert!(table_path(&base, table).exists());
        }
        assert_eq!(
            table_path(&base, "robots").file_name().unwrap(),
            "battle.robots.csv"
        );
    }
}
