//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

pub use battlerec::{
    BattleEvent, BattleEventDispatcher, BattleId, BattleRecorder, BattleResults, BattleRules,
    BulletSnapshot, BulletState, Error, ExportOutcome, ImportOutcome, OutputOptions, RecordConfig,
    RecordFormat, RecordManager, RobotSnapshot, StaticVersion, TurnSnapshot,
};
use parking_lot::Mutex;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::{Arc, Once};
use tempfile::TempDir;

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness (`RUST_LOG` filters it)
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Product version stamped into test records
pub const VERSION: &str = "1.9.5";

/// A manager, a dispatcher with a recorder attached, and a scratch directory
pub struct TestBattle {
    pub manager: Arc<Mutex<RecordManager>>,
    pub dispatcher: Arc<BattleEventDispatcher>,
    pub recorder: BattleRecorder,
    pub dir: TempDir,
}

impl TestBattle {
    pub fn new() -> Self {
        Self::with_config(RecordConfig::for_testing())
    }

    pub fn with_config(config: RecordConfig) -> Self {
        init_tracing();
        let manager = Arc::new(Mutex::new(new_manager(config)));
        let dispatcher = Arc::new(BattleEventDispatcher::new());
        let mut recorder = BattleRecorder::new(Arc::clone(&manager));
        recorder.attach(&dispatcher);
        Self {
            manager,
            dispatcher,
            recorder,
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Path inside the scratch directory
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Publish a complete battle with `counts[r]` turns in round r
    pub fn run(&self, counts: &[u32], robots: u32) {
        self.dispatch(BattleEvent::BattleStarted {
            rules: BattleRules::with_rounds(counts.len() as u32),
            robot_count: robots,
            battle_id: BattleId::new(),
        });
        for (round, &count) in counts.iter().enumerate() {
            for time in 0..count {
                self.dispatch(BattleEvent::TurnEnded {
                    snapshot: snapshot(round as u32, time, robots),
                    round: round as u32,
                    time,
                });
            }
        }
        self.dispatch(BattleEvent::BattleCompleted {
            results: results(robots),
        });
        self.dispatch(BattleEvent::BattleFinished { aborted: false });
    }

    pub fn dispatch(&self, event: BattleEvent) {
        self.dispatcher
            .dispatch(&event)
            .expect("dispatch failed");
    }
}

pub fn new_manager(config: RecordConfig) -> RecordManager {
    RecordManager::new(config, Arc::new(StaticVersion::new(VERSION)))
        .expect("Failed to create record manager")
}

/// Deterministic snapshot: every robot moves and one bullet per robot is in flight
pub fn snapshot(round: u32, time: u32, robots: u32) -> TurnSnapshot {
    let mut turn = TurnSnapshot::new(round, time);
    for index in 0..robots {
        let mut robot = RobotSnapshot::new(format!("sample.Bot{} 1.0", index), index);
        robot.energy = 100.0 - time as f64 * 0.5;
        robot.x = 100.0 + index as f64 * 50.0 + time as f64;
        robot.y = 200.0 + round as f64;
        robot.velocity = 8.0;
        robot.score.current_score = time as f64 * 1.25;
        turn.bullets.push(BulletSnapshot {
            bullet_id: time * robots + index,
            owner_index: index,
            state: BulletState::Moving,
            power: 1.5,
            heading: 0.75,
            x: robot.x,
            y: 10.0,
            victim_index: None,
        });
        turn.robots.push(robot);
    }
    turn
}

pub fn results(robots: u32) -> Vec<BattleResults> {
    (0..robots)
        .map(|index| BattleResults {
            team_leader_name: format!("sample.Bot{} 1.0", index),
            rank: index + 1,
            score: 100.0 / (index + 1) as f64,
            firsts: u32::from(index == 0),
            ..Default::default()
        })
        .collect()
}

/// (round, turn) of every replayed snapshot
pub fn positions(manager: &mut RecordManager) -> Vec<(u32, u32)> {
    let mut seen = Vec::new();
    manager
        .replay_turns(&mut |turn| {
            seen.push((turn.round, turn.turn));
            Ok(ControlFlow::Continue(()))
        })
        .expect("replay failed");
    seen
}

/// Every replayed snapshot
pub fn replayed(manager: &mut RecordManager) -> Vec<TurnSnapshot> {
    let mut turns = Vec::new();
    manager
        .replay_turns(&mut |turn| {
            turns.push(turn);
            Ok(ControlFlow::Continue(()))
        })
        .expect("replay failed");
    turns
}
