//! Battle lifecycle through the event dispatcher

use crate::common::*;

#[test]
fn test_binary_zip_scenario() {
    let battle = TestBattle::new();
    battle.run(&[3, 2], 1);
    let path = battle.path("battle.br.tar.zst");

    let outcome = battle
        .manager
        .lock()
        .export(&path, RecordFormat::BinaryZip, OutputOptions::new())
        .unwrap();
    assert!(matches!(outcome, ExportOutcome::Written(_)));

    let mut loaded = new_manager(RecordConfig::for_testing());
    assert!(loaded.import_record(&path, RecordFormat::BinaryZip).is_loaded());

    let seen = positions(&mut loaded);
    let rounds: Vec<u32> = seen.iter().map(|&(round, _)| round).collect();
    let turns: Vec<u32> = seen.iter().map(|&(_, turn)| turn).collect();
    assert_eq!(rounds, vec![0, 0, 0, 1, 1]);
    assert_eq!(turns, vec![0, 1, 2, 0, 1]);
}

#[test]
fn test_recorded_header() {
    let battle = TestBattle::new();
    battle.run(&[4, 0, 2], 3);

    let manager = battle.manager.lock();
    let header = manager.header().unwrap();
    assert_eq!(header.turn_counts(), Some(&[4, 0, 2][..]));
    assert_eq!(header.rounds_count, 3);
    assert_eq!(header.robot_count, 3);
    assert_eq!(header.version, VERSION);
    assert_eq!(header.results, results(3));
    assert!(header.is_frozen());
}

#[test]
fn test_replay_matches_published_turns() {
    let battle = TestBattle::new();
    battle.run(&[2, 3], 2);

    let turns = replayed(&mut battle.manager.lock());
    let expected: Vec<_> = [(0, 0), (0, 1), (1, 0), (1, 1), (1, 2)]
        .into_iter()
        .map(|(round, time)| snapshot(round, time, 2))
        .collect();
    assert_eq!(turns, expected);
}

#[test]
fn test_second_battle_replaces_first() {
    let battle = TestBattle::new();
    battle.run(&[5], 1);
    battle.run(&[1, 1], 1);

    let mut manager = battle.manager.lock();
    assert_eq!(manager.header().unwrap().turn_counts(), Some(&[1, 1][..]));
    assert_eq!(positions(&mut manager), vec![(0, 0), (1, 0)]);
}

#[test]
fn test_aborted_battle_keeps_partial_record() {
    let battle = TestBattle::new();
    battle.dispatch(BattleEvent::BattleStarted {
        rules: BattleRules::with_rounds(3),
        robot_count: 1,
        battle_id: BattleId::new(),
    });
    for time in 0..2 {
        battle.dispatch(BattleEvent::TurnEnded {
            snapshot: snapshot(0, time, 1),
            round: 0,
            time,
        });
    }
    battle.dispatch(BattleEvent::BattleFinished { aborted: true });

    let mut manager = battle.manager.lock();
    assert_eq!(manager.header().unwrap().turn_counts(), Some(&[2, 0, 0][..]));
    assert_eq!(positions(&mut manager), vec![(0, 0), (0, 1)]);
}

#[test]
fn test_detached_recorder_records_nothing() {
    let mut battle = TestBattle::new();
    battle.recorder.detach();
    battle.run(&[2], 1);
    assert!(!battle.manager.lock().has_record());
}

mod properties {
    use crate::common::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_turn_counts_survive_binary_round_trip(
            counts in prop::collection::vec(0u32..6, 1..5),
            robots in 1u32..4,
        ) {
            let battle = TestBattle::new();
            battle.run(&counts, robots);
            let path = battle.path("battle.br");
            let outcome = battle
                .manager
                .lock()
                .export(&path, RecordFormat::Binary, OutputOptions::new())
                .unwrap();
            prop_assert!(matches!(outcome, ExportOutcome::Written(_)));

            let mut loaded = new_manager(RecordConfig::for_testing());
            prop_assert!(loaded.import_record(&path, RecordFormat::Binary).is_loaded());
            prop_assert_eq!(loaded.header().unwrap().turn_counts(), Some(&counts[..]));

            let expected: Vec<(u32, u32)> = counts
                .iter()
                .enumerate()
                .flat_map(|(round, &count)| (0..count).map(move |time| (round as u32, time)))
                .collect();
            prop_assert_eq!(positions(&mut loaded), expected);
        }
    }
}
