//! Failure handling of the record manager

use crate::common::*;
use std::ops::ControlFlow;

#[test]
fn test_out_of_order_turn_abandons_recording() {
    let battle = TestBattle::new();
    battle.dispatch(BattleEvent::BattleStarted {
        rules: BattleRules::with_rounds(1),
        robot_count: 1,
        battle_id: BattleId::new(),
    });

    let result = battle.dispatcher.dispatch(&BattleEvent::TurnEnded {
        snapshot: snapshot(0, 1, 1),
        round: 0,
        time: 1,
    });
    assert!(matches!(result, Err(Error::Unrecoverable(_))));

    let path = battle.path("battle.br");
    let outcome = battle
        .manager
        .lock()
        .export(&path, RecordFormat::Binary, OutputOptions::new())
        .unwrap();
    assert_eq!(outcome, ExportOutcome::Skipped);
    assert!(!path.exists());

    // a new battle records normally again
    battle.run(&[2], 1);
    let outcome = battle
        .manager
        .lock()
        .export(&path, RecordFormat::Binary, OutputOptions::new())
        .unwrap();
    assert!(matches!(outcome, ExportOutcome::Written(ref info) if info.turns == 2));
}

#[test]
fn test_export_without_battle_is_skipped() {
    let battle = TestBattle::new();
    for format in RecordFormat::ALL {
        let outcome = battle
            .manager
            .lock()
            .export(&battle.path("none"), format, OutputOptions::new())
            .unwrap();
        assert_eq!(outcome, ExportOutcome::Skipped);
    }
}

#[test]
fn test_import_garbage_leaves_empty_spool() {
    let battle = TestBattle::new();
    battle.run(&[2], 1);
    let path = battle.path("garbage.br");
    std::fs::write(&path, b"definitely not a record").unwrap();

    let mut manager = battle.manager.lock();
    let outcome = manager.import_record(&path, RecordFormat::Binary);
    assert!(matches!(outcome, ImportOutcome::Failed(_)));
    assert!(!manager.has_record());
    assert_eq!(manager.spool().unwrap().stats().turns_written, 0);
}

#[test]
fn test_import_legacy_xml_is_incompatible() {
    let battle = TestBattle::new();
    let path = battle.path("old.xml");
    std::fs::write(&path, "<battleRecord><recordInfo/></battleRecord>").unwrap();

    let outcome = battle
        .manager
        .lock()
        .import_record(&path, RecordFormat::Xml);
    assert!(matches!(outcome, ImportOutcome::Incompatible(_)));
}

#[test]
fn test_import_with_wrong_format_fails() {
    let battle = TestBattle::new();
    battle.run(&[1], 1);
    let path = battle.path("battle.xml");
    battle
        .manager
        .lock()
        .export(&path, RecordFormat::Xml, OutputOptions::new())
        .unwrap();

    let mut manager = new_manager(RecordConfig::for_testing());
    let outcome = manager.import_record(&path, RecordFormat::Binary);
    assert!(matches!(outcome, ImportOutcome::Failed(_)));
    assert!(!manager.has_record());
}

fn truncate_spool(manager: &RecordManager, by: u64) {
    let path = manager.spool().unwrap().path().to_path_buf();
    let len = std::fs::metadata(&path).unwrap().len();
    let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(len - by).unwrap();
}

#[test]
fn test_corrupt_spool_on_export_drops_record() {
    let battle = TestBattle::new();
    battle.run(&[3], 1);
    let path = battle.path("battle.br");

    let mut manager = battle.manager.lock();
    truncate_spool(&manager, 5);

    let result = manager.export(&path, RecordFormat::Binary, OutputOptions::new());
    assert!(matches!(result, Err(Error::Corruption(_))));
    assert!(!manager.has_record());
    assert_eq!(manager.spool().unwrap().stats().turns_written, 0);

    let outcome = manager
        .export(&path, RecordFormat::Binary, OutputOptions::new())
        .unwrap();
    assert_eq!(outcome, ExportOutcome::Skipped);
}

#[test]
fn test_corrupt_spool_on_replay_drops_record() {
    let battle = TestBattle::new();
    battle.run(&[3], 1);

    let mut manager = battle.manager.lock();
    truncate_spool(&manager, 5);

    let result = manager.replay_turns(&mut |_| Ok(ControlFlow::Continue(())));
    assert!(matches!(result, Err(Error::Corruption(_))));
    assert!(!manager.has_record());

    let result = manager.replay_turns(&mut |_| Ok(ControlFlow::Continue(())));
    assert!(matches!(result, Err(Error::InvalidOperation(_))));
}
