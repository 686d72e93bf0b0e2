//! Engine-level tests: configuration from disk and recording from another thread

use battlerec_core::{BattleId, BattleRules, RecordFormat, StaticVersion, TurnSnapshot};
use battlerec_engine::{
    BattleEvent, BattleEventDispatcher, BattleRecorder, ExportOutcome, ImportOutcome,
    RecordConfig, RecordManager, CONFIG_FILE_NAME,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn manager(config: RecordConfig) -> RecordManager {
    RecordManager::new(config, Arc::new(StaticVersion::new("1.9.5"))).unwrap()
}

fn publish_battle(dispatcher: &BattleEventDispatcher, counts: &[u32]) {
    dispatcher
        .dispatch(&BattleEvent::BattleStarted {
            rules: BattleRules::with_rounds(counts.len() as u32),
            robot_count: 1,
            battle_id: BattleId::new(),
        })
        .unwrap();
    for (round, &count) in counts.iter().enumerate() {
        for time in 0..count {
            dispatcher
                .dispatch(&BattleEvent::TurnEnded {
                    snapshot: TurnSnapshot::new(round as u32, time),
                    round: round as u32,
                    time,
                })
                .unwrap();
        }
    }
    dispatcher
        .dispatch(&BattleEvent::BattleCompleted { results: vec![] })
        .unwrap();
    dispatcher
        .dispatch(&BattleEvent::BattleFinished { aborted: false })
        .unwrap();
}

#[test]
fn test_spool_lives_in_configured_dir() {
    let dir = TempDir::new().unwrap();
    let spool_dir = dir.path().join("spool");
    let config_path = dir.path().join(CONFIG_FILE_NAME);

    let config = RecordConfig {
        spool_dir: Some(spool_dir.clone()),
        ..RecordConfig::for_testing()
    };
    config.write_to_file(&config_path).unwrap();

    let loaded = RecordConfig::from_file(&config_path).unwrap();
    assert_eq!(loaded, config);

    let manager = manager(loaded);
    assert!(manager.spool().unwrap().path().starts_with(&spool_dir));
}

#[test]
fn test_created_config_drives_export_format() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join(CONFIG_FILE_NAME);
    let config = RecordConfig::load_or_create(&config_path).unwrap();
    assert!(config_path.exists());
    assert_eq!(config.record_format().unwrap(), RecordFormat::BinaryZip);

    let manager = Arc::new(Mutex::new(manager(config)));
    let dispatcher = Arc::new(BattleEventDispatcher::new());
    let mut recorder = BattleRecorder::new(Arc::clone(&manager));
    recorder.attach(&dispatcher);
    publish_battle(&dispatcher, &[2, 1]);

    let dest = dir.path().join("battle.br");
    let outcome = manager.lock().export_configured(&dest).unwrap();
    let info = match outcome {
        ExportOutcome::Written(info) => info,
        other => panic!("expected a written record, got {:?}", other),
    };
    assert_eq!(info.format, RecordFormat::BinaryZip);
    assert_eq!(info.turns, 3);

    let loaded = manager.lock().import_record(&dest, RecordFormat::BinaryZip);
    assert!(loaded.is_loaded());
}

#[test]
fn test_battle_published_from_another_thread() {
    let dir = TempDir::new().unwrap();
    let manager = Arc::new(Mutex::new(manager(RecordConfig::for_testing())));
    let dispatcher = Arc::new(BattleEventDispatcher::new());
    let mut recorder = BattleRecorder::new(Arc::clone(&manager));
    recorder.attach(&dispatcher);

    let simulation = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || publish_battle(&dispatcher, &[3, 0, 2]))
    };
    simulation.join().unwrap();

    let mut manager = manager.lock();
    assert_eq!(
        manager.header().unwrap().turn_counts(),
        Some(&[3, 0, 2][..])
    );

    let dest = dir.path().join("battle.br");
    let outcome = manager
        .export(&dest, RecordFormat::Binary, Default::default())
        .unwrap();
    assert!(matches!(outcome, ExportOutcome::Written(_)));

    match manager.import_record(&dest, RecordFormat::Binary) {
        ImportOutcome::Loaded(info) => assert_eq!(info.turns, 5),
        other => panic!("expected a loaded record, got {:?}", other),
    }
}
