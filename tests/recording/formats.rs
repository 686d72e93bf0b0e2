//! Export and import through every format

use crate::common::*;
use battlerec::CsvSinks;

fn export(battle: &TestBattle, name: &str, format: RecordFormat, options: OutputOptions) -> std::path::PathBuf {
    let path = battle.path(name);
    let outcome = battle
        .manager
        .lock()
        .export(&path, format, options)
        .unwrap();
    assert!(matches!(outcome, ExportOutcome::Written(_)), "{:?}", outcome);
    path
}

fn import(path: &std::path::Path, format: RecordFormat) -> RecordManager {
    let mut manager = new_manager(RecordConfig::for_testing());
    let outcome = manager.import_record(path, format);
    assert!(outcome.is_loaded(), "{:?}", outcome);
    manager
}

#[test]
fn test_binary_round_trip_is_identical() {
    let battle = TestBattle::new();
    battle.run(&[3, 1, 2], 2);
    let path = export(&battle, "battle.br", RecordFormat::Binary, OutputOptions::new());

    let mut loaded = import(&path, RecordFormat::Binary);
    let original = replayed(&mut battle.manager.lock());
    assert_eq!(replayed(&mut loaded), original);

    let source = battle.manager.lock().header().cloned().unwrap();
    let header = loaded.header().unwrap();
    assert_eq!(header.battle_id, source.battle_id);
    assert_eq!(header.turn_counts(), source.turn_counts());
    assert_eq!(header.results, source.results);
}

#[test]
fn test_xml_round_trip_keeps_header() {
    for (name, format, options) in [
        ("long.xml", RecordFormat::Xml, OutputOptions::new()),
        (
            "short.xml.tar.zst",
            RecordFormat::XmlZip,
            OutputOptions::new().with_short_attributes(true),
        ),
        (
            "trimmed.xml",
            RecordFormat::Xml,
            OutputOptions::new().with_trim_precision(true),
        ),
    ] {
        let battle = TestBattle::new();
        battle.run(&[2, 0, 3], 2);
        let path = export(&battle, name, format, options);

        let mut loaded = import(&path, format);
        let source = battle.manager.lock().header().cloned().unwrap();
        let header = loaded.header().unwrap().clone();
        assert_eq!(header.turn_counts(), source.turn_counts(), "{}", name);
        assert_eq!(header.battle_id, source.battle_id, "{}", name);
        assert_eq!(header.rules, source.rules, "{}", name);
        assert_eq!(header.robot_count, source.robot_count, "{}", name);
        assert_eq!(header.version, source.version, "{}", name);
        assert_eq!(
            positions(&mut loaded),
            vec![(0, 0), (0, 1), (2, 0), (2, 1), (2, 2)],
            "{}",
            name
        );
    }
}

#[test]
fn test_xml_round_trip_untrimmed_is_identical() {
    let battle = TestBattle::new();
    battle.run(&[2, 2], 3);
    let path = export(&battle, "battle.xml", RecordFormat::Xml, OutputOptions::new());

    let mut loaded = import(&path, RecordFormat::Xml);
    let original = replayed(&mut battle.manager.lock());
    assert_eq!(replayed(&mut loaded), original);
}

#[test]
fn test_trimmed_binary_rounds_floats() {
    let battle = TestBattle::new();
    {
        let mut manager = battle.manager.lock();
        manager.begin(BattleRules::with_rounds(1), 1, BattleId::new());
        let mut turn = snapshot(0, 0, 1);
        turn.robots[0].energy = 87.6543;
        manager.record_turn(&turn, 0, 0).unwrap();
        manager.finalize(Vec::new());
    }
    let path = export(
        &battle,
        "battle.br",
        RecordFormat::Binary,
        OutputOptions::new().with_trim_precision(true),
    );

    let mut loaded = import(&path, RecordFormat::Binary);
    assert_eq!(replayed(&mut loaded)[0].robots[0].energy, 87.65);
}

#[test]
fn test_csv_row_counts() {
    let robots = 3;
    let counts = [4, 0, 2];
    let battle = TestBattle::new();
    battle.run(&counts, robots);
    export(&battle, "battle.csv", RecordFormat::Csv, OutputOptions::new());

    let rows = |table: &str| {
        let text = std::fs::read_to_string(battle.path(&format!("battle.{}.csv", table))).unwrap();
        text.lines().count() - 1
    };
    let turns: u32 = counts.iter().sum();
    assert_eq!(rows("results"), robots as usize);
    assert_eq!(rows("rounds"), 2);
    assert_eq!(rows("robots"), (turns * robots) as usize);
    // one bullet per robot per turn
    assert_eq!(rows("bullets"), (turns * robots) as usize);
}

#[test]
fn test_generate_csv_with_hook() {
    let battle = TestBattle::new();
    battle.run(&[2, 1], 1);

    let mut tables: [Vec<u8>; 4] = Default::default();
    let [results, rounds, robots, bullets] = &mut tables;
    let mut hooked = 0;
    let mut hook = |_: &TurnSnapshot| -> battlerec::Result<()> {
        hooked += 1;
        Ok(())
    };
    let stats = battle
        .manager
        .lock()
        .generate_csv(
            CsvSinks {
                results,
                rounds,
                robots,
                bullets,
            },
            OutputOptions::new(),
            Some(&mut hook),
        )
        .unwrap();
    assert_eq!(hooked, 3);
    assert_eq!(stats.robots, 3);
    assert_eq!(stats.rounds, 2);

    let robots = String::from_utf8(tables[2].clone()).unwrap();
    assert!(robots.lines().nth(1).unwrap().starts_with(VERSION));
}

#[test]
fn test_convert_xml_to_binary() {
    let battle = TestBattle::new();
    battle.run(&[2, 2], 2);
    let xml = export(&battle, "battle.xml", RecordFormat::Xml, OutputOptions::new());
    let binary = battle.path("converted.br");

    let mut converter = new_manager(RecordConfig::for_testing());
    let outcome = converter.convert_xml_to_binary(&xml, false, &binary);
    assert!(outcome.is_loaded());
    let converted = replayed(&mut converter);

    let mut loaded = import(&binary, RecordFormat::Binary);
    assert_eq!(replayed(&mut loaded), converted);
    assert_eq!(converted.len(), 4);
}

#[test]
fn test_export_with_default_name() {
    let battle = TestBattle::new();
    battle.run(&[1], 1);
    let outcome = battle
        .manager
        .lock()
        .export_with_default_name(battle.dir.path(), RecordFormat::XmlZip, OutputOptions::new())
        .unwrap();
    let info = match outcome {
        ExportOutcome::Written(info) => info,
        other => panic!("export was not written: {:?}", other),
    };
    let name = info.path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.ends_with("-battle.xml.tar.zst"), "{}", name);
    assert!(info.path.exists());
}

#[test]
fn test_export_configured_uses_config() {
    let config = RecordConfig {
        format: "xml".to_string(),
        short_attributes: true,
        ..RecordConfig::for_testing()
    };
    let battle = TestBattle::with_config(config);
    battle.run(&[1], 1);
    let path = battle.path("configured.xml");
    battle.manager.lock().export_configured(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("battleRecordS.xsd"));
}
