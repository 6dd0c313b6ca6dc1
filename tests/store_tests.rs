use std::fs;

use chrono::NaiveDate;
use tempfile::tempdir;

use kbo_schedule_sync::error::{PersistError, StoreError};
use kbo_schedule_sync::model::game::GameKey;
use kbo_schedule_sync::store::{JsonFileStore, Schedule, ScheduleStore};

fn sample_store() -> (tempfile::TempDir, JsonFileStore) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("schedule.json");
    fs::copy("tests/sample_schedule.json", &path).expect("copy fixture");
    (dir, JsonFileStore::new(path))
}

fn key(y: i32, m: u32, d: u32, home: &str, away: &str) -> GameKey {
    GameKey::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), home, away)
}

#[test]
fn loads_sample_schedule() {
    let (_dir, store) = sample_store();
    let schedule = store.load().expect("load failed");
    assert_eq!(schedule.len(), 4);

    let game = schedule.find_by_key(&key(2026, 4, 1, "삼성", "한화")).expect("game present");
    assert_eq!(game.id, "20260401_삼성_한화");
    assert_eq!((game.home_score(), game.away_score()), (Some(2), Some(2)));
    assert_eq!(game.note(), Some("시범경기"));

    // Minute-precision start is accepted
    let doosan = schedule.find_by_key(&key(2026, 4, 2, "두산", "KIA")).expect("game present");
    assert_eq!(doosan.start.value().format("%H:%M:%S").to_string(), "18:30:00");
    assert_eq!(doosan.start.as_str(), "2026-04-02T18:30");
    assert_eq!(doosan.extra.get("stadium").and_then(|v| v.as_str()), Some("잠실"));
}

#[test]
fn find_by_key_misses_are_not_errors() {
    let (_dir, store) = sample_store();
    let schedule = store.load().expect("load failed");
    assert!(schedule.find_by_key(&key(2026, 4, 1, "KT", "LG")).is_none());
    assert!(schedule.find_by_key(&key(2025, 4, 1, "LG", "KT")).is_none());
    assert!(schedule.find_by_key(&key(2026, 4, 1, "lg", " KT ")).is_some());
}

#[test]
fn persist_round_trips_and_keeps_unknown_fields() {
    let (dir, mut store) = sample_store();
    let mut schedule = store.load().expect("load failed");
    let changed = schedule.apply_scores(&key(2026, 4, 1, "LG", "KT"), Some(5), Some(3));
    assert_eq!(changed, Some(true));

    store.persist(&schedule).expect("persist failed");
    let reloaded = store.load().expect("reload failed");
    assert_eq!(reloaded, schedule);

    let raw = fs::read_to_string(store.path()).expect("read back");
    assert!(raw.starts_with("[\n    {\n        \"id\""), "raw was: {}", raw);
    assert!(raw.contains("\"title\": \"KT vs LG\""));
    assert!(raw.contains("\"start\": \"2026-04-02T18:30\","), "raw was: {}", raw);
    assert!(raw.ends_with("]\n"));

    // Temp file renamed away
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn missing_file_is_corrupt_store() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("nope.json"));
    assert!(matches!(store.load(), Err(StoreError::Read { .. })));
}

#[test]
fn wrong_shape_is_corrupt_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schedule.json");
    let store = JsonFileStore::new(&path);

    for body in ["{}", "[{\"id\": \"x\"}]", "[{\"id\":\"x\",\"start\":\"tomorrow\",\"home_team\":\"LG\",\"away_team\":\"KT\"}]", "not json"] {
        fs::write(&path, body).unwrap();
        let result = store.load();
        assert!(matches!(result, Err(StoreError::Parse { .. })), "body {:?} gave {:?}", body, result);
    }
}

#[test]
fn duplicate_keys_are_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schedule.json");
    fs::write(
        &path,
        r#"[
            {"id": "a", "start": "2026-04-01T14:00:00", "home_team": "LG", "away_team": "KT"},
            {"id": "b", "start": "2026-04-01T18:30:00", "home_team": "LG", "away_team": "KT"}
        ]"#,
    )
    .unwrap();

    match JsonFileStore::new(&path).load() {
        Err(StoreError::DuplicateKey { first_id, second_id, .. }) => {
            assert_eq!((first_id.as_str(), second_id.as_str()), ("a", "b"));
        }
        other => panic!("expected duplicate key error, got {:?}", other),
    }
}

#[test]
fn empty_schedule_is_valid() {
    let schedule = Schedule::from_records(Vec::new()).unwrap();
    assert!(schedule.is_empty());
}

#[test]
fn persist_into_missing_directory_fails_cleanly() {
    let dir = tempdir().unwrap();
    let (_src, store) = sample_store();
    let schedule = store.load().unwrap();

    let mut target = JsonFileStore::new(dir.path().join("missing").join("schedule.json"));
    let err = target.persist(&schedule).expect_err("expected write failure");
    assert!(matches!(err, PersistError::Write { .. }), "error was: {:?}", err);
}

#[test]
fn untouched_records_keep_start_and_missing_fields_verbatim() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schedule.json");
    fs::write(
        &path,
        r#"[
            {"id": "20260401_LG_KT", "start": "2026-04-01T18:30:00", "home_team": "LG", "away_team": "KT"},
            {"id": "20260402_LG_KT", "start": "2026-04-02T18:30:00.750", "home_team": "LG", "away_team": "KT", "note": null}
        ]"#,
    )
    .unwrap();
    let mut store = JsonFileStore::new(&path);
    let mut schedule = store.load().unwrap();
    let before = schedule.records()[1].clone();

    assert_eq!(schedule.apply_scores(&key(2026, 4, 1, "LG", "KT"), Some(5), Some(3)), Some(true));
    store.persist(&schedule).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"start\": \"2026-04-02T18:30:00.750\""), "raw was: {}", raw);
    assert!(raw.contains("\"note\": null"), "raw was: {}", raw);

    let reloaded = store.load().unwrap();
    let untouched = &reloaded.records()[1];
    assert_eq!(untouched, &before);
    assert_eq!(untouched.home_score, None);
    assert_eq!(untouched.note, Some(None));
    // Only the two scores written for the matched game appear in the file
    assert_eq!(raw.matches("_score").count(), 2);
}
