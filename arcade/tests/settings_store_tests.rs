use std::fs;
use std::time::Duration;

use arcade::settings::{MAX_GRID_SIZE, MIN_TICK_PERIOD};
use arcade::{ArcadeSettings, SettingsStore};

#[test]
fn missing_file_loads_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SettingsStore::new(dir.path().join("nope.json"));
    assert_eq!(store.load(), ArcadeSettings::default());
}

#[test]
fn save_creates_parent_dirs_and_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SettingsStore::new(dir.path().join("nested").join("arcade.json"));
    let settings = ArcadeSettings {
        grid_size: 30,
        tick_period: Duration::from_millis(80),
        ..ArcadeSettings::default()
    };

    store.save(&settings).expect("save");
    assert_eq!(store.load(), settings);
}

#[test]
fn out_of_range_values_are_sanitized_on_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("arcade.json");
    fs::write(&path, r#"{"gridSize": 1000, "tickPeriod": 1}"#).expect("write");

    let loaded = SettingsStore::new(&path).load();
    assert_eq!(loaded.grid_size, MAX_GRID_SIZE);
    assert_eq!(loaded.tick_period, MIN_TICK_PERIOD);
}

#[test]
fn malformed_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("arcade.json");
    fs::write(&path, "{ not json").expect("write");
    assert_eq!(SettingsStore::new(&path).load(), ArcadeSettings::default());
}
