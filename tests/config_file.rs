//! Loading configurations from disk and running them end to end.

use std::io::Write;

use popdyn::compute::{TERRAIN, WATER};
use popdyn::schema::{ConfigError, SimulationConfig};

#[test]
fn load_and_run_config_file() {
    let json = r#"{
        "width": 6,
        "height": 5,
        "layers": [
            {"name": "terrain", "pattern": {"type": "Noise", "amplitude": 10.0, "seed": 4}},
            {"name": "water", "pattern": {"type": "Constant", "value": 0.0}}
        ],
        "rules": [
            {"type": "Flow", "flow_factor": 0.3},
            {"type": "RainBurst", "net_water": 30.0, "burst_step": 4, "seed": 1},
            {"type": "Evaporation", "rate": 0.25}
        ],
        "steps": 8,
        "savestep": 4
    }"#;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let config = SimulationConfig::load(file.path()).unwrap();
    let mut space = config.build_space().unwrap();
    let terrain_before = space.canvases().total(TERRAIN).unwrap();

    space.flow(config.steps, config.savestep).unwrap();

    let terrain_after = space.canvases().total(TERRAIN).unwrap();
    assert!((terrain_after - terrain_before).abs() < 1e-3);
    assert_eq!(space.history().steps(), &[0, 4, 8]);
    assert!(space.canvas(WATER).unwrap().min() >= 0.0);
}

#[test]
fn example_config_round_trips_through_json() {
    let config = SimulationConfig::default();
    let json = serde_json::to_string_pretty(&config).unwrap();
    let back = SimulationConfig::from_json(&json).unwrap();
    back.validate().unwrap();
    assert_eq!(back.rules.len(), config.rules.len());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SimulationConfig::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
