//! Subcommand handlers against files in a temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use curbreg_cli::check::{self, CheckArgs};
use curbreg_cli::inventory::{self, InventoryArgs};
use curbreg_cli::resolve::{self, ResolveArgs};

const GEOBASE: &str = r#"[
  {"id": "S1", "geometry": [{"x": 0.0, "y": 0.0}, {"x": 100.0, "y": 0.0}]}
]"#;

const SIGNS: &str = r#"[
  {"id": "a", "position": {"x": 10.0, "y": -3.0}, "nature": "interdiction",
   "vehicle_exception": "no", "boundary_role": "begin"},
  {"id": "b", "position": {"x": 70.0, "y": -3.0}, "nature": "interdiction",
   "vehicle_exception": "no", "boundary_role": "end"},
  {"id": "lost", "position": {"x": 900.0, "y": 900.0}, "nature": "permission"}
]"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn resolve_writes_zones_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let args = ResolveArgs {
        signs: write(dir.path(), "signs.json", SIGNS),
        geobase: write(dir.path(), "geobase.json", GEOBASE),
        config: None,
        out: dir.path().join("zones.json"),
        report: Some(dir.path().join("report.json")),
    };
    resolve::run(&args).unwrap();

    let zones: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&args.out).unwrap()).unwrap();
    assert_eq!(zones.as_array().unwrap().len(), 1);
    assert_eq!(zones[0]["source_sign_ids"], serde_json::json!(["a", "b"]));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap())
            .unwrap();
    let kinds: Vec<&str> = report["defects"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"UnmatchedSign"));
}

#[test]
fn resolve_reports_missing_input_path() {
    let dir = tempfile::tempdir().unwrap();
    let args = ResolveArgs {
        signs: dir.path().join("absent.json"),
        geobase: write(dir.path(), "geobase.json", GEOBASE),
        config: None,
        out: dir.path().join("zones.json"),
        report: None,
    };
    let err = resolve::run(&args).unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));
}

#[test]
fn check_with_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let args = CheckArgs {
        signs: write(dir.path(), "signs.json", SIGNS),
        geobase: write(dir.path(), "geobase.json", GEOBASE),
        config: Some(write(dir.path(), "config.yaml", "search_radius_m: 5.0\n")),
        deny_errors: false,
    };
    check::run(&args).unwrap();

    let denied = CheckArgs {
        deny_errors: true,
        ..args
    };
    assert!(check::run(&denied).is_err());
}

#[test]
fn inventory_converts_rows() {
    let dir = tempfile::tempdir().unwrap();
    let rows = r#"[
      {"globalid_panneau": "P1", "RegNature": "interdiction", "RegFleche": "vers rue",
       "cote_rue_id": 11, "X": 10.0, "Y": -3.0},
      {"globalid_panneau": "P2", "X": "not a number", "Y": 0.0}
    ]"#;
    let args = InventoryArgs {
        rows: write(dir.path(), "rows.json", rows),
        out: dir.path().join("signs.json"),
        strict: false,
    };
    inventory::run(&args).unwrap();
    let signs: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&args.out).unwrap()).unwrap();
    assert_eq!(signs.as_array().unwrap().len(), 1);
    assert_eq!(signs[0]["side_of_street"], "right");

    let strict = InventoryArgs {
        strict: true,
        out: dir.path().join("strict.json"),
        ..args
    };
    assert!(inventory::run(&strict).is_err());
}
