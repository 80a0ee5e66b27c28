//! Runs the engine from a YAML configuration file and JSON fixtures, the
//! way the driver binary does.

use std::io::Write;

use curbreg_core::{Segment, Sign, SignId};
use curbreg_engine::{
    DefectKind, Engine, EngineConfig, StandaloneExtent, TemporalExceptionPolicy,
};

const SEGMENTS: &str = r#"[
  {
    "id": "1340101",
    "geometry": [{"x": 0.0, "y": 0.0}, {"x": 120.0, "y": 0.0}],
    "street_name": "rue Saint-Denis",
    "traffic_direction": "both"
  }
]"#;

const SIGNS: &str = r#"[
  {
    "id": "P-1",
    "position": {"x": 40.0, "y": -4.0},
    "nature": "interdiction",
    "vehicle_exception": "non",
    "time_windows": [
      {"start": "08:00:00", "end": "10:00:00", "days": ["Mon", "Tue"], "temporal_exception": "oui"},
      {"start": "14:00:00", "end": "16:00:00", "days": ["Tue"], "temporal_exception": "non"}
    ]
  },
  {
    "id": "P-2",
    "position": {"x": 80.0, "y": -4.0},
    "nature": "permission",
    "vehicle_exception": "no",
    "boundary_role": "begin"
  }
]"#;

const CONFIG: &str = r#"
search_radius_m: 15.0
temporal_exception_policy: latest_wins
standalone_extent:
  mode: around_sign
  before_m: 10.0
  after_m: 5.0
overrides:
  P-2:
    action: set_boundary_role
    role: none
"#;

fn load_config() -> EngineConfig {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    EngineConfig::load(file.path()).unwrap()
}

#[test]
fn yaml_config_drives_the_run() {
    let config = load_config();
    assert_eq!(config.search_radius_m, 15.0);
    assert_eq!(
        config.temporal_exception_policy,
        TemporalExceptionPolicy::LatestWins
    );
    assert_eq!(
        config.standalone_extent,
        StandaloneExtent::AroundSign {
            before_m: 10.0,
            after_m: 5.0
        }
    );

    let segments: Vec<Segment> = serde_json::from_str(SEGMENTS).unwrap();
    let signs: Vec<Sign> = serde_json::from_str(SIGNS).unwrap();
    let out = Engine::new(segments, config).unwrap().run(signs).unwrap();

    // P-1: latest flag wins across both windows.
    let p1 = out
        .zones
        .iter()
        .find(|z| z.source_sign_ids == vec![SignId::new("P-1")])
        .unwrap();
    assert!(p1.time_windows.iter().all(|w| !w.exception));
    assert_eq!(
        out.report
            .of_kind(DefectKind::InconsistentTemporalException)
            .count(),
        1
    );

    // P-2: the override turned a lone begin marker into a standalone sign.
    let p2 = out
        .zones
        .iter()
        .find(|z| z.source_sign_ids == vec![SignId::new("P-2")])
        .unwrap();
    assert!(p2.location_range.length() > 0.0);
    assert!(p2.location_range.length() <= 15.0 + 1e-9);
    assert_eq!(out.report.of_kind(DefectKind::OverrideApplied).count(), 1);
    assert_eq!(out.report.of_kind(DefectKind::UnopenedZone).count(), 0);
}

#[test]
fn env_overlay_beats_file() {
    let config = load_config()
        .with_env(|var| match var {
            "CURBREG_TEMPORAL_POLICY" => Some("reject_sign".to_string()),
            _ => None,
        })
        .unwrap();

    let segments: Vec<Segment> = serde_json::from_str(SEGMENTS).unwrap();
    let signs: Vec<Sign> = serde_json::from_str(SIGNS).unwrap();
    let out = Engine::new(segments, config).unwrap().run(signs).unwrap();

    assert!(out
        .zones
        .iter()
        .all(|z| !z.source_sign_ids.contains(&SignId::new("P-1"))));
    let rejected = out
        .report
        .of_kind(DefectKind::InconsistentTemporalException)
        .next()
        .unwrap();
    assert_eq!(rejected.excluded, vec![SignId::new("P-1")]);
}

#[test]
fn output_serializes_to_json() {
    let segments: Vec<Segment> = serde_json::from_str(SEGMENTS).unwrap();
    let signs: Vec<Sign> = serde_json::from_str(SIGNS).unwrap();
    let out = Engine::new(segments, EngineConfig::default())
        .unwrap()
        .run(signs)
        .unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert!(json["zones"].is_array());
    assert!(json["report"]["defects"].is_array());
    assert!(json["report"]["batch_id"].is_string());
}
