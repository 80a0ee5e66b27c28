//! # Engine Configuration
//!
//! All tunable thresholds and policies of a run. Loaded from YAML, every
//! field optional, then optionally overlaid with environment variables.
//!
//! ```yaml
//! search_radius_m: 20.0
//! hint_tolerance_m: 1.0
//! grid_cell_m: 100.0
//! zero_length_epsilon_m: 0.01
//! temporal_exception_policy: earliest_wins
//! standalone_extent:
//!   mode: around_sign
//!   before_m: 5.0
//!   after_m: 15.0
//! overrides:
//!   "{7F3A...}":
//!     action: exclude
//!     reason: panel removed in 2021 survey
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use curbreg_core::{BoundaryRole, RegulationNature, SegmentId, SignId, TriState};
use curbreg_geobase::MatchParams;

/// Environment variable overriding `search_radius_m`.
pub const ENV_SEARCH_RADIUS: &str = "CURBREG_SEARCH_RADIUS_M";
/// Environment variable overriding `hint_tolerance_m`.
pub const ENV_HINT_TOLERANCE: &str = "CURBREG_HINT_TOLERANCE_M";
/// Environment variable overriding `temporal_exception_policy`.
pub const ENV_TEMPORAL_POLICY: &str = "CURBREG_TEMPORAL_POLICY";

/// Largest search radius, in grid cells, a configuration may ask for.
pub const MAX_RADIUS_CELLS: f64 = 64.0;

/// How conflicting `temporal_exception` flags within one sign are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalExceptionPolicy {
    /// Later conflicting windows take the earlier flag.
    #[default]
    EarliestWins,
    /// Earlier conflicting windows take the later flag.
    LatestWins,
    /// The sign is excluded from consolidation.
    RejectSign,
}

impl TemporalExceptionPolicy {
    /// Config spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EarliestWins => "earliest_wins",
            Self::LatestWins => "latest_wins",
            Self::RejectSign => "reject_sign",
        }
    }
}

impl std::fmt::Display for TemporalExceptionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemporalExceptionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "earliest_wins" => Ok(Self::EarliestWins),
            "latest_wins" => Ok(Self::LatestWins),
            "reject_sign" => Ok(Self::RejectSign),
            other => Err(ConfigError::InvalidValue {
                field: "temporal_exception_policy".to_string(),
                reason: format!("unknown policy {other:?}"),
            }),
        }
    }
}

/// Extent of the zone produced by a standalone (no arrow) sign.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StandaloneExtent {
    /// The whole curb.
    #[default]
    FullSegment,
    /// A window around the sign, measured in traffic order and clamped to
    /// the segment.
    AroundSign {
        /// Metres before the sign.
        before_m: f64,
        /// Metres after the sign.
        after_m: f64,
    },
}

/// A per-sign correction applied before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OverrideAction {
    /// Drop the sign from the batch.
    Exclude {
        /// Why, for the report.
        reason: String,
    },
    /// Match the sign to this segment regardless of geometry.
    SetSegment {
        /// Target segment.
        segment_id: SegmentId,
    },
    /// Replace the boundary role.
    SetBoundaryRole {
        /// New role.
        role: BoundaryRole,
    },
    /// Replace the recorded vehicle exception.
    SetVehicleException {
        /// New value.
        value: TriState,
    },
    /// Replace the regulation nature.
    SetNature {
        /// New nature.
        nature: RegulationNature,
    },
}

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The YAML is malformed or has unknown shapes.
    #[error("invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A field is out of range.
    #[error("invalid {field}: {reason}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An environment variable could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv {
        /// Variable name.
        var: String,
        /// Raw value.
        value: String,
    },
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum sign-to-segment distance, metres.
    pub search_radius_m: f64,
    /// Slack over the best distance within which the segment hint wins.
    pub hint_tolerance_m: f64,
    /// Spatial grid cell edge, metres.
    pub grid_cell_m: f64,
    /// Lengths below this are zero.
    pub zero_length_epsilon_m: f64,
    /// Conflict resolution for per-window exception flags.
    pub temporal_exception_policy: TemporalExceptionPolicy,
    /// Zone extent for standalone signs.
    pub standalone_extent: StandaloneExtent,
    /// Per-sign corrections.
    pub overrides: BTreeMap<SignId, OverrideAction>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_radius_m: 20.0,
            hint_tolerance_m: 1.0,
            grid_cell_m: 100.0,
            zero_length_epsilon_m: 0.01,
            temporal_exception_policy: TemporalExceptionPolicy::EarliestWins,
            standalone_extent: StandaloneExtent::FullSegment,
            overrides: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parse YAML. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Overlay environment variables.
    ///
    /// Variables:
    /// - `CURBREG_SEARCH_RADIUS_M`
    /// - `CURBREG_HINT_TOLERANCE_M`
    /// - `CURBREG_TEMPORAL_POLICY` (`earliest_wins` | `latest_wins` | `reject_sign`)
    pub fn from_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_env(|var| std::env::var(var).ok())
    }

    /// Overlay variables from an arbitrary lookup.
    pub fn with_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = lookup(ENV_SEARCH_RADIUS) {
            self.search_radius_m = env_f64(ENV_SEARCH_RADIUS, &v)?;
        }
        if let Some(v) = lookup(ENV_HINT_TOLERANCE) {
            self.hint_tolerance_m = env_f64(ENV_HINT_TOLERANCE, &v)?;
        }
        if let Some(v) = lookup(ENV_TEMPORAL_POLICY) {
            self.temporal_exception_policy =
                v.parse().map_err(|_| ConfigError::InvalidEnv {
                    var: ENV_TEMPORAL_POLICY.to_string(),
                    value: v.clone(),
                })?;
        }
        Ok(self)
    }

    /// Reject unusable thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("search_radius_m", self.search_radius_m)?;
        positive("grid_cell_m", self.grid_cell_m)?;
        positive("zero_length_epsilon_m", self.zero_length_epsilon_m)?;
        non_negative("hint_tolerance_m", self.hint_tolerance_m)?;
        if self.search_radius_m > self.grid_cell_m * MAX_RADIUS_CELLS {
            return Err(ConfigError::InvalidValue {
                field: "search_radius_m".to_string(),
                reason: format!(
                    "{} exceeds {MAX_RADIUS_CELLS} grid cells of {} m",
                    self.search_radius_m, self.grid_cell_m
                ),
            });
        }
        if let StandaloneExtent::AroundSign { before_m, after_m } = self.standalone_extent {
            non_negative("standalone_extent.before_m", before_m)?;
            non_negative("standalone_extent.after_m", after_m)?;
            if before_m + after_m < self.zero_length_epsilon_m {
                return Err(ConfigError::InvalidValue {
                    field: "standalone_extent".to_string(),
                    reason: "before_m + after_m must exceed zero_length_epsilon_m".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Thresholds handed to the segment matcher.
    pub fn match_params(&self) -> MatchParams {
        MatchParams {
            search_radius_m: self.search_radius_m,
            hint_tolerance_m: self.hint_tolerance_m,
            zero_length_epsilon_m: self.zero_length_epsilon_m,
        }
    }
}

fn env_f64(var: &str, raw: &str) -> Result<f64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: raw.to_string(),
    })
}

fn positive(field: &str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("must be positive and finite, got {v}"),
        })
    }
}

fn non_negative(field: &str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("must be non-negative and finite, got {v}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.search_radius_m, 20.0);
        assert_eq!(cfg.temporal_exception_policy, TemporalExceptionPolicy::EarliestWins);
        assert_eq!(cfg.standalone_extent, StandaloneExtent::FullSegment);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = EngineConfig::from_yaml_str("search_radius_m: 35.5\n").unwrap();
        assert_eq!(cfg.search_radius_m, 35.5);
        assert_eq!(cfg.grid_cell_m, 100.0);
    }

    #[test]
    fn full_yaml() {
        let yaml = r#"
temporal_exception_policy: latest_wins
standalone_extent:
  mode: around_sign
  before_m: 5.0
  after_m: 15.0
overrides:
  sign-1:
    action: exclude
    reason: removed
  sign-2:
    action: set_segment
    segment_id: "1250"
  sign-3:
    action: set_vehicle_exception
    value: oui
  sign-4:
    action: set_boundary_role
    role: none
"#;
        let cfg = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.temporal_exception_policy, TemporalExceptionPolicy::LatestWins);
        assert_eq!(
            cfg.standalone_extent,
            StandaloneExtent::AroundSign {
                before_m: 5.0,
                after_m: 15.0
            }
        );
        assert_eq!(cfg.overrides.len(), 4);
        assert_eq!(
            cfg.overrides[&SignId::new("sign-2")],
            OverrideAction::SetSegment {
                segment_id: SegmentId::new("1250")
            }
        );
        assert_eq!(
            cfg.overrides[&SignId::new("sign-3")],
            OverrideAction::SetVehicleException {
                value: TriState::Yes
            }
        );
        assert_eq!(
            cfg.overrides[&SignId::new("sign-4")],
            OverrideAction::SetBoundaryRole {
                role: BoundaryRole::Standalone
            }
        );
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = EngineConfig::from_yaml_str("search_radius_m: [1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overlay() {
        let vars: HashMap<&str, &str> = [
            (ENV_SEARCH_RADIUS, "42"),
            (ENV_TEMPORAL_POLICY, "reject_sign"),
        ]
        .into_iter()
        .collect();
        let cfg = EngineConfig::default()
            .with_env(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(cfg.search_radius_m, 42.0);
        assert_eq!(cfg.hint_tolerance_m, 1.0);
        assert_eq!(cfg.temporal_exception_policy, TemporalExceptionPolicy::RejectSign);
    }

    #[test]
    fn bad_env_value_is_rejected() {
        let err = EngineConfig::default()
            .with_env(|k| (k == ENV_HINT_TOLERANCE).then(|| "wide".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn validation_rejects_non_positive_radius() {
        let cfg = EngineConfig {
            search_radius_m: 0.0,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = EngineConfig {
            grid_cell_m: -1.0,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validation_caps_radius_by_grid_cells() {
        let at_cap = EngineConfig {
            search_radius_m: 6_400.0,
            ..EngineConfig::default()
        };
        assert!(at_cap.validate().is_ok());

        let cfg = EngineConfig::default()
            .with_env(|k| (k == ENV_SEARCH_RADIUS).then(|| "1e12".to_string()))
            .unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "search_radius_m"
        ));
        assert!(crate::Engine::new(Vec::new(), cfg).is_err());
    }

    #[test]
    fn validation_rejects_empty_standalone_window() {
        let cfg = EngineConfig {
            standalone_extent: StandaloneExtent::AroundSign {
                before_m: 0.0,
                after_m: 0.0,
            },
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        std::fs::write(&path, "grid_cell_m: 250\n").unwrap();
        let cfg = EngineConfig::load(&path).unwrap();
        assert_eq!(cfg.grid_cell_m, 250.0);
        assert!(matches!(
            EngineConfig::load(&dir.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
