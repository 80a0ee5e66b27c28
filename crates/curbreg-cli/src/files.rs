//! JSON input/output and engine setup shared by the subcommands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;

use curbreg_core::{Segment, Sign};
use curbreg_engine::{Engine, EngineConfig};

/// Read and parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Write a value as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

/// Load the configuration file if given, then overlay the environment.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(p) => EngineConfig::load(p).with_context(|| format!("loading {}", p.display()))?,
        None => EngineConfig::default(),
    };
    config
        .from_env_overrides()
        .context("applying environment overrides")
}

/// Build the engine and read the signs for a run.
pub fn prepare_run(
    signs: &Path,
    geobase: &Path,
    config: Option<&PathBuf>,
) -> anyhow::Result<(Engine, Vec<Sign>)> {
    let config = load_config(config.map(PathBuf::as_path))?;
    let segments: Vec<Segment> = read_json(geobase)?;
    let signs: Vec<Sign> = read_json(signs)?;
    tracing::info!(
        segments = segments.len(),
        signs = signs.len(),
        "inputs loaded"
    );
    let engine = Engine::new(segments, config).context("building engine")?;
    Ok((engine, signs))
}
