// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::config::model::{TranspileConfig, Tsconfig};

/// Read and parse a tsconfig file from a given path.
///
/// This only performs JSON deserialization; the mapping to
/// [`TranspileConfig`] happens in [`load_transpile_config`].
pub fn read_tsconfig(path: impl AsRef<Path>) -> Result<Tsconfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading tsconfig at {:?}", path))?;

    let config: Tsconfig = serde_json::from_str(&contents)
        .with_context(|| format!("parsing JSON config from {:?}", path))?;

    Ok(config)
}

/// Load the transpile options for a run.
///
/// A missing file yields the default config with a warning; projects
/// without a tsconfig still get plain type stripping. A file that
/// exists but fails to parse is an error.
pub fn load_transpile_config(path: impl AsRef<Path>) -> Result<TranspileConfig> {
    let path = path.as_ref();

    if !path.exists() {
        warn!(path = ?path, "tsconfig not found; using default transpile options");
        return Ok(TranspileConfig::default());
    }

    let tsconfig = read_tsconfig(path)?;
    let config = tsconfig.to_transpile_config();
    debug!(?config, "loaded transpile options");
    Ok(config)
}
