use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::merge::merge_layers;
use super::{Config, ConfigLayer};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Reads one layer; a missing file is not an error.
pub fn load_layer(path: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Merges the layers at `paths` in order.
pub fn load(paths: &[&Path]) -> Result<Config, ConfigError> {
    let mut layers = Vec::with_capacity(paths.len());
    for path in paths {
        if let Some(layer) = load_layer(path)? {
            layers.push(layer);
        }
    }
    let config = merge_layers(layers);
    Ok(config)
}

/// Like [`load`], but falls back to defaults on any error.
pub fn load_or_default(paths: &[&Path]) -> Config {
    match load(paths) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("config load failed, using defaults: {err}");
            let config = Config::default();
            config
        }
    }
}
