//! Dataset persistence: pretty-printed JSON snapshots on disk.

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Write a dataset as pretty JSON, creating parent directories first.
pub fn save_dataset<T: Serialize>(dataset: &T, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(dataset)?;
    fs::write(path, &json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), bytes = json.len(), "dataset saved");
    Ok(())
}

/// Load a dataset snapshot previously written by [`save_dataset`].
pub fn load_dataset<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let dataset = serde_json::from_str(&json)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(dataset)
}
