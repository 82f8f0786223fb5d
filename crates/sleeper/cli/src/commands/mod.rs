//! CLI command implementations

pub mod due;
pub mod evaluate;
pub mod hits;
pub mod replay;

use crate::error::{CliError, CliResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read a JSON document from disk.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        CliError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write a value to disk as pretty JSON.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> CliResult<()> {
    let mut contents = serde_json::to_string_pretty(value)?;
    contents.push('\n');
    std::fs::write(path, contents)?;
    Ok(())
}
