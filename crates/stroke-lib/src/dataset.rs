//! Dataset loading

use crate::error::{Error, Result};
use crate::models::RawRecord;
use std::path::Path;
use tracing::info;

/// Read the raw stroke dataset from a CSV file with a header row.
///
/// Fails with a message naming the file when it is missing or malformed;
/// a row that does not match [`RawRecord`] aborts the load.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        Error::dataset(format!("failed to open {}: {e}", path.display()))
    })?;

    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<RawRecord>, csv::Error>>()?;

    info!(rows = records.len(), path = %path.display(), "Loaded dataset");
    Ok(records)
}
