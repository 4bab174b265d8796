//! Container file I/O.
//!
//! Writes go to a temporary file in the destination directory which is
//! renamed over the target only after every byte has been flushed. A failed
//! write leaves any previous file untouched and no partial file behind.

use coinset_core::{CryptocoinExperiment, Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use crate::xdr::{decode, encode};

/// Encode `experiment` and atomically replace `path` with it.
pub fn save_to_file(experiment: &CryptocoinExperiment, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode(experiment)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Dropping the temp file on an early return deletes it
    let mut tmp = NamedTempFile::new_in(dir).map_err(Error::EncodeIo)?;
    tmp.write_all(&bytes).map_err(Error::EncodeIo)?;
    tmp.as_file().sync_all().map_err(Error::EncodeIo)?;
    tmp.persist(path).map_err(|e| Error::EncodeIo(e.error))?;

    info!(
        path = %path.display(),
        coins = experiment.len(),
        bytes = bytes.len(),
        "Wrote experiment"
    );
    Ok(())
}

/// Read and decode a container file.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<CryptocoinExperiment> {
    let bytes = std::fs::read(path.as_ref())?;
    decode(&bytes)
}
