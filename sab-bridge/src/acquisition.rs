//! File-first measurement acquisition
//!
//! Tries the first few discovered files in order and returns the first one
//! that converts into a valid measurement of the requested kind. Every
//! per-file failure (read error, timeout, parse error, invalid axis) is
//! logged and the scan moves on; the caller falls back to synthesis when
//! nothing parses.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::discovery::FileRef;
use crate::measurement::{Measurement, MeasurementError, MeasurementKind};
use crate::parsers::{self, ParseError};

/// Files tried per acquisition
pub const MAX_CANDIDATES: usize = 3;

/// Why one candidate file was skipped
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    #[error("read failed: {0}")]
    Read(#[from] std::io::Error),

    #[error("not a recognized format")]
    Unparsable,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Measurement(#[from] MeasurementError),
}

/// Read and convert one candidate file
pub async fn read_candidate(
    file: &FileRef,
    kind: MeasurementKind,
    read_timeout: Duration,
) -> Result<Measurement, AttemptError> {
    let bytes = tokio::time::timeout(read_timeout, tokio::fs::read(&file.path))
        .await
        .map_err(|_| AttemptError::Timeout(read_timeout))??;

    let content = parsers::parse(file.format, &bytes).ok_or(AttemptError::Unparsable)?;
    debug!("{}: {}", file.name, parsers::describe(&content));

    let data = parsers::to_measurement_data(kind, &content)?;
    Ok(Measurement::from_file(data, file.name.clone())?)
}

/// First of up to [`MAX_CANDIDATES`] files that yields a measurement
pub async fn read_first_candidate(
    files: &[FileRef],
    kind: MeasurementKind,
    read_timeout: Duration,
) -> Option<Measurement> {
    for file in files.iter().take(MAX_CANDIDATES) {
        match read_candidate(file, kind, read_timeout).await {
            Ok(measurement) => {
                info!("Parsed {} measurement from {}", kind, file.name);
                return Some(measurement);
            }
            Err(e) => warn!("Skipping {}: {}", file.path.display(), e),
        }
    }
    None
}
