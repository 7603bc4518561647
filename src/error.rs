use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a validation run. Structural anomalies in the input
/// (missing headers, short rows, empty files) are deliberately absent here:
/// those degrade to empty/zero values and the run classifies best-effort.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("input file missing: {path}")]
    InputMissing { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid UTF-8 in {path} near byte {offset}")]
    Decode { path: PathBuf, offset: u64 },
}
