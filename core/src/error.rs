use thiserror::Error;

/// Fatal errors: failing to open or parse the image itself.
///
/// Filesystem inconsistencies are never errors; they are recorded as
/// findings in the report and the scan keeps going.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid boot sector: {0}")]
    InvalidBootSector(String),

    #[error("Unsupported filesystem: {0}")]
    UnsupportedFilesystem(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
