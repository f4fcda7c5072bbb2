// Image buffer: the whole image held in memory, written back on flush

use fatscan_core::ScanError;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// The mapped filesystem image.
///
/// This is the single shared mutable resource of a scan; every repair
/// goes through `bytes_mut` and nothing reaches the backing file until
/// `flush`.
pub struct FatImage {
    path: Option<PathBuf>,
    buf: Vec<u8>,
    dirty: bool,
}

impl FatImage {
    /// Load an image file into memory.
    pub fn open(path: &Path) -> Result<Self, ScanError> {
        let buf = fs::read(path)?;
        debug!("loaded {} ({} bytes)", path.display(), buf.len());
        Ok(Self {
            path: Some(path.to_path_buf()),
            buf,
            dirty: false,
        })
    }

    /// Wrap an in-memory image; used by tests and library callers.
    pub fn from_bytes(buf: Vec<u8>) -> Self {
        Self {
            path: None,
            buf,
            dirty: false,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Mutable view of the image; taking it marks the image dirty.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.dirty = true;
        &mut self.buf
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write repairs back to the backing file, if there is one.
    pub fn flush(&mut self) -> Result<(), ScanError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(path) = &self.path {
            fs::write(path, &self.buf)?;
            info!("wrote {} bytes back to {}", self.buf.len(), path.display());
        }
        self.dirty = false;
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
