//! The temporary on-disk copy of an upload.
//!
//! ## Why a unique name per request?
//!
//! Naming the file after the client's file name makes two concurrent uploads
//! of `receipt.png` write, read and delete the same path. The asset is named
//! `<request-id>-<random>.<ext>` instead, so no two requests ever share a
//! path.
//!
//! ## Lifetime
//!
//! The handle owns a [`tempfile::NamedTempFile`]. [`TemporaryAsset::release`]
//! deletes the file and reports failures; if the handle is dropped instead
//! (early return, panic unwinding) `NamedTempFile`'s destructor still removes
//! it.

use crate::error::OcrBriefError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;
use uuid::Uuid;

/// A per-request temporary file holding the uploaded bytes.
#[derive(Debug)]
pub struct TemporaryAsset {
    file: NamedTempFile,
    consumed: bool,
}

impl TemporaryAsset {
    /// Write `bytes` to a new uniquely named file in `dir`.
    pub fn persist(
        dir: &Path,
        request_id: Uuid,
        extension: &str,
        bytes: &[u8],
    ) -> Result<Self, OcrBriefError> {
        let write_err = |source| OcrBriefError::AssetWriteFailed {
            dir: dir.to_path_buf(),
            source,
        };

        let prefix = format!("{request_id}-");
        let suffix = if extension.is_empty() {
            String::new()
        } else {
            format!(".{extension}")
        };
        let mut file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(write_err)?;
        file.write_all(bytes).map_err(write_err)?;
        file.flush().map_err(write_err)?;

        debug!("Persisted {} bytes to {}", bytes.len(), file.path().display());
        Ok(Self {
            file,
            consumed: false,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the stored bytes. Succeeds once; later calls fail with
    /// [`OcrBriefError::AssetAlreadyRead`].
    pub async fn read_bytes(&mut self) -> Result<Vec<u8>, OcrBriefError> {
        let path = self.path().to_path_buf();
        if self.consumed {
            return Err(OcrBriefError::AssetAlreadyRead { path });
        }
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| OcrBriefError::AssetReadFailed {
                path: path.clone(),
                source,
            })?;
        self.consumed = true;
        Ok(bytes)
    }

    /// Delete the file now, reporting any error.
    pub fn release(self) -> Result<(), OcrBriefError> {
        let path: PathBuf = self.path().to_path_buf();
        self.file
            .close()
            .map_err(|source| OcrBriefError::AssetReleaseFailed {
                path: path.clone(),
                source,
            })?;
        debug!("Released {}", path.display());
        Ok(())
    }
}
