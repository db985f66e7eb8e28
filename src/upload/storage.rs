use crate::error::UploadError;
use axum::body::Bytes;
use futures::{pin_mut, Stream, StreamExt};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Places uploaded audio blobs under a process-wide working directory
#[derive(Debug, Clone)]
pub struct TransientStorage {
    dir: PathBuf,
    max_bytes: u64,
}

impl TransientStorage {
    /// Create the storage manager, creating `dir` if it does not exist yet
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64) -> Result<Self, UploadError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let dir = dir.canonicalize()?;

        info!(
            "Transient storage ready at {:?} (limit: {} bytes)",
            dir, max_bytes
        );

        Ok(Self { dir, max_bytes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Stream `chunks` into a fresh request-scoped file.
    ///
    /// The size limit is checked as bytes arrive; an oversized or empty
    /// upload leaves nothing behind on disk.
    pub async fn acquire<S, E>(
        &self,
        content_type: Option<String>,
        chunks: S,
    ) -> Result<UploadedAudio, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        UploadError: From<E>,
    {
        let path = self.dir.join(format!("{}.audio", Uuid::new_v4()));
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        // From here on the guard owns the path, so every early return unlinks it
        let mut audio = UploadedAudio {
            path,
            size: 0,
            content_type,
            released: false,
        };

        let written = self.copy_limited(file, chunks).await;
        match written {
            Ok(0) => {
                audio.release();
                Err(UploadError::NoFile)
            }
            Ok(size) => {
                audio.size = size;
                debug!("Stored upload at {:?} ({} bytes)", audio.path, size);
                Ok(audio)
            }
            Err(e) => {
                audio.release();
                Err(e)
            }
        }
    }

    async fn copy_limited<S, E>(
        &self,
        mut file: tokio::fs::File,
        chunks: S,
    ) -> Result<u64, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        UploadError: From<E>,
    {
        pin_mut!(chunks);
        let mut size: u64 = 0;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| match UploadError::from(e) {
                UploadError::BodyTooLarge => UploadError::TooLarge {
                    limit: self.max_bytes,
                },
                other => other,
            })?;

            size += chunk.len() as u64;
            if size > self.max_bytes {
                return Err(UploadError::TooLarge {
                    limit: self.max_bytes,
                });
            }

            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(size)
    }
}

/// An uploaded audio blob on local storage, owned by exactly one request.
///
/// Dropping the handle releases the file if `release` was never called.
#[derive(Debug)]
pub struct UploadedAudio {
    path: PathBuf,
    size: u64,
    content_type: Option<String>,
    released: bool,
}

impl UploadedAudio {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Unlink the blob. Safe to call repeatedly and when the file is gone.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Released upload {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Upload {:?} already removed", self.path)
            }
            Err(e) => warn!("Failed to remove upload {:?}: {}", self.path, e),
        }
    }
}

impl Drop for UploadedAudio {
    fn drop(&mut self) {
        self.release();
    }
}
