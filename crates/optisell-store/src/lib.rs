//! Flat-file JSON persistence for integrations and local products.
//!
//! Each collection lives in its own pretty-printed JSON array under the data
//! directory. All read-modify-write cycles go through one async mutex, and
//! writes land in a sibling temp file that is renamed over the original.

mod integrations;
mod products;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

pub use products::ImportSummary;

pub const INTEGRATIONS_FILE: &str = "integrations.json";
pub const PRODUCTS_FILE: &str = "products.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize {collection}: {source}")]
    Serialize {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug)]
pub struct JsonStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    /// Opens the store rooted at `dir`, creating the directory and seeding
    /// empty collection files when missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory or files cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(io_error(&dir))?;

        for file in [INTEGRATIONS_FILE, PRODUCTS_FILE] {
            let path = dir.join(file);
            if !tokio::fs::try_exists(&path)
                .await
                .map_err(io_error(&path))?
            {
                tokio::fs::write(&path, b"[]\n")
                    .await
                    .map_err(io_error(&path))?;
                tracing::info!(path = %path.display(), "seeded empty collection");
            }
        }

        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Confirms both collection files can be read and parsed.
    ///
    /// # Errors
    ///
    /// Returns the first read or parse failure.
    pub async fn check(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.read_collection::<serde_json::Value>(INTEGRATIONS_FILE)
            .await?;
        self.read_collection::<serde_json::Value>(PRODUCTS_FILE)
            .await?;
        Ok(())
    }

    // Callers must hold `self.lock`.
    async fn read_collection<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, StoreError> {
        let path = self.dir.join(file);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse { path, source })
    }

    // Callers must hold `self.lock`.
    async fn write_collection<T: Serialize>(
        &self,
        file: &'static str,
        records: &[T],
    ) -> Result<(), StoreError> {
        let mut body =
            serde_json::to_vec_pretty(records).map_err(|source| StoreError::Serialize {
                collection: file,
                source,
            })?;
        body.push(b'\n');

        let path = self.dir.join(file);
        let tmp = self.dir.join(format!("{file}.tmp"));
        tokio::fs::write(&tmp, &body).await.map_err(io_error(&tmp))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(io_error(&path))?;
        tracing::debug!(path = %path.display(), records = records.len(), "collection written");
        Ok(())
    }
}
