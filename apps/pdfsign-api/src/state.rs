//! Application state for the pdfsign API

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub struct AppState {
    pub upload_dir: PathBuf,
    pub signed_dir: PathBuf,
    /// Signature (width, height) used when the form leaves them out
    pub default_size: (f64, f64),
}

impl AppState {
    /// Create the storage directories and the shared state
    pub async fn new(
        upload_dir: PathBuf,
        signed_dir: PathBuf,
        default_size: (f64, f64),
    ) -> Result<Self> {
        for dir in [&upload_dir, &signed_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating directory {}", dir.display()))?;
        }

        tracing::info!(
            "Storing uploads in {}, signed documents in {}",
            upload_dir.display(),
            signed_dir.display()
        );

        Ok(Self {
            upload_dir,
            signed_dir,
            default_size,
        })
    }

    /// Write an uploaded file. `name` must already be sanitized.
    pub async fn store_upload(&self, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        write_file(&self.upload_dir, name, bytes).await
    }

    /// Write a signed document. `name` must already be sanitized.
    pub async fn store_signed(&self, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        write_file(&self.signed_dir, name, bytes).await
    }
}

async fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    tokio::fs::write(&path, bytes).await?;
    tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}
