// src/core/fs_ops.rs
//! File system helpers for stored uploads

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::utils::sanitize_file_stem;

pub struct FsOps;

impl FsOps {
    pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            info!("Created directory: {}", path.display());
        }
        Ok(())
    }

    /// Destination for an uploaded CSV: `<dir>/<unix-millis>-<id>-<stem>.csv`
    pub fn upload_path(dir: &Path, original_name: &str) -> PathBuf {
        let stem = Path::new(original_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(sanitize_file_stem)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "upload".to_string());

        let id = uuid::Uuid::new_v4().simple().to_string();
        dir.join(format!(
            "{}-{}-{}.csv",
            Utc::now().timestamp_millis(),
            &id[..8],
            stem
        ))
    }
}

/// A stored upload, deleted when the guard goes out of scope.
///
/// Create it before writing the file so that partial writes are removed too.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed stored upload {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove stored upload {}: {}", self.path.display(), e),
        }
    }
}
