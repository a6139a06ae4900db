use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, Result};

pub fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;
        info!("Created upload directory {}", dir.display());
    }
    Ok(())
}

/// File name for an upload: a fresh id plus the last path component of the
/// client's name, limited to a safe character set.
pub fn stored_name(client_name: Option<&str>) -> String {
    let base = client_name
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        format!("{}-upload", Uuid::new_v4())
    } else {
        format!("{}-{}", Uuid::new_v4(), cleaned)
    }
}

/// Writes the uploaded image under `dir`. Files are kept indefinitely.
pub async fn store(dir: &Path, client_name: Option<&str>, bytes: &[u8]) -> Result<PathBuf> {
    if bytes.is_empty() {
        return Err(AppError::Upload("no image was uploaded".to_string()));
    }

    let path = dir.join(stored_name(client_name));
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write upload {}", path.display()))?;

    debug!("Stored upload at {}", path.display());
    Ok(path)
}
