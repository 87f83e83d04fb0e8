//! Writes validated PDF bytes into the output directory.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::error::PersistError;

/// Writes `bytes` to `<output_dir>/<file_name>` and returns the final path.
///
/// The directory is created if absent. Bytes land in a hidden `.part` file
/// first and are renamed into place, so a crash never leaves a truncated PDF
/// under the final name. An existing file with the same name is replaced.
///
/// # Errors
///
/// Returns [`PersistError`] if the directory cannot be created or the file
/// cannot be written or renamed. The `.part` file is removed on failure.
pub async fn write_atomic(
    output_dir: &Path,
    file_name: &str,
    bytes: &[u8],
) -> Result<PathBuf, PersistError> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| PersistError::io(output_dir, e))?;

    let final_path = output_dir.join(file_name);
    let part_path = output_dir.join(part_file_name(file_name));

    if let Err(error) = write_part(&part_path, bytes).await {
        let _ = tokio::fs::remove_file(&part_path).await;
        return Err(error);
    }

    if let Err(error) = tokio::fs::rename(&part_path, &final_path).await {
        debug!(path = %part_path.display(), "cleaning up partial file after failed rename");
        let _ = tokio::fs::remove_file(&part_path).await;
        return Err(PersistError::io(final_path, error));
    }

    debug!(path = %final_path.display(), bytes = bytes.len(), "file written");
    Ok(final_path)
}

/// Removes `.part` files an aborted run left in `output_dir` and returns how
/// many were removed. A missing directory has nothing to remove.
///
/// # Errors
///
/// Returns [`PersistError`] if the directory cannot be listed or a leftover
/// cannot be removed.
pub async fn remove_stale_parts(output_dir: &Path) -> Result<usize, PersistError> {
    let mut entries = match tokio::fs::read_dir(output_dir).await {
        Ok(entries) => entries,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(error) => return Err(PersistError::io(output_dir, error)),
    };

    let mut removed = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PersistError::io(output_dir, e))?
    {
        let is_part = entry.file_name().to_str().is_some_and(is_part_file_name);
        if !is_part {
            continue;
        }
        let path = entry.path();
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| PersistError::io(&path, e))?;
        debug!(path = %path.display(), "removed leftover partial file");
        removed += 1;
    }
    Ok(removed)
}

fn part_file_name(file_name: &str) -> String {
    format!(".{file_name}.part")
}

fn is_part_file_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".pdf.part")
}

async fn write_part(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| PersistError::io(path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| PersistError::io(path, e))?;
    file.sync_all()
        .await
        .map_err(|e| PersistError::io(path, e))?;
    Ok(())
}
