use super::AppState;
use crate::archive;
use crate::error::{AppError, Result};
use crate::util::expand_home;

/// Zip the latest snapshot. `path` is the file picked in the frontend's save
/// dialog; without one the archive lands in the configured export directory.
#[tauri::command]
pub async fn export_archive(
    path: Option<String>,
    state: tauri::State<'_, AppState>,
) -> Result<String> {
    let snapshot = state.snapshot.lock().await.clone();
    if snapshot.code_files().next().is_none() {
        return Err(AppError::Custom("Nothing to export yet".into()));
    }

    let written = match path {
        Some(path) => {
            let path = expand_home(&path);
            archive::save_archive(&snapshot, &path)?;
            path
        }
        None => {
            let dir = state
                .config
                .lock()
                .await
                .export_dir()
                .ok_or_else(|| AppError::Custom("Cannot find an export directory".into()))?;
            archive::write_archive(&snapshot, &dir)?
        }
    };

    Ok(written.to_string_lossy().to_string())
}
