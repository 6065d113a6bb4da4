use super::AppState;
use crate::error::{AppError, Result};
use crate::preview::{PreviewBuild, PreviewHost};
use crate::transform::TransformStrategy;

/// Build a fresh preview of the latest snapshot.
#[tauri::command]
pub async fn build_preview(
    mode: TransformStrategy,
    state: tauri::State<'_, AppState>,
) -> Result<PreviewBuild> {
    let _guard = state.preview_lock.lock().await;
    let snapshot = state.snapshot.lock().await.clone();
    let host = PreviewHost::new(state.config.lock().await.preview.clone());

    tokio::task::spawn_blocking(move || host.build(&snapshot, mode))
        .await
        .map_err(|e| AppError::Custom(format!("Preview build failed: {e}")))
}
