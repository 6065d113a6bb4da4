use tracing::info;

use super::AppState;
use crate::config::AppConfig;
use crate::error::Result;

#[tauri::command]
pub async fn load_config(state: tauri::State<'_, AppState>) -> Result<AppConfig> {
    Ok(state.config.lock().await.clone())
}

/// Persist `config` and use it for every later generation and preview.
#[tauri::command]
pub async fn save_config(config: AppConfig, state: tauri::State<'_, AppState>) -> Result<AppConfig> {
    let path = config.save()?;
    info!(path = %path.display(), "saved configuration");
    *state.config.lock().await = config.clone();
    Ok(config)
}
