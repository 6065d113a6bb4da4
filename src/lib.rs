pub mod accumulator;
pub mod archive;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod preview;
pub mod session;
pub mod status;
pub mod stream;
pub mod templates;
pub mod transform;
pub mod tree;
pub mod util;

#[cfg(feature = "desktop")]
mod commands;

pub use accumulator::{ChunkAccumulator, GeneratedFile, Snapshot};
pub use client::GenerationClient;
pub use error::{AppError, Result};
pub use preview::{PreviewBuild, PreviewHost, PreviewOutcome};
pub use transform::TransformStrategy;

#[cfg(feature = "desktop")]
pub fn run() {
    use tauri::Manager;

    logging::init();
    let config = config::AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "using default configuration");
        config::AppConfig::default()
    });

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .manage(commands::AppState::new(config))
        .invoke_handler(tauri::generate_handler![
            commands::generate::start_generation,
            commands::generate::cancel_generation,
            commands::generate::get_file_tree,
            commands::preview::build_preview,
            commands::export::export_archive,
            commands::config::load_config,
            commands::config::save_config,
        ])
        .on_window_event(|window, event| {
            if let tauri::WindowEvent::Destroyed = event {
                // Abort the stream when the window is closed
                if let Some(state) = window.try_state::<commands::AppState>() {
                    state.inner().kill_sync();
                }
            }
        })
        .run(tauri::generate_context!())
        .expect("failed to run AppForge");
}
