pub mod config;
pub mod export;
pub mod generate;
pub mod preview;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::accumulator::Snapshot;
use crate::config::AppConfig;
use crate::session::GenerationSession;

/// Managed state shared by every command.
pub struct AppState {
    pub session: GenerationSession,
    /// Last snapshot of the current generation.
    pub snapshot: Arc<Mutex<Snapshot>>,
    /// One preview build at a time.
    pub preview_lock: Mutex<()>,
    pub config: Mutex<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            session: GenerationSession::new(),
            snapshot: Arc::new(Mutex::new(Snapshot::default())),
            preview_lock: Mutex::new(()),
            config: Mutex::new(config),
        }
    }

    /// Stop the running generation (for window close handler).
    pub fn kill_sync(&self) {
        self.session.kill_sync();
    }
}
