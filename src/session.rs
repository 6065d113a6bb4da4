use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// At most one generation runs at a time. Starting another aborts the
/// task in flight and invalidates every ticket handed out before.
pub struct GenerationSession {
    epoch: Arc<AtomicU64>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Default for GenerationSession {
    fn default() -> Self {
        Self {
            epoch: Arc::new(AtomicU64::new(0)),
            task: Arc::new(Mutex::new(None)),
        }
    }
}

/// Identifies one generation; events from a stale ticket are dropped.
#[derive(Clone, Debug)]
pub struct GenerationTicket {
    id: u64,
    epoch: Arc<AtomicU64>,
}

impl GenerationTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.epoch.load(Ordering::SeqCst) == self.id
    }

    /// Apply `update` to `slot` only if this ticket is still current. The
    /// check happens under the slot's lock, so it cannot interleave with
    /// [`GenerationSession::begin_resetting`] on the same slot.
    pub async fn write_if_current<T>(&self, slot: &Mutex<T>, update: impl FnOnce(&mut T)) -> bool {
        let mut guard = slot.lock().await;
        if !self.is_current() {
            return false;
        }
        update(&mut guard);
        true
    }
}

impl GenerationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, aborting the previous one.
    pub async fn begin(&self) -> GenerationTicket {
        let id = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(handle) = self.task.lock().await.take() {
            debug!(request_id = id - 1, "aborting superseded generation");
            handle.abort();
        }
        GenerationTicket {
            id,
            epoch: self.epoch.clone(),
        }
    }

    /// Start a new generation and reset `slot` while holding its lock. A
    /// superseded task writing through [`GenerationTicket::write_if_current`]
    /// either lands before the reset or not at all.
    pub async fn begin_resetting<T: Default>(&self, slot: &Mutex<T>) -> GenerationTicket {
        let mut guard = slot.lock().await;
        let ticket = self.begin().await;
        *guard = T::default();
        ticket
    }

    /// Record the task driving `ticket`. A ticket that is no longer current
    /// has its task aborted right away.
    pub async fn attach(&self, ticket: &GenerationTicket, handle: JoinHandle<()>) {
        let mut guard = self.task.lock().await;
        if ticket.is_current() {
            *guard = Some(handle);
        } else {
            handle.abort();
        }
    }

    /// Abort the running generation without starting a new one. Returns
    /// whether a task was still running.
    pub async fn cancel(&self) -> bool {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        match self.task.lock().await.take() {
            Some(handle) => {
                let running = !handle.is_finished();
                handle.abort();
                running
            }
            None => false,
        }
    }

    /// Abort synchronously (for window close handler).
    pub fn kill_sync(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.task.try_lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}
