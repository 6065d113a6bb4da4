use serde::Serialize;
use std::sync::Arc;
use tauri::ipc::Channel;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, warn};

use super::AppState;
use crate::accumulator::Snapshot;
use crate::client::GenerationClient;
use crate::error::Result;
use crate::session::GenerationTicket;
use crate::status::StatusFeed;
use crate::tree::{build_tree, DirectoryNode};

/// Snapshots buffered between the stream and the frontend.
const PROGRESS_BUFFER: usize = 32;

/// Events streamed from a generation to the frontend via Channel.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "event", content = "data")]
pub enum GenerationEvent {
    #[serde(rename_all = "camelCase")]
    Started { request_id: u64 },
    #[serde(rename_all = "camelCase")]
    Progress {
        request_id: u64,
        files: Snapshot,
        status: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Completed {
        request_id: u64,
        files: Snapshot,
        status: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Failed { request_id: u64, message: String },
}

/// Start generating from `description`, replacing any generation in flight.
/// Returns the request id carried by every event of this generation.
#[tauri::command]
pub async fn start_generation(
    description: String,
    on_event: Channel<GenerationEvent>,
    state: tauri::State<'_, AppState>,
) -> Result<u64> {
    let client_config = state.config.lock().await.client.clone();
    let client = GenerationClient::new(&client_config)?;

    let ticket = state.session.begin_resetting(&*state.snapshot).await;
    let _ = on_event.send(GenerationEvent::Started {
        request_id: ticket.id(),
    });

    let latest = state.snapshot.clone();
    let task_ticket = ticket.clone();
    let handle = tokio::spawn(async move {
        run_generation(client, description, task_ticket, latest, on_event).await;
    });
    state.session.attach(&ticket, handle).await;

    Ok(ticket.id())
}

async fn run_generation(
    client: GenerationClient,
    description: String,
    ticket: GenerationTicket,
    latest: Arc<Mutex<Snapshot>>,
    on_event: Channel<GenerationEvent>,
) {
    let request_id = ticket.id();
    let (tx, mut rx) = mpsc::channel::<Snapshot>(PROGRESS_BUFFER);
    let mut feed = StatusFeed::new();

    let generate = async {
        let result = client.generate(&description, Some(&tx)).await;
        drop(tx);
        result
    };
    let forward = async {
        while let Some(snapshot) = rx.recv().await {
            if !ticket.write_if_current(&*latest, |l| *l = snapshot.clone()).await {
                warn!(request_id, "dropping progress from superseded generation");
                continue;
            }
            feed.observe(&snapshot);
            let _ = on_event.send(GenerationEvent::Progress {
                request_id,
                files: snapshot,
                status: feed.lines().to_vec(),
            });
        }
    };
    let (result, ()) = tokio::join!(generate, forward);

    match result {
        Ok(snapshot) => {
            if !ticket.write_if_current(&*latest, |l| *l = snapshot.clone()).await {
                warn!(request_id, "discarding result of superseded generation");
                return;
            }
            feed.observe(&snapshot);
            let _ = on_event.send(GenerationEvent::Completed {
                request_id,
                files: snapshot,
                status: feed.lines().to_vec(),
            });
        }
        Err(_) if !ticket.is_current() => {
            warn!(request_id, "discarding result of superseded generation");
        }
        Err(e) => {
            error!(request_id, error = %e, "generation failed");
            let _ = on_event.send(GenerationEvent::Failed {
                request_id,
                message: e.to_string(),
            });
        }
    }
}

/// Abort the running generation. Returns whether one was running.
#[tauri::command]
pub async fn cancel_generation(state: tauri::State<'_, AppState>) -> Result<bool> {
    Ok(state.session.cancel().await)
}

/// Directory tree of the latest snapshot.
#[tauri::command]
pub async fn get_file_tree(state: tauri::State<'_, AppState>) -> Result<Vec<DirectoryNode>> {
    Ok(build_tree(&*state.snapshot.lock().await))
}
