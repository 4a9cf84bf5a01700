//! WebSocket support for live discovery updates.
//!
//! Every socket receives the engine's events. Clients also send commands,
//! and replies meant only for the sender (`results_loaded`,
//! `settings_loaded`, `library_snapshot`, `error`) go to that socket alone.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use cinescout_core::config::{ConnectionUpdate, SanitizedConnection};
use cinescout_core::{LibraryReport, Recommendation};

use crate::metrics::{
    WS_COMMANDS_RECEIVED, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS,
    WS_MESSAGES_SENT,
};
use crate::state::AppState;

/// Command sent by a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsCommand {
    RefreshLibrary,
    LibrarySnapshot,
    Start { names: Vec<String> },
    Stop,
    LoadMore,
    /// `name` may be percent-encoded.
    Add { name: String, year: String },
    LoadSettings,
    UpdateSettings(ConnectionUpdate),
}

impl WsCommand {
    fn kind(&self) -> &'static str {
        match self {
            WsCommand::RefreshLibrary => "refresh_library",
            WsCommand::LibrarySnapshot => "library_snapshot",
            WsCommand::Start { .. } => "start",
            WsCommand::Stop => "stop",
            WsCommand::LoadMore => "load_more",
            WsCommand::Add { .. } => "add",
            WsCommand::LoadSettings => "load_settings",
            WsCommand::UpdateSettings(_) => "update_settings",
        }
    }
}

/// Message for a single socket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsReply {
    /// Results to show right after connecting.
    ResultsLoaded { results: Vec<Recommendation> },
    SettingsLoaded { settings: SanitizedConnection },
    LibrarySnapshot(LibraryReport),
    Error { message: String },
}

impl WsReply {
    fn kind(&self) -> &'static str {
        match self {
            WsReply::ResultsLoaded { .. } => "results_loaded",
            WsReply::SettingsLoaded { .. } => "settings_loaded",
            WsReply::LibrarySnapshot(_) => "library_snapshot",
            WsReply::Error { .. } => "error",
        }
    }
}

/// Decode a client-supplied title, keeping it as-is if it is not valid percent-encoding.
pub fn decode_title(name: &str) -> String {
    urlencoding::decode(name)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| name.to_string())
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before loading results so nothing emitted in between is lost.
    let mut events = state.engine().subscribe();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<WsReply>();

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();
    info!("WebSocket client connected");

    let results = state.engine().client_connected().await;
    let _ = reply_tx.send(WsReply::ResultsLoaded { results });

    // Forward engine events and per-socket replies to this client
    let send_task = tokio::spawn(async move {
        loop {
            let (kind, json) = tokio::select! {
                result = events.recv() => match result {
                    Ok(event) => (event.kind(), serde_json::to_string(&event)),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("WebSocket client lagged, skipped {} events", n);
                        WS_LAG_EVENTS.inc();
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Event channel closed");
                        break;
                    }
                },
                reply = reply_rx.recv() => match reply {
                    Some(reply) => (reply.kind(), serde_json::to_string(&reply)),
                    None => break,
                },
            };

            match json {
                Ok(json) => {
                    WS_MESSAGES_SENT.with_label_values(&[kind]).inc();
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, client disconnected");
                        break;
                    }
                }
                Err(e) => error!("Failed to serialize {} message: {}", kind, e),
            }
        }
    });

    // Handle incoming commands
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Text(text)) => match serde_json::from_str::<WsCommand>(text.as_str()) {
                Ok(command) => {
                    WS_COMMANDS_RECEIVED
                        .with_label_values(&[command.kind()])
                        .inc();
                    tokio::spawn(handle_command(command, state.clone(), reply_tx.clone()));
                }
                Err(e) => {
                    warn!("Invalid WebSocket command: {}", e);
                    let _ = reply_tx.send(WsReply::Error {
                        message: format!("Invalid command: {}", e),
                    });
                }
            },
            Ok(_) => {
                // Ping/pong is handled by axum; binary frames are ignored
            }
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    // Clean up
    send_task.abort();
    state.engine().client_disconnected();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}

/// Run one client command. Broadcast effects reach every socket through the
/// engine's events; direct answers go through `reply`.
pub async fn handle_command(
    command: WsCommand,
    state: Arc<AppState>,
    reply: mpsc::UnboundedSender<WsReply>,
) {
    debug!("Handling WebSocket command: {}", command.kind());
    let engine = state.engine();

    match command {
        WsCommand::RefreshLibrary => {
            // Failures are reported through the library_refreshed event.
            let _ = engine.refresh_library(false).await;
        }
        WsCommand::LibrarySnapshot => {
            let _ = reply.send(WsReply::LibrarySnapshot(engine.library_snapshot().await));
        }
        WsCommand::Start { names } => {
            // Rejections are reported through the start_failed event.
            let _ = engine.start(&names).await;
        }
        WsCommand::Stop => engine.stop(),
        WsCommand::LoadMore => {
            engine.load_more();
        }
        WsCommand::Add { name, year } => {
            engine.add_title(&decode_title(&name), &year).await;
        }
        WsCommand::LoadSettings => {
            let _ = reply.send(WsReply::SettingsLoaded {
                settings: state.settings().await,
            });
        }
        WsCommand::UpdateSettings(update) => {
            let message = match state.update_settings(&update).await {
                Ok(settings) => WsReply::SettingsLoaded { settings },
                Err(e) => WsReply::Error {
                    message: e.to_string(),
                },
            };
            let _ = reply.send(message);
        }
    }
}
