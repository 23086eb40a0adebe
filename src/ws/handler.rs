use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::borrow::Cow;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::guard::LeaveGuard;
use crate::collab::ConnHandle;
use crate::models::ClientMessage;
use crate::state::AppState;

/// Query parameters accepted on the collaboration socket
#[derive(Deserialize, Debug, Default)]
pub struct ConnectParams {
    pub user_name: Option<String>,
}

/// WebSocket handler
pub async fn websocket_handler(
    Path(diagram_id): Path<String>,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    info!("New WebSocket connection attempt for diagram {}", diagram_id);
    ws.on_upgrade(move |socket| handle_socket(socket, diagram_id, params.user_name, state))
}

/// Handle WebSocket connection
async fn handle_socket(
    mut socket: WebSocket,
    diagram_id: String,
    user_name: Option<String>,
    state: AppState,
) {
    let coordinator = state.coordinator.clone();

    let record = match coordinator.accept(&diagram_id).await {
        Ok(record) => record,
        Err(e) => {
            let frame = CloseFrame {
                code: e.close_code(),
                reason: Cow::Owned(e.to_string()),
            };
            if let Err(send_err) = socket.send(Message::Close(Some(frame))).await {
                debug!("Failed to send close frame for diagram {}: {}", diagram_id, send_err);
            }
            return;
        }
    };

    let (conn, outbound) = ConnHandle::channel(state.config.send_buffer());
    let member = coordinator
        .join(&diagram_id, conn.clone(), user_name.as_deref(), record.xml)
        .await;
    let guard = LeaveGuard::new(coordinator.clone(), member.clone());

    let (sink, mut stream) = socket.split();
    let mut writer = tokio::spawn(write_loop(sink, outbound, state.config.send_timeout()));

    // Frames from one client are handled strictly one after another.
    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => match ClientMessage::parse(&text) {
                        Ok(message) => coordinator.handle(&member, message).await,
                        Err(e) => warn!(
                            "Failed to parse message from {} in diagram {}: {}",
                            member.session.user_name, diagram_id, e
                        ),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("WebSocket read error for {}: {}", member.session.user_name, e);
                        break;
                    }
                }
            }
            _ = conn.closed() => {
                info!("Connection {} dropped by the server after a failed send", conn.id());
                break;
            }
            _ = &mut writer => {
                debug!("Writer for connection {} stopped", conn.id());
                break;
            }
        }
    }

    guard.leave().await;
    writer.abort();
    info!("WebSocket connection terminated for diagram {}", diagram_id);
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<String>,
    send_timeout: Duration,
) {
    while let Some(text) = outbound.recv().await {
        match timeout(send_timeout, sink.send(Message::Text(text))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!("WebSocket write failed: {}", e);
                break;
            }
            Err(_) => {
                warn!("WebSocket write timed out after {:?}", send_timeout);
                break;
            }
        }
    }
    let _ = sink.close().await;
}
