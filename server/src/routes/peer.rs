//! WebSocket handler: one socket per peer, relayed through [`crate::relay::Relay`].
//!
//! LIFECYCLE
//! =========
//! 1. `GET /peer/{identity}?role=display|controller`. The identity and the
//!    pairing rules are checked before upgrading so a refused peer gets a
//!    plain HTTP status (400 bad identity, 404 no display, 409 taken).
//! 2. After upgrade the peer registers for real. Losing a race between the
//!    check and the registration sends a `rejected` notice and closes.
//! 3. A `select!` loop forwards inbound text frames to the other side and
//!    writes whatever the relay queues for this socket.
//! 4. Close on either side unregisters; the relay tells the other side.

#[cfg(test)]
#[path = "peer_test.rs"]
mod peer_test;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use frames::{RelayNotice, encode_notice};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::relay::{JoinError, Outbound};
use crate::state::AppState;

/// Which side of the session a socket is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Display,
    Controller,
}

#[derive(Debug, Deserialize)]
pub struct PeerQuery {
    pub role: Role,
}

/// HTTP status for a refused peer.
#[must_use]
pub fn status_for(err: &JoinError) -> StatusCode {
    match err {
        JoinError::InvalidIdentity(_) => StatusCode::BAD_REQUEST,
        JoinError::NoDisplay(_) => StatusCode::NOT_FOUND,
        JoinError::IdentityTaken(_) | JoinError::WriterActive(_) => StatusCode::CONFLICT,
    }
}

fn refuse(err: &JoinError) -> Response {
    warn!(error = %err, "peer: refused before upgrade");
    (status_for(err), err.to_string()).into_response()
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_peer(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    Query(query): Query<PeerQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    match query.role {
        Role::Display => match state.relay.check_display(&identity).await {
            Ok(identity) => ws.on_upgrade(move |socket| run_display(socket, state, identity)),
            Err(err) => refuse(&err),
        },
        Role::Controller => match state.relay.check_controller(&identity).await {
            Ok(identity) => ws.on_upgrade(move |socket| run_controller(socket, state, identity)),
            Err(err) => refuse(&err),
        },
    }
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_display(mut socket: WebSocket, state: AppState, identity: String) {
    let mut link = match state.relay.register_display(&identity).await {
        Ok(link) => link,
        Err(err) => return reject_socket(socket, &err).await,
    };
    info!(identity = %link.identity, "peer: display connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        state.relay.to_controller(&link.identity, text.as_str().to_owned()).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            out = link.rx.recv() => {
                if !write_outbound(&mut socket, out).await {
                    break;
                }
            }
        }
    }

    state.relay.leave_display(&link.identity).await;
    info!(identity = %link.identity, "peer: display disconnected");
}

async fn run_controller(mut socket: WebSocket, state: AppState, identity: String) {
    let mut link = match state.relay.join_controller(&identity).await {
        Ok(link) => link,
        Err(err) => return reject_socket(socket, &err).await,
    };
    let peer: Uuid = link.peer;
    info!(identity = %link.identity, %peer, "peer: controller connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        if !state.relay.to_display(&link.identity, peer, text.as_str().to_owned()).await {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            out = link.rx.recv() => {
                if !write_outbound(&mut socket, out).await {
                    break;
                }
            }
        }
    }

    state.relay.leave_controller(&link.identity, peer).await;
    info!(identity = %link.identity, %peer, "peer: controller disconnected");
}

/// Write one queued item. Returns `false` when the socket should close.
async fn write_outbound(socket: &mut WebSocket, out: Option<Outbound>) -> bool {
    match out {
        Some(Outbound::Text(text)) => socket.send(Message::Text(text.into())).await.is_ok(),
        Some(Outbound::Close) | None => {
            if let Err(err) = socket.send(Message::Close(None)).await {
                debug!(error = %err, "peer: close frame not sent");
            }
            false
        }
    }
}

async fn reject_socket(mut socket: WebSocket, err: &JoinError) {
    warn!(error = %err, "peer: refused after upgrade");
    let notice = encode_notice(&RelayNotice::Rejected { reason: err.to_string() });
    if socket.send(Message::Text(notice.into())).await.is_ok() {
        write_outbound(&mut socket, Some(Outbound::Close)).await;
    }
}
