//! Session registry and frame relay.
//!
//! DESIGN
//! ======
//! A display registers under its peer identity (`wb-app-<CODE>`) and gets an
//! outbound queue. At most one controller pairs with it at a time. Board
//! messages are never inspected: text frames are forwarded verbatim between
//! the two sockets. The only frames the relay writes itself are
//! [`RelayNotice`]s: `peer_open`/`peer_closed` to the display and `rejected`
//! to a peer that lost a registration race.
//!
//! LOCKING
//! =======
//! The session map sits behind one `RwLock`. Senders are cloned out of the
//! map before sending so no lock is held across a slow socket.
//!
//! BACKPRESSURE
//! ============
//! Forwarded frames never wait: each socket task forwards from inside its own
//! `select!` loop, so an awaited send into a full peer queue would stop it
//! draining its own queue. A frame that does not fit is dropped; the next
//! `sync_board` snapshot corrects the peer. Notices and `Close` are awaited.

#[cfg(test)]
#[path = "relay_test.rs"]
mod relay_test;

use std::collections::HashMap;
use std::sync::Arc;

use frames::session::{SessionCode, SessionCodeError};
use frames::{RelayNotice, encode_notice};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};
use uuid::Uuid;

// =============================================================================
// TYPES
// =============================================================================

/// What a socket task should write next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    /// The other side went away; close this socket.
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("invalid peer identity: {0}")]
    InvalidIdentity(#[from] SessionCodeError),
    #[error("peer identity {0} is already taken")]
    IdentityTaken(String),
    #[error("no display is listening on {0}")]
    NoDisplay(String),
    #[error("display {0} already has a controller")]
    WriterActive(String),
}

/// A controller paired with a display.
#[derive(Debug)]
pub struct ControllerLink {
    pub identity: String,
    pub peer: Uuid,
    pub rx: mpsc::Receiver<Outbound>,
}

/// A registered display.
#[derive(Debug)]
pub struct DisplayLink {
    pub identity: String,
    pub rx: mpsc::Receiver<Outbound>,
}

struct Session {
    display: mpsc::Sender<Outbound>,
    controller: Option<(Uuid, mpsc::Sender<Outbound>)>,
}

/// Normalize a peer identity so `wb-app-k7qz` and `wb-app-K7QZ` meet.
///
/// # Errors
///
/// [`JoinError::InvalidIdentity`] if it is not `wb-app-` plus a valid code.
pub fn canonical_identity(identity: &str) -> Result<String, JoinError> {
    Ok(SessionCode::from_identity(identity)?.peer_identity())
}

// =============================================================================
// RELAY
// =============================================================================

/// Shared registry of live sessions. Cheap to clone.
#[derive(Clone)]
pub struct Relay {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    capacity: usize,
}

impl Relay {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { sessions: Arc::new(RwLock::new(HashMap::new())), capacity: capacity.max(1) }
    }

    /// Check whether a display could register `identity` right now.
    ///
    /// # Errors
    ///
    /// Same as [`Relay::register_display`].
    pub async fn check_display(&self, identity: &str) -> Result<String, JoinError> {
        let identity = canonical_identity(identity)?;
        if self.sessions.read().await.contains_key(&identity) {
            return Err(JoinError::IdentityTaken(identity));
        }
        Ok(identity)
    }

    /// Claim `identity` for a display.
    ///
    /// # Errors
    ///
    /// Invalid identity, or another display already holds it.
    pub async fn register_display(&self, identity: &str) -> Result<DisplayLink, JoinError> {
        let identity = canonical_identity(identity)?;
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&identity) {
            return Err(JoinError::IdentityTaken(identity));
        }
        let (tx, rx) = mpsc::channel(self.capacity);
        sessions.insert(identity.clone(), Session { display: tx, controller: None });
        info!(%identity, "relay: display registered");
        Ok(DisplayLink { identity, rx })
    }

    /// Check whether a controller could join right now, without joining.
    ///
    /// # Errors
    ///
    /// Same as [`Relay::join_controller`].
    pub async fn check_controller(&self, identity: &str) -> Result<String, JoinError> {
        let identity = canonical_identity(identity)?;
        let sessions = self.sessions.read().await;
        match sessions.get(&identity) {
            None => Err(JoinError::NoDisplay(identity)),
            Some(s) if s.controller.is_some() => Err(JoinError::WriterActive(identity)),
            Some(_) => Ok(identity),
        }
    }

    /// Pair a controller with the display at `identity` and tell the display.
    ///
    /// # Errors
    ///
    /// Invalid identity, no display, or a controller is already paired.
    pub async fn join_controller(&self, identity: &str) -> Result<ControllerLink, JoinError> {
        let identity = canonical_identity(identity)?;
        let peer = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.capacity);
        let display = {
            let mut sessions = self.sessions.write().await;
            let Some(session) = sessions.get_mut(&identity) else {
                return Err(JoinError::NoDisplay(identity));
            };
            if session.controller.is_some() {
                return Err(JoinError::WriterActive(identity));
            }
            session.controller = Some((peer, tx));
            session.display.clone()
        };
        info!(%identity, %peer, "relay: controller joined");
        let notice = encode_notice(&RelayNotice::PeerOpen { peer: peer.to_string() });
        deliver(&display, Outbound::Text(notice)).await;
        Ok(ControllerLink { identity, peer, rx })
    }

    /// Forward a display frame to its controller without waiting. Returns
    /// `false` if there is no live controller; a frame dropped on a full
    /// queue still counts as delivered.
    pub async fn to_controller(&self, identity: &str, text: String) -> bool {
        let target = {
            let sessions = self.sessions.read().await;
            sessions.get(identity).and_then(|s| s.controller.as_ref().map(|(_, tx)| tx.clone()))
        };
        match target {
            Some(tx) => forward(&tx, text),
            None => {
                debug!(%identity, "relay: no controller for display frame");
                false
            }
        }
    }

    /// Forward a controller frame to the display without waiting, if `peer`
    /// is still its paired controller.
    pub async fn to_display(&self, identity: &str, peer: Uuid, text: String) -> bool {
        let target = {
            let sessions = self.sessions.read().await;
            sessions
                .get(identity)
                .filter(|s| s.controller.as_ref().is_some_and(|(id, _)| *id == peer))
                .map(|s| s.display.clone())
        };
        target.is_some_and(|tx| forward(&tx, text))
    }

    /// Drop the display's registration and close its controller.
    pub async fn leave_display(&self, identity: &str) {
        let removed = self.sessions.write().await.remove(identity);
        if let Some(Session { controller: Some((peer, tx)), .. }) = removed {
            debug!(%identity, %peer, "relay: closing controller of departed display");
            deliver(&tx, Outbound::Close).await;
        }
        info!(%identity, "relay: display left");
    }

    /// Unpair a controller and tell the display.
    pub async fn leave_controller(&self, identity: &str, peer: Uuid) {
        let display = {
            let mut sessions = self.sessions.write().await;
            let Some(session) = sessions.get_mut(identity) else {
                return;
            };
            if !session.controller.as_ref().is_some_and(|(id, _)| *id == peer) {
                return;
            }
            session.controller = None;
            session.display.clone()
        };
        info!(%identity, %peer, "relay: controller left");
        let notice = encode_notice(&RelayNotice::PeerClosed { peer: peer.to_string() });
        deliver(&display, Outbound::Text(notice)).await;
    }

    /// Number of registered displays.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn forward(tx: &mpsc::Sender<Outbound>, text: String) -> bool {
    match tx.try_send(Outbound::Text(text)) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            debug!("relay: peer queue full, frame dropped");
            true
        }
        Err(TrySendError::Closed(_)) => {
            debug!("relay: receiver dropped");
            false
        }
    }
}

async fn deliver(tx: &mpsc::Sender<Outbound>, out: Outbound) -> bool {
    if tx.send(out).await.is_err() {
        debug!("relay: receiver dropped");
        return false;
    }
    true
}
