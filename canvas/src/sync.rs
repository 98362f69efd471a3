//! Peer connection bookkeeping and inbound message filtering.
//!
//! A display may see several controllers connect, but only the first open one
//! is the writer. Later controllers are rejected until the writer goes away,
//! so two remote producers never feed the same draft slot. A controller holds
//! at most one link, to its display.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::fmt;

use frames::{CodecError, Message, decode_message};
use tracing::{debug, info, warn};

/// Lifecycle of one peer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionStatus {
    /// Human-readable status line shown by the controller.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Open => "Connected",
            Self::Closed => "Disconnected",
            Self::Errored => "Connection Failed",
        }
    }

    #[must_use]
    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

/// Relay-assigned identifier of a remote peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerId(pub String);

impl PeerId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a peer opening a link to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The peer is now the single writer.
    Accepted,
    /// Another writer is active.
    Rejected,
}

/// Display-side set of controller links.
#[derive(Debug, Clone, Default)]
pub struct Links {
    writer: Option<PeerId>,
}

impl Links {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A controller link opened.
    pub fn open(&mut self, peer: &PeerId) -> Admission {
        match &self.writer {
            Some(current) if current == peer => Admission::Accepted,
            Some(current) => {
                warn!(%peer, writer = %current, "rejecting second controller");
                Admission::Rejected
            }
            None => {
                info!(%peer, "controller connected");
                self.writer = Some(peer.clone());
                Admission::Accepted
            }
        }
    }

    /// A controller link closed or failed. Returns `true` if it was the writer.
    pub fn close(&mut self, peer: &PeerId) -> bool {
        if self.writer.as_ref() == Some(peer) {
            info!(%peer, "controller disconnected");
            self.writer = None;
            return true;
        }
        false
    }

    /// Whether input from `peer` should be applied.
    #[must_use]
    pub fn is_writer(&self, peer: &PeerId) -> bool {
        self.writer.as_ref() == Some(peer)
    }

    #[must_use]
    pub fn writer(&self) -> Option<&PeerId> {
        self.writer.as_ref()
    }
}

/// Decode an inbound peer message. Malformed and unknown messages are logged
/// and dropped.
#[must_use]
pub fn parse_inbound(text: &str) -> Option<Message> {
    match decode_message(text) {
        Ok(msg) => Some(msg),
        Err(CodecError::UnknownType(kind)) => {
            debug!(%kind, "ignoring unknown message type");
            None
        }
        Err(err) => {
            debug!(error = %err, "ignoring malformed message");
            None
        }
    }
}
