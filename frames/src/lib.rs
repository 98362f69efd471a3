//! Shared data model and JSON codec for the whiteboard peer channels.
//!
//! This crate owns the wire representation used by the `canvas` engine, the
//! relay `server` and the `cli`. Every message is a JSON object with a `type`
//! discriminator. Decoding distinguishes malformed payloads from unknown
//! `type` values so receivers can skip both without treating them as fatal.
//!
//! | Module | Role |
//! |--------|------|
//! | [`model`] | Points, strokes, colors, tools, tool state |
//! | [`message`] | Peer messages, presenter mirror state, relay notices |
//! | [`session`] | Short session codes and derived peer identities |
//! | [`throttle`] | Rate limit for outbound `move` input |

pub mod message;
pub mod model;
pub mod session;
pub mod throttle;

pub use message::{BoardSnapshot, InputEvent, Message, MirrorState, PanDelta, RelayNotice, ZoomCommand};
pub use model::{Color, Dimensions, LaserTrail, PanOffset, Point, Stroke, Tool, ToolPatch, ToolState};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Error returned by the `decode_*` functions.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not JSON, or a known message has the wrong shape.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The payload is not an object with a string `type` field.
    #[error("message has no `type` discriminator")]
    MissingType,
    /// The `type` is not one this build understands.
    #[error("unknown message type `{0}`")]
    UnknownType(String),
}

impl CodecError {
    /// Whether the message should be skipped for forward compatibility
    /// rather than reported as corrupt.
    #[must_use]
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, Self::UnknownType(_))
    }
}

/// Encode a peer message to JSON text.
#[must_use]
pub fn encode_message(message: &Message) -> String {
    encode(message)
}

/// Decode a peer message.
///
/// # Errors
///
/// Returns [`CodecError::UnknownType`] for a well-formed object whose `type`
/// is not a [`Message`] variant, and [`CodecError::Malformed`] /
/// [`CodecError::MissingType`] for everything else that does not parse.
pub fn decode_message(text: &str) -> Result<Message, CodecError> {
    decode_tagged(text, Message::TYPES)
}

/// Encode a relay notice to JSON text.
#[must_use]
pub fn encode_notice(notice: &RelayNotice) -> String {
    encode(notice)
}

/// Decode a relay notice.
///
/// # Errors
///
/// Same classification as [`decode_message`], against [`RelayNotice::TYPES`].
pub fn decode_notice(text: &str) -> Result<RelayNotice, CodecError> {
    decode_tagged(text, RelayNotice::TYPES)
}

/// Encode presenter mirror state to JSON text.
#[must_use]
pub fn encode_mirror(state: &MirrorState) -> String {
    encode(state)
}

/// Decode presenter mirror state.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] if the text is not a mirror object.
pub fn decode_mirror(text: &str) -> Result<MirrorState, CodecError> {
    Ok(serde_json::from_str(text)?)
}

fn encode<T: Serialize>(value: &T) -> String {
    // Serializing these types cannot fail: every map key is a string.
    serde_json::to_string(value).unwrap_or_default()
}

fn decode_tagged<T: DeserializeOwned>(text: &str, known: &[&str]) -> Result<T, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingType)?;
    if !known.contains(&kind) {
        return Err(CodecError::UnknownType(kind.to_owned()));
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
