//! Session handshake: short human-readable codes and peer identities.
//!
//! The display listens on the peer identity `wb-app-<CODE>`; a controller
//! types the code and derives the same identity. The code is the only part of
//! the protocol a user ever sees.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::fmt;

use rand::Rng;

/// Prefix prepended to a session code to form the display's peer identity.
pub const PEER_ID_PREFIX: &str = "wb-app-";

/// Number of characters in a session code.
pub const CODE_LEN: usize = 4;

/// Characters used when generating codes. Omits `0/O` and `1/I` so codes
/// survive being read aloud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Error returned when a code or identity fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionCodeError {
    #[error("session code must be {CODE_LEN} characters, got {0}")]
    WrongLength(usize),
    #[error("session code may only contain letters and digits")]
    InvalidCharacter,
    #[error("peer identity must start with `{PEER_ID_PREFIX}`")]
    MissingPrefix,
}

/// A validated, upper-cased session code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionCode(String);

impl SessionCode {
    /// Generate a random code from the unambiguous alphabet.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..CODE_LEN)
            .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
            .collect();
        Self(code)
    }

    /// Validate user input. Case-insensitive; surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SessionCodeError`] if the code is not exactly [`CODE_LEN`]
    /// ASCII letters or digits.
    pub fn parse(input: &str) -> Result<Self, SessionCodeError> {
        let trimmed = input.trim();
        let len = trimmed.chars().count();
        if len != CODE_LEN {
            return Err(SessionCodeError::WrongLength(len));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SessionCodeError::InvalidCharacter);
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Recover the code from a peer identity such as `wb-app-K7QZ`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionCodeError::MissingPrefix`] if the prefix is absent,
    /// or the [`SessionCode::parse`] error for the remainder.
    pub fn from_identity(identity: &str) -> Result<Self, SessionCodeError> {
        let code = identity
            .strip_prefix(PEER_ID_PREFIX)
            .ok_or(SessionCodeError::MissingPrefix)?;
        Self::parse(code)
    }

    /// The display's peer identity for this code.
    #[must_use]
    pub fn peer_identity(&self) -> String {
        format!("{PEER_ID_PREFIX}{}", self.0)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
