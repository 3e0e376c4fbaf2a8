use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use std::fmt;

use super::Identifier;

#[derive(Debug, thiserror::Error)]
pub enum SessionSecretError {
    #[error("session secret is empty")]
    Empty,
    #[error("session secret rejected: {0}")]
    InvalidKey(String),
}

/// Process-wide key for session key derivation.
///
/// There is no fallback value: an absent or empty secret is refused.
#[derive(Clone)]
pub struct SessionSecret {
    mac: Hmac<Sha256>,
}

impl SessionSecret {
    pub fn new(secret: &[u8]) -> Result<Self, SessionSecretError> {
        if secret.is_empty() {
            return Err(SessionSecretError::Empty);
        }
        let mac = Hmac::<Sha256>::new_from_slice(secret)
            .map_err(|e| SessionSecretError::InvalidKey(e.to_string()))?;
        Ok(SessionSecret { mac })
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(<redacted>)")
    }
}

/// Cache key addressing the session entry of one identifier.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SessionKey(pub String);

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lowercase hex of `HMAC-SHA256(secret, identifier)`.
pub fn derive_session_key(secret: &SessionSecret, identifier: &Identifier) -> SessionKey {
    let mut mac = secret.mac.clone();
    mac.update(identifier.as_str().as_bytes());
    SessionKey(hex::encode(mac.finalize().into_bytes()))
}
