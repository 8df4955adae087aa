//! RPC authentication token.

use std::fmt;

/// Shared secret the daemon is launched with and every RPC call presents.
///
/// Regenerated for every daemon start; `Debug` output never shows it.
#[derive(Clone, PartialEq, Eq)]
pub struct RpcCredential(String);

impl RpcCredential {
    /// Wraps a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token, for the daemon command line and RPC headers.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns the token length in characters.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Returns true if the token is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RpcCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RpcCredential(<redacted>)")
    }
}
