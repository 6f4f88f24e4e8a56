//! Session identity.

use std::fmt;

use uuid::Uuid;

/// Identifies one accepted WebSocket session for its whole lifetime.
///
/// Random (UUID v4) rather than derived from the peer address, so two
/// connections from the same port in quick succession never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first group of the UUID is plenty to tell sessions apart in logs.
        let full = self.0.simple().to_string();
        f.write_str(&full[..8])
    }
}
