use std::fmt;

use serde::{Deserialize, Serialize};

/// Credential bundle obtained from the service handshake.
///
/// Never mutated in place: re-authentication replaces the whole value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub cookies: String,
    pub user_agent: String,
    pub session_id: String,
}

impl Session {
    pub fn new(
        cookies: impl Into<String>,
        user_agent: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            cookies: cookies.into(),
            user_agent: user_agent.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cookies", &"[REDACTED]")
            .field("user_agent", &self.user_agent)
            .field("session_id", &self.session_id)
            .finish()
    }
}
