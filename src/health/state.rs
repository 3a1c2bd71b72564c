//! Console connectivity state.
//!
//! # States
//! - Connected: the most recent calls succeeded, or the recovery period elapsed
//! - Disconnected: a call failed less than one recovery period ago
//!
//! # State Transitions
//! ```text
//! Connected → Disconnected: any reported failure (immediate)
//! Disconnected → Disconnected: further failure, recovery timer re-armed
//! Disconnected → Connected: recovery timer elapses without a new failure
//! ```

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn is_connected(self) -> bool {
        self == ConnectionStatus::Connected
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
