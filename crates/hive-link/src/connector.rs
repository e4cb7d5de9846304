//! The seam between the watchdog and whatever carries an agent's link.

use serde::Serialize;

use hive_core::AgentId;

use crate::LinkResult;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Connected,
    /// A reconnect is already in flight; the watchdog leaves it alone.
    Connecting,
    Disconnected,
}

/// Live channel per agent (e.g. a game-server socket).
///
/// `reconnect` should be bounded in time; the watchdog calls it at most once
/// per agent per reconcile pass.
pub trait Connector {
    fn status(&self, agent: AgentId) -> ConnectionStatus;

    fn reconnect(&mut self, agent: AgentId) -> LinkResult<()>;
}

/// Connector for agents that never disconnect.
#[derive(Copy, Clone, Debug, Default)]
pub struct AlwaysConnected;

impl Connector for AlwaysConnected {
    fn status(&self, _agent: AgentId) -> ConnectionStatus {
        ConnectionStatus::Connected
    }

    fn reconnect(&mut self, _agent: AgentId) -> LinkResult<()> {
        Ok(())
    }
}
