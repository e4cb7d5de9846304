use hive_core::AgentId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("{0} refused the connection: {1}")]
    Refused(AgentId, String),

    #[error("{0} did not answer within {1} ms")]
    Timeout(AgentId, u64),

    #[error("{0} is not known to the connector")]
    UnknownAgent(AgentId),
}

pub type LinkResult<T> = Result<T, LinkError>;
