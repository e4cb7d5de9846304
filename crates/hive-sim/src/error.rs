use hive_core::{AgentId, HiveError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrainError {
    #[error("configuration error: {0}")]
    Config(#[from] HiveError),

    #[error("scheduler is stopped; build a new one to run again")]
    Stopped,

    #[error("scheduler is already ticking")]
    AlreadyTicking,

    #[error("action sink rejected {agent}: {reason}")]
    Sink {
        agent:  AgentId,
        reason: String,
    },
}

pub type BrainResult<T> = Result<T, BrainError>;
