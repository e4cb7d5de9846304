use thiserror::Error;

/// Why an oracle batch fell back to the rule table.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle call timed out after {0} ms")]
    Timeout(u64),

    #[error("oracle transport error: {0}")]
    Transport(String),

    #[error("malformed oracle response: {0}")]
    Malformed(String),

    #[error("oracle unavailable until next availability check")]
    Unavailable,

    #[error("oracle panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type OracleResult<T> = Result<T, OracleError>;
