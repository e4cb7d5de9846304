use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernorError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {detail}")]
    Parse { path: &'static str, detail: String },

    #[error("process memory statistics unavailable on this platform")]
    MemoryStatsUnavailable,
}

pub type GovernorResult<T> = Result<T, GovernorError>;
