use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("timeout after {0}s")]
    Timeout(u64),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Db(String),

    #[error("config error: missing or invalid {0}")]
    Config(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}
