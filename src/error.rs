// src/error.rs
use thiserror::Error;

/// Failure while loading the raw grid for a tab.
///
/// Kept `Clone` so it can travel inside UI messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("sheets api returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("could not read {path}: {message}")]
    Io { path: String, message: String },
    #[error("invalid csv in {path}: {message}")]
    Csv { path: String, message: String },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("sheets api rejected the update: {0}")]
    Api(#[from] google_sheets4::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {0} is outside the sheet")]
    RowOutOfRange(usize),
    #[error("background task failed: {0}")]
    Task(String),
}

/// Returned by `transform::locate_by_name`.
#[cfg_attr(not(test), allow(dead_code))]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocateError {
    #[error("unknown field `{0}`")]
    UnknownField(String),
}
