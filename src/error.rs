//! Error types for adishe.
//!
//! Every variant is terminal for a run: the caller logs it and exits.

use thiserror::Error;

use crate::routeros::ApiError;

#[derive(Error, Debug)]
pub enum AdisheError {
    #[error("Cannot connect to router at {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("Router rejected credentials: {0}")]
    Auth(String),

    #[error("Failed to fetch blocklist from {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Router query failed: {0}")]
    Query(#[source] ApiError),

    #[error("{action} failed: {source}")]
    Apply {
        action: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("Script transfer failed: {0}")]
    Transfer(String),

    #[error("Local I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Another run holds the lock {0:?}; wait for it to finish or remove the file")]
    Locked(std::path::PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AdisheError {
    pub(crate) fn fetch(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn apply(action: &'static str, source: ApiError) -> Self {
        Self::Apply { action, source }
    }
}

pub type Result<T, E = AdisheError> = std::result::Result<T, E>;
