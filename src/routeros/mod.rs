//! Router access through the RouterOS API.
//!
//! [`RouterApi`] is the seam the reconciliation engine talks to: one request
//! in, reply rows out. [`ApiClient`] implements it over a TCP session.

mod client;
mod protocol;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use client::ApiClient;
pub use protocol::{encode_length, read_length, read_sentence, Connection, Reply, Request, Row};

/// Failure of a single API call
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("{command} trapped: {message}")]
    Trap { command: String, message: String },

    #[error("router closed the session: {0}")]
    Fatal(String),

    #[error("protocol violation: {0}")]
    Protocol(String),
}

/// Request/response access to the router's control plane
#[async_trait]
pub trait RouterApi: Send + Sync {
    /// Run one command and return its `!re` rows
    async fn execute(&self, request: &Request) -> Result<Vec<Row>, ApiError>;
}
