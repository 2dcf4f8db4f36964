//! # adishe - hostname blocklist reconciler for MikroTik routers
//!
//! Mirrors a remote hosts-format blocklist onto a RouterOS device, either as
//! static DNS entries resolving to a sink address or as firewall
//! address-list entries. Only records carrying the configured tag are ever
//! touched. Each run is stateless: it reads the router, diffs, applies, and
//! a rerun against an unchanged list issues no mutation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        adishe                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap) ──> Config (validated) ──> LockGuard (fs2)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Fetcher (reqwest + rustls)      Records (RouterApi)        │
//! │    └── hosts parsing               └── tagged rows by key   │
//! │              └──── concurrently ────┘                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Reconciler                                                 │
//! │    └── Plan { to_add, to_delete }                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Apply (ApplyStrategy trait)                                │
//! │    ├── ScriptedApply: scp (ssh2) + /import                  │
//! │    └── DirectApply: one add call per hostname               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RouterOS API (tokio TCP, length-prefixed sentences)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use adishe::config::Config;
//! use adishe::sync;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::default();
//!     config.router.address = "10.0.0.1".to_string();
//!     config.router.password = "secret".into();
//!     config.validate()?;
//!
//!     let outcome = sync::run(&config).await?;
//!     println!("{}", outcome);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`apply`] - Scripted and direct apply strategies
//! - [`cli`] - Command-line interface definitions
//! - [`config`] - Configuration and validation
//! - [`error`] - Error type shared by every stage
//! - [`fetcher`] - Blocklist download and hosts parsing
//! - [`lock`] - File locking for concurrent execution prevention
//! - [`reconciler`] - Set difference between remote list and router state
//! - [`records`] - Managed records on the router and the requests touching them
//! - [`routeros`] - RouterOS API protocol and client
//! - [`sync`] - One full run
//! - [`syslog`] - Syslog writer for the logging subscriber
//! - [`transfer`] - Script upload over SSH
//! - [`utils`] - Common utility functions (formatting)

pub mod apply;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod lock;
pub mod reconciler;
pub mod records;
pub mod routeros;
pub mod sync;
pub mod syslog;
pub mod transfer;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use error::{AdisheError, Result};
