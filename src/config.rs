//! Run configuration for adishe.
//!
//! Built once from the command line, validated, then passed by reference to
//! every component. Nothing in here is mutated after startup.

use clap::ValueEnum;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cli::Cli;
use crate::error::{AdisheError, Result};
use crate::fetcher::DEFAULT_SOURCE_URL;

/// Secure string type that zeroizes memory on drop
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    pub fn new(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Router record type managed by this tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Target {
    /// Static DNS entries resolving blocked names to the sink address
    #[default]
    DnsStatic,
    /// Firewall address-list entries, one list per tag
    AddressList,
}

impl Target {
    /// API menu path of the record type
    pub fn menu(&self) -> &'static str {
        match self {
            Target::DnsStatic => "/ip/dns/static",
            Target::AddressList => "/ip/firewall/address-list",
        }
    }

    /// Field holding the hostname
    pub fn key_field(&self) -> &'static str {
        match self {
            Target::DnsStatic => "name",
            Target::AddressList => "address",
        }
    }

    /// Field that marks a record as managed
    pub fn tag_field(&self) -> &'static str {
        match self {
            Target::DnsStatic => "comment",
            Target::AddressList => "list",
        }
    }

    /// Context line that opens an import script
    pub fn script_header(&self) -> &'static str {
        match self {
            Target::DnsStatic => "/ip dns static",
            Target::AddressList => "/ip firewall address-list",
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::DnsStatic => f.write_str("static DNS"),
            Target::AddressList => f.write_str("address-list"),
        }
    }
}

/// How additions reach the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ApplyMode {
    /// Generate an import script, upload it over SSH and import it
    #[default]
    Scripted,
    /// One API add call per hostname
    Direct,
}

/// Router endpoints and credentials
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub address: String,
    pub api_port: u16,
    pub ssh_port: u16,
    pub login: String,
    pub password: SecureString,
    /// Upper bound for every single I/O call
    pub timeout: Duration,
}

impl RouterConfig {
    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.address, self.api_port)
    }

    pub fn ssh_addr(&self) -> String {
        format!("{}:{}", self.address, self.ssh_port)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            address: "192.168.0.1".to_string(),
            api_port: 8728,
            ssh_port: 22,
            login: "admin".to_string(),
            password: SecureString::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    pub router: RouterConfig,

    /// Hosts-format blocklist to mirror
    pub source_url: String,

    pub target: Target,

    pub mode: ApplyMode,

    /// DNS comment or address-list name marking managed records
    pub tag: String,

    /// Address blocked names resolve to (static DNS only)
    pub sink_address: IpAddr,

    /// Compute and log the plan without touching the router
    pub dry_run: bool,

    pub lock_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            router: RouterConfig::default(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            target: Target::default(),
            mode: ApplyMode::default(),
            tag: "adishe".to_string(),
            sink_address: IpAddr::from([127, 0, 0, 1]),
            dry_run: false,
            lock_file: PathBuf::from("/tmp/adishe.lock"),
        }
    }
}

impl Config {
    /// Build and validate the configuration from parsed arguments
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Self {
            router: RouterConfig {
                address: cli.addr.clone(),
                api_port: cli.api_port,
                ssh_port: cli.ssh_port,
                login: cli.login.clone(),
                password: SecureString::new(cli.password.clone()),
                timeout: Duration::from_secs(cli.timeout),
            },
            source_url: cli.source.clone(),
            target: cli.target,
            mode: cli.mode,
            tag: cli.tag.clone(),
            sink_address: cli.sink,
            dry_run: cli.dry_run,
            lock_file: cli.lock_file.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.router.address.trim().is_empty() {
            return Err(AdisheError::Config("router address is empty".to_string()));
        }
        if self.router.api_port == 0 || self.router.ssh_port == 0 {
            return Err(AdisheError::Config("ports must be non-zero".to_string()));
        }
        if self.router.login.is_empty() {
            return Err(AdisheError::Config("login is empty".to_string()));
        }
        if self.router.timeout.is_zero() {
            return Err(AdisheError::Config("timeout must be at least 1s".to_string()));
        }
        if !self.source_url.starts_with("https://") {
            return Err(AdisheError::Config(format!(
                "blocklist source must use HTTPS: {}",
                self.source_url
            )));
        }
        if !is_valid_tag(&self.tag) {
            return Err(AdisheError::Config(format!(
                "invalid tag '{}': use 1-64 characters from [A-Za-z0-9_-]",
                self.tag
            )));
        }
        Ok(())
    }
}

/// Tags end up unquoted in API words and script lines
fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag.len() <= 64
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
