//! HTTP fetcher for the remote hosts blocklist.

use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{AdisheError, Result};
use crate::utils::format_count;

/// Blocklist mirrored when no `--source` is given
pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/StevenBlack/hosts/master/alternates/gambling/hosts";

/// Everything up to and including this line is the list's custom section
pub const CUSTOM_SECTION_END: &str = "# End of custom host records.";

/// Addresses the list uses to null-route a hostname
const BLOCKING_PREFIXES: &[&str] = &["0.0.0.0", "127.0.0.1"];

/// Maximum size of the downloaded list (10 MB)
/// The gambling list is well under 1 MB
const MAX_BLOCKLIST_SIZE: usize = 10 * 1024 * 1024;

/// Hostnames the remote list wants blocked
pub type RemoteBlocklist = BTreeSet<String>;

/// Source of the desired blocklist
#[async_trait]
pub trait BlocklistSource: Send + Sync {
    async fn fetch(&self) -> Result<RemoteBlocklist>;
}

/// HTTP client for the remote list
pub struct Fetcher {
    client: Client,
    url: String,
}

impl Fetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("adishe/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AdisheError::fetch(&url, format!("cannot create HTTP client: {}", e)))?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the list body with size validation. No retry.
    async fn download(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AdisheError::fetch(&self.url, e))?;

        if !response.status().is_success() {
            return Err(AdisheError::fetch(
                &self.url,
                format!("HTTP {}", response.status()),
            ));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > MAX_BLOCKLIST_SIZE as u64 {
                return Err(AdisheError::fetch(
                    &self.url,
                    format!(
                        "response too large: {} bytes (max: {} bytes)",
                        content_length, MAX_BLOCKLIST_SIZE
                    ),
                ));
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| AdisheError::fetch(&self.url, format!("unreadable body: {}", e)))?;

        // Content-Length may be absent or wrong
        if body.len() > MAX_BLOCKLIST_SIZE {
            return Err(AdisheError::fetch(
                &self.url,
                format!(
                    "downloaded content too large: {} bytes (max: {} bytes)",
                    body.len(),
                    MAX_BLOCKLIST_SIZE
                ),
            ));
        }

        Ok(body)
    }
}

#[async_trait]
impl BlocklistSource for Fetcher {
    async fn fetch(&self) -> Result<RemoteBlocklist> {
        info!("Fetching blocklist from {}...", self.url);
        let content = self.download().await?;
        let domains = parse_hosts(&content);
        info!("Fetched blocklist - {} hostnames", format_count(domains.len()));
        Ok(domains)
    }
}

/// Parse a hosts-format blocklist.
///
/// Lines up to the custom-section marker are ignored. After it, trailing
/// `#` comments are cut, a leading blocking address is stripped, and every
/// remaining hostname is lowercased and collected. Lines pointing a name at
/// any other address are redirects, not blocks, and are skipped.
pub fn parse_hosts(content: &str) -> RemoteBlocklist {
    let mut domains = RemoteBlocklist::new();
    let mut lines = content.lines();

    for line in lines.by_ref() {
        if line.trim() == CUSTOM_SECTION_END {
            break;
        }
    }

    for line in lines {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let mut tokens = line.split_whitespace().peekable();
        if let Some(first) = tokens.peek() {
            if first.parse::<IpAddr>().is_ok() {
                if !BLOCKING_PREFIXES.contains(first) {
                    debug!("Skipping non-blocking entry: {}", line);
                    continue;
                }
                tokens.next();
            }
        }

        for host in tokens {
            let host = host.to_ascii_lowercase();
            if is_safe_hostname(&host) {
                domains.insert(host);
            } else {
                warn!("Filtered unsafe hostname entry: {}", host);
            }
        }
    }

    domains
}

/// Hostnames are written unquoted into API words and import scripts, so only
/// plain DNS characters are let through.
pub fn is_safe_hostname(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 253
        && host.parse::<IpAddr>().is_err()
        && host
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '_'))
}
