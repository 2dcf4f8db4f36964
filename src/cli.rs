//! CLI argument parsing with clap.

use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::config::{ApplyMode, Target};
use crate::fetcher::DEFAULT_SOURCE_URL;

#[derive(Parser, Debug)]
#[command(name = "adishe")]
#[command(
    author,
    version,
    about = "Keeps a MikroTik router's blocked hostnames in sync with a remote hosts blocklist"
)]
pub struct Cli {
    /// Router address
    #[arg(short = 'a', long, default_value = "192.168.0.1")]
    pub addr: String,

    /// RouterOS API port
    #[arg(long, default_value_t = 8728)]
    pub api_port: u16,

    /// SSH port used to upload import scripts
    #[arg(long, default_value_t = 22)]
    pub ssh_port: u16,

    /// Router login
    #[arg(short, long, default_value = "admin")]
    pub login: String,

    /// Router password; prefer the ADISHE_PASSWORD environment variable
    /// so it stays out of the process list
    #[arg(
        short,
        long,
        env = "ADISHE_PASSWORD",
        default_value = "",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub password: String,

    /// Hosts-format blocklist to mirror (HTTPS only)
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    pub source: String,

    /// Record type that carries the blocklist on the router
    #[arg(long, value_enum, default_value_t = Target::DnsStatic)]
    pub target: Target,

    /// How additions are applied
    #[arg(long, value_enum, default_value_t = ApplyMode::Scripted)]
    pub mode: ApplyMode,

    /// Comment (static DNS) or list name (address-list) marking managed records
    #[arg(long, default_value = "adishe")]
    pub tag: String,

    /// Address blocked names resolve to
    #[arg(long, default_value = "127.0.0.1")]
    pub sink: IpAddr,

    /// Timeout in seconds for each network operation
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Compute and log the changes without applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Lock file preventing concurrent runs
    #[arg(long, default_value = "/tmp/adishe.lock")]
    pub lock_file: PathBuf,

    /// Log to the local syslog socket instead of stderr
    #[arg(long)]
    pub syslog: bool,

    /// Quiet mode (for cron/systemd timer)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long)]
    pub verbose: bool,
}
