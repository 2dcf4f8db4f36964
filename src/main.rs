//! adishe - keeps a MikroTik router's blocked hostnames in sync with a
//! remote hosts blocklist.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use adishe::cli::Cli;
use adishe::config::Config;
use adishe::syslog::Syslog;

fn init_logging(cli: &Cli) -> Result<()> {
    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time();

    if cli.syslog {
        let syslog = Syslog::connect("adishe").context("Cannot open the syslog socket")?;
        let subscriber = builder.with_ansi(false).with_writer(syslog).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = builder.with_writer(std::io::stderr).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let config = Config::from_cli(cli)?;
    let outcome = adishe::sync::run(&config).await?;
    if !cli.quiet {
        println!("[OK] {}", outcome);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("[ERROR] {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // AdisheError messages already embed their cause
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
