//! Upload of generated import scripts to the router's filesystem.

use async_trait::async_trait;
use ssh2::Session;
use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[cfg(test)]
use mockall::automock;

use crate::config::{RouterConfig, SecureString};
use crate::error::{AdisheError, Result};

/// Moves a local file onto the router
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ScriptTransport: Send + Sync {
    /// Copy `local` to the router's filesystem root as `remote_name`
    async fn upload(&self, local: &Path, remote_name: &str) -> Result<()>;
}

/// SCP over an SSH session authenticated with the router password
#[derive(Debug, Clone)]
pub struct SshTransport {
    addr: String,
    login: String,
    password: SecureString,
    timeout: Duration,
}

impl SshTransport {
    pub fn new(router: &RouterConfig) -> Self {
        Self {
            addr: router.ssh_addr(),
            login: router.login.clone(),
            password: router.password.clone(),
            timeout: router.timeout,
        }
    }

    fn transfer_error(&self, what: &str, e: impl std::fmt::Display) -> AdisheError {
        AdisheError::Transfer(format!("{} ({}): {}", what, self.addr, e))
    }

    /// Open and authenticate a session
    fn open_session(&self) -> Result<Session> {
        info!("Creating SSH session to {}...", self.addr);

        let socket_addr = self
            .addr
            .to_socket_addrs()
            .map_err(|e| self.transfer_error("cannot resolve", e))?
            .next()
            .ok_or_else(|| self.transfer_error("cannot resolve", "no address"))?;

        let tcp = TcpStream::connect_timeout(&socket_addr, self.timeout)
            .map_err(|e| self.transfer_error("cannot connect", e))?;

        let mut session = Session::new().map_err(|e| self.transfer_error("ssh init", e))?;
        session.set_timeout(u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX));
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| self.transfer_error("ssh handshake", e))?;

        session
            .userauth_password(&self.login, self.password.as_str())
            .map_err(|e| AdisheError::Auth(format!("ssh login as {}: {}", self.login, e)))?;
        if !session.authenticated() {
            return Err(AdisheError::Auth(format!(
                "ssh session for {} not authenticated",
                self.login
            )));
        }

        info!("SSH session created");
        Ok(session)
    }

    fn upload_blocking(&self, local: &Path, remote_name: &str) -> Result<()> {
        let data = std::fs::read(local)?;
        let session = self.open_session()?;

        info!("Uploading script {}...", remote_name);
        let mut channel = session
            .scp_send(Path::new(remote_name), 0o644, data.len() as u64, None)
            .map_err(|e| self.transfer_error("scp open", e))?;
        channel
            .write_all(&data)
            .map_err(|e| self.transfer_error("scp write", e))?;
        finish_channel(&mut channel).map_err(|e| self.transfer_error("scp close", e))?;

        info!("Script {} uploaded", remote_name);
        Ok(())
    }
}

/// Signal end of data and wait for the remote side to acknowledge it
fn finish_channel(channel: &mut ssh2::Channel) -> std::result::Result<(), ssh2::Error> {
    channel.send_eof()?;
    channel.wait_eof()?;
    channel.close()?;
    channel.wait_close()
}

#[async_trait]
impl ScriptTransport for SshTransport {
    async fn upload(&self, local: &Path, remote_name: &str) -> Result<()> {
        let transport = self.clone();
        let local = local.to_path_buf();
        let remote_name = remote_name.to_string();

        tokio::task::spawn_blocking(move || transport.upload_blocking(&local, &remote_name))
            .await
            .map_err(|e| AdisheError::Transfer(format!("upload task failed: {}", e)))?
    }
}
