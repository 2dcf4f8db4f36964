//! Syslog output for `tracing-subscriber`.
//!
//! Each formatted event becomes one RFC 3164 datagram on the local syslog
//! socket: `<PRI>ident[pid]: message`. Every error ends the run, so ERROR
//! events are sent with critical severity.

use std::io;
use std::os::unix::net::UnixDatagram;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

const SYSLOG_SOCKET: &str = "/dev/log";

/// Facility code for user-level messages
const FACILITY_USER: u8 = 1;

/// Map a tracing level to a syslog severity (0=emergency .. 7=debug)
pub fn severity(level: &Level) -> u8 {
    match *level {
        Level::ERROR => 2,
        Level::WARN => 4,
        Level::INFO => 6,
        Level::DEBUG | Level::TRACE => 7,
    }
}

/// Frame one message. PRI is facility * 8 + severity.
pub fn frame(severity: u8, ident: &str, pid: u32, message: &str) -> String {
    format!(
        "<{}>{}[{}]: {}",
        u16::from(FACILITY_USER) * 8 + u16::from(severity),
        ident,
        pid,
        message.trim_end()
    )
}

/// Connected syslog socket
#[derive(Debug)]
pub struct Syslog {
    socket: UnixDatagram,
    ident: String,
    pid: u32,
}

impl Syslog {
    /// Connect to the local syslog daemon
    pub fn connect(ident: &str) -> io::Result<Self> {
        let socket = UnixDatagram::unbound()?;
        socket.connect(SYSLOG_SOCKET)?;
        Ok(Self::from_socket(socket, ident))
    }

    pub fn from_socket(socket: UnixDatagram, ident: &str) -> Self {
        Self {
            socket,
            ident: ident.to_string(),
            pid: std::process::id(),
        }
    }

    fn writer(&self, severity: u8) -> SyslogWriter<'_> {
        SyslogWriter {
            syslog: self,
            severity,
        }
    }
}

/// Writer for a single event
pub struct SyslogWriter<'a> {
    syslog: &'a Syslog,
    severity: u8,
}

impl io::Write for SyslogWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let message = String::from_utf8_lossy(buf);
        let line = frame(self.severity, &self.syslog.ident, self.syslog.pid, &message);
        self.syslog.socket.send(line.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Syslog {
    type Writer = SyslogWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer(severity(&Level::INFO))
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        self.writer(severity(meta.level()))
    }
}
