//! RouterOS API client over TCP.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::protocol::{Connection, Request, Row};
use super::{ApiError, RouterApi};
use crate::config::RouterConfig;
use crate::error::{AdisheError, Result};

/// API session shared by concurrent tasks.
///
/// The session carries one request at a time; callers queue on the mutex.
/// A call that times out may leave reply sentences unread, so the session is
/// dropped and every later call fails.
pub struct ApiClient<S = TcpStream> {
    conn: Mutex<Option<Connection<S>>>,
    timeout: Duration,
}

impl ApiClient<TcpStream> {
    /// Connect and log in
    pub async fn connect(router: &RouterConfig) -> Result<Self> {
        let addr = router.api_addr();
        info!("Connecting to router at {}...", addr);

        let stream = match tokio::time::timeout(router.timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(AdisheError::Connect {
                    addr,
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(AdisheError::Connect {
                    addr,
                    reason: format!("timed out after {:?}", router.timeout),
                })
            }
        };

        let client = Self::from_stream(stream, router.timeout);
        match client.login(&router.login, router.password.as_str()).await {
            Ok(()) => {}
            Err(ApiError::Trap { message, .. }) => return Err(AdisheError::Auth(message)),
            Err(e) => {
                return Err(AdisheError::Connect {
                    addr,
                    reason: format!("login failed: {}", e),
                })
            }
        }

        info!("Connection to router established");
        Ok(client)
    }
}

impl<S> ApiClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected stream (no login)
    pub fn from_stream(stream: S, timeout: Duration) -> Self {
        Self {
            conn: Mutex::new(Some(Connection::new(stream))),
            timeout,
        }
    }

    /// Plain-text login used since RouterOS 6.43
    pub async fn login(&self, login: &str, password: &str) -> Result<(), ApiError> {
        let request = Request::new("/login")
            .attr("name", login)
            .attr("password", password);
        self.execute(&request).await.map(|_| ())
    }
}

#[async_trait]
impl<S> RouterApi for ApiClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn execute(&self, request: &Request) -> Result<Vec<Row>, ApiError> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(|| {
            ApiError::Fatal("session dropped after an earlier timeout".to_string())
        })?;
        // Only the command word is logged; attribute words may hold credentials
        debug!("API -> {}", request.command());

        let outcome = tokio::time::timeout(self.timeout, conn.execute(request)).await;
        let rows = match outcome {
            Ok(result) => result?,
            Err(_) => {
                *guard = None;
                return Err(ApiError::Timeout(self.timeout));
            }
        };

        debug!("API <- {} ({} rows)", request.command(), rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routeros::protocol::{encode_length, read_sentence};
    use tokio::io::{duplex, AsyncWriteExt, DuplexStream};

    fn sentence(words: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        for word in words {
            encode_length(word.len(), &mut out).unwrap();
            out.extend_from_slice(word.as_bytes());
        }
        out.push(0);
        out
    }

    /// Reads one request, answers with the given reply sentences
    async fn serve_once(server: &mut DuplexStream, replies: &[&[&str]]) -> Vec<String> {
        let request = read_sentence(server).await.unwrap();
        for reply in replies {
            server.write_all(&sentence(reply)).await.unwrap();
        }
        request
    }

    #[tokio::test]
    async fn test_execute_collects_rows() {
        let (client_end, mut server) = duplex(4096);
        let client = ApiClient::from_stream(client_end, Duration::from_secs(5));

        let router = tokio::spawn(async move {
            serve_once(
                &mut server,
                &[
                    &["!re", "=.id=*1", "=name=a.example"],
                    &["!re", "=.id=*2", "=name=b.example"],
                    &["!done"],
                ],
            )
            .await
        });

        let request = Request::new("/ip/dns/static/print").query("comment", "adishe");
        let rows = client.execute(&request).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("name").map(String::as_str), Some("b.example"));

        let seen = router.await.unwrap();
        assert_eq!(seen, vec!["/ip/dns/static/print", "?comment=adishe"]);
    }

    #[tokio::test]
    async fn test_login_trap_is_reported() {
        let (client_end, mut server) = duplex(4096);
        let client = ApiClient::from_stream(client_end, Duration::from_secs(5));

        let router = tokio::spawn(async move {
            serve_once(
                &mut server,
                &[
                    &["!trap", "=message=invalid user name or password (6)"],
                    &["!done"],
                ],
            )
            .await
        });

        let err = client.login("admin", "wrong").await.unwrap_err();
        match err {
            ApiError::Trap { command, message } => {
                assert_eq!(command, "/login");
                assert!(message.contains("invalid user name"));
            }
            other => panic!("expected trap, got {:?}", other),
        }

        let seen = router.await.unwrap();
        assert_eq!(seen, vec!["/login", "=name=admin", "=password=wrong"]);
    }

    #[tokio::test]
    async fn test_fatal_reply() {
        let (client_end, mut server) = duplex(4096);
        let client = ApiClient::from_stream(client_end, Duration::from_secs(5));

        tokio::spawn(async move {
            serve_once(&mut server, &[&["!fatal", "not logged in"]]).await;
        });

        let err = client.execute(&Request::new("/system/resource/print")).await;
        assert!(matches!(err, Err(ApiError::Fatal(msg)) if msg == "not logged in"));
    }

    #[tokio::test]
    async fn test_execute_times_out() {
        let (client_end, _server) = duplex(4096);
        let client = ApiClient::from_stream(client_end, Duration::from_millis(50));

        let err = client.execute(&Request::new("/import")).await;
        assert!(matches!(err, Err(ApiError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_session_is_dropped_after_timeout() {
        let (client_end, mut server) = duplex(4096);
        let client = ApiClient::from_stream(client_end, Duration::from_millis(50));

        // Router starts answering but never sends !done
        let router = tokio::spawn(async move {
            serve_once(&mut server, &[&["!re", "=.id=*1"]]).await;
            server
        });

        let first = client.execute(&Request::new("/ip/dns/static/print")).await;
        assert!(matches!(first, Err(ApiError::Timeout(_))));

        let second = client.execute(&Request::new("/ip/dns/static/print")).await;
        assert!(matches!(second, Err(ApiError::Fatal(_))));
        drop(router.await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_reply_yields_no_rows() {
        let (client_end, mut server) = duplex(4096);
        let client = ApiClient::from_stream(client_end, Duration::from_secs(5));

        tokio::spawn(async move {
            serve_once(&mut server, &[&["!empty"], &["!done"]]).await;
        });

        let request = Request::new("/ip/dns/static/print").query("comment", "adishe");
        let rows = client.execute(&request).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_closed_stream_is_io_error() {
        let (client_end, server) = duplex(4096);
        drop(server);
        let client = ApiClient::from_stream(client_end, Duration::from_secs(5));

        let err = client.execute(&Request::new("/import")).await;
        assert!(matches!(err, Err(ApiError::Io(_))));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let router = RouterConfig {
            address: "127.0.0.1".to_string(),
            api_port: 1,
            timeout: Duration::from_secs(2),
            ..RouterConfig::default()
        };
        let err = ApiClient::connect(&router).await.err().unwrap();
        assert!(matches!(err, AdisheError::Connect { .. }));
    }
}
