//! RouterOS API wire format.
//!
//! A sentence is a sequence of length-prefixed words closed by an empty word.
//! Requests start with a command word (`/ip/dns/static/print`), followed by
//! attribute words (`=name=value`) and query words (`?name=value`). Replies
//! start with `!re`, `!done`, `!trap` or `!fatal`.

use std::collections::HashMap;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::ApiError;

/// Largest word we accept from the router (16 MiB)
const MAX_WORD_LEN: u32 = 16 * 1024 * 1024;

/// One reply row: attribute name to value
pub type Row = HashMap<String, String>;

/// A command sentence sent to the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    command: String,
    words: Vec<String>,
}

impl Request {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            words: Vec::new(),
        }
    }

    /// Add an `=key=value` attribute word
    pub fn attr(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.words.push(format!("={}={}", key, value.as_ref()));
        self
    }

    /// Add a `?key=value` query word (equality filter)
    pub fn query(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.words.push(format!("?{}={}", key, value.as_ref()));
        self
    }

    /// Restrict the returned fields
    pub fn proplist(self, fields: &[&str]) -> Self {
        let fields = fields.join(",");
        self.attr(".proplist", fields)
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Value of an attribute word, if present
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.words
            .iter()
            .filter_map(|w| w.strip_prefix('='))
            .find_map(|w| w.split_once('=').filter(|(k, _)| *k == key).map(|(_, v)| v))
    }

    /// Value of a query word, if present
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.words
            .iter()
            .filter_map(|w| w.strip_prefix('?'))
            .find_map(|w| w.split_once('=').filter(|(k, _)| *k == key).map(|(_, v)| v))
    }

    /// All words of the sentence, command first
    pub fn words(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.command.as_str()).chain(self.words.iter().map(String::as_str))
    }

    /// Encode the full sentence including the terminating empty word
    pub fn encode(&self) -> Result<Vec<u8>, ApiError> {
        let mut out = Vec::new();
        for word in self.words() {
            encode_word(word, &mut out)?;
        }
        out.push(0);
        Ok(out)
    }
}

/// A reply sentence received from the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// One data row
    Re(Row),
    /// End of the reply; may carry `ret`
    Done(Row),
    /// Query matched nothing (RouterOS 7.18+), followed by `!done`
    Empty,
    /// Command failed; `message` explains why
    Trap(Row),
    /// Session is being closed by the router
    Fatal(String),
}

impl Reply {
    /// Classify a decoded sentence
    pub fn parse(words: Vec<String>) -> Result<Self, ApiError> {
        let mut iter = words.into_iter();
        let kind = iter
            .next()
            .ok_or_else(|| ApiError::Protocol("empty reply sentence".to_string()))?;

        match kind.as_str() {
            "!re" => Ok(Reply::Re(parse_attributes(iter))),
            "!done" => Ok(Reply::Done(parse_attributes(iter))),
            "!empty" => Ok(Reply::Empty),
            "!trap" => Ok(Reply::Trap(parse_attributes(iter))),
            "!fatal" => Ok(Reply::Fatal(iter.collect::<Vec<_>>().join(" "))),
            other => Err(ApiError::Protocol(format!("unexpected reply word '{}'", other))),
        }
    }
}

/// Collect `=key=value` words into a row. Tags and unknown words are ignored.
fn parse_attributes(words: impl Iterator<Item = String>) -> Row {
    words
        .filter_map(|word| {
            let rest = word.strip_prefix('=')?;
            let (key, value) = rest.split_once('=').unwrap_or((rest, ""));
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Append the length prefix for a word of `len` bytes
pub fn encode_length(len: usize, out: &mut Vec<u8>) -> Result<(), ApiError> {
    let len = u32::try_from(len)
        .map_err(|_| ApiError::Protocol(format!("word too long: {} bytes", len)))?;

    match len {
        0..=0x7F => out.push(len as u8),
        0x80..=0x3FFF => out.extend_from_slice(&((len | 0x8000) as u16).to_be_bytes()),
        0x4000..=0x1F_FFFF => out.extend_from_slice(&(len | 0xC0_0000).to_be_bytes()[1..]),
        0x20_0000..=0x0FFF_FFFF => out.extend_from_slice(&(len | 0xE000_0000).to_be_bytes()),
        _ => {
            out.push(0xF0);
            out.extend_from_slice(&len.to_be_bytes());
        }
    }
    Ok(())
}

fn encode_word(word: &str, out: &mut Vec<u8>) -> Result<(), ApiError> {
    encode_length(word.len(), out)?;
    out.extend_from_slice(word.as_bytes());
    Ok(())
}

/// Read one length prefix
pub async fn read_length<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<u32> {
    let first = reader.read_u8().await?;

    let (mut len, extra) = if first & 0x80 == 0 {
        (u32::from(first), 0)
    } else if first & 0xC0 == 0x80 {
        (u32::from(first & 0x3F), 1)
    } else if first & 0xE0 == 0xC0 {
        (u32::from(first & 0x1F), 2)
    } else if first & 0xF0 == 0xE0 {
        (u32::from(first & 0x0F), 3)
    } else if first == 0xF0 {
        (0, 4)
    } else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("reserved control byte 0x{:02x}", first),
        ));
    };

    for _ in 0..extra {
        len = (len << 8) | u32::from(reader.read_u8().await?);
    }
    Ok(len)
}

/// Read words until the empty terminator word
pub async fn read_sentence<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<String>, ApiError> {
    let mut words = Vec::new();
    loop {
        let len = read_length(reader).await?;
        if len == 0 {
            return Ok(words);
        }
        if len > MAX_WORD_LEN {
            return Err(ApiError::Protocol(format!("word of {} bytes exceeds limit", len)));
        }
        let mut buf = vec![0u8; len as usize];
        reader.read_exact(&mut buf).await?;
        words.push(String::from_utf8_lossy(&buf).into_owned());
    }
}

/// One API session over any byte stream
pub struct Connection<S> {
    stream: S,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Send a request and collect its reply rows.
    ///
    /// Reads until `!done`. A `!trap` anywhere in the reply turns the whole
    /// call into [`ApiError::Trap`].
    pub async fn execute(&mut self, request: &Request) -> Result<Vec<Row>, ApiError> {
        let bytes = request.encode()?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;

        let mut rows = Vec::new();
        let mut trap = None;
        loop {
            // Sentences with no words carry nothing; RouterOS may emit them as keepalives
            let words = read_sentence(&mut self.stream).await?;
            if words.is_empty() {
                continue;
            }
            match Reply::parse(words)? {
                Reply::Re(row) => rows.push(row),
                Reply::Empty => {}
                Reply::Trap(mut row) => {
                    trap = Some(
                        row.remove("message")
                            .unwrap_or_else(|| "unknown error".to_string()),
                    )
                }
                Reply::Done(_) => break,
                Reply::Fatal(message) => return Err(ApiError::Fatal(message)),
            }
        }

        match trap {
            Some(message) => Err(ApiError::Trap {
                command: request.command().to_string(),
                message,
            }),
            None => Ok(rows),
        }
    }
}
