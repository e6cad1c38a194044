//! Minimal memcached text-protocol client for the stats commands the profiler needs.
//!
//! Only two introspection commands are spoken:
//!
//! * `stats items` to discover which slab classes currently hold items
//! * `stats cachedump <slab> <limit>` to list the items of one slab class
//!
//! Replies are read line by line until the `END` terminator. Nothing is retried.

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::{Error, Result};

/// Port memcached listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 11211;

/// One `ITEM` line of a cachedump reply, kept as the server reported it.
///
/// `size` is expected to look like `"123 b"` and `idle` like `"45 s"`.
/// Interpreting them is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDetail {
    pub name: String,
    pub size: String,
    pub idle: String,
}

impl KeyDetail {
    pub fn new(name: impl Into<String>, size: impl Into<String>, idle: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: size.into(),
            idle: idle.into(),
        }
    }

    /// Parse `ITEM <name> [<size>; <idle>]`.
    fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix("ITEM ")?;
        let (name, bracket) = rest.rsplit_once(" [")?;
        let (size, idle) = bracket.strip_suffix(']')?.split_once("; ")?;
        Some(Self::new(name, size, idle))
    }
}

pub struct MemcachedStats {
    addr: String,
    reader: BufReader<TcpStream>,
}

impl MemcachedStats {
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addr = format!("{}:{}", host, port);
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr.as_str()))
            .await
            .map_err(|_| Error::ConnectTimeout(timeout, addr.clone()))??;

        tracing::debug!(addr = %addr, "Connected to memcached");

        Ok(Self {
            addr,
            reader: BufReader::new(stream),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Ids of the slab classes that currently hold items, ascending.
    pub async fn slab_ids(&mut self) -> Result<Vec<u32>> {
        let command = "stats items";
        let lines = self.query(command).await?;

        let mut ids = BTreeSet::new();
        for line in &lines {
            let id = line
                .strip_prefix("STAT items:")
                .and_then(|stat| stat.split_once(':'))
                .filter(|(_, field)| field.starts_with("number "))
                .map(|(id, _)| id.parse::<u32>());

            match id {
                Some(Ok(id)) => {
                    ids.insert(id);
                }
                Some(Err(_)) => return Err(malformed(command, line)),
                None if line.starts_with("STAT ") => {}
                None => return Err(malformed(command, line)),
            }
        }

        Ok(ids.into_iter().collect())
    }

    /// Dump the items of every slab class.
    ///
    /// `per_slab_limit` is forwarded to `stats cachedump` and caps each slab
    /// separately; 0 asks the server for everything it is willing to dump.
    pub async fn key_details(&mut self, per_slab_limit: u64) -> Result<Vec<KeyDetail>> {
        let mut details = Vec::new();
        for slab in self.slab_ids().await? {
            let command = format!("stats cachedump {} {}", slab, per_slab_limit);
            let lines = self.query(&command).await?;
            tracing::debug!(slab, items = lines.len(), "Dumped slab");

            for line in &lines {
                let detail = KeyDetail::parse(line).ok_or_else(|| malformed(&command, line))?;
                details.push(detail);
            }
        }
        Ok(details)
    }

    /// Send `command` and collect the reply lines preceding `END`.
    async fn query(&mut self, command: &str) -> Result<Vec<String>> {
        let stream = self.reader.get_mut();
        stream.write_all(command.as_bytes()).await?;
        stream.write_all(b"\r\n").await?;
        stream.flush().await?;

        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if self.reader.read_until(b'\n', &mut buf).await? == 0 {
                return Err(Error::ConnectionClosed(command.to_string()));
            }
            // Keys are arbitrary bytes; invalid UTF-8 becomes U+FFFD.
            let decoded = String::from_utf8_lossy(&buf);
            let line = decoded.trim_end_matches(['\r', '\n']);

            if line == "END" {
                return Ok(lines);
            }
            if line == "ERROR"
                || line.starts_with("CLIENT_ERROR")
                || line.starts_with("SERVER_ERROR")
            {
                return Err(Error::Server {
                    command: command.to_string(),
                    reply: line.to_string(),
                });
            }
            lines.push(line.to_string());
        }
    }
}

fn malformed(command: &str, line: &str) -> Error {
    Error::MalformedResponse {
        command: command.to_string(),
        line: line.to_string(),
    }
}
