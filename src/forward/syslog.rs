//! Syslog over UDP, one datagram per line
//!
//! Frames follow the BSD layout most collectors accept:
//! `<PRI>TIMESTAMP HOSTNAME TAG[PID]: MESSAGE\n`

use std::env;
use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use time::OffsetDateTime;
use time::macros::format_description;
use tokio::net::UdpSocket;
use tracing::info;

use super::{ForwardError, LineSink};

pub struct SyslogSink {
    socket: UdpSocket,
    priority: u8,
    tag: String,
    hostname: String,
    pid: u32,
}

impl SyslogSink {
    /// Resolve `target` and bind a local socket connected to it
    pub async fn connect(target: &str, priority: u8, tag: &str) -> Result<Self, ForwardError> {
        let addr = tokio::net::lookup_host(target)
            .await
            .map_err(|source| ForwardError::Resolve {
                target: target.to_string(),
                source,
            })?
            .next()
            .ok_or_else(|| ForwardError::NoAddress(target.to_string()))?;

        let local: SocketAddr = match addr {
            SocketAddr::V4(_) => ([0, 0, 0, 0], 0).into(),
            SocketAddr::V6(_) => ([0u16; 8], 0).into(),
        };

        let socket_err = |source| ForwardError::Socket {
            target: target.to_string(),
            source,
        };
        let socket = UdpSocket::bind(local).await.map_err(socket_err)?;
        socket.connect(addr).await.map_err(socket_err)?;

        info!(%addr, priority, tag, "Forwarding to syslog");

        Ok(Self {
            socket,
            priority,
            tag: tag.to_string(),
            hostname: hostname(),
            pid: std::process::id(),
        })
    }

    fn frame(&self, line: &[u8], now: OffsetDateTime) -> Vec<u8> {
        let stamp = now
            .format(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
            ))
            .unwrap_or_default();

        let mut frame = format!(
            "<{}>{} {} {}[{}]: ",
            self.priority, stamp, self.hostname, self.tag, self.pid
        )
        .into_bytes();
        frame.extend_from_slice(line);
        frame.push(b'\n');
        frame
    }
}

#[async_trait]
impl LineSink for SyslogSink {
    async fn send(&self, line: &[u8]) -> io::Result<()> {
        let frame = self.frame(line, OffsetDateTime::now_utc());
        self.socket.send(&frame).await.map(|_| ())
    }
}

/// Host name for the syslog header: `HOSTNAME`, then the system's, then `localhost`
fn hostname() -> String {
    resolve_hostname(env::var("HOSTNAME").ok())
}

fn resolve_hostname(from_env: Option<String>) -> String {
    if let Some(name) = from_env.filter(|name| !name.is_empty()) {
        return name;
    }

    system_hostname().unwrap_or_else(|| "localhost".to_string())
}

#[cfg(unix)]
fn system_hostname() -> Option<String> {
    match nix::unistd::gethostname() {
        Ok(name) => name.into_string().ok().filter(|name| !name.is_empty()),
        Err(e) => {
            tracing::debug!(error = %e, "gethostname failed");
            None
        }
    }
}

#[cfg(not(unix))]
fn system_hostname() -> Option<String> {
    None
}
