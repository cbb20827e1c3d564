// MIT License - Copyright (c) 2026 Peter Wright
// Direct TCP transport

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;
use tracing::{debug, error};

use crate::config::AvrConfig;
use crate::transport::Transport;

/// Direct TCP transport to the receiver's IP control port.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    address: String,
    connect_timeout: Duration,
}

impl TcpTransport {
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
        }
    }

    pub fn from_config(config: &AvrConfig) -> Self {
        Self::new(config.address(), config.connect_timeout())
    }
}

impl Transport for TcpTransport {
    type Reader = OwnedReadHalf;
    type Writer = OwnedWriteHalf;

    async fn open(&self) -> std::io::Result<(OwnedReadHalf, OwnedWriteHalf)> {
        let stream = match timeout(self.connect_timeout, TcpStream::connect(&self.address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                error!("TCP connect to {} failed: {}", self.address, e);
                return Err(e);
            }
            Err(_) => {
                error!("TCP connect to {} timed out", self.address);
                return Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect to {} timed out", self.address),
                ));
            }
        };
        // Commands are a few bytes each; send them immediately.
        stream.set_nodelay(true)?;
        debug!("TCP socket connected to {}", self.address);
        Ok(stream.into_split())
    }

    fn description(&self) -> String {
        self.address.clone()
    }
}
