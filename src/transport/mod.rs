// MIT License - Copyright (c) 2026 Peter Wright
// Transport abstraction

pub mod direct;

use std::future::Future;

use tokio::io::{AsyncRead, AsyncWrite};

pub use direct::TcpTransport;

/// Source of a duplex byte stream to the receiver.
///
/// Each call to `open` starts a new session; the connection reads lines from
/// the reader half on its own task and writes commands to the writer half.
pub trait Transport: Send + Sync + 'static {
    type Reader: AsyncRead + Unpin + Send + 'static;
    type Writer: AsyncWrite + Unpin + Send + 'static;

    fn open(&self) -> impl Future<Output = std::io::Result<(Self::Reader, Self::Writer)>> + Send;

    /// Human-readable peer description for logs.
    fn description(&self) -> String;
}
