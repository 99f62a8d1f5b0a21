/*
 * Copyright Stalwart Labs Ltd. See the COPYING
 * file at the top-level directory of this distribution.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

/// Longest reply line accepted before a line terminator shows up.
pub const MAX_LINE_LENGTH: usize = 4096;

#[allow(clippy::large_enum_variant)]
#[doc(hidden)]
#[derive(Default)]
pub enum Stream {
    Basic(TcpStream),
    Tls(tokio_rustls::client::TlsStream<TcpStream>),
    #[default]
    None,
}

impl Stream {
    pub(crate) async fn read(&mut self, buf: &mut [u8]) -> tokio::io::Result<usize> {
        match self {
            Stream::Basic(stream) => stream.read(buf).await,
            Stream::Tls(stream) => stream.read(buf).await,
            Stream::None => Err(not_connected()),
        }
    }

    pub(crate) async fn write_all(&mut self, bytes: &[u8]) -> tokio::io::Result<()> {
        match self {
            Stream::Basic(stream) => stream.write_all(bytes).await,
            Stream::Tls(stream) => stream.write_all(bytes).await,
            Stream::None => Err(not_connected()),
        }
    }

    pub(crate) async fn flush(&mut self) -> tokio::io::Result<()> {
        match self {
            Stream::Basic(stream) => stream.flush().await,
            Stream::Tls(stream) => stream.flush().await,
            Stream::None => Ok(()),
        }
    }

    pub(crate) async fn shutdown(&mut self) -> tokio::io::Result<()> {
        match self {
            Stream::Basic(stream) => stream.shutdown().await,
            Stream::Tls(stream) => stream.shutdown().await,
            Stream::None => Ok(()),
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Stream::Tls(_))
    }
}

fn not_connected() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::NotConnected, "Stream is not connected")
}

/// Splits received bytes into reply lines.
///
/// A line is only handed out once its `\n` has arrived, so a reply split
/// across several reads is never dispatched half-way.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends received bytes.
    pub fn push(&mut self, bytes: &[u8]) -> crate::Result<()> {
        self.buf.extend_from_slice(bytes);
        if self.buf.len() > MAX_LINE_LENGTH && !self.buf.contains(&b'\n') {
            self.buf.clear();
            Err(crate::Error::ReplyTooLong)
        } else {
            Ok(())
        }
    }

    /// Returns the next complete line without its terminator.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|byte| *byte == b'\n')?;
        let mut line = self.buf.drain(..=pos).collect::<Vec<_>>();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Discards a partially received line.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
