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

use std::{future::Future, time::Duration};

use rustls_pki_types::ServerName;
use tokio::{net::TcpStream, time};
use tokio_rustls::TlsConnector;
use tracing::{debug, trace};

use super::{
    stream::{LineBuffer, Stream},
    tls::handshake_error,
};

/// A connection to one mail exchanger.
///
/// Every read, write and handshake is bounded by the idle timeout, which
/// restarts whenever one of them completes. When it elapses the operation
/// fails with [`crate::Error::Timeout`].
pub struct Connection {
    stream: Stream,
    lines: LineBuffer,
    read_buf: Vec<u8>,
    timeout: Duration,
}

impl Connection {
    /// Opens a plaintext connection.
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> crate::Result<Self> {
        debug!("Connecting to {host}:{port}");
        let stream = with_timeout(timeout, async {
            TcpStream::connect((host, port))
                .await
                .map_err(crate::Error::from)
        })
        .await?;

        Ok(Connection {
            stream: Stream::Basic(stream),
            lines: LineBuffer::new(),
            read_buf: vec![0u8; 1024],
            timeout,
        })
    }

    /// Waits for the next complete reply line.
    pub async fn read_line(&mut self) -> crate::Result<String> {
        loop {
            if let Some(line) = self.lines.next_line() {
                trace!("<- {line:?}");
                return Ok(line);
            }

            let br = with_timeout(self.timeout, async {
                self.stream
                    .read(&mut self.read_buf)
                    .await
                    .map_err(crate::Error::from)
            })
            .await?;

            if br == 0 {
                return Err(crate::Error::ConnectionClosed);
            }

            self.lines.push(&self.read_buf[..br])?;
        }
    }

    /// Writes a single command line.
    pub async fn write_line(&mut self, line: &str) -> crate::Result<()> {
        trace!("-> {:?}", line);
        self.write_lines([line.as_bytes()]).await
    }

    /// Writes several lines and flushes them as one batch.
    ///
    /// The idle timeout applies to each line on its own, a slow peer that
    /// keeps accepting data never times out.
    pub async fn write_lines(
        &mut self,
        lines: impl IntoIterator<Item = impl AsRef<[u8]>>,
    ) -> crate::Result<()> {
        for line in lines {
            let line = line.as_ref();
            with_timeout(self.timeout, async {
                self.stream.write_all(line).await.map_err(crate::Error::from)
            })
            .await?;
        }

        with_timeout(self.timeout, async {
            self.stream.flush().await.map_err(crate::Error::from)
        })
        .await
    }

    /// Upgrades the connection to TLS in place.
    ///
    /// Replies buffered before the handshake are discarded, everything read
    /// afterwards comes from the encrypted stream.
    pub async fn start_tls(
        &mut self,
        tls_connector: &TlsConnector,
        hostname: &str,
    ) -> crate::Result<()> {
        let stream = match std::mem::take(&mut self.stream) {
            Stream::Basic(stream) => stream,
            stream => {
                self.stream = stream;
                return if self.is_secure() {
                    Ok(())
                } else {
                    Err(crate::Error::ConnectionClosed)
                };
            }
        };
        let server_name = ServerName::try_from(hostname)
            .map_err(|_| crate::Error::InvalidTLSName)?
            .to_owned();

        self.stream = Stream::Tls(
            with_timeout(self.timeout, async {
                tls_connector
                    .connect(server_name, stream)
                    .await
                    .map_err(handshake_error)
            })
            .await?,
        );
        self.lines.clear();
        debug!("Upgraded connection to {hostname} to TLS");

        Ok(())
    }

    pub fn is_secure(&self) -> bool {
        self.stream.is_secure()
    }

    /// Shuts the connection down. Errors are ignored, the socket is gone
    /// either way.
    pub async fn close(mut self) {
        let _ = time::timeout(self.timeout, self.stream.shutdown()).await;
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    f: impl Future<Output = crate::Result<T>>,
) -> crate::Result<T> {
    time::timeout(timeout, f)
        .await
        .map_err(|_| crate::Error::Timeout)?
}
