/*
 * connection.rs
 * Copyright (C) 2026 The Portolano authors
 *
 * This file is part of Portolano, an asynchronous HTTP client engine.
 *
 * Portolano is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Portolano is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Portolano.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Connection dispatcher: one TCP (optionally TLS) stream bound to one exchange.
//!
//! A connection is opened per exchange and closed when the exchange ends; it is never
//! reused.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream as TokioTlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;

use crate::protocol::http::error::{HttpError, HttpResult};
use crate::protocol::http::request::Target;

const READ_CHUNK: usize = 8192;

/// Unified stream: plain TCP or TLS. Implements AsyncRead + AsyncWrite.
pub enum HttpStream {
    Plain(TcpStream),
    Tls(Box<TokioTlsStream<TcpStream>>),
}

impl AsyncRead for HttpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HttpStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Await `fut`, failing with `Timeout(what)` after `limit` when one is set.
pub(crate) async fn with_timeout<T, F>(
    limit: Option<Duration>,
    what: &'static str,
    fut: F,
) -> HttpResult<T>
where
    F: Future<Output = HttpResult<T>>,
{
    match limit {
        Some(d) => tokio::time::timeout(d, fut)
            .await
            .map_err(|_| HttpError::Timeout(what))?,
        None => fut.await,
    }
}

/// Live connection for one exchange.
pub struct Connection {
    stream: HttpStream,
}

impl Connection {
    /// Connect to the target and, when it asks for TLS, negotiate TLS with `connector`.
    ///
    /// A TCP failure is `ConnectFailed`; a handshake failure is `Tls`. The partially set up
    /// stream is dropped (closed) on either.
    pub async fn open(target: &Target, connector: Option<&TlsConnector>) -> HttpResult<Self> {
        let tcp = TcpStream::connect((target.host.as_str(), target.port))
            .await
            .map_err(|source| HttpError::ConnectFailed {
                host: target.host.clone(),
                port: target.port,
                source,
            })?;
        tcp.set_nodelay(true).ok();

        let stream = if target.use_tls {
            let connector = connector.ok_or_else(|| {
                HttpError::Tls(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "no TLS connector configured",
                ))
            })?;
            let server_name = ServerName::try_from(target.host.as_str())
                .map_err(|e| HttpError::Tls(io::Error::new(io::ErrorKind::InvalidInput, e)))?
                .to_owned();
            let tls = connector
                .connect(server_name, tcp)
                .await
                .map_err(HttpError::Tls)?;
            HttpStream::Tls(Box::new(tls))
        } else {
            HttpStream::Plain(tcp)
        };
        Ok(Self { stream })
    }

    pub fn is_secure(&self) -> bool {
        matches!(self.stream, HttpStream::Tls(_))
    }

    /// Write and flush the whole request.
    pub async fn write_request(&mut self, data: &[u8]) -> HttpResult<()> {
        self.stream
            .write_all(data)
            .await
            .map_err(HttpError::WriteFailed)?;
        self.stream.flush().await.map_err(HttpError::WriteFailed)?;
        tracing::trace!(bytes = data.len(), "request written");
        Ok(())
    }

    /// Read whatever is available into `buf`. Returns 0 at end of stream.
    pub async fn read(&mut self, buf: &mut BytesMut) -> HttpResult<usize> {
        let secure = self.is_secure();
        buf.reserve(READ_CHUNK);
        let n = self.stream.read_buf(buf).await.map_err(|e| {
            if secure && e.kind() == io::ErrorKind::InvalidData {
                HttpError::Tls(e)
            } else {
                HttpError::protocol(format!("read failed: {}", e))
            }
        })?;
        tracing::trace!(bytes = n, "response bytes read");
        Ok(n)
    }

    /// Shut down the write side (sending TLS close_notify when secure) and drop the socket.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            tracing::trace!(error = %e, "shutdown on close failed");
        }
    }
}
