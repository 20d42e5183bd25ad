/*
 * error.rs
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

//! HTTP exchange errors.
//!
//! Every failure is terminal for its exchange and is reported exactly once through the
//! exchange's promise. `kind()` folds the variants onto the coarse taxonomy callers match on.

use std::io;

/// Errors produced by an HTTP exchange.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// Unsupported scheme, unparsable URL, or malformed request description.
    /// Raised before any network activity.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// TCP connect to the target failed.
    #[error("connect to {host}:{port} failed: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Writing the request failed after the connection was established.
    #[error("request write failed: {0}")]
    WriteFailed(#[source] io::Error),

    /// Malformed response bytes, or a read error while receiving the response.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// TLS negotiation failed.
    #[error("TLS negotiation failed: {0}")]
    Tls(#[source] io::Error),

    /// The peer closed the connection before the response was complete.
    #[error("connection closed before response was complete")]
    ConnectionClosed,

    /// The aggregated response would exceed the configured maximum content length.
    #[error("response exceeds maximum content length of {limit} bytes")]
    ResponseTooLarge { limit: usize },

    /// A configured connect or read timeout elapsed.
    #[error("{0} timed out")]
    Timeout(&'static str),

    /// The exchange ended without reporting an outcome (its task was dropped).
    #[error("exchange abandoned without an outcome")]
    Abandoned,
}

/// Result type for HTTP exchange operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Coarse classification of an [`HttpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    ConnectFailed,
    WriteFailed,
    /// Malformed response, TLS negotiation failure, or premature close.
    Protocol,
    ResponseTooLarge,
    Timeout,
    Abandoned,
}

impl HttpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HttpError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            HttpError::ConnectFailed { .. } => ErrorKind::ConnectFailed,
            HttpError::WriteFailed(_) => ErrorKind::WriteFailed,
            HttpError::Protocol(_) | HttpError::Tls(_) | HttpError::ConnectionClosed => {
                ErrorKind::Protocol
            }
            HttpError::ResponseTooLarge { .. } => ErrorKind::ResponseTooLarge,
            HttpError::Timeout(_) => ErrorKind::Timeout,
            HttpError::Abandoned => ErrorKind::Abandoned,
        }
    }

    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        HttpError::Protocol(msg.into())
    }
}
