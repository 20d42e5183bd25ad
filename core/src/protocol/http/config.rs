/*
 * config.rs
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

//! HTTP client configuration.

use std::time::Duration;

/// Default aggregation limit: 10 MiB.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Configuration shared by every exchange an `HttpClient` dispatches.
///
/// No timeouts are applied unless set; an unresponsive peer otherwise holds the exchange
/// until it closes or errors.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Largest response body the aggregation stage will buffer.
    pub max_content_length: usize,
    /// Bound on TCP connect plus TLS handshake.
    pub connect_timeout: Option<Duration>,
    /// Bound on receiving the complete response once the request is written.
    pub read_timeout: Option<Duration>,
    /// Sent as `User-Agent` when the request does not carry one.
    pub user_agent: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            connect_timeout: None,
            read_timeout: None,
            user_agent: None,
        }
    }
}

impl HttpClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_content_length(mut self, bytes: usize) -> Self {
        self.max_content_length = bytes;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}
