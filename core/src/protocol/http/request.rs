/*
 * request.rs
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

//! HTTP request: method, URL, headers, optional body.
//!
//! Callers fill a `RequestSpec` through a configurator closure; preparation turns it into an
//! immutable `RequestDescriptor` bound to a `Target`.

use bytes::Bytes;
use url::Url;

use crate::protocol::http::headers::HeaderMap;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Other(&'static str),
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Other(s) => s,
        }
    }
}

/// Mutable request description handed to the caller's configurator.
///
/// Method defaults to GET. Headers set here are sent as given, except `Connection`, which
/// is always `close`.
#[derive(Debug, Clone, Default)]
pub struct RequestSpec {
    pub(crate) method: Method,
    pub(crate) url: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Bytes>,
}

impl RequestSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(&mut self, method: Method) -> &mut Self {
        self.method = method;
        self
    }

    pub fn url(&mut self, url: impl Into<String>) -> &mut Self {
        self.url = Some(url.into());
        self
    }

    /// Add a header value (multi-valued headers may repeat).
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.add(name, value);
        self
    }

    /// Replace all values of a header.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.set(name, value);
        self
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&mut self, data: impl Into<Bytes>) -> &mut Self {
        self.body = Some(data.into());
        self
    }

    /// Set body from a slice (copied).
    pub fn body_slice(&mut self, data: &[u8]) -> &mut Self {
        self.body = Some(Bytes::copy_from_slice(data));
        self
    }

    pub fn get_method(&self) -> Method {
        self.method
    }

    pub fn get_url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

/// Where an exchange connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Host as used for DNS / socket connect (IPv6 literals without brackets).
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
}

/// Immutable request, ready to be encoded.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub(crate) method: Method,
    pub(crate) uri: Url,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) target: Target,
}

impl RequestDescriptor {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Request target as sent on the request line (path plus query).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn target(&self) -> &Target {
        &self.target
    }
}
