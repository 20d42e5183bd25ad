/*
 * prepare.rs
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

//! Request preparation: validate the URL, resolve the target, finalize headers.
//!
//! No network access happens here; every failure is an `InvalidRequest`.

use url::{Host, Url};

use crate::protocol::http::config::HttpClientConfig;
use crate::protocol::http::error::{HttpError, HttpResult};
use crate::protocol::http::media_type::is_token;
use crate::protocol::http::request::{Method, RequestDescriptor, RequestSpec, Target};

pub const HTTP_DEFAULT_PORT: u16 = 80;
pub const HTTPS_DEFAULT_PORT: u16 = 443;

/// Turn a configured `RequestSpec` into an immutable descriptor.
pub fn prepare(spec: RequestSpec, config: &HttpClientConfig) -> HttpResult<RequestDescriptor> {
    let RequestSpec {
        method,
        url,
        mut headers,
        body,
    } = spec;

    let raw = url.ok_or_else(|| HttpError::InvalidRequest("no URL given".to_string()))?;
    let uri = Url::parse(&raw)
        .map_err(|e| HttpError::InvalidRequest(format!("URL '{}' is invalid: {}", raw, e)))?;

    let use_tls = match uri.scheme() {
        "https" => true,
        "http" => false,
        _ => {
            return Err(HttpError::InvalidRequest(format!(
                "URL '{}' is not a http url",
                uri
            )))
        }
    };

    if let Method::Other(token) = method {
        if !is_token(token) {
            return Err(HttpError::InvalidRequest(format!(
                "'{}' is not a valid method",
                token
            )));
        }
    }

    for (name, value) in headers.iter() {
        if !is_token(name) || value.bytes().any(|b| b == b'\r' || b == b'\n') {
            return Err(HttpError::InvalidRequest(format!(
                "invalid header '{}'",
                name
            )));
        }
    }

    let host = match uri.host() {
        Some(Host::Domain(d)) if !d.is_empty() => d.to_string(),
        Some(Host::Ipv4(ip)) => ip.to_string(),
        Some(Host::Ipv6(ip)) => ip.to_string(),
        _ => {
            return Err(HttpError::InvalidRequest(format!(
                "URL '{}' has no host",
                uri
            )))
        }
    };
    let default_port = if use_tls {
        HTTPS_DEFAULT_PORT
    } else {
        HTTP_DEFAULT_PORT
    };
    // Url::port() is None when the URL omits the port or names the scheme default.
    let explicit_port = uri.port();
    let port = explicit_port.unwrap_or(default_port);

    if !headers.contains("Host") {
        let host_str = uri.host_str().unwrap_or(&host);
        let value = match explicit_port {
            Some(p) => format!("{}:{}", host_str, p),
            None => host_str.to_string(),
        };
        headers.set("Host", value);
    }
    if let Some(agent) = &config.user_agent {
        if !headers.contains("User-Agent") {
            headers.set("User-Agent", agent.as_str());
        }
    }
    headers.set("Connection", "close");

    // The body is always sent whole, so framing comes from its actual length.
    let body = body.unwrap_or_default();
    headers.remove("Transfer-Encoding");
    if body.is_empty() {
        headers.remove("Content-Length");
    } else {
        headers.set("Content-Length", body.len().to_string());
    }

    let path = full_path(&uri);
    tracing::trace!(method = method.as_str(), %path, %host, port, use_tls, "request prepared");

    Ok(RequestDescriptor {
        method,
        path,
        headers,
        body,
        target: Target {
            host,
            port,
            use_tls,
        },
        uri,
    })
}

/// Raw path plus `?query`; the fragment is never sent.
fn full_path(uri: &Url) -> String {
    let path = if uri.path().is_empty() { "/" } else { uri.path() };
    match uri.query() {
        Some(q) => format!("{}?{}", path, q),
        None => path.to_string(),
    }
}
