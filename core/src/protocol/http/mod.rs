/*
 * mod.rs
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

//! HTTP/1.1 client engine: one exchange per connection, fully buffered responses.
//!
//! Pipeline per exchange: optional TLS → HTTP/1.1 codec (`h1`) → aggregation
//! (`aggregator`) → terminal handling (`exchange`), which assembles the `ReceivedResponse`
//! and completes the caller's promise.

mod aggregator;
mod buffer;
mod config;
mod error;
mod exchange;
mod headers;
mod media_type;
mod prepare;
mod request;
mod response;

pub mod client;
pub mod connection;
pub mod h1;

pub use aggregator::{FullResponse, ResponseAggregator};
pub use buffer::{retain_until_close, ByteBuf};
pub use client::HttpClient;
pub use config::{HttpClientConfig, DEFAULT_MAX_CONTENT_LENGTH};
pub use connection::{Connection, HttpStream};
pub use error::{ErrorKind, HttpError, HttpResult};
pub use exchange::ExchangeState;
pub use headers::HeaderMap;
pub use media_type::MediaType;
pub use prepare::{prepare, HTTP_DEFAULT_PORT, HTTPS_DEFAULT_PORT};
pub use request::{Method, RequestDescriptor, RequestSpec, Target};
pub use response::{assemble, ReceivedResponse, Status, TypedData};
