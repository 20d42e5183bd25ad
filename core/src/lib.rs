/*
 * lib.rs
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

//! Portolano core: asynchronous HTTP/1.1 request/response engine.
//!
//! - `exec`: event-loop handle, execution scopes with cleanup hooks, single-assignment promises.
//! - `net`: TLS client configuration (system trust store).
//! - `protocol::http`: request preparation, connection dispatch, HTTP/1.1 codec, response
//!   aggregation and assembly, scoped body buffers.
//!
//! ```no_run
//! use portolano_core::exec::{ExecController, Execution};
//! use portolano_core::protocol::http::{HttpClient, HttpClientConfig};
//!
//! # async fn demo() -> Result<(), portolano_core::protocol::http::HttpError> {
//! let client = HttpClient::new(ExecController::current().unwrap(), HttpClientConfig::default());
//! let execution = Execution::new();
//! let response = client
//!     .get(&execution, |spec| {
//!         spec.url("http://example.test/foo?x=1");
//!     })?
//!     .await?;
//! println!("{} ({} bytes)", response.status(), response.body().len());
//! # Ok(())
//! # }
//! ```

pub mod exec;
pub mod net;
pub mod protocol;
