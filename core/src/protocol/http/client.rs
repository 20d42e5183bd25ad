/*
 * client.rs
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

//! HTTP client: prepare a request from a configurator, then run the exchange on the shared
//! event loop and hand back a promise of the response.

use std::sync::Arc;

use crate::exec::{ExecController, Execution, Promise};
use crate::protocol::http::config::HttpClientConfig;
use crate::protocol::http::error::HttpResult;
use crate::protocol::http::exchange::Exchange;
use crate::protocol::http::prepare::prepare;
use crate::protocol::http::request::{Method, RequestSpec};
use crate::protocol::http::response::ReceivedResponse;

/// HTTP client bound to an event loop and a configuration.
///
/// Every call opens a fresh connection, sends one request with `Connection: close`, and
/// buffers the whole response. The response body stays readable until `execution` closes.
#[derive(Clone)]
pub struct HttpClient {
    controller: ExecController,
    config: Arc<HttpClientConfig>,
}

impl HttpClient {
    pub fn new(controller: ExecController, config: HttpClientConfig) -> Self {
        Self {
            controller,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// GET (or whatever method the configurator sets).
    pub fn get<F>(&self, execution: &Execution, configure: F) -> HttpResult<Promise<ReceivedResponse>>
    where
        F: FnOnce(&mut RequestSpec),
    {
        self.request(execution, configure)
    }

    /// POST; the configurator runs afterwards and may still change the method.
    pub fn post<F>(&self, execution: &Execution, configure: F) -> HttpResult<Promise<ReceivedResponse>>
    where
        F: FnOnce(&mut RequestSpec),
    {
        self.request(execution, |spec| {
            spec.method(Method::Post);
            configure(spec);
        })
    }

    /// Configure and dispatch a request.
    ///
    /// An invalid request fails here, before any network activity. Every other failure is
    /// reported through the returned promise.
    pub fn request<F>(
        &self,
        execution: &Execution,
        configure: F,
    ) -> HttpResult<Promise<ReceivedResponse>>
    where
        F: FnOnce(&mut RequestSpec),
    {
        let mut spec = RequestSpec::new();
        configure(&mut spec);
        let request = prepare(spec, &self.config)?;
        tracing::debug!(
            method = request.method().as_str(),
            url = %request.uri(),
            "dispatching request"
        );
        let exchange = Exchange::new(request, self.config.clone(), execution.downgrade());
        Ok(self.controller.promise(move |fulfiller| exchange.run(fulfiller)))
    }
}
