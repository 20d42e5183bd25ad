/*
 * exchange.rs
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

//! One request/response exchange, run as a cooperative task on the event loop.
//!
//! States: `Idle → Connecting → Connected → Sending → AwaitingResponse → Completed`, with
//! `Failed` reachable from every non-terminal state. The task suspends only while
//! connecting, writing, and waiting for response bytes. Whatever happens, the connection is
//! closed and the fulfiller is completed exactly once.

use std::sync::Arc;

use bytes::BytesMut;

use crate::exec::{ExecutionRef, Fulfiller};
use crate::net;
use crate::protocol::http::aggregator::{FullResponse, ResponseAggregator};
use crate::protocol::http::config::HttpClientConfig;
use crate::protocol::http::connection::{with_timeout, Connection};
use crate::protocol::http::error::HttpResult;
use crate::protocol::http::h1::{body_mode, encode_request, ParseState, ResponseParser};
use crate::protocol::http::request::{Method, RequestDescriptor};
use crate::protocol::http::response::{assemble, ReceivedResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Connecting,
    Connected,
    Sending,
    AwaitingResponse,
    Completed,
    Failed,
}

impl ExchangeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExchangeState::Completed | ExchangeState::Failed)
    }
}

pub(crate) struct Exchange {
    request: RequestDescriptor,
    config: Arc<HttpClientConfig>,
    execution: ExecutionRef,
    state: ExchangeState,
}

impl Exchange {
    pub(crate) fn new(
        request: RequestDescriptor,
        config: Arc<HttpClientConfig>,
        execution: ExecutionRef,
    ) -> Self {
        Self {
            request,
            config,
            execution,
            state: ExchangeState::Idle,
        }
    }

    fn transition(&mut self, next: ExchangeState) {
        tracing::debug!(
            host = %self.request.target.host,
            port = self.request.target.port,
            from = ?self.state,
            to = ?next,
            "exchange state"
        );
        self.state = next;
    }

    /// Drive the exchange to a terminal state and report the outcome.
    pub(crate) async fn run(mut self, fulfiller: Fulfiller<ReceivedResponse>) {
        match self.execute().await {
            Ok(response) => {
                self.transition(ExchangeState::Completed);
                fulfiller.success(response);
            }
            Err(error) => {
                self.transition(ExchangeState::Failed);
                tracing::debug!(error = %error, "exchange failed");
                fulfiller.error(error);
            }
        }
    }

    async fn execute(&mut self) -> HttpResult<ReceivedResponse> {
        self.transition(ExchangeState::Connecting);
        let connector = if self.request.target.use_tls {
            Some(net::http_connector())
        } else {
            None
        };
        let mut conn = with_timeout(
            self.config.connect_timeout,
            "connect",
            Connection::open(&self.request.target, connector),
        )
        .await?;
        self.transition(ExchangeState::Connected);

        let result = self.send_and_receive(&mut conn).await;
        conn.close().await;
        let message = result?;
        assemble(message, &self.execution)
    }

    async fn send_and_receive(&mut self, conn: &mut Connection) -> HttpResult<FullResponse> {
        self.transition(ExchangeState::Sending);
        let wire = encode_request(&self.request);
        conn.write_request(&wire).await?;

        self.transition(ExchangeState::AwaitingResponse);
        with_timeout(
            self.config.read_timeout,
            "response",
            read_response(conn, self.request.method, self.config.max_content_length),
        )
        .await
    }
}

/// Codec and aggregation stages: read until one complete response is aggregated.
async fn read_response(
    conn: &mut Connection,
    method: Method,
    max_content_length: usize,
) -> HttpResult<FullResponse> {
    let mut parser = ResponseParser::new();
    let mut aggregator = ResponseAggregator::new(max_content_length);
    let mut buf = BytesMut::new();
    loop {
        parser.receive(&mut buf, &mut aggregator)?;
        match parser.state() {
            ParseState::HeadersComplete => {
                let code = aggregator.received_status().map(|s| s.code).unwrap_or(0);
                if (100..200).contains(&code) && code != 101 {
                    tracing::trace!(code, "skipping interim response");
                    aggregator.discard_interim();
                    parser.reset();
                    continue;
                }
                let mode = body_mode(method, code, aggregator.headers())?;
                aggregator.check_body_mode(mode)?;
                parser.set_body_mode(mode, &mut aggregator);
                continue;
            }
            ParseState::Complete => break,
            _ => {}
        }
        if conn.read(&mut buf).await? == 0 {
            parser.finish(&mut aggregator)?;
            break;
        }
    }
    aggregator.into_full_response()
}
