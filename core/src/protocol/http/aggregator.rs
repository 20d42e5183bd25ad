/*
 * aggregator.rs
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

//! Aggregation stage: collects one response (status, headers, body) into a `FullResponse`,
//! bounded by a maximum content length.

use bytes::BytesMut;

use crate::protocol::http::buffer::ByteBuf;
use crate::protocol::http::error::{HttpError, HttpResult};
use crate::protocol::http::h1::{BodyMode, H1ResponseHandler};
use crate::protocol::http::headers::HeaderMap;
use crate::protocol::http::response::Status;

/// One complete response message. `content` holds one reference owned by whoever holds
/// the message.
#[derive(Debug)]
pub struct FullResponse {
    pub status: Status,
    pub headers: HeaderMap,
    pub content: ByteBuf,
}

/// Buffers parser events until the message is complete.
pub struct ResponseAggregator {
    max_content_length: usize,
    status: Option<Status>,
    headers: HeaderMap,
    body: BytesMut,
    complete: bool,
}

impl ResponseAggregator {
    pub fn new(max_content_length: usize) -> Self {
        Self {
            max_content_length,
            status: None,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            complete: false,
        }
    }

    pub fn received_status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Reject a declared length over the limit before any body is read.
    pub fn check_body_mode(&mut self, mode: BodyMode) -> HttpResult<()> {
        if let BodyMode::Length(n) = mode {
            if n > self.max_content_length as u64 {
                return Err(HttpError::ResponseTooLarge {
                    limit: self.max_content_length,
                });
            }
            self.body.reserve(n as usize);
        }
        Ok(())
    }

    /// Drop an interim (1xx) response head so the final response can follow.
    pub fn discard_interim(&mut self) {
        self.status = None;
        self.headers = HeaderMap::new();
    }

    pub fn into_full_response(self) -> HttpResult<FullResponse> {
        match (self.complete, self.status) {
            (true, Some(status)) => Ok(FullResponse {
                status,
                headers: self.headers,
                content: ByteBuf::new(self.body.freeze()),
            }),
            _ => Err(HttpError::ConnectionClosed),
        }
    }
}

impl H1ResponseHandler for ResponseAggregator {
    fn status(&mut self, code: u16, reason: &str) {
        self.status = Some(Status::new(code, reason));
    }

    fn header(&mut self, name: &str, value: &str) {
        self.headers.add(name, value);
    }

    fn body_chunk(&mut self, data: &[u8]) -> HttpResult<()> {
        if self.body.len() + data.len() > self.max_content_length {
            return Err(HttpError::ResponseTooLarge {
                limit: self.max_content_length,
            });
        }
        self.body.extend_from_slice(data);
        Ok(())
    }

    /// Trailers are merged into the response headers.
    fn trailer(&mut self, name: &str, value: &str) {
        self.headers.add(name, value);
    }

    fn complete(&mut self) {
        self.complete = true;
    }
}
