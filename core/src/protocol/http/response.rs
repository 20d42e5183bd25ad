/*
 * response.rs
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

//! Received response: status, headers, typed body; and assembly from an aggregated message.

use std::fmt;

use bytes::Bytes;

use crate::exec::ExecutionRef;
use crate::protocol::http::aggregator::FullResponse;
use crate::protocol::http::buffer::{retain_until_close, ByteBuf};
use crate::protocol::http::error::{HttpError, HttpResult};
use crate::protocol::http::headers::HeaderMap;
use crate::protocol::http::media_type::MediaType;

/// Response status: code and reason phrase (possibly empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: u16,
    pub reason: String,
}

impl Status {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.code)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_redirection(&self) -> bool {
        (300..400).contains(&self.code)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} {}", self.code, self.reason)
        }
    }
}

/// Response body tagged with its media type. Always present; possibly zero-length.
///
/// The backing buffer is released when the execution that received the response closes;
/// after that `bytes()` is empty.
#[derive(Debug)]
pub struct TypedData {
    content_type: MediaType,
    buffer: ByteBuf,
}

impl TypedData {
    pub fn new(content_type: MediaType, buffer: ByteBuf) -> Self {
        Self {
            content_type,
            buffer,
        }
    }

    pub fn content_type(&self) -> &MediaType {
        &self.content_type
    }

    pub fn bytes(&self) -> Bytes {
        self.buffer.bytes().unwrap_or_default()
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &ByteBuf {
        &self.buffer
    }
}

/// A complete response delivered to the caller.
#[derive(Debug)]
pub struct ReceivedResponse {
    status: Status,
    headers: HeaderMap,
    body: TypedData,
}

impl ReceivedResponse {
    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.code
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &TypedData {
        &self.body
    }
}

/// Build the caller's response from an aggregated message.
///
/// The message's own buffer reference is released once the caller's reference has been
/// registered with `execution`.
pub fn assemble(message: FullResponse, execution: &ExecutionRef) -> HttpResult<ReceivedResponse> {
    let FullResponse {
        status,
        headers,
        content,
    } = message;
    let content_type = MediaType::from_header(headers.get("Content-Type"));
    let retained = retain_until_close(&content, execution);
    content.release();
    let buffer = retained.ok_or(HttpError::Abandoned)?;
    Ok(ReceivedResponse {
        status,
        headers,
        body: TypedData::new(content_type, buffer),
    })
}
