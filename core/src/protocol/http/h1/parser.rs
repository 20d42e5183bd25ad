/*
 * parser.rs
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

//! HTTP/1.1 response push parser: status line, headers, body (Content-Length, chunked, or
//! read-until-close).
//!
//! Feed bytes with `receive`; the handler is invoked as complete tokens are parsed. The parser
//! stops in `HeadersComplete` so the caller can inspect status and headers and choose the body
//! mode (see [`body_mode`]) before body bytes are consumed.

use bytes::{Buf, BytesMut};

use crate::protocol::http::error::{HttpError, HttpResult};
use crate::protocol::http::headers::HeaderMap;
use crate::protocol::http::media_type::is_token;
use crate::protocol::http::request::Method;

/// Longest status, header, chunk-size or trailer line accepted.
pub const MAX_LINE_LENGTH: usize = 8192;

/// Callback for HTTP/1.1 response events.
pub trait H1ResponseHandler {
    fn status(&mut self, code: u16, reason: &str);
    fn header(&mut self, name: &str, value: &str);
    /// Body bytes, in order. An error aborts parsing and is returned from `receive`.
    fn body_chunk(&mut self, data: &[u8]) -> HttpResult<()>;
    fn trailer(&mut self, name: &str, value: &str);
    fn complete(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    StatusLine,
    Headers,
    /// Headers done; caller must call `set_body_mode()` (or `reset()` for an interim 1xx).
    HeadersComplete,
    Body,
    ChunkSize,
    ChunkData,
    ChunkDataEnd,
    ChunkTrailer,
    /// Response fully parsed.
    Complete,
}

/// How the response body is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// No body (HEAD, 1xx, 204, 304).
    Empty,
    Length(u64),
    Chunked,
    /// Body runs until the peer closes the connection.
    UntilClose,
}

/// Push parser for one HTTP/1.1 response.
pub struct ResponseParser {
    state: ParseState,
    mode: BodyMode,
    /// Bytes left in the current fixed-length body or chunk.
    remaining: u64,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::StatusLine,
            mode: BodyMode::Empty,
            remaining: 0,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == ParseState::Complete
    }

    /// Prepare for the next response head (after an interim 1xx).
    pub fn reset(&mut self) {
        self.state = ParseState::StatusLine;
        self.mode = BodyMode::Empty;
        self.remaining = 0;
    }

    fn find_crlf(buf: &[u8]) -> Option<usize> {
        buf.windows(2).position(|w| w == b"\r\n")
    }

    /// Split one CRLF-terminated line off `buf`, without the CRLF. `None` if incomplete.
    fn take_line(buf: &mut BytesMut, what: &str) -> HttpResult<Option<String>> {
        match Self::find_crlf(buf) {
            Some(n) => {
                if n > MAX_LINE_LENGTH {
                    return Err(HttpError::protocol(format!("{} line too long", what)));
                }
                let line = buf.split_to(n + 2);
                let s = std::str::from_utf8(&line[..n])
                    .map_err(|_| HttpError::protocol(format!("invalid {} encoding", what)))?;
                Ok(Some(s.to_string()))
            }
            None if buf.len() > MAX_LINE_LENGTH => {
                Err(HttpError::protocol(format!("{} line too long", what)))
            }
            None => Ok(None),
        }
    }

    /// Consume and parse as much as possible from `buf`. Partial tokens stay in `buf`.
    pub fn receive<H: H1ResponseHandler>(
        &mut self,
        buf: &mut BytesMut,
        handler: &mut H,
    ) -> HttpResult<()> {
        while !buf.is_empty() {
            match self.state {
                ParseState::StatusLine => {
                    let Some(line) = Self::take_line(buf, "status")? else {
                        return Ok(());
                    };
                    // Tolerate stray blank lines before the status line.
                    if line.is_empty() {
                        continue;
                    }
                    let (code, reason) = parse_status_line(&line)?;
                    handler.status(code, reason);
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    let Some(line) = Self::take_line(buf, "header")? else {
                        return Ok(());
                    };
                    if line.is_empty() {
                        self.state = ParseState::HeadersComplete;
                        return Ok(());
                    }
                    let (name, value) = parse_header_line(&line)?;
                    handler.header(name, value);
                }
                ParseState::HeadersComplete | ParseState::Complete => return Ok(()),
                ParseState::Body => {
                    if self.mode == BodyMode::UntilClose {
                        let chunk = buf.split();
                        handler.body_chunk(&chunk)?;
                        return Ok(());
                    }
                    let take = self.remaining.min(buf.len() as u64) as usize;
                    let chunk = buf.split_to(take);
                    handler.body_chunk(&chunk)?;
                    self.remaining -= take as u64;
                    if self.remaining == 0 {
                        handler.complete();
                        self.state = ParseState::Complete;
                    }
                }
                ParseState::ChunkSize => {
                    let Some(line) = Self::take_line(buf, "chunk size")? else {
                        return Ok(());
                    };
                    let hex = line.split(';').next().unwrap_or("").trim();
                    self.remaining = u64::from_str_radix(hex, 16).map_err(|_| {
                        HttpError::protocol(format!("invalid chunk size '{}'", hex))
                    })?;
                    self.state = if self.remaining == 0 {
                        ParseState::ChunkTrailer
                    } else {
                        ParseState::ChunkData
                    };
                }
                ParseState::ChunkData => {
                    let take = self.remaining.min(buf.len() as u64) as usize;
                    let chunk = buf.split_to(take);
                    handler.body_chunk(&chunk)?;
                    self.remaining -= take as u64;
                    if self.remaining == 0 {
                        self.state = ParseState::ChunkDataEnd;
                    }
                }
                ParseState::ChunkDataEnd => {
                    if buf.len() < 2 {
                        return Ok(());
                    }
                    if &buf[..2] != b"\r\n" {
                        return Err(HttpError::protocol("missing CRLF after chunk data"));
                    }
                    buf.advance(2);
                    self.state = ParseState::ChunkSize;
                }
                ParseState::ChunkTrailer => {
                    let Some(line) = Self::take_line(buf, "trailer")? else {
                        return Ok(());
                    };
                    if line.is_empty() {
                        handler.complete();
                        self.state = ParseState::Complete;
                    } else {
                        let (name, value) = parse_header_line(&line)?;
                        handler.trailer(name, value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Choose how the body is read. Only valid in `HeadersComplete`.
    pub fn set_body_mode<H: H1ResponseHandler>(&mut self, mode: BodyMode, handler: &mut H) {
        if self.state != ParseState::HeadersComplete {
            return;
        }
        self.mode = mode;
        match mode {
            BodyMode::Empty | BodyMode::Length(0) => {
                handler.complete();
                self.state = ParseState::Complete;
            }
            BodyMode::Length(n) => {
                self.remaining = n;
                self.state = ParseState::Body;
            }
            BodyMode::Chunked => self.state = ParseState::ChunkSize,
            BodyMode::UntilClose => self.state = ParseState::Body,
        }
    }

    /// The peer closed the connection. Completes a read-until-close body; anything else
    /// short of a complete response is an error.
    pub fn finish<H: H1ResponseHandler>(&mut self, handler: &mut H) -> HttpResult<()> {
        match self.state {
            ParseState::Complete => Ok(()),
            ParseState::Body if self.mode == BodyMode::UntilClose => {
                handler.complete();
                self.state = ParseState::Complete;
                Ok(())
            }
            _ => Err(HttpError::ConnectionClosed),
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// `HTTP/1.x SP code [SP reason]`.
fn parse_status_line(line: &str) -> HttpResult<(u16, &str)> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or("");
    if !version.starts_with("HTTP/1.") {
        return Err(HttpError::protocol(format!("invalid status line '{}'", line)));
    }
    let code_str = parts.next().unwrap_or("");
    let code = match code_str.parse::<u16>() {
        Ok(c) if code_str.len() == 3 && (100..=999).contains(&c) => c,
        _ => return Err(HttpError::protocol(format!("invalid status code '{}'", code_str))),
    };
    Ok((code, parts.next().unwrap_or("").trim()))
}

fn parse_header_line(line: &str) -> HttpResult<(&str, &str)> {
    let colon = line
        .find(':')
        .ok_or_else(|| HttpError::protocol(format!("invalid header line '{}'", line)))?;
    let name = &line[..colon];
    if !is_token(name) {
        return Err(HttpError::protocol(format!("invalid header name '{}'", name)));
    }
    Ok((name, line[colon + 1..].trim()))
}

/// Decide how the body of a response to `method` is delimited (RFC 9112 §6.3).
pub fn body_mode(method: Method, code: u16, headers: &HeaderMap) -> HttpResult<BodyMode> {
    if method == Method::Head || (100..200).contains(&code) || code == 204 || code == 304 {
        return Ok(BodyMode::Empty);
    }
    if let Some(te) = headers.get_all("Transfer-Encoding").last() {
        let last_coding = te.rsplit(',').next().unwrap_or("").trim();
        return Ok(if last_coding.eq_ignore_ascii_case("chunked") {
            BodyMode::Chunked
        } else {
            BodyMode::UntilClose
        });
    }
    let mut length: Option<u64> = None;
    for value in headers.get_all("Content-Length") {
        for v in value.split(',') {
            let n = v.trim().parse::<u64>().map_err(|_| {
                HttpError::protocol(format!("invalid Content-Length '{}'", value))
            })?;
            match length {
                Some(prev) if prev != n => {
                    return Err(HttpError::protocol("conflicting Content-Length values"))
                }
                _ => length = Some(n),
            }
        }
    }
    Ok(match length {
        Some(n) => BodyMode::Length(n),
        None => BodyMode::UntilClose,
    })
}
