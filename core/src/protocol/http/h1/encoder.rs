/*
 * encoder.rs
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

//! HTTP/1.1 request serialization.

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::http::request::RequestDescriptor;

/// Serialize request line, headers and body into one buffer ready to be written.
pub fn encode_request(request: &RequestDescriptor) -> Bytes {
    let head_len = request.method().as_str().len()
        + request.path().len()
        + request
            .headers()
            .iter()
            .map(|(k, v)| k.len() + v.len() + 4)
            .sum::<usize>()
        + 16;
    let mut out = BytesMut::with_capacity(head_len + request.body().len());
    out.put_slice(request.method().as_str().as_bytes());
    out.put_u8(b' ');
    out.put_slice(request.path().as_bytes());
    out.put_slice(b" HTTP/1.1\r\n");
    for (name, value) in request.headers().iter() {
        out.put_slice(name.as_bytes());
        out.put_slice(b": ");
        out.put_slice(value.as_bytes());
        out.put_slice(b"\r\n");
    }
    out.put_slice(b"\r\n");
    out.put_slice(request.body());
    out.freeze()
}
