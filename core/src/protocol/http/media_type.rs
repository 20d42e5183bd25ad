/*
 * media_type.rs
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

//! Media type of a response body, from the `Content-Type` header (RFC 9110 §8.3).

use std::fmt;

/// Checks if a byte is valid in an HTTP token (RFC 9110 `tchar`).
#[inline]
pub fn is_token_char(c: u8) -> bool {
    matches!(c,
        b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' |
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
        b'^' | b'_' | b'`' | b'|' | b'~'
    )
}

/// Checks if the string is a valid token (1+ token chars).
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_char)
}

/// Parsed media type. Type and subtype are lower-cased; parameter names too.
///
/// The unknown media type (absent or unparsable header) has empty type and subtype.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaType {
    primary_type: String,
    sub_type: String,
    parameters: Vec<(String, String)>,
}

impl MediaType {
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Media type for an optional `Content-Type` value, falling back to unknown.
    pub fn from_header(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or_default()
    }

    /// Parse a `Content-Type` value: `type/subtype *(; name=value)`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (type_part, params_part) = match value.find(';') {
            Some(i) => (value[..i].trim(), &value[i + 1..]),
            None => (value, ""),
        };
        let slash = type_part.find('/')?;
        let primary = type_part[..slash].trim();
        let sub = type_part[slash + 1..].trim();
        if !is_token(primary) || !is_token(sub) {
            return None;
        }
        Some(Self {
            primary_type: primary.to_ascii_lowercase(),
            sub_type: sub.to_ascii_lowercase(),
            parameters: parse_parameters(params_part),
        })
    }

    pub fn is_unknown(&self) -> bool {
        self.primary_type.is_empty()
    }

    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }

    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    /// `type/subtype` without parameters; empty for the unknown type.
    pub fn essence(&self) -> String {
        if self.is_unknown() {
            String::new()
        } else {
            format!("{}/{}", self.primary_type, self.sub_type)
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    pub fn is_text(&self) -> bool {
        self.primary_type == "text"
    }

    pub fn is_json(&self) -> bool {
        self.primary_type == "application"
            && (self.sub_type == "json" || self.sub_type.ends_with("+json"))
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return Ok(());
        }
        write!(f, "{}/{}", self.primary_type, self.sub_type)?;
        for (name, value) in &self.parameters {
            if is_token(value) {
                write!(f, ";{}={}", name, value)?;
            } else {
                write!(f, ";{}=\"{}\"", name, value.replace('\\', "\\\\").replace('"', "\\\""))?;
            }
        }
        Ok(())
    }
}

/// Semicolon-separated `name=value` / `name="quoted"` list. Malformed entries are skipped.
fn parse_parameters(params: &str) -> Vec<(String, String)> {
    let bytes = params.as_bytes();
    let len = bytes.len();
    let mut out = Vec::new();
    let mut pos = 0;

    while pos < len {
        while pos < len && (bytes[pos] == b';' || bytes[pos].is_ascii_whitespace()) {
            pos += 1;
        }
        if pos >= len {
            break;
        }
        let end_of_entry = bytes[pos..]
            .iter()
            .position(|&b| b == b';')
            .map(|i| pos + i)
            .unwrap_or(len);
        let eq = match bytes[pos..end_of_entry].iter().position(|&b| b == b'=') {
            Some(i) => pos + i,
            None => {
                pos = end_of_entry;
                continue;
            }
        };
        let name = params[pos..eq].trim();
        pos = eq + 1;
        let value = if pos < len && bytes[pos] == b'"' {
            pos += 1;
            let mut v = Vec::new();
            while pos < len {
                let c = bytes[pos];
                if c == b'\\' && pos + 1 < len {
                    v.push(bytes[pos + 1]);
                    pos += 2;
                } else if c == b'"' {
                    pos += 1;
                    break;
                } else {
                    v.push(c);
                    pos += 1;
                }
            }
            // Skip anything between the closing quote and the next ';'.
            while pos < len && bytes[pos] != b';' {
                pos += 1;
            }
            String::from_utf8_lossy(&v).into_owned()
        } else {
            let end = bytes[pos..]
                .iter()
                .position(|&b| b == b';')
                .map(|i| pos + i)
                .unwrap_or(len);
            let v = params[pos..end].trim().to_string();
            pos = end;
            v
        };
        if is_token(name) {
            out.push((name.to_ascii_lowercase(), value));
        }
    }
    out
}
