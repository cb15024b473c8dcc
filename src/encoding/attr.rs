// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0
//! Attribute stream.
//!
//! An encoded structure is a sequence of attributes in one of two forms:
//!
//! ```text
//! name=value;          ascii-safe value (decimal or hex digits)
//! name:LEN=BYTES;      LEN raw bytes, delimited by length only
//! ```
//!
//! Names consist of ASCII letters and digits.
use std::collections::HashMap;

use crate::buffer::{Buffer, find_bytes};
use crate::error::WebAuthError;

/// Writes attributes into a [`Buffer`].
pub struct AttrWriter<'a> {
    buf: &'a mut Buffer,
}

impl<'a> AttrWriter<'a> {
    pub fn new(buf: &'a mut Buffer) -> Self {
        Self { buf }
    }

    /// Write an ascii-safe attribute.
    pub fn ascii(&mut self, name: &str, value: &[u8]) -> Result<(), WebAuthError> {
        check_name(name)?;
        if value.iter().any(|c| !c.is_ascii_graphic() || *c == b';') {
            return Err(WebAuthError::invalid(format!(
                "value of attribute {name} is not ascii-safe"
            )));
        }
        self.buf.append(name.as_bytes());
        self.buf.append(b"=");
        self.buf.append(value);
        self.buf.append(b";");
        Ok(())
    }

    /// Write a length-delimited binary attribute.
    pub fn binary(&mut self, name: &str, value: &[u8]) -> Result<(), WebAuthError> {
        check_name(name)?;
        self.buf
            .append_fmt(format_args!("{name}:{}=", value.len()));
        self.buf.append(value);
        self.buf.append(b";");
        Ok(())
    }
}

fn check_name(name: &str) -> Result<(), WebAuthError> {
    if name.is_empty() || !name.bytes().all(|c| c.is_ascii_alphanumeric()) {
        return Err(WebAuthError::invalid(format!(
            "invalid attribute name {name:?}"
        )));
    }
    Ok(())
}

/// One decoded attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Vec<u8>,
    /// Whether the attribute used the ascii-safe form.
    pub ascii: bool,
}

/// Attributes of an encoded structure, in stream order.
///
/// Decoders [`take`](Attributes::take) the attributes they recognize; what
/// remains afterwards was not described by the schema.
#[derive(Debug, Default)]
pub struct Attributes {
    slots: Vec<Option<Attribute>>,
    index: HashMap<String, usize>,
}

impl Attributes {
    /// Parse an attribute stream in a single pass.
    pub fn parse(input: &[u8]) -> Result<Self, WebAuthError> {
        let mut attrs = Self::default();
        let mut pos = 0;
        while pos < input.len() {
            let start = pos;
            while pos < input.len() && input[pos].is_ascii_alphanumeric() {
                pos += 1;
            }
            if pos == start {
                return Err(WebAuthError::corrupt(format!(
                    "missing attribute name at offset {start}"
                )));
            }
            let name = String::from_utf8_lossy(&input[start..pos]).into_owned();
            let attr = match input.get(pos) {
                Some(b'=') => {
                    let value_start = pos + 1;
                    let end = find_bytes(input, b";", value_start).ok_or_else(|| {
                        WebAuthError::corrupt(format!("unterminated attribute {name}"))
                    })?;
                    pos = end + 1;
                    Attribute {
                        name,
                        value: input[value_start..end].to_vec(),
                        ascii: true,
                    }
                }
                Some(b':') => {
                    let len_start = pos + 1;
                    let len_end = find_bytes(input, b"=", len_start).ok_or_else(|| {
                        WebAuthError::corrupt(format!("missing length of attribute {name}"))
                    })?;
                    let len = std::str::from_utf8(&input[len_start..len_end])
                        .ok()
                        .filter(|s| !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit()))
                        .and_then(|s| s.parse::<usize>().ok())
                        .ok_or_else(|| {
                            WebAuthError::corrupt(format!("invalid length of attribute {name}"))
                        })?;
                    let value_start = len_end + 1;
                    let end = value_start
                        .checked_add(len)
                        .filter(|end| *end < input.len())
                        .ok_or_else(|| {
                            WebAuthError::corrupt(format!("truncated attribute {name}"))
                        })?;
                    if input[end] != b';' {
                        return Err(WebAuthError::corrupt(format!(
                            "attribute {name} not terminated after {len} bytes"
                        )));
                    }
                    pos = end + 1;
                    Attribute {
                        name,
                        value: input[value_start..end].to_vec(),
                        ascii: false,
                    }
                }
                _ => {
                    return Err(WebAuthError::corrupt(format!(
                        "missing value of attribute {name}"
                    )));
                }
            };
            if attrs.index.contains_key(&attr.name) {
                return Err(WebAuthError::corrupt(format!(
                    "duplicate attribute {}",
                    attr.name
                )));
            }
            attrs.index.insert(attr.name.clone(), attrs.slots.len());
            attrs.slots.push(Some(attr));
        }
        Ok(attrs)
    }

    /// Name of the first attribute in the stream.
    pub fn first_name(&self) -> Option<&str> {
        self.slots
            .first()
            .and_then(|slot| slot.as_ref())
            .map(|attr| attr.name.as_str())
    }

    /// Remove and return the named attribute.
    pub fn take(&mut self, name: &str) -> Option<Attribute> {
        let idx = self.index.remove(name)?;
        self.slots.get_mut(idx).and_then(Option::take)
    }

    /// Number of attributes not yet taken.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Names of the attributes not yet taken, in stream order.
    pub fn remaining(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|attr| attr.name.as_str()))
    }
}
