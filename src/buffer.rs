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
//! # Buffer
//!
//! Growable byte accumulator used by the attribute encoder. The stored data
//! is always followed by a nul byte which is not counted in [`Buffer::len`],
//! and nul bytes are permitted inside the data.
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub struct Buffer {
    /// Data followed by the terminating nul.
    data: Vec<u8>,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    pub fn new() -> Self {
        Self { data: vec![0] }
    }

    pub fn with_capacity(size: usize) -> Self {
        let mut data = Vec::with_capacity(size + 1);
        data.push(0);
        Self { data }
    }

    /// Number of data bytes, excluding the terminator.
    pub fn len(&self) -> usize {
        self.data.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ensure room for at least `size` data bytes without reallocation.
    pub fn resize(&mut self, size: usize) {
        if size + 1 > self.data.capacity() {
            self.data.reserve(size + 1 - self.data.len());
        }
    }

    /// Replace the contents of the buffer.
    pub fn set(&mut self, data: &[u8]) {
        self.data.clear();
        self.data.reserve(data.len() + 1);
        self.data.extend_from_slice(data);
        self.data.push(0);
    }

    pub fn append(&mut self, data: &[u8]) {
        self.data.pop();
        self.data.extend_from_slice(data);
        self.data.push(0);
    }

    /// Append formatted text.
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) {
        match args.as_str() {
            Some(s) => self.append(s.as_bytes()),
            None => self.append(args.to_string().as_bytes()),
        }
    }

    /// Find `needle` at or after `start`, returning its offset.
    pub fn find(&self, needle: &[u8], start: usize) -> Option<usize> {
        find_bytes(self.as_bytes(), needle, start)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    /// Data including the terminating nul.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(mut self) -> Vec<u8> {
        self.data.pop();
        self.data
    }
}

impl fmt::Write for Buffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append(s.as_bytes());
        Ok(())
    }
}

/// Find `needle` in `haystack` at or after `start`.
pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if start > haystack.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(start);
    }
    haystack[start..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + start)
}
