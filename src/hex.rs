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
//! # Hex encoding
//!
//! ASCII-safe representation of binary attribute values. None of the
//! functions nul-terminate their output. The `_in_place` variants use the
//! same buffer for input and output.
use thiserror::Error;

const DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Hex conversion error.
#[derive(Debug, Error, PartialEq)]
pub enum HexError {
    /// Output buffer is too small.
    #[error("output buffer too small: need {needed} bytes, have {available}")]
    NoRoom { needed: usize, available: usize },

    /// Input is not valid hex.
    #[error("invalid hex data: {0}")]
    Corrupt(String),
}

/// Space required to hex encode `length` bytes.
pub const fn encoded_length(length: usize) -> usize {
    length * 2
}

/// Space required to hold the decoding of `length` hex digits.
pub fn decoded_length(length: usize) -> Result<usize, HexError> {
    if length == 0 || length % 2 != 0 {
        return Err(HexError::Corrupt(format!(
            "length {length} is not a positive multiple of two"
        )));
    }
    Ok(length / 2)
}

fn check_room(needed: usize, available: usize) -> Result<(), HexError> {
    if needed > available {
        return Err(HexError::NoRoom { needed, available });
    }
    Ok(())
}

fn nibble(digit: u8) -> Result<u8, HexError> {
    (digit as char)
        .to_digit(16)
        .map(|v| v as u8)
        .ok_or_else(|| HexError::Corrupt(format!("invalid hex digit {:?}", digit as char)))
}

/// Hex encode `input` into `output`, returning the number of bytes written.
pub fn encode(input: &[u8], output: &mut [u8]) -> Result<usize, HexError> {
    let needed = encoded_length(input.len());
    check_room(needed, output.len())?;
    hex::encode_to_slice(input, &mut output[..needed])
        .map_err(|e| HexError::Corrupt(e.to_string()))?;
    Ok(needed)
}

/// Hex encode the first `input_len` bytes of `buf` in place.
///
/// Works backwards so that no input byte is overwritten before it is read.
pub fn encode_in_place(buf: &mut [u8], input_len: usize) -> Result<usize, HexError> {
    let needed = encoded_length(input_len);
    check_room(needed, buf.len())?;
    for i in (0..input_len).rev() {
        let byte = buf[i];
        buf[i * 2] = DIGITS[usize::from(byte >> 4)];
        buf[i * 2 + 1] = DIGITS[usize::from(byte & 0x0f)];
    }
    Ok(needed)
}

/// Hex decode `input` into `output`, returning the number of bytes written.
pub fn decode(input: &[u8], output: &mut [u8]) -> Result<usize, HexError> {
    let needed = decoded_length(input.len())?;
    check_room(needed, output.len())?;
    hex::decode_to_slice(input, &mut output[..needed])
        .map_err(|e| HexError::Corrupt(e.to_string()))?;
    Ok(needed)
}

/// Hex decode the first `input_len` bytes of `buf` in place.
pub fn decode_in_place(buf: &mut [u8], input_len: usize) -> Result<usize, HexError> {
    let needed = decoded_length(input_len)?;
    check_room(input_len, buf.len())?;
    for i in 0..needed {
        let high = nibble(buf[i * 2])?;
        let low = nibble(buf[i * 2 + 1])?;
        buf[i] = (high << 4) | low;
    }
    Ok(needed)
}

/// Hex encode into a newly allocated vector.
pub fn encode_to_vec(input: &[u8]) -> Vec<u8> {
    hex::encode(input).into_bytes()
}

/// Hex decode into a newly allocated vector.
///
/// Unlike [`decode`], the empty input decodes to the empty vector since an
/// empty attribute value is a legitimate encoding of empty data.
pub fn decode_to_vec(input: &[u8]) -> Result<Vec<u8>, HexError> {
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = vec![0; decoded_length(input.len())?];
    decode(input, &mut out)?;
    Ok(out)
}
