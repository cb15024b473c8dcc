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
//! Keys.
use std::fmt;

use crate::error::{Status, WebAuthError};

/// Key algorithm.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KeyType {
    Aes,
}

impl KeyType {
    /// Numeric code used in the persisted keyring.
    pub const fn code(self) -> u32 {
        match self {
            Self::Aes => 1,
        }
    }

    pub fn from_code(code: u32) -> Result<Self, WebAuthError> {
        match code {
            1 => Ok(Self::Aes),
            other => Err(WebAuthError::unimplemented(format!(
                "unsupported key type {other}"
            ))),
        }
    }

    fn valid_size(self, len: usize) -> bool {
        match self {
            Self::Aes => matches!(len, 16 | 24 | 32),
        }
    }
}

/// Key size in bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeySize {
    Aes128 = 16,
    Aes192 = 24,
    Aes256 = 32,
}

#[derive(Clone, Eq, PartialEq)]
pub struct Key {
    key_type: KeyType,
    data: Vec<u8>,
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("key_type", &self.key_type)
            .field("length", &self.data.len())
            .finish()
    }
}

impl Key {
    /// Create a key from existing key material.
    pub fn new(key_type: KeyType, data: Vec<u8>) -> Result<Self, WebAuthError> {
        if !key_type.valid_size(data.len()) {
            return Err(WebAuthError::invalid(format!(
                "unsupported {key_type:?} key length {}",
                data.len()
            )));
        }
        Ok(Self { key_type, data })
    }

    /// Create a new random key.
    pub fn generate(key_type: KeyType, size: KeySize) -> Result<Self, WebAuthError> {
        let mut data = vec![0u8; size as usize];
        getrandom::getrandom(&mut data).map_err(|e| {
            WebAuthError::with_source(Status::RandFailure, "cannot generate key", e)
        })?;
        Self::new(key_type, data)
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        for len in [16, 24, 32] {
            assert!(Key::new(KeyType::Aes, vec![0; len]).is_ok());
        }
        for len in [0, 15, 33] {
            assert_eq!(
                Status::Invalid,
                Key::new(KeyType::Aes, vec![0; len]).unwrap_err().status()
            );
        }
    }

    #[test]
    fn test_generate() {
        let a = Key::generate(KeyType::Aes, KeySize::Aes192).unwrap();
        let b = Key::generate(KeyType::Aes, KeySize::Aes192).unwrap();
        assert_eq!(24, a.data().len());
        assert_ne!(a, b);
    }

    #[test]
    fn test_type_codes() {
        assert_eq!(KeyType::Aes, KeyType::from_code(KeyType::Aes.code()).unwrap());
        assert_eq!(
            Status::Unimplemented,
            KeyType::from_code(7).unwrap_err().status()
        );
    }

    #[test]
    fn test_debug_hides_material() {
        let key = Key::new(KeyType::Aes, vec![0xab; 16]).unwrap();
        assert!(!format!("{key:?}").contains("171"));
    }
}
