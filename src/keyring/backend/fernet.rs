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

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use fernet::Fernet;
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::error::{Status, WebAuthError};
use crate::keyring::{Key, backend::Sealer};

/// Fernet based sealing.
///
/// The Fernet key is the SHA-256 digest of the keyring key, so keys of any
/// supported size are usable.
#[derive(Clone, Debug, Default)]
pub struct FernetSealer {}

impl FernetSealer {
    pub fn new() -> Self {
        Self {}
    }

    fn fernet(key: &Key) -> Result<Fernet, WebAuthError> {
        Fernet::new(&URL_SAFE.encode(Sha256::digest(key.data())))
            .ok_or_else(|| WebAuthError::new(Status::BadKey, "key is not usable for Fernet"))
    }
}

impl Sealer for FernetSealer {
    #[tracing::instrument(level = "trace", skip_all)]
    fn seal(&self, key: &Key, data: &[u8]) -> Result<Vec<u8>, WebAuthError> {
        Ok(Self::fernet(key)?.encrypt(data).into_bytes())
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn unseal(&self, key: &Key, data: &[u8]) -> Result<Vec<u8>, WebAuthError> {
        let token = std::str::from_utf8(data)
            .map_err(|_| WebAuthError::new(Status::BadHmac, "sealed data is not a Fernet token"))?;
        let fernet = Self::fernet(key)?;
        let payload = fernet.decrypt(token)?;
        trace!("unsealed {} bytes", payload.len());
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyring::{KeySize, KeyType};

    #[test]
    fn test_seal_unseal() {
        let key = Key::new(KeyType::Aes, vec![1; 16]).unwrap();
        let sealer = FernetSealer::new();
        let sealed = sealer.seal(&key, b"t:2=id;s:4=user;").unwrap();
        assert_ne!(b"t:2=id;s:4=user;".to_vec(), sealed);
        assert_eq!(
            b"t:2=id;s:4=user;".to_vec(),
            sealer.unseal(&key, &sealed).unwrap()
        );
    }

    #[test]
    fn test_wrong_key() {
        let sealer = FernetSealer::new();
        let key = Key::generate(KeyType::Aes, KeySize::Aes256).unwrap();
        let other = Key::generate(KeyType::Aes, KeySize::Aes256).unwrap();
        let sealed = sealer.seal(&key, b"data").unwrap();
        let err = sealer.unseal(&other, &sealed).unwrap_err();
        assert_eq!(Status::BadHmac, err.status());
        let err = sealer.unseal(&key, b"\xff\xfe").unwrap_err();
        assert_eq!(Status::BadHmac, err.status());
    }
}
