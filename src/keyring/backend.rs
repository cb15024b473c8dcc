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
//! Sealing backends.

use crate::error::WebAuthError;
use crate::keyring::Key;

pub mod fernet;
pub use fernet::FernetSealer;

/// Authenticated encryption of encoded data under a single key.
#[cfg_attr(test, mockall::automock)]
pub trait Sealer: Send + Sync {
    /// Encrypt and authenticate `data` with `key`.
    fn seal(&self, key: &Key, data: &[u8]) -> Result<Vec<u8>, WebAuthError>;

    /// Authenticate and decrypt `data` with `key`.
    fn unseal(&self, key: &Key, data: &[u8]) -> Result<Vec<u8>, WebAuthError>;
}
