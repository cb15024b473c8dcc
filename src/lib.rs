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
//! # WebAuth token layer
//!
//! WebAuth is a web single sign-on system. Relying parties, the WebLogin
//! server and the WebKDC exchange state as tokens: small typed records
//! encoded as attributes and sealed with a key shared by the parties.
//!
//! This crate provides the pieces every participant needs:
//!
//! - [`encoding`]: the attribute encoding, driven by static per type schemas;
//! - [`token`]: the token types, sealing with a [`keyring::Keyring`] and the
//!   merging of webkdc-proxy and webkdc-factor tokens presented in a login;
//! - [`keyring`]: versioned sets of keys with key selection, trial
//!   decryption and persistence;
//! - [`webkdc`]: the state of a single WebKDC login request.
//!
//! Every operation that can fail returns a [`error::WebAuthError`]. The
//! entry points that take a [`context::Context`] also record the failure
//! there, together with log callbacks for the caller.

pub mod buffer;
pub mod config;
pub mod context;
pub mod encoding;
pub mod error;
pub mod hex;
pub mod keyring;
pub mod krb5;
pub mod token;
pub mod webkdc;

#[cfg(test)]
mod tests;
