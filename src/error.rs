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
//! # Error
//!
//! WebAuth status codes, the protocol projection of those codes and the
//! error type returned by every fallible operation of the crate.
use std::fmt;

use thiserror::Error;

use crate::hex::HexError;

/// Internal WebAuth status code.
///
/// This is the complete internal error space. It is never shown to relying
/// parties directly; see [`Status::protocol`] for the externally visible
/// projection.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(i32)]
pub enum Status {
    /// Output buffer too small.
    NoRoom = 1,
    /// Malformed encoded data.
    Corrupt = 2,
    /// Sealed data did not authenticate under any key.
    BadHmac = 4,
    /// Random number generation failed.
    RandFailure = 5,
    /// No usable key.
    BadKey = 6,
    /// Requested object not found.
    NotFound = 12,
    /// Kerberos collaborator failure.
    Krb5 = 13,
    /// User authentication failed.
    LoginFailed = 15,
    /// Token has expired.
    TokenExpired = 16,
    /// Token is too old to be used.
    TokenStale = 17,
    /// User credentials have expired.
    CredsExpired = 18,
    /// User is not permitted to authenticate.
    UserRejected = 19,
    /// Underlying system failure.
    System = 20,
    /// Operation not implemented.
    Unimplemented = 21,
    /// Invalid argument.
    Invalid = 22,
    /// Remote service failure.
    RemoteFailure = 23,
    /// Unable to write a file.
    FileWrite = 25,
    /// Unable to read a file.
    FileRead = 27,
    /// Unsupported file format version.
    FileVersion = 28,
    /// File does not exist.
    FileNotFound = 29,
}

impl Status {
    /// Numeric status code.
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Generic description of the status.
    pub const fn description(self) -> &'static str {
        match self {
            Self::NoRoom => "supplied buffer too small",
            Self::Corrupt => "data is incorrectly formatted",
            Self::BadHmac => "HMAC check failed",
            Self::RandFailure => "unable to get random data",
            Self::BadKey => "unable to use key",
            Self::NotFound => "item not found while searching",
            Self::Krb5 => "Kerberos error",
            Self::LoginFailed => "login failed",
            Self::TokenExpired => "token has expired",
            Self::TokenStale => "token is stale",
            Self::CredsExpired => "password has expired",
            Self::UserRejected => "user not permitted to authenticate",
            Self::System => "system call failed",
            Self::Unimplemented => "operation not supported",
            Self::Invalid => "invalid argument to function",
            Self::RemoteFailure => "a remote service call failed",
            Self::FileWrite => "unable to write to file",
            Self::FileRead => "unable to read from file",
            Self::FileVersion => "bad file data version",
            Self::FileNotFound => "file does not exist",
        }
    }

    /// Project the status onto the protocol error codes.
    ///
    /// Most internal codes collapse to [`ProtocolStatus::InvalidRequest`] or
    /// [`ProtocolStatus::ServerFailure`]. Specific protocol codes such as
    /// "service token expired" cannot be recovered from the generic internal
    /// code and must be chosen by the caller before falling back to this.
    pub const fn protocol(self) -> ProtocolStatus {
        match self {
            Self::Corrupt
            | Self::BadHmac
            | Self::Invalid
            | Self::NotFound
            | Self::TokenExpired
            | Self::TokenStale
            | Self::Unimplemented => ProtocolStatus::InvalidRequest,
            Self::LoginFailed => ProtocolStatus::LoginFailed,
            Self::CredsExpired => ProtocolStatus::CredsExpired,
            Self::UserRejected => ProtocolStatus::UserRejected,
            Self::NoRoom
            | Self::RandFailure
            | Self::BadKey
            | Self::Krb5
            | Self::System
            | Self::RemoteFailure
            | Self::FileWrite
            | Self::FileRead
            | Self::FileVersion
            | Self::FileNotFound => ProtocolStatus::ServerFailure,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Protocol error codes, as carried in error tokens and XML responses.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u32)]
pub enum ProtocolStatus {
    ServiceTokenExpired = 1,
    ServiceTokenInvalid = 2,
    ProxyTokenExpired = 3,
    ProxyTokenInvalid = 4,
    InvalidRequest = 5,
    Unauthorized = 6,
    ServerFailure = 7,
    RequestTokenStale = 8,
    RequestTokenInvalid = 9,
    GetCredFailure = 10,
    RequesterKrb5CredInvalid = 11,
    LoginTokenStale = 12,
    LoginTokenInvalid = 13,
    LoginFailed = 14,
    ProxyTokenRequired = 15,
    LoginCanceled = 16,
    LoginForced = 17,
    UserRejected = 18,
    CredsExpired = 19,
    MultifactorRequired = 20,
    MultifactorUnavailable = 21,
    LoginRejected = 22,
    LoaUnavailable = 23,
    AuthRejected = 24,
    AuthReplay = 25,
    AuthLockout = 26,
    LoginTimeout = 27,
}

impl ProtocolStatus {
    /// Numeric protocol code.
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// Error raised by the structure builders.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// A required field was not set.
    #[error("{0}")]
    UninitializedField(String),

    /// Builder validation failed.
    #[error("{0}")]
    Validation(String),
}

impl From<derive_builder::UninitializedFieldError> for BuilderError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        Self::UninitializedField(err.to_string())
    }
}

impl From<String> for BuilderError {
    fn from(msg: String) -> Self {
        Self::Validation(msg)
    }
}

/// WebAuth error.
///
/// Carries the internal [`Status`], a human-readable message that callers
/// extend with context as the error bubbles up, and optionally the
/// underlying error that caused it.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct WebAuthError {
    status: Status,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl WebAuthError {
    pub fn new<M: Into<String>>(status: Status, message: M) -> Self {
        Self {
            status,
            message: message.into(),
            source: None,
        }
    }

    pub fn corrupt<M: Into<String>>(message: M) -> Self {
        Self::new(Status::Corrupt, message)
    }

    pub fn invalid<M: Into<String>>(message: M) -> Self {
        Self::new(Status::Invalid, message)
    }

    pub fn unimplemented<M: Into<String>>(message: M) -> Self {
        Self::new(Status::Unimplemented, message)
    }

    /// Wrap an underlying error, keeping its text in the message.
    pub fn with_source<M, E>(status: Status, message: M, source: E) -> Self
    where
        M: fmt::Display,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            status,
            message: format!("{message}: {source}"),
            source: Some(Box::new(source)),
        }
    }

    pub const fn status(&self) -> Status {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Prepend explanatory text to the message, keeping the status.
    pub fn context<C: fmt::Display>(mut self, context: C) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }

    /// Rewrite the status to `new` only if it currently is `old`.
    pub fn change(mut self, old: Status, new: Status) -> Self {
        if self.status == old {
            self.status = new;
        }
        self
    }

    /// Protocol code suitable for relying-party-facing responses.
    pub const fn protocol(&self) -> ProtocolStatus {
        self.status.protocol()
    }
}

impl From<HexError> for WebAuthError {
    fn from(err: HexError) -> Self {
        let status = match err {
            HexError::NoRoom { .. } => Status::NoRoom,
            HexError::Corrupt(_) => Status::Corrupt,
        };
        Self::with_source(status, "hex conversion failed", err)
    }
}

impl From<std::io::Error> for WebAuthError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(Status::System, "system call failed", err)
    }
}

impl From<fernet::DecryptionError> for WebAuthError {
    fn from(err: fernet::DecryptionError) -> Self {
        Self::with_source(Status::BadHmac, "unable to unseal data", err)
    }
}

impl From<validator::ValidationErrors> for WebAuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::with_source(Status::Invalid, "invalid token data", err)
    }
}

impl From<BuilderError> for WebAuthError {
    fn from(err: BuilderError) -> Self {
        Self::with_source(Status::Invalid, "unable to build structure", err)
    }
}
