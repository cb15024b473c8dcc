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
//! Token types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use validator::{Validate, ValidationErrors};

use crate::encoding::{self, AttrWriter, Attributes, Encodable, Kind};
use crate::error::WebAuthError;

pub mod app;
pub mod cred;
pub mod error;
pub mod id;
pub mod login;
pub mod proxy;
pub mod request;
pub mod validators;
pub mod webkdc_factor;
pub mod webkdc_proxy;
pub mod webkdc_service;

pub use app::{AppToken, AppTokenBuilder};
pub use cred::{CredToken, CredTokenBuilder};
pub use error::{ErrorToken, ErrorTokenBuilder};
pub use id::{IdToken, IdTokenBuilder};
pub use login::{LoginToken, LoginTokenBuilder};
pub use proxy::{ProxyToken, ProxyTokenBuilder};
pub use request::{RequestToken, RequestTokenBuilder};
pub use webkdc_factor::{WebkdcFactorToken, WebkdcFactorTokenBuilder};
pub use webkdc_proxy::{WebkdcProxyToken, WebkdcProxyTokenBuilder};
pub use webkdc_service::{WebkdcServiceToken, WebkdcServiceTokenBuilder};

/// Token type, carried on the wire as the `t` attribute.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TokenType {
    Error,
    Id,
    Login,
    Proxy,
    App,
    Cred,
    Request,
    WebkdcFactor,
    WebkdcProxy,
    WebkdcService,
}

impl TokenType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Id => "id",
            Self::Login => "login",
            Self::Proxy => "proxy",
            Self::App => "app",
            Self::Cred => "cred",
            Self::Request => "req",
            Self::WebkdcFactor => "webkdc-factor",
            Self::WebkdcProxy => "webkdc-proxy",
            Self::WebkdcService => "webkdc-service",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = WebAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "error" => Self::Error,
            "id" => Self::Id,
            "login" => Self::Login,
            "proxy" => Self::Proxy,
            "app" => Self::App,
            "cred" => Self::Cred,
            "req" => Self::Request,
            "webkdc-factor" => Self::WebkdcFactor,
            "webkdc-proxy" => Self::WebkdcProxy,
            "webkdc-service" => Self::WebkdcService,
            other => {
                return Err(WebAuthError::unimplemented(format!(
                    "unknown token type {other}"
                )));
            }
        })
    }
}

/// WebAuth token.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Error reported to a WebAuth application server.
    Error(ErrorToken),
    /// Identity of the authenticated user.
    Id(IdToken),
    /// Username and authentication secret sent to the WebKDC.
    Login(LoginToken),
    /// Delegated credential for an application server.
    Proxy(ProxyToken),
    /// Application session state.
    App(AppToken),
    /// Credential for a backend service.
    Cred(CredToken),
    /// Authentication request from an application server.
    Request(RequestToken),
    /// Long-lived record of factors satisfied by a device.
    WebkdcFactor(WebkdcFactorToken),
    /// Single sign-on token of the WebKDC.
    WebkdcProxy(WebkdcProxyToken),
    /// Identity and session key of an application server.
    WebkdcService(WebkdcServiceToken),
}

impl Token {
    /// Token of the given type with every field unset.
    pub fn empty(token_type: TokenType) -> Self {
        match token_type {
            TokenType::Error => Self::Error(ErrorToken::default()),
            TokenType::Id => Self::Id(IdToken::default()),
            TokenType::Login => Self::Login(LoginToken::default()),
            TokenType::Proxy => Self::Proxy(ProxyToken::default()),
            TokenType::App => Self::App(AppToken::default()),
            TokenType::Cred => Self::Cred(CredToken::default()),
            TokenType::Request => Self::Request(RequestToken::default()),
            TokenType::WebkdcFactor => Self::WebkdcFactor(WebkdcFactorToken::default()),
            TokenType::WebkdcProxy => Self::WebkdcProxy(WebkdcProxyToken::default()),
            TokenType::WebkdcService => Self::WebkdcService(WebkdcServiceToken::default()),
        }
    }

    pub const fn token_type(&self) -> TokenType {
        match self {
            Self::Error(_) => TokenType::Error,
            Self::Id(_) => TokenType::Id,
            Self::Login(_) => TokenType::Login,
            Self::Proxy(_) => TokenType::Proxy,
            Self::App(_) => TokenType::App,
            Self::Cred(_) => TokenType::Cred,
            Self::Request(_) => TokenType::Request,
            Self::WebkdcFactor(_) => TokenType::WebkdcFactor,
            Self::WebkdcProxy(_) => TokenType::WebkdcProxy,
            Self::WebkdcService(_) => TokenType::WebkdcService,
        }
    }

    /// Encoding view onto the active variant.
    pub fn data(&self) -> &dyn TokenData {
        match self {
            Self::Error(x) => x,
            Self::Id(x) => x,
            Self::Login(x) => x,
            Self::Proxy(x) => x,
            Self::App(x) => x,
            Self::Cred(x) => x,
            Self::Request(x) => x,
            Self::WebkdcFactor(x) => x,
            Self::WebkdcProxy(x) => x,
            Self::WebkdcService(x) => x,
        }
    }

    /// Mutable encoding view onto the active variant.
    pub fn data_mut(&mut self) -> &mut dyn TokenData {
        match self {
            Self::Error(x) => x,
            Self::Id(x) => x,
            Self::Login(x) => x,
            Self::Proxy(x) => x,
            Self::App(x) => x,
            Self::Cred(x) => x,
            Self::Request(x) => x,
            Self::WebkdcFactor(x) => x,
            Self::WebkdcProxy(x) => x,
            Self::WebkdcService(x) => x,
        }
    }

    pub fn creation(&self) -> Option<DateTime<Utc>> {
        self.data().creation()
    }

    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Error(_) | Self::Login(_) | Self::Request(_) => None,
            Self::Id(x) => Some(x.expiration),
            Self::Proxy(x) => Some(x.expiration),
            Self::App(x) => Some(x.expiration),
            Self::Cred(x) => Some(x.expiration),
            Self::WebkdcFactor(x) => Some(x.expiration),
            Self::WebkdcProxy(x) => Some(x.expiration),
            Self::WebkdcService(x) => Some(x.expiration),
        }
    }

    /// Authenticated identity carried by the token, if any.
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::Error(_) | Self::Request(_) => None,
            Self::Id(x) => x.subject.as_deref(),
            Self::Login(x) => Some(&x.username),
            Self::Proxy(x) => Some(&x.subject),
            Self::App(x) => x.subject.as_deref(),
            Self::Cred(x) => Some(&x.subject),
            Self::WebkdcFactor(x) => Some(&x.subject),
            Self::WebkdcProxy(x) => Some(&x.subject),
            Self::WebkdcService(x) => Some(&x.subject),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.data().check()
    }
}

/// Type erased encoding of one token payload.
pub trait TokenData {
    /// Write every attribute of the payload.
    fn encode_attrs(&self, out: &mut AttrWriter<'_>) -> Result<(), WebAuthError>;

    /// Fill the payload from decoded attributes.
    fn decode_attrs(&mut self, attrs: &mut Attributes) -> Result<(), WebAuthError>;

    /// Value of the creation time field, `None` when unset.
    fn creation(&self) -> Option<DateTime<Utc>>;

    /// Set the creation time to `now` unless already set.
    fn stamp_creation(&mut self, now: DateTime<Utc>);

    /// Check the payload for consistency.
    fn check(&self) -> Result<(), ValidationErrors>;
}

impl<T: Encodable + Validate> TokenData for T {
    fn encode_attrs(&self, out: &mut AttrWriter<'_>) -> Result<(), WebAuthError> {
        encoding::encode_attrs(T::schema(), self, out)
    }

    fn decode_attrs(&mut self, attrs: &mut Attributes) -> Result<(), WebAuthError> {
        encoding::decode_attrs(T::schema(), attrs, self)
    }

    fn creation(&self) -> Option<DateTime<Utc>> {
        match T::schema().creation_field().map(|field| &field.kind) {
            Some(Kind::Time { get, .. }) => get(self),
            _ => None,
        }
    }

    fn stamp_creation(&mut self, now: DateTime<Utc>) {
        if let Some(Kind::Time { get, set }) = T::schema().creation_field().map(|field| &field.kind)
            && get(self).is_none()
        {
            set(self, now);
        }
    }

    fn check(&self) -> Result<(), ValidationErrors> {
        self.validate()
    }
}

/// Getter for a creation time, where the epoch means "not yet set".
pub(crate) fn creation_time(time: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (time.timestamp() != 0).then_some(time)
}
