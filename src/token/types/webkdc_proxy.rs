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

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use validator::Validate;

use crate::encoding::schema::{CREATION, OPTIONAL, REQUIRED};
use crate::encoding::{Encodable, Field, Schema};
use crate::error::BuilderError;
use crate::token::factors::Factors;
use crate::token::types::{Token, creation_time, validators};

/// Single sign-on credential of a user, held by the WebLogin server.
#[derive(Builder, Clone, Debug, Default, PartialEq, Validate)]
#[builder(setter(into), build_fn(error = "BuilderError"))]
#[validate(schema(function = "validators::validate_webkdc_proxy_type"))]
pub struct WebkdcProxyToken {
    #[validate(length(min = 1, max = 256))]
    pub subject: String,

    /// How the user authenticated, such as `krb5`.
    pub proxy_type: String,

    /// Identity that obtained the token, `WEBKDC:<principal>` for logins.
    #[validate(length(min = 1))]
    pub proxy_subject: String,

    /// Proxied credential, a Kerberos TGT for `krb5` tokens.
    #[builder(default, setter(strip_option))]
    pub data: Option<Vec<u8>>,

    #[builder(default, setter(strip_option))]
    pub initial_factors: Option<String>,

    #[builder(default, setter(strip_option))]
    pub session_factors: Option<String>,

    /// Level of assurance.
    #[builder(default, setter(strip_option))]
    pub loa: Option<u64>,

    #[builder(default)]
    pub creation: DateTime<Utc>,

    #[validate(custom(function = "validators::validate_set_time"))]
    pub expiration: DateTime<Utc>,
}

impl WebkdcProxyToken {
    pub fn initial_factor_set(&self) -> Factors {
        Factors::from_opt(self.initial_factors.as_deref())
    }

    pub fn session_factor_set(&self) -> Factors {
        Factors::from_opt(self.session_factors.as_deref())
    }
}

impl From<WebkdcProxyToken> for Token {
    fn from(value: WebkdcProxyToken) -> Self {
        Self::WebkdcProxy(value)
    }
}

static FIELDS: &[Field<WebkdcProxyToken>] = &[
    Field::string(
        "s",
        "subject",
        REQUIRED,
        |t: &WebkdcProxyToken| Some(t.subject.as_str()),
        |t: &mut WebkdcProxyToken, v| t.subject = v,
    ),
    Field::string(
        "pt",
        "proxy type",
        REQUIRED,
        |t: &WebkdcProxyToken| Some(t.proxy_type.as_str()),
        |t: &mut WebkdcProxyToken, v| t.proxy_type = v,
    ),
    Field::string(
        "ps",
        "proxy subject",
        REQUIRED,
        |t: &WebkdcProxyToken| Some(t.proxy_subject.as_str()),
        |t: &mut WebkdcProxyToken, v| t.proxy_subject = v,
    ),
    Field::data(
        "pd",
        "proxy data",
        OPTIONAL,
        |t: &WebkdcProxyToken| t.data.as_deref(),
        |t: &mut WebkdcProxyToken, v| t.data = Some(v),
    ),
    Field::string(
        "ia",
        "initial factors",
        OPTIONAL,
        |t: &WebkdcProxyToken| t.initial_factors.as_deref(),
        |t: &mut WebkdcProxyToken, v| t.initial_factors = Some(v),
    ),
    Field::string(
        "san",
        "session factors",
        OPTIONAL,
        |t: &WebkdcProxyToken| t.session_factors.as_deref(),
        |t: &mut WebkdcProxyToken, v| t.session_factors = Some(v),
    ),
    Field::ulong(
        "loa",
        "level of assurance",
        OPTIONAL,
        |t: &WebkdcProxyToken| t.loa,
        |t: &mut WebkdcProxyToken, v| t.loa = Some(v),
    ),
    Field::time(
        "ct",
        "creation",
        CREATION,
        |t: &WebkdcProxyToken| creation_time(t.creation),
        |t: &mut WebkdcProxyToken, v| t.creation = v,
    ),
    Field::time(
        "et",
        "expiration",
        REQUIRED,
        |t: &WebkdcProxyToken| Some(t.expiration),
        |t: &mut WebkdcProxyToken, v| t.expiration = v,
    ),
];

static SCHEMA: Schema<WebkdcProxyToken> = Schema::new("webkdc-proxy token", FIELDS);

impl Encodable for WebkdcProxyToken {
    fn schema() -> &'static Schema<Self> {
        &SCHEMA
    }
}
