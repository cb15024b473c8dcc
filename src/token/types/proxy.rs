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
use crate::token::types::{Token, creation_time, validators};

/// Delegated credential returned to an application server, wrapping a
/// webkdc-proxy token that only the WebKDC can open.
#[derive(Builder, Clone, Debug, Default, PartialEq, Validate)]
#[builder(setter(into), build_fn(error = "BuilderError"))]
pub struct ProxyToken {
    #[validate(length(min = 1))]
    pub subject: String,

    #[builder(default, setter(strip_option))]
    #[validate(length(min = 1))]
    pub authz_subject: Option<String>,

    #[validate(length(min = 1))]
    pub proxy_type: String,

    /// Sealed webkdc-proxy token.
    #[validate(length(min = 1))]
    pub webkdc_proxy: Vec<u8>,

    #[builder(default, setter(strip_option))]
    pub initial_factors: Option<String>,

    #[builder(default, setter(strip_option))]
    pub session_factors: Option<String>,

    #[builder(default, setter(strip_option))]
    pub loa: Option<u64>,

    #[builder(default)]
    pub creation: DateTime<Utc>,

    #[validate(custom(function = "validators::validate_set_time"))]
    pub expiration: DateTime<Utc>,
}

impl From<ProxyToken> for Token {
    fn from(value: ProxyToken) -> Self {
        Self::Proxy(value)
    }
}

static FIELDS: &[Field<ProxyToken>] = &[
    Field::string(
        "s",
        "subject",
        REQUIRED,
        |t: &ProxyToken| Some(t.subject.as_str()),
        |t: &mut ProxyToken, v| t.subject = v,
    ),
    Field::string(
        "sz",
        "authorization subject",
        OPTIONAL,
        |t: &ProxyToken| t.authz_subject.as_deref(),
        |t: &mut ProxyToken, v| t.authz_subject = Some(v),
    ),
    Field::string(
        "pt",
        "proxy type",
        REQUIRED,
        |t: &ProxyToken| Some(t.proxy_type.as_str()),
        |t: &mut ProxyToken, v| t.proxy_type = v,
    ),
    Field::data(
        "wt",
        "webkdc-proxy token",
        REQUIRED,
        |t: &ProxyToken| Some(t.webkdc_proxy.as_slice()),
        |t: &mut ProxyToken, v| t.webkdc_proxy = v,
    ),
    Field::string(
        "ia",
        "initial factors",
        OPTIONAL,
        |t: &ProxyToken| t.initial_factors.as_deref(),
        |t: &mut ProxyToken, v| t.initial_factors = Some(v),
    ),
    Field::string(
        "san",
        "session factors",
        OPTIONAL,
        |t: &ProxyToken| t.session_factors.as_deref(),
        |t: &mut ProxyToken, v| t.session_factors = Some(v),
    ),
    Field::ulong(
        "loa",
        "level of assurance",
        OPTIONAL,
        |t: &ProxyToken| t.loa,
        |t: &mut ProxyToken, v| t.loa = Some(v),
    ),
    Field::time(
        "ct",
        "creation",
        CREATION,
        |t: &ProxyToken| creation_time(t.creation),
        |t: &mut ProxyToken, v| t.creation = v,
    ),
    Field::time(
        "et",
        "expiration",
        REQUIRED,
        |t: &ProxyToken| Some(t.expiration),
        |t: &mut ProxyToken, v| t.expiration = v,
    ),
];

static SCHEMA: Schema<ProxyToken> = Schema::new("proxy token", FIELDS);

impl Encodable for ProxyToken {
    fn schema() -> &'static Schema<Self> {
        &SCHEMA
    }
}
