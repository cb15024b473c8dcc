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
use validator::{Validate, ValidationError};

use crate::encoding::schema::{CREATION, OPTIONAL};
use crate::encoding::{Encodable, Field, Schema};
use crate::error::BuilderError;
use crate::token::types::{Token, creation_time};

/// Request from an application server, either for an id or proxy token on
/// behalf of a user or a bare command to the WebKDC.
#[derive(Builder, Clone, Debug, Default, PartialEq, Validate)]
#[builder(setter(into), build_fn(error = "BuilderError"))]
#[validate(schema(function = "validate_request"))]
pub struct RequestToken {
    /// Requested token type, `id` or `proxy`.
    #[builder(default, setter(strip_option))]
    pub request_type: Option<String>,

    /// Authenticator type for id requests.
    #[builder(default, setter(strip_option))]
    pub auth: Option<String>,

    /// Proxy type for proxy requests.
    #[builder(default, setter(strip_option))]
    pub proxy_type: Option<String>,

    /// Opaque application state returned with the response.
    #[builder(default, setter(strip_option))]
    pub state: Option<Vec<u8>>,

    #[builder(default, setter(strip_option))]
    #[validate(length(min = 1))]
    pub return_url: Option<String>,

    /// Comma-separated request options such as `fa` (forced authentication).
    #[builder(default, setter(strip_option))]
    pub options: Option<String>,

    /// Factors the user must have authenticated with initially.
    #[builder(default, setter(strip_option))]
    pub initial_factors: Option<String>,

    /// Factors the user must have authenticated with in this session.
    #[builder(default, setter(strip_option))]
    pub session_factors: Option<String>,

    #[builder(default, setter(strip_option))]
    pub loa: Option<u64>,

    #[builder(default, setter(strip_option))]
    pub command: Option<String>,

    #[builder(default)]
    pub creation: DateTime<Utc>,
}

fn validate_request(token: &RequestToken) -> Result<(), ValidationError> {
    let message = if token.command.is_some() {
        if token.request_type.is_none() && token.return_url.is_none() {
            return Ok(());
        }
        "Command request cannot request a token"
    } else {
        match (token.request_type.as_deref(), token.return_url.is_some()) {
            (_, false) => "Request needs a return URL",
            (Some("id"), true) if token.auth.is_some() => return Ok(()),
            (Some("id"), true) => "Id request needs an authenticator type",
            (Some("proxy"), true) if token.proxy_type.is_some() => return Ok(()),
            (Some("proxy"), true) => "Proxy request needs a proxy type",
            (_, true) => "Unknown requested token type",
        }
    };
    let mut err = ValidationError::new("invalid_request_token");
    err.message = Some(message.into());
    Err(err)
}

impl RequestToken {
    /// Whether the request carries the given option.
    pub fn has_option(&self, option: &str) -> bool {
        self.options
            .as_deref()
            .is_some_and(|options| options.split(',').any(|o| o.trim() == option))
    }
}

impl From<RequestToken> for Token {
    fn from(value: RequestToken) -> Self {
        Self::Request(value)
    }
}

static FIELDS: &[Field<RequestToken>] = &[
    Field::string(
        "rtt",
        "requested token type",
        OPTIONAL,
        |t: &RequestToken| t.request_type.as_deref(),
        |t: &mut RequestToken, v| t.request_type = Some(v),
    ),
    Field::string(
        "sa",
        "subject auth",
        OPTIONAL,
        |t: &RequestToken| t.auth.as_deref(),
        |t: &mut RequestToken, v| t.auth = Some(v),
    ),
    Field::string(
        "pt",
        "proxy type",
        OPTIONAL,
        |t: &RequestToken| t.proxy_type.as_deref(),
        |t: &mut RequestToken, v| t.proxy_type = Some(v),
    ),
    Field::data(
        "as",
        "application state",
        OPTIONAL,
        |t: &RequestToken| t.state.as_deref(),
        |t: &mut RequestToken, v| t.state = Some(v),
    ),
    Field::string(
        "ru",
        "return url",
        OPTIONAL,
        |t: &RequestToken| t.return_url.as_deref(),
        |t: &mut RequestToken, v| t.return_url = Some(v),
    ),
    Field::string(
        "ro",
        "request options",
        OPTIONAL,
        |t: &RequestToken| t.options.as_deref(),
        |t: &mut RequestToken, v| t.options = Some(v),
    ),
    Field::string(
        "ia",
        "initial factors",
        OPTIONAL,
        |t: &RequestToken| t.initial_factors.as_deref(),
        |t: &mut RequestToken, v| t.initial_factors = Some(v),
    ),
    Field::string(
        "san",
        "session factors",
        OPTIONAL,
        |t: &RequestToken| t.session_factors.as_deref(),
        |t: &mut RequestToken, v| t.session_factors = Some(v),
    ),
    Field::ulong(
        "loa",
        "level of assurance",
        OPTIONAL,
        |t: &RequestToken| t.loa,
        |t: &mut RequestToken, v| t.loa = Some(v),
    ),
    Field::string(
        "cmd",
        "command",
        OPTIONAL,
        |t: &RequestToken| t.command.as_deref(),
        |t: &mut RequestToken, v| t.command = Some(v),
    ),
    Field::time(
        "ct",
        "creation",
        CREATION,
        |t: &RequestToken| creation_time(t.creation),
        |t: &mut RequestToken, v| t.creation = v,
    ),
];

static SCHEMA: Schema<RequestToken> = Schema::new("request token", FIELDS);

impl Encodable for RequestToken {
    fn schema() -> &'static Schema<Self> {
        &SCHEMA
    }
}
