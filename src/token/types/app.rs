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

use crate::encoding::schema::{CREATION, OPTIONAL, REQUIRED};
use crate::encoding::{Encodable, Field, Schema};
use crate::error::BuilderError;
use crate::token::types::{Token, creation_time, validators};

/// Application token.
///
/// Either a user session (subject set) or the session key an application
/// server shares with the WebKDC (session key set), never both.
#[derive(Builder, Clone, Debug, Default, PartialEq, Validate)]
#[builder(setter(into), build_fn(error = "BuilderError"))]
#[validate(schema(function = "validate_app"))]
pub struct AppToken {
    #[builder(default, setter(strip_option))]
    pub subject: Option<String>,

    #[builder(default, setter(strip_option))]
    pub authz_subject: Option<String>,

    #[builder(default, setter(strip_option))]
    pub last_used: Option<DateTime<Utc>>,

    #[builder(default, setter(strip_option))]
    pub session_key: Option<Vec<u8>>,

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

fn validate_app(token: &AppToken) -> Result<(), ValidationError> {
    match (&token.subject, &token.session_key) {
        (Some(subject), None) if !subject.is_empty() => Ok(()),
        (None, Some(key)) if !key.is_empty() => Ok(()),
        _ => {
            let mut err = ValidationError::new("invalid_app_token");
            err.message = Some("App token needs exactly one of subject and session key".into());
            Err(err)
        }
    }
}

impl From<AppToken> for Token {
    fn from(value: AppToken) -> Self {
        Self::App(value)
    }
}

static FIELDS: &[Field<AppToken>] = &[
    Field::string(
        "s",
        "subject",
        OPTIONAL,
        |t: &AppToken| t.subject.as_deref(),
        |t: &mut AppToken, v| t.subject = Some(v),
    ),
    Field::string(
        "sz",
        "authorization subject",
        OPTIONAL,
        |t: &AppToken| t.authz_subject.as_deref(),
        |t: &mut AppToken, v| t.authz_subject = Some(v),
    ),
    Field::time(
        "lt",
        "last used",
        OPTIONAL,
        |t: &AppToken| t.last_used,
        |t: &mut AppToken, v| t.last_used = Some(v),
    ),
    Field::data(
        "k",
        "session key",
        OPTIONAL,
        |t: &AppToken| t.session_key.as_deref(),
        |t: &mut AppToken, v| t.session_key = Some(v),
    ),
    Field::string(
        "ia",
        "initial factors",
        OPTIONAL,
        |t: &AppToken| t.initial_factors.as_deref(),
        |t: &mut AppToken, v| t.initial_factors = Some(v),
    ),
    Field::string(
        "san",
        "session factors",
        OPTIONAL,
        |t: &AppToken| t.session_factors.as_deref(),
        |t: &mut AppToken, v| t.session_factors = Some(v),
    ),
    Field::ulong(
        "loa",
        "level of assurance",
        OPTIONAL,
        |t: &AppToken| t.loa,
        |t: &mut AppToken, v| t.loa = Some(v),
    ),
    Field::time(
        "ct",
        "creation",
        CREATION,
        |t: &AppToken| creation_time(t.creation),
        |t: &mut AppToken, v| t.creation = v,
    ),
    Field::time(
        "et",
        "expiration",
        REQUIRED,
        |t: &AppToken| Some(t.expiration),
        |t: &mut AppToken, v| t.expiration = v,
    ),
];

static SCHEMA: Schema<AppToken> = Schema::new("app token", FIELDS);

impl Encodable for AppToken {
    fn schema() -> &'static Schema<Self> {
        &SCHEMA
    }
}
