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

use crate::encoding::schema::{CREATION, REQUIRED};
use crate::encoding::{Encodable, Field, Schema};
use crate::error::BuilderError;
use crate::token::types::{Token, creation_time, validators};

#[derive(Builder, Clone, Debug, Default, PartialEq, Validate)]
#[builder(setter(into), build_fn(error = "BuilderError"))]
pub struct WebkdcServiceToken {
    /// Kerberos identity of the application server.
    #[validate(length(min = 1))]
    pub subject: String,

    /// Key shared between the WebKDC and the application server.
    #[validate(length(min = 16, max = 32))]
    pub session_key: Vec<u8>,

    #[builder(default)]
    pub creation: DateTime<Utc>,

    #[validate(custom(function = "validators::validate_set_time"))]
    pub expiration: DateTime<Utc>,
}

impl From<WebkdcServiceToken> for Token {
    fn from(value: WebkdcServiceToken) -> Self {
        Self::WebkdcService(value)
    }
}

static FIELDS: &[Field<WebkdcServiceToken>] = &[
    Field::string(
        "s",
        "subject",
        REQUIRED,
        |t: &WebkdcServiceToken| Some(t.subject.as_str()),
        |t: &mut WebkdcServiceToken, v| t.subject = v,
    ),
    Field::data(
        "k",
        "session key",
        REQUIRED,
        |t: &WebkdcServiceToken| Some(t.session_key.as_slice()),
        |t: &mut WebkdcServiceToken, v| t.session_key = v,
    ),
    Field::time(
        "ct",
        "creation",
        CREATION,
        |t: &WebkdcServiceToken| creation_time(t.creation),
        |t: &mut WebkdcServiceToken, v| t.creation = v,
    ),
    Field::time(
        "et",
        "expiration",
        REQUIRED,
        |t: &WebkdcServiceToken| Some(t.expiration),
        |t: &mut WebkdcServiceToken, v| t.expiration = v,
    ),
];

static SCHEMA: Schema<WebkdcServiceToken> = Schema::new("webkdc-service token", FIELDS);

impl Encodable for WebkdcServiceToken {
    fn schema() -> &'static Schema<Self> {
        &SCHEMA
    }
}
