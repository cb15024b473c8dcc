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

/// Credential for a backend service, such as a Kerberos service ticket
/// encoded as a [`Krb5Cred`](crate::krb5::Krb5Cred).
#[derive(Builder, Clone, Debug, Default, PartialEq, Validate)]
#[builder(setter(into), build_fn(error = "BuilderError"))]
pub struct CredToken {
    #[validate(length(min = 1))]
    pub subject: String,

    #[validate(length(min = 1))]
    pub cred_type: String,

    #[validate(length(min = 1))]
    pub service: String,

    #[validate(length(min = 1))]
    pub data: Vec<u8>,

    #[builder(default)]
    pub creation: DateTime<Utc>,

    #[validate(custom(function = "validators::validate_set_time"))]
    pub expiration: DateTime<Utc>,
}

impl From<CredToken> for Token {
    fn from(value: CredToken) -> Self {
        Self::Cred(value)
    }
}

static FIELDS: &[Field<CredToken>] = &[
    Field::string(
        "s",
        "subject",
        REQUIRED,
        |t: &CredToken| Some(t.subject.as_str()),
        |t: &mut CredToken, v| t.subject = v,
    ),
    Field::string(
        "crt",
        "credential type",
        REQUIRED,
        |t: &CredToken| Some(t.cred_type.as_str()),
        |t: &mut CredToken, v| t.cred_type = v,
    ),
    Field::string(
        "crs",
        "credential service",
        REQUIRED,
        |t: &CredToken| Some(t.service.as_str()),
        |t: &mut CredToken, v| t.service = v,
    ),
    Field::data(
        "crd",
        "credential data",
        REQUIRED,
        |t: &CredToken| Some(t.data.as_slice()),
        |t: &mut CredToken, v| t.data = v,
    ),
    Field::time(
        "ct",
        "creation",
        CREATION,
        |t: &CredToken| creation_time(t.creation),
        |t: &mut CredToken, v| t.creation = v,
    ),
    Field::time(
        "et",
        "expiration",
        REQUIRED,
        |t: &CredToken| Some(t.expiration),
        |t: &mut CredToken, v| t.expiration = v,
    ),
];

static SCHEMA: Schema<CredToken> = Schema::new("cred token", FIELDS);

impl Encodable for CredToken {
    fn schema() -> &'static Schema<Self> {
        &SCHEMA
    }
}
