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
use crate::token::factors::Factors;
use crate::token::types::{Token, creation_time, validators};

/// Factors a user has satisfied on a particular device, kept in a long-lived
/// cookie so that they need not be presented again.
#[derive(Builder, Clone, Debug, Default, PartialEq, Validate)]
#[builder(setter(into), build_fn(error = "BuilderError"))]
pub struct WebkdcFactorToken {
    #[validate(length(min = 1, max = 256))]
    pub subject: String,

    #[validate(custom(function = "validators::validate_factors"))]
    pub factors: String,

    #[builder(default)]
    pub creation: DateTime<Utc>,

    #[validate(custom(function = "validators::validate_set_time"))]
    pub expiration: DateTime<Utc>,
}

impl WebkdcFactorToken {
    pub fn factor_set(&self) -> Factors {
        Factors::parse(&self.factors)
    }
}

impl From<WebkdcFactorToken> for Token {
    fn from(value: WebkdcFactorToken) -> Self {
        Self::WebkdcFactor(value)
    }
}

static FIELDS: &[Field<WebkdcFactorToken>] = &[
    Field::string(
        "s",
        "subject",
        REQUIRED,
        |t: &WebkdcFactorToken| Some(t.subject.as_str()),
        |t: &mut WebkdcFactorToken, v| t.subject = v,
    ),
    Field::string(
        "ia",
        "factors",
        REQUIRED,
        |t: &WebkdcFactorToken| Some(t.factors.as_str()),
        |t: &mut WebkdcFactorToken, v| t.factors = v,
    ),
    Field::time(
        "ct",
        "creation",
        CREATION,
        |t: &WebkdcFactorToken| creation_time(t.creation),
        |t: &mut WebkdcFactorToken, v| t.creation = v,
    ),
    Field::time(
        "et",
        "expiration",
        REQUIRED,
        |t: &WebkdcFactorToken| Some(t.expiration),
        |t: &mut WebkdcFactorToken, v| t.expiration = v,
    ),
];

static SCHEMA: Schema<WebkdcFactorToken> = Schema::new("webkdc-factor token", FIELDS);

impl Encodable for WebkdcFactorToken {
    fn schema() -> &'static Schema<Self> {
        &SCHEMA
    }
}
