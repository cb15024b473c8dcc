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

/// Identity of an authenticated user as returned to an application server.
#[derive(Builder, Clone, Debug, Default, PartialEq, Validate)]
#[builder(setter(into), build_fn(error = "BuilderError"))]
#[validate(schema(function = "validators::validate_id_auth"))]
pub struct IdToken {
    #[builder(default, setter(strip_option))]
    #[validate(length(min = 1))]
    pub subject: Option<String>,

    /// Identity the user asked to act as.
    #[builder(default, setter(strip_option))]
    #[validate(length(min = 1))]
    pub authz_subject: Option<String>,

    /// Authenticator type, `webkdc` or `krb5`.
    pub auth: String,

    /// Kerberos authenticator for `krb5` tokens.
    #[builder(default, setter(strip_option))]
    pub auth_data: Option<Vec<u8>>,

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

impl From<IdToken> for Token {
    fn from(value: IdToken) -> Self {
        Self::Id(value)
    }
}

static FIELDS: &[Field<IdToken>] = &[
    Field::string(
        "s",
        "subject",
        OPTIONAL,
        |t: &IdToken| t.subject.as_deref(),
        |t: &mut IdToken, v| t.subject = Some(v),
    ),
    Field::string(
        "sz",
        "authorization subject",
        OPTIONAL,
        |t: &IdToken| t.authz_subject.as_deref(),
        |t: &mut IdToken, v| t.authz_subject = Some(v),
    ),
    Field::string(
        "sa",
        "subject auth",
        REQUIRED,
        |t: &IdToken| Some(t.auth.as_str()),
        |t: &mut IdToken, v| t.auth = v,
    ),
    Field::data(
        "sad",
        "subject auth data",
        OPTIONAL,
        |t: &IdToken| t.auth_data.as_deref(),
        |t: &mut IdToken, v| t.auth_data = Some(v),
    ),
    Field::string(
        "ia",
        "initial factors",
        OPTIONAL,
        |t: &IdToken| t.initial_factors.as_deref(),
        |t: &mut IdToken, v| t.initial_factors = Some(v),
    ),
    Field::string(
        "san",
        "session factors",
        OPTIONAL,
        |t: &IdToken| t.session_factors.as_deref(),
        |t: &mut IdToken, v| t.session_factors = Some(v),
    ),
    Field::ulong(
        "loa",
        "level of assurance",
        OPTIONAL,
        |t: &IdToken| t.loa,
        |t: &mut IdToken, v| t.loa = Some(v),
    ),
    Field::time(
        "ct",
        "creation",
        CREATION,
        |t: &IdToken| creation_time(t.creation),
        |t: &mut IdToken, v| t.creation = v,
    ),
    Field::time(
        "et",
        "expiration",
        REQUIRED,
        |t: &IdToken| Some(t.expiration),
        |t: &mut IdToken, v| t.expiration = v,
    ),
];

static SCHEMA: Schema<IdToken> = Schema::new("id token", FIELDS);

impl Encodable for IdToken {
    fn schema() -> &'static Schema<Self> {
        &SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expiration() -> DateTime<Utc> {
        DateTime::from_timestamp(1_000, 0).unwrap()
    }

    #[test]
    fn test_auth_consistency() {
        let token = IdTokenBuilder::default()
            .subject("user")
            .auth("webkdc")
            .expiration(expiration())
            .build()
            .unwrap();
        assert!(token.validate().is_ok());

        let token = IdTokenBuilder::default()
            .auth("krb5")
            .expiration(expiration())
            .build()
            .unwrap();
        assert!(token.validate().is_err());

        let token = IdTokenBuilder::default()
            .auth("krb5")
            .auth_data(b"authenticator".to_vec())
            .expiration(expiration())
            .build()
            .unwrap();
        assert!(token.validate().is_ok());

        let token = IdTokenBuilder::default()
            .subject("user")
            .auth("basic")
            .expiration(expiration())
            .build()
            .unwrap();
        assert!(token.validate().is_err());
    }

    #[test]
    fn test_unset_expiration() {
        let token = IdToken {
            subject: Some("user".into()),
            auth: "webkdc".into(),
            ..Default::default()
        };
        assert!(token.validate().is_err());
    }
}
