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
use crate::token::types::{Token, creation_time};

/// Login token.
///
/// Carries a password, an OTP code, or only a device id when the user
/// authenticates with a device.
#[derive(Builder, Clone, Debug, Default, PartialEq, Validate)]
#[builder(setter(into), build_fn(error = "BuilderError"))]
#[validate(schema(function = "validate_login"))]
pub struct LoginToken {
    #[validate(length(min = 1))]
    pub username: String,

    #[builder(default, setter(strip_option))]
    pub password: Option<String>,

    #[builder(default, setter(strip_option))]
    pub otp: Option<String>,

    /// Factor code of the OTP.
    #[builder(default, setter(strip_option))]
    pub otp_type: Option<String>,

    #[builder(default, setter(strip_option))]
    pub device_id: Option<String>,

    #[builder(default)]
    pub creation: DateTime<Utc>,
}

fn validate_login(token: &LoginToken) -> Result<(), ValidationError> {
    let message = match (&token.password, &token.otp, &token.device_id) {
        (Some(_), Some(_), _) => "Login token cannot have both password and OTP",
        (None, None, None) => "Login token needs password, OTP or device id",
        (None, None, Some(_)) | (None, Some(_), _) | (Some(_), None, _) => {
            if token.otp_type.is_some() && token.otp.is_none() {
                "OTP type without OTP"
            } else {
                return Ok(());
            }
        }
    };
    let mut err = ValidationError::new("invalid_login_token");
    err.message = Some(message.into());
    Err(err)
}

impl From<LoginToken> for Token {
    fn from(value: LoginToken) -> Self {
        Self::Login(value)
    }
}

static FIELDS: &[Field<LoginToken>] = &[
    Field::string(
        "u",
        "username",
        REQUIRED,
        |t: &LoginToken| Some(t.username.as_str()),
        |t: &mut LoginToken, v| t.username = v,
    ),
    Field::string(
        "p",
        "password",
        OPTIONAL,
        |t: &LoginToken| t.password.as_deref(),
        |t: &mut LoginToken, v| t.password = Some(v),
    ),
    Field::string(
        "otp",
        "otp",
        OPTIONAL,
        |t: &LoginToken| t.otp.as_deref(),
        |t: &mut LoginToken, v| t.otp = Some(v),
    ),
    Field::string(
        "ott",
        "otp type",
        OPTIONAL,
        |t: &LoginToken| t.otp_type.as_deref(),
        |t: &mut LoginToken, v| t.otp_type = Some(v),
    ),
    Field::string(
        "did",
        "device id",
        OPTIONAL,
        |t: &LoginToken| t.device_id.as_deref(),
        |t: &mut LoginToken, v| t.device_id = Some(v),
    ),
    Field::time(
        "ct",
        "creation",
        CREATION,
        |t: &LoginToken| creation_time(t.creation),
        |t: &mut LoginToken, v| t.creation = v,
    ),
];

static SCHEMA: Schema<LoginToken> = Schema::new("login token", FIELDS);

impl Encodable for LoginToken {
    fn schema() -> &'static Schema<Self> {
        &SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_combinations() {
        let base = LoginTokenBuilder::default().username("user").build().unwrap();
        assert!(base.validate().is_err());

        let password = LoginToken {
            password: Some("secret".into()),
            ..base.clone()
        };
        assert!(password.validate().is_ok());

        let otp = LoginToken {
            otp: Some("123456".into()),
            otp_type: Some("o1".into()),
            ..base.clone()
        };
        assert!(otp.validate().is_ok());

        let both = LoginToken {
            password: Some("secret".into()),
            ..otp
        };
        assert!(both.validate().is_err());

        let device = LoginToken {
            device_id: Some("DEVICEID".into()),
            ..base.clone()
        };
        assert!(device.validate().is_ok());

        let stray_type = LoginToken {
            otp_type: Some("o1".into()),
            ..password
        };
        assert!(stray_type.validate().is_err());
    }
}
