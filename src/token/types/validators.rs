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
use validator::ValidationError;

use crate::token::types::{IdToken, WebkdcProxyToken};

pub fn validate_set_time(time: &DateTime<Utc>) -> Result<(), ValidationError> {
    if time.timestamp() == 0 {
        let mut err = ValidationError::new("time_unset");
        err.message = Some("Time must be set".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_factors(factors: &str) -> Result<(), ValidationError> {
    if factors.split(',').any(|f| f.trim().is_empty()) {
        let mut err = ValidationError::new("invalid_factors");
        err.message = Some("Factors must be a comma-separated list of factor codes".into());
        return Err(err);
    }
    Ok(())
}

/// Id tokens authenticate either with the subject or with Kerberos
/// authenticator data.
pub fn validate_id_auth(token: &IdToken) -> Result<(), ValidationError> {
    let message = match token.auth.as_str() {
        "webkdc" if token.subject.is_none() => "webkdc authenticator requires a subject",
        "krb5" if token.auth_data.is_none() => "krb5 authenticator requires auth data",
        "webkdc" | "krb5" => return Ok(()),
        _ => "Unknown authenticator type",
    };
    let mut err = ValidationError::new("invalid_auth");
    err.message = Some(message.into());
    Err(err)
}

/// The proxy type must name a known login source.
pub fn validate_webkdc_proxy_type(token: &WebkdcProxyToken) -> Result<(), ValidationError> {
    match token.proxy_type.as_str() {
        "krb5" | "otp" | "remuser" => Ok(()),
        _ => {
            let mut err = ValidationError::new("invalid_proxy_type");
            err.message = Some(format!("Unknown proxy type {}", token.proxy_type).into());
            Err(err)
        }
    }
}
