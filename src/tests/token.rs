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
//! Token fixtures with times relative to a fixed reference point.
use std::sync::LazyLock;

use chrono::{DateTime, TimeDelta, Utc};

use crate::token::*;

/// Reference time shared by every fixture of a test run.
///
/// Truncated to whole seconds, the resolution of encoded times.
static NOW: LazyLock<DateTime<Utc>> = LazyLock::new(|| {
    DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap_or_default()
});

pub fn now() -> DateTime<Utc> {
    *NOW
}

/// Time `offset` seconds from [`now`].
pub fn at(offset: i64) -> DateTime<Utc> {
    now() + TimeDelta::seconds(offset)
}

pub fn webkdc_factor(
    subject: &str,
    factors: &str,
    created: i64,
    expires: i64,
) -> WebkdcFactorToken {
    WebkdcFactorTokenBuilder::default()
        .subject(subject)
        .factors(factors)
        .creation(at(created))
        .expiration(at(expires))
        .build()
        .unwrap()
}

pub fn webkdc_proxy(
    subject: &str,
    factors: &str,
    created: i64,
    expires: i64,
) -> WebkdcProxyToken {
    WebkdcProxyTokenBuilder::default()
        .subject(subject)
        .proxy_type("krb5")
        .proxy_subject("WEBKDC:krb5:service/webkdc@EXAMPLE.ORG")
        .data(b"krb5 tgt".to_vec())
        .initial_factors(factors)
        .loa(1u64)
        .creation(at(created))
        .expiration(at(expires))
        .build()
        .unwrap()
}

pub fn webkdc_service(subject: &str, key: &[u8]) -> WebkdcServiceToken {
    WebkdcServiceTokenBuilder::default()
        .subject(subject)
        .session_key(key.to_vec())
        .creation(at(-60))
        .expiration(at(3600))
        .build()
        .unwrap()
}

/// One valid token of every type, the error token first.
pub fn every_token(now: DateTime<Utc>) -> Vec<Token> {
    let created = now - TimeDelta::seconds(10);
    let expires = now + TimeDelta::hours(1);
    vec![
        ErrorTokenBuilder::default()
            .code(16u64)
            .message("user canceled login")
            .creation(created)
            .build()
            .unwrap()
            .into(),
        IdTokenBuilder::default()
            .subject("user")
            .authz_subject("admin")
            .auth("webkdc")
            .initial_factors("p,o")
            .session_factors("o")
            .loa(2u64)
            .creation(created)
            .expiration(expires)
            .build()
            .unwrap()
            .into(),
        LoginTokenBuilder::default()
            .username("user")
            .otp("123456")
            .otp_type("o1")
            .creation(created)
            .build()
            .unwrap()
            .into(),
        ProxyTokenBuilder::default()
            .subject("user")
            .proxy_type("krb5")
            .webkdc_proxy(b"sealed webkdc-proxy".to_vec())
            .initial_factors("p")
            .creation(created)
            .expiration(expires)
            .build()
            .unwrap()
            .into(),
        AppTokenBuilder::default()
            .subject("user")
            .last_used(now)
            .loa(1u64)
            .creation(created)
            .expiration(expires)
            .build()
            .unwrap()
            .into(),
        CredTokenBuilder::default()
            .subject("user")
            .cred_type("krb5")
            .service("host/example.org@EXAMPLE.ORG")
            .data(vec![0, 1, 2, 0x3b, 0x3d, 0xff])
            .creation(created)
            .expiration(expires)
            .build()
            .unwrap()
            .into(),
        RequestTokenBuilder::default()
            .request_type("id")
            .auth("webkdc")
            .state(b"app state".to_vec())
            .return_url("https://example.org/app/")
            .options("fa")
            .initial_factors("p")
            .creation(created)
            .build()
            .unwrap()
            .into(),
        WebkdcFactorTokenBuilder::default()
            .subject("user")
            .factors("d")
            .creation(created)
            .expiration(expires)
            .build()
            .unwrap()
            .into(),
        WebkdcProxyTokenBuilder::default()
            .subject("user")
            .proxy_type("remuser")
            .proxy_subject("WEBKDC:remuser")
            .initial_factors("x1")
            .session_factors("x1")
            .loa(1u64)
            .creation(created)
            .expiration(expires)
            .build()
            .unwrap()
            .into(),
        WebkdcServiceTokenBuilder::default()
            .subject("krb5:webauth/example.org@EXAMPLE.ORG")
            .session_key(vec![0x42; 16])
            .creation(created)
            .expiration(expires)
            .build()
            .unwrap()
            .into(),
    ]
}

/// One token of every type with only its required fields set, the error
/// token first.
///
/// Some of these do not pass validation, such as an app token without a
/// subject or session key. They are meant for encoding tests.
pub fn minimal_token(now: DateTime<Utc>) -> Vec<Token> {
    let created = now - TimeDelta::seconds(10);
    let expires = now + TimeDelta::hours(1);
    vec![
        ErrorTokenBuilder::default()
            .code(5u64)
            .message("m")
            .creation(created)
            .build()
            .unwrap()
            .into(),
        IdTokenBuilder::default()
            .auth("krb5")
            .creation(created)
            .expiration(expires)
            .build()
            .unwrap()
            .into(),
        LoginTokenBuilder::default()
            .username("user")
            .creation(created)
            .build()
            .unwrap()
            .into(),
        ProxyTokenBuilder::default()
            .subject("user")
            .proxy_type("krb5")
            .webkdc_proxy(vec![1])
            .creation(created)
            .expiration(expires)
            .build()
            .unwrap()
            .into(),
        AppTokenBuilder::default()
            .creation(created)
            .expiration(expires)
            .build()
            .unwrap()
            .into(),
        CredTokenBuilder::default()
            .subject("user")
            .cred_type("krb5")
            .service("host/example.org@EXAMPLE.ORG")
            .data(vec![0])
            .creation(created)
            .expiration(expires)
            .build()
            .unwrap()
            .into(),
        RequestTokenBuilder::default()
            .creation(created)
            .build()
            .unwrap()
            .into(),
        WebkdcFactorTokenBuilder::default()
            .subject("user")
            .factors("p")
            .creation(created)
            .expiration(expires)
            .build()
            .unwrap()
            .into(),
        WebkdcProxyTokenBuilder::default()
            .subject("user")
            .proxy_type("krb5")
            .proxy_subject("WEBKDC:krb5:service/webkdc@EXAMPLE.ORG")
            .creation(created)
            .expiration(expires)
            .build()
            .unwrap()
            .into(),
        WebkdcServiceTokenBuilder::default()
            .subject("krb5:webauth/example.org@EXAMPLE.ORG")
            .session_key(vec![0x42; 16])
            .creation(created)
            .expiration(expires)
            .build()
            .unwrap()
            .into(),
    ]
}
