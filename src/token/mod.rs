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
//! # Tokens
//!
//! A token is the attribute encoding of one of the [`Token`] variants,
//! preceded by its type in the `t` attribute, sealed with a keyring key.
use chrono::{DateTime, TimeDelta, Utc};
use tracing::trace;

use crate::buffer::Buffer;
use crate::context::Context;
use crate::encoding::{AttrWriter, Attributes};
use crate::error::{Status, WebAuthError};
use crate::keyring::{Keyring, Sealer};

pub mod factors;
pub mod merge;
pub mod types;

pub use factors::Factors;
pub use merge::{merge_webkdc_factor, merge_webkdc_proxy, merge_webkdc_proxy_factor};
pub use types::*;

/// Name of the token type attribute.
const TYPE_ATTR: &str = "t";

/// Attribute encoding of `token`, without any validation.
pub fn encode_raw(token: &Token) -> Result<Vec<u8>, WebAuthError> {
    let mut buf = Buffer::new();
    let mut out = AttrWriter::new(&mut buf);
    out.binary(TYPE_ATTR, token.token_type().as_str().as_bytes())?;
    token.data().encode_attrs(&mut out)?;
    Ok(buf.into_vec())
}

/// Parse the attribute encoding of a token, without any validation.
pub fn decode_raw(input: &[u8]) -> Result<Token, WebAuthError> {
    let mut attrs = Attributes::parse(input).map_err(|e| e.context("decoding token"))?;
    if attrs.first_name() != Some(TYPE_ATTR) {
        return Err(WebAuthError::corrupt("token does not start with its type"));
    }
    let attr = attrs
        .take(TYPE_ATTR)
        .ok_or_else(|| WebAuthError::corrupt("token has no type attribute"))?;
    if attr.ascii {
        return Err(WebAuthError::corrupt("token type has the wrong representation"));
    }
    let name = String::from_utf8(attr.value)
        .map_err(|_| WebAuthError::corrupt("token type is not valid UTF-8"))?;
    let mut token = Token::empty(name.parse()?);
    token.data_mut().decode_attrs(&mut attrs)?;
    Ok(token)
}

/// Validate, encode and seal a token.
///
/// A token without a creation time is stamped with the current time.
#[tracing::instrument(level = "trace", skip_all, fields(token_type = %token.token_type()))]
pub fn encode(
    ctx: &mut Context,
    token: &Token,
    ring: &Keyring,
    sealer: &dyn Sealer,
) -> Result<Vec<u8>, WebAuthError> {
    encode_at(token, ring, sealer, Utc::now()).inspect_err(|e| ctx.record(e))
}

fn encode_at(
    token: &Token,
    ring: &Keyring,
    sealer: &dyn Sealer,
    now: DateTime<Utc>,
) -> Result<Vec<u8>, WebAuthError> {
    let mut token = token.clone();
    token.data_mut().stamp_creation(now);
    token.validate().map_err(|e| {
        WebAuthError::from(e).context(format!("invalid {} token", token.token_type()))
    })?;
    let raw = encode_raw(&token)?;
    trace!("encoded {} token in {} bytes", token.token_type(), raw.len());
    ring.seal(sealer, &raw, now)
}

/// The time `secs` seconds before `now`, saturating at the earliest
/// representable time.
pub(crate) fn seconds_before(now: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Unseal, decode and check a token.
///
/// When `expected` is given, a token of any other type is rejected. Tokens
/// past their expiration are rejected with [`Status::TokenExpired`]. Request
/// and login tokens older than the configured `token_max_ttl` are rejected
/// with [`Status::TokenStale`].
#[tracing::instrument(level = "trace", skip_all, fields(expected = ?expected))]
pub fn decode(
    ctx: &mut Context,
    expected: Option<TokenType>,
    input: &[u8],
    ring: &Keyring,
    sealer: &dyn Sealer,
) -> Result<Token, WebAuthError> {
    let max_ttl = ctx.config().webkdc.token_max_ttl;
    decode_at(expected, input, ring, sealer, max_ttl, Utc::now()).inspect_err(|e| ctx.record(e))
}

fn decode_at(
    expected: Option<TokenType>,
    input: &[u8],
    ring: &Keyring,
    sealer: &dyn Sealer,
    max_ttl: u64,
    now: DateTime<Utc>,
) -> Result<Token, WebAuthError> {
    let raw = ring.unseal(sealer, input)?;
    let token = decode_raw(&raw)?;
    let token_type = token.token_type();
    if let Some(expected) = expected
        && expected != token_type
    {
        return Err(WebAuthError::corrupt(format!(
            "wrong token type {token_type}, expected {expected}"
        )));
    }
    token.validate().map_err(|e| {
        WebAuthError::from(e)
            .change(Status::Invalid, Status::Corrupt)
            .context(format!("invalid {token_type} token"))
    })?;
    if let Some(expiration) = token.expiration()
        && expiration <= now
    {
        return Err(WebAuthError::new(
            Status::TokenExpired,
            format!("{token_type} token expired at {}", expiration.timestamp()),
        ));
    }
    if matches!(token_type, TokenType::Request | TokenType::Login)
        && let Some(creation) = token.creation()
        && creation < seconds_before(now, max_ttl)
    {
        return Err(WebAuthError::new(
            Status::TokenStale,
            format!("{token_type} token created at {} is stale", creation.timestamp()),
        ));
    }
    Ok(token)
}
