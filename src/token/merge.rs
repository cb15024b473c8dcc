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
//! # Token merging
//!
//! A login may present several webkdc-proxy and webkdc-factor tokens for the
//! same user. These are combined into one token of each kind before the
//! result is handed back to the relying party.
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::error::WebAuthError;
use crate::token::factors::Factors;
use crate::token::seconds_before;
use crate::token::types::{WebkdcFactorToken, WebkdcProxyToken};

/// Ensure every token in `tokens` carries the subject of the first one.
fn common_subject<'a, T, F>(
    kind: &str,
    tokens: &'a [T],
    subject: F,
) -> Result<&'a str, WebAuthError>
where
    F: Fn(&'a T) -> &'a str,
{
    let (first, rest) = tokens
        .split_first()
        .ok_or_else(|| WebAuthError::invalid(format!("no {kind} tokens to merge")))?;
    let expected = subject(first);
    if let Some(other) = rest.iter().map(&subject).find(|s| *s != expected) {
        return Err(WebAuthError::invalid(format!(
            "subject mismatch in {kind} tokens: {expected} != {other}"
        )));
    }
    Ok(expected)
}

/// Merge webkdc-factor tokens of one user into a single token.
///
/// The result carries the union of the factors and is valid only while every
/// input is.
#[tracing::instrument(level = "trace", skip_all, fields(count = tokens.len()))]
pub fn merge_webkdc_factor(
    tokens: &[WebkdcFactorToken],
) -> Result<WebkdcFactorToken, WebAuthError> {
    let subject = common_subject("webkdc-factor", tokens, |t| t.subject.as_str())?;
    let factors = tokens
        .iter()
        .fold(Factors::new(), |acc, t| acc.union(&t.factor_set()));
    let creation = tokens.iter().map(|t| t.creation).min().unwrap_or_default();
    let expiration = tokens.iter().map(|t| t.expiration).min().unwrap_or_default();
    trace!("merged factors {factors} for {subject}");
    Ok(WebkdcFactorToken {
        subject: subject.to_string(),
        factors: factors.to_string(),
        creation,
        expiration,
    })
}

/// Merge webkdc-proxy tokens of one user into a single token.
///
/// Initial factors are collected from every input. Session factors are only
/// collected from inputs created within `session_limit` seconds of `now`; an
/// input without session factors contributes its initial factors. The proxy
/// type, proxy subject and data of the newest input are kept.
#[tracing::instrument(level = "trace", skip_all, fields(count = tokens.len()))]
pub fn merge_webkdc_proxy(
    tokens: &[WebkdcProxyToken],
    session_limit: u64,
    now: DateTime<Utc>,
) -> Result<WebkdcProxyToken, WebAuthError> {
    let subject = common_subject("webkdc-proxy", tokens, |t| t.subject.as_str())?;
    let cutoff = seconds_before(now, session_limit);

    let mut initial = Factors::new();
    let mut session = Factors::new();
    for token in tokens {
        initial = initial.union(&token.initial_factor_set());
        if token.creation >= cutoff {
            let factors = match token.session_factors {
                Some(_) => token.session_factor_set(),
                None => token.initial_factor_set(),
            };
            session = session.union(&factors);
        } else {
            debug!(
                "webkdc-proxy token created at {} too old for session factors",
                token.creation.timestamp()
            );
        }
    }

    // Ties go to the later input.
    let newest = tokens
        .iter()
        .max_by_key(|t| t.creation)
        .ok_or_else(|| WebAuthError::invalid("no webkdc-proxy tokens to merge"))?;
    let creation = tokens.iter().map(|t| t.creation).min().unwrap_or_default();
    let expiration = tokens.iter().map(|t| t.expiration).min().unwrap_or_default();
    let loa = tokens.iter().filter_map(|t| t.loa).max();

    Ok(WebkdcProxyToken {
        subject: subject.to_string(),
        proxy_type: newest.proxy_type.clone(),
        proxy_subject: newest.proxy_subject.clone(),
        data: newest.data.clone(),
        initial_factors: initial.to_opt_string(),
        session_factors: session.to_opt_string(),
        loa,
        creation,
        expiration,
    })
}

/// Add the factors of a webkdc-factor token to the initial factors of a
/// webkdc-proxy token.
pub fn merge_webkdc_proxy_factor(
    proxy: &WebkdcProxyToken,
    factor: &WebkdcFactorToken,
) -> Result<WebkdcProxyToken, WebAuthError> {
    if proxy.subject != factor.subject {
        return Err(WebAuthError::invalid(format!(
            "subject mismatch between webkdc-proxy and webkdc-factor tokens: {} != {}",
            proxy.subject, factor.subject
        )));
    }
    let mut merged = proxy.clone();
    merged.initial_factors = proxy
        .initial_factor_set()
        .union(&factor.factor_set())
        .to_opt_string();
    Ok(merged)
}
