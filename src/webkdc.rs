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
//! # WebKDC login state
//!
//! State of a single login request to the WebKDC: the tokens presented by
//! the WebLogin server and the results of processing them. A [`LoginState`]
//! lives for the duration of one request and is never persisted.
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::context::{Context, LogLevel};
use crate::error::{Status, WebAuthError};
use crate::keyring::{Key, KeyType, Keyring, Sealer};
use crate::token::{
    self, Factors, LoginToken, RequestToken, Token, TokenType, WebkdcFactorToken,
    WebkdcProxyToken, WebkdcServiceToken,
};

#[derive(Clone, Debug)]
pub struct LoginState {
    /// Service token of the WebLogin server making the request.
    pub service: WebkdcServiceToken,
    /// Request token of the relying party, sealed with the session key.
    pub request: Option<RequestToken>,

    pub wkproxies: Vec<WebkdcProxyToken>,
    pub wkfactors: Vec<WebkdcFactorToken>,
    pub logins: Vec<LoginToken>,

    /// Host sending the request.
    pub client_ip: Option<String>,
    /// Host connecting to the WebLogin server.
    pub remote_ip: Option<String>,

    /// Opaque multifactor login state passed to and from the user
    /// information service.
    pub login_state_in: Option<String>,
    pub login_state_out: Option<String>,

    /// Requested authorization identity.
    pub authz_subject_in: Option<String>,
    /// Authorization identity granted by [`LoginState::resolve_authz_subject`].
    pub authz_subject_out: Option<String>,

    /// Keyring holding the session key of the service token.
    pub session: Keyring,

    /// Whether a login token was presented and the authentication succeeded.
    pub did_login: bool,
    /// Username of a login token whose authentication failed.
    pub login_subject: Option<String>,

    /// Merged tokens, set by [`LoginState::merge_tokens`].
    pub wkproxy: Option<WebkdcProxyToken>,
    pub wkfactor: Option<WebkdcFactorToken>,

    pub user_message: Option<String>,
    pub factors_wanted: Factors,
    pub factors_configured: Factors,
    pub password_expires: Option<DateTime<Utc>>,

    /// Authorization identities the user may assert.
    pub permitted_authz: Vec<String>,
}

impl LoginState {
    /// Start a login for the application server identified by `service`.
    pub fn new(service: WebkdcServiceToken) -> Result<Self, WebAuthError> {
        let key = Key::new(KeyType::Aes, service.session_key.clone())
            .map_err(|e| e.context("session key of webkdc-service token"))?;
        let session = Keyring::from_key(key, service.creation);
        Ok(Self {
            service,
            request: None,
            wkproxies: Vec::new(),
            wkfactors: Vec::new(),
            logins: Vec::new(),
            client_ip: None,
            remote_ip: None,
            login_state_in: None,
            login_state_out: None,
            authz_subject_in: None,
            authz_subject_out: None,
            session,
            did_login: false,
            login_subject: None,
            wkproxy: None,
            wkfactor: None,
            user_message: None,
            factors_wanted: Factors::new(),
            factors_configured: Factors::new(),
            password_expires: None,
            permitted_authz: Vec::new(),
        })
    }

    /// Decode the request token, which is sealed with the session key.
    pub fn open_request(
        &mut self,
        ctx: &mut Context,
        input: &[u8],
        sealer: &dyn Sealer,
    ) -> Result<&RequestToken, WebAuthError> {
        match token::decode(ctx, Some(TokenType::Request), input, &self.session, sealer)? {
            Token::Request(request) => Ok(self.request.insert(request)),
            other => Err(ctx.error_set(
                Status::Corrupt,
                format!("wrong token type {}, expected req", other.token_type()),
            )),
        }
    }

    /// Merge the presented webkdc-factor and webkdc-proxy tokens.
    ///
    /// Expired tokens are skipped. The factors of the merged webkdc-factor
    /// token are added to the merged webkdc-proxy token when both belong to
    /// the same user.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn merge_tokens(
        &mut self,
        ctx: &mut Context,
        now: DateTime<Utc>,
    ) -> Result<(), WebAuthError> {
        self.merge_at(ctx, now).inspect_err(|e| ctx.record(e))
    }

    fn merge_at(&mut self, ctx: &Context, now: DateTime<Utc>) -> Result<(), WebAuthError> {
        // State is only replaced once every merge has succeeded.
        let wkfactors: Vec<_> = self
            .wkfactors
            .iter()
            .filter(|t| {
                let live = t.expiration > now;
                if !live {
                    ctx.log_info(&format!(
                        "ignoring expired webkdc-factor token for {}",
                        t.subject
                    ));
                }
                live
            })
            .cloned()
            .collect();
        let wkproxies: Vec<_> = self
            .wkproxies
            .iter()
            .filter(|t| {
                let live = t.expiration > now;
                if !live {
                    ctx.log_info(&format!(
                        "ignoring expired webkdc-proxy token for {}",
                        t.subject
                    ));
                }
                live
            })
            .cloned()
            .collect();

        let wkfactor = match wkfactors.as_slice() {
            [] => None,
            tokens => Some(token::merge_webkdc_factor(tokens)?),
        };
        let limit = ctx.config().webkdc.login_time_limit;
        let wkproxy = match wkproxies.as_slice() {
            [] => None,
            tokens => Some(token::merge_webkdc_proxy(tokens, limit, now)?),
        };

        let wkproxy = match (wkproxy, &wkfactor) {
            (Some(proxy), Some(factor)) if proxy.subject == factor.subject => {
                Some(token::merge_webkdc_proxy_factor(&proxy, factor)?)
            }
            (Some(proxy), Some(factor)) => {
                ctx.log_notice(&format!(
                    "ignoring webkdc-factor token for {} in login of {}",
                    factor.subject, proxy.subject
                ));
                Some(proxy)
            }
            (proxy, _) => proxy,
        };
        debug!(
            "merged {} webkdc-proxy and {} webkdc-factor tokens",
            wkproxies.len(),
            wkfactors.len()
        );
        self.wkproxies = wkproxies;
        self.wkfactors = wkfactors;
        self.wkproxy = wkproxy;
        self.wkfactor = wkfactor;
        Ok(())
    }

    /// Authenticated user, or the username of a failed login.
    pub fn subject(&self) -> Option<&str> {
        self.wkproxy
            .as_ref()
            .map(|t| t.subject.as_str())
            .or(self.login_subject.as_deref())
    }

    /// Grant the requested authorization identity.
    ///
    /// Asking for the authenticated identity itself is not an authorization
    /// request. Any other identity must be listed in `permitted_authz`.
    pub fn resolve_authz_subject(&mut self) -> Result<Option<&str>, WebAuthError> {
        self.authz_subject_out = None;
        let Some(wanted) = self.authz_subject_in.as_deref() else {
            return Ok(None);
        };
        if Some(wanted) == self.subject() {
            return Ok(None);
        }
        if !self.permitted_authz.iter().any(|p| p == wanted) {
            return Err(WebAuthError::new(
                Status::UserRejected,
                format!(
                    "{} not authorized to use {wanted} as authorization identity",
                    self.subject().unwrap_or("<unknown>")
                ),
            ));
        }
        Ok(Some(self.authz_subject_out.insert(wanted.to_string()).as_str()))
    }

    /// Log a one-line summary of the login through the context.
    pub fn log_login(&self, ctx: &Context, result: Result<(), &WebAuthError>) {
        let mut fields = vec![format!("server={}", self.service.subject)];
        if let Some(ip) = &self.client_ip {
            fields.push(format!("clientIp={ip}"));
        }
        if let Some(ip) = &self.remote_ip {
            fields.push(format!("remoteIp={ip}"));
        }
        if let Some(subject) = self.subject() {
            fields.push(format!("user={subject}"));
        }
        if let Some(authz) = &self.authz_subject_out {
            fields.push(format!("authz={authz}"));
        }
        if let Some(request) = &self.request {
            if let Some(url) = &request.return_url {
                fields.push(format!("ru={url}"));
            }
            if let Some(options) = &request.options {
                fields.push(format!("options={options}"));
            }
        }
        if let Some(proxy) = &self.wkproxy {
            fields.push(format!("login={}", if self.did_login { "password" } else { "sso" }));
            if let Some(factors) = &proxy.initial_factors {
                fields.push(format!("factorsInitial={factors}"));
            }
            if let Some(factors) = &proxy.session_factors {
                fields.push(format!("factorsSession={factors}"));
            }
            if let Some(loa) = proxy.loa {
                fields.push(format!("loa={loa}"));
            }
        }
        match result {
            Ok(()) => fields.push("status=0".to_string()),
            Err(err) => {
                fields.push(format!("status={}", err.status().code()));
                fields.push(format!("error=\"{}\"", err.message()));
            }
        }
        ctx.log(LogLevel::Notice, &format!("WebKDC login {}", fields.join(" ")));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::TimeDelta;

    use super::*;
    use crate::config::Config;
    use crate::keyring::FernetSealer;
    use crate::tests::token::*;

    fn state() -> LoginState {
        LoginState::new(webkdc_service("krb5:webauth/example.org@EXAMPLE.ORG", &[7; 16])).unwrap()
    }

    fn ctx_with_limit(limit: u64) -> Context {
        let mut config = Config::default();
        config.webkdc.login_time_limit = limit;
        Context::with_config(config)
    }

    #[test]
    fn test_bad_session_key() {
        let err = LoginState::new(webkdc_service("svc", &[7; 5])).unwrap_err();
        assert_eq!(Status::Invalid, err.status());
    }

    #[test]
    fn test_open_request() {
        let mut state = state();
        let mut ctx = Context::new();
        let sealer = FernetSealer::new();
        let request = every_token(now())
            .into_iter()
            .find(|t| t.token_type() == TokenType::Request)
            .unwrap();
        let sealed = token::encode(&mut ctx, &request, &state.session, &sealer).unwrap();
        state.open_request(&mut ctx, &sealed, &sealer).unwrap();
        assert_eq!(Some(request), state.request.clone().map(Token::from));

        let other: Token = webkdc_factor("user", "p", -1, 60).into();
        let sealed = token::encode(&mut ctx, &other, &state.session, &sealer).unwrap();
        let err = state.open_request(&mut ctx, &sealed, &sealer).unwrap_err();
        assert_eq!(Status::Corrupt, err.status());
    }

    #[test]
    fn test_merge_tokens() {
        let mut state = state();
        let mut ctx = ctx_with_limit(3600);
        state.wkproxies = vec![
            webkdc_proxy("user", "k", -5, 3600),
            webkdc_proxy("user", "o", -10000, 600),
            webkdc_proxy("user", "x", -20000, -1),
        ];
        state.wkfactors = vec![
            webkdc_factor("user", "d", -100, 86400),
            webkdc_factor("user", "m", -100, -10),
        ];
        state.merge_tokens(&mut ctx, now()).unwrap();

        assert_eq!(2, state.wkproxies.len());
        assert_eq!(1, state.wkfactors.len());
        let proxy = state.wkproxy.as_ref().unwrap();
        assert_eq!(Some("d,k,o".into()), proxy.initial_factors);
        assert_eq!(Some("k".into()), proxy.session_factors);
        assert_eq!(at(600), proxy.expiration);
        assert_eq!("d", state.wkfactor.as_ref().unwrap().factors);
        assert_eq!(Some("user"), state.subject());
        assert_eq!(None, ctx.error_status());
    }

    #[test]
    fn test_merge_tokens_default_limit() {
        let mut state = state();
        let mut ctx = Context::new();
        state.wkproxies = vec![webkdc_proxy("user", "p", -600, 3600)];
        state.merge_tokens(&mut ctx, now()).unwrap();
        let proxy = state.wkproxy.as_ref().unwrap();
        assert_eq!(Some("p".into()), proxy.initial_factors);
        assert_eq!(None, proxy.session_factors);
    }

    #[test]
    fn test_merge_tokens_foreign_factor() {
        let mut state = state();
        let mut ctx = ctx_with_limit(300);
        state.wkproxies = vec![webkdc_proxy("user", "p", -5, 3600)];
        state.wkfactors = vec![webkdc_factor("other", "d", -5, 3600)];
        state.merge_tokens(&mut ctx, now()).unwrap();
        assert_eq!(Some("p".into()), state.wkproxy.as_ref().unwrap().initial_factors);
        assert_eq!("other", state.wkfactor.as_ref().unwrap().subject);
    }

    #[test]
    fn test_merge_tokens_mismatch() {
        let mut state = state();
        let mut ctx = ctx_with_limit(300);
        state.wkproxies = vec![
            webkdc_proxy("user", "p", -5, 3600),
            webkdc_proxy("other", "p", -5, 3600),
        ];
        let err = state.merge_tokens(&mut ctx, now()).unwrap_err();
        assert_eq!(Status::Invalid, err.status());
        assert_eq!(Some(Status::Invalid), ctx.error_status());
        assert!(state.wkproxy.is_none());
    }

    #[test]
    fn test_merge_tokens_failure_keeps_inputs() {
        let mut state = state();
        let mut ctx = ctx_with_limit(300);
        let proxies = vec![
            webkdc_proxy("user", "p", -500, -10),
            webkdc_proxy("user", "p", -5, 3600),
            webkdc_proxy("other", "p", -5, 3600),
        ];
        let factors = vec![
            webkdc_factor("user", "d", -500, -10),
            webkdc_factor("user", "d", -50, 3600),
        ];
        state.wkproxies = proxies.clone();
        state.wkfactors = factors.clone();

        state.merge_tokens(&mut ctx, now()).unwrap_err();
        assert_eq!(proxies, state.wkproxies);
        assert_eq!(factors, state.wkfactors);
        assert!(state.wkproxy.is_none());
        assert!(state.wkfactor.is_none());
    }

    #[test]
    fn test_merge_tokens_empty() {
        let mut state = state();
        let mut ctx = Context::new();
        state.login_subject = Some("user".into());
        state.merge_tokens(&mut ctx, now()).unwrap();
        assert!(state.wkproxy.is_none());
        assert!(state.wkfactor.is_none());
        assert_eq!(Some("user"), state.subject());
    }

    #[test]
    fn test_resolve_authz_subject() {
        let mut state = state();
        state.wkproxy = Some(webkdc_proxy("user", "p", -5, 3600));
        assert_eq!(None, state.resolve_authz_subject().unwrap());

        state.authz_subject_in = Some("user".into());
        assert_eq!(None, state.resolve_authz_subject().unwrap());

        state.authz_subject_in = Some("admin".into());
        let err = state.resolve_authz_subject().unwrap_err();
        assert_eq!(Status::UserRejected, err.status());
        assert_eq!(None, state.authz_subject_out);

        state.permitted_authz = vec!["guest".into(), "admin".into()];
        assert_eq!(Some("admin"), state.resolve_authz_subject().unwrap());
        assert_eq!(Some("admin".into()), state.authz_subject_out);
    }

    #[test]
    fn test_log_login() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let mut ctx = Context::new();
        ctx.set_log_callback(
            LogLevel::Notice,
            Box::new(move |msg: &str| sink.lock().unwrap().push(msg.to_string())),
        );

        let mut state = state();
        state.client_ip = Some("192.0.2.1".into());
        state.wkproxy = Some(webkdc_proxy("user", "p", -5, 3600));
        state.did_login = true;
        state.log_login(&ctx, Ok(()));

        let err = WebAuthError::new(Status::LoginFailed, "bad password");
        state.log_login(&ctx, Err(&err));

        let lines = lines.lock().unwrap();
        assert_eq!(2, lines.len());
        assert_eq!(
            "WebKDC login server=krb5:webauth/example.org@EXAMPLE.ORG clientIp=192.0.2.1 \
             user=user login=password factorsInitial=p loa=1 status=0",
            lines[0]
        );
        assert!(lines[1].ends_with("status=15 error=\"bad password\""), "{}", lines[1]);
    }

    #[test]
    fn test_expired_tokens_logged() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let mut ctx = Context::new();
        ctx.set_log_callback(
            LogLevel::Info,
            Box::new(move |msg: &str| sink.lock().unwrap().push(msg.to_string())),
        );
        let mut state = state();
        state.wkfactors = vec![webkdc_factor("user", "d", -100, -1)];
        state.merge_tokens(&mut ctx, now() + TimeDelta::seconds(1)).unwrap();
        assert!(state.wkfactor.is_none());
        assert!(state.wkfactors.is_empty());
        assert_eq!(
            vec!["ignoring expired webkdc-factor token for user".to_string()],
            *lines.lock().unwrap()
        );
    }
}
