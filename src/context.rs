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
//! # Context
//!
//! Per unit of work state: the last error raised, the log callbacks and the
//! configuration. A context is never shared between threads of work, so
//! nothing in it is locked. Independent contexts may be used in parallel.
use std::collections::HashMap;

use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::error::{ProtocolStatus, Status, WebAuthError};

/// Log level of a context callback.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LogLevel {
    Trace,
    Info,
    Notice,
    Warn,
}

/// Log callback. Any user data is captured by the closure.
pub type LogCallback = Box<dyn Fn(&str) + Send>;

#[derive(Default)]
pub struct Context {
    /// Status and message of the last recorded failure.
    error: Option<(Status, String)>,
    callbacks: HashMap<LogLevel, LogCallback>,
    config: Config,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("error", &self.error)
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Record a new failure, replacing any earlier one, and return it.
    pub fn error_set<M: Into<String>>(&mut self, status: Status, message: M) -> WebAuthError {
        let err = WebAuthError::new(status, message);
        self.record(&err);
        err
    }

    /// Remember `err` as the outstanding failure of this context.
    pub fn record(&mut self, err: &WebAuthError) {
        debug!(status = ?err.status(), "{}", err.message());
        self.error = Some((err.status(), err.message().to_string()));
    }

    /// Prepend explanatory text to the outstanding failure message.
    pub fn error_context<C: std::fmt::Display>(&mut self, context: C) {
        if let Some((_, message)) = self.error.as_mut() {
            *message = format!("{context}: {message}");
        }
    }

    /// Rewrite the outstanding status to `new` if it currently is `old`.
    pub fn error_change(&mut self, old: Status, new: Status) {
        if let Some((status, _)) = self.error.as_mut()
            && *status == old
        {
            *status = new;
        }
    }

    pub fn error_status(&self) -> Option<Status> {
        self.error.as_ref().map(|(status, _)| *status)
    }

    /// Message for `status`.
    ///
    /// The recorded message is returned only when it belongs to `status`,
    /// otherwise the generic description of the status.
    pub fn error_message(&self, status: Status) -> String {
        match &self.error {
            Some((recorded, message)) if *recorded == status => {
                format!("{message} ({})", status.description())
            }
            _ => status.description().to_string(),
        }
    }

    /// Protocol projection of the outstanding failure.
    pub fn protocol(&self) -> Option<ProtocolStatus> {
        self.error_status().map(Status::protocol)
    }

    pub fn set_log_callback(&mut self, level: LogLevel, callback: LogCallback) {
        self.callbacks.insert(level, callback);
    }

    pub fn clear_log_callback(&mut self, level: LogLevel) {
        self.callbacks.remove(&level);
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Trace => trace!("{message}"),
            LogLevel::Info => info!("{message}"),
            LogLevel::Notice => info!(notice = true, "{message}"),
            LogLevel::Warn => warn!("{message}"),
        }
        if let Some(callback) = self.callbacks.get(&level) {
            callback(message);
        }
    }

    pub fn log_trace(&self, message: &str) {
        self.log(LogLevel::Trace, message)
    }

    pub fn log_info(&self, message: &str) {
        self.log(LogLevel::Info, message)
    }

    pub fn log_notice(&self, message: &str) {
        self.log(LogLevel::Notice, message)
    }

    pub fn log_warn(&self, message: &str) {
        self.log(LogLevel::Warn, message)
    }

    /// Log an error with a leading description of what failed.
    pub fn log_error(&self, level: LogLevel, err: &WebAuthError, prefix: &str) {
        self.log(
            level,
            &format!("{prefix}: {} ({})", err.message(), err.status().description()),
        )
    }
}
