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
//! # WebAuth configuration
//!
//! Parsing of the INI configuration file.
use config::{File, FileFormat};
use eyre::{Report, WrapErr};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    /// Global configuration options
    #[serde(rename = "DEFAULT")]
    pub default: Option<DefaultSection>,

    /// WebKDC configuration
    #[serde(default)]
    pub webkdc: WebkdcSection,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct DefaultSection {
    /// Debug logging
    pub debug: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebkdcSection {
    /// Path to the WebKDC keyring file.
    pub keyring: Option<PathBuf>,

    /// Maximum age in seconds of a webkdc-proxy token for its factors to still count as
    /// session factors of a login.
    #[serde(default = "default_login_time_limit")]
    pub login_time_limit: u64,

    /// Maximum lifetime in seconds of request and login tokens.
    #[serde(default = "default_token_max_ttl")]
    pub token_max_ttl: u64,
}

fn default_login_time_limit() -> u64 {
    300
}

fn default_token_max_ttl() -> u64 {
    300
}

impl Default for WebkdcSection {
    fn default() -> Self {
        Self {
            keyring: None,
            login_time_limit: default_login_time_limit(),
            token_max_ttl: default_token_max_ttl(),
        }
    }
}

impl Config {
    pub fn new(path: PathBuf) -> Result<Self, Report> {
        let mut builder = config::Config::builder();

        if std::path::Path::new(&path).is_file() {
            builder = builder.add_source(File::from(path).format(FileFormat::Ini));
        }

        builder.try_into()
    }

    /// Whether debug logging was requested.
    pub fn debug(&self) -> bool {
        self.default
            .as_ref()
            .and_then(|d| d.debug)
            .unwrap_or_default()
    }
}

impl TryFrom<config::ConfigBuilder<config::builder::DefaultState>> for Config {
    type Error = Report;
    fn try_from(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, Self::Error> {
        let mut builder = builder;
        builder = builder
            .set_default("webkdc.login_time_limit", "300")?
            .set_default("webkdc.token_max_ttl", "300")?;

        builder
            .build()
            .wrap_err("Failed to read configuration file")?
            .try_deserialize()
            .wrap_err("Failed to parse configuration file")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = Config::new(PathBuf::from("/nonexistent/webauth.conf")).unwrap();
        assert!(!config.debug());
        assert_eq!(300, config.webkdc.login_time_limit);
        assert_eq!(300, config.webkdc.token_max_ttl);
        assert!(config.webkdc.keyring.is_none());
    }

    #[test]
    fn test_parse_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[webkdc]
keyring = /var/lib/webkdc/keyring
login_time_limit = 3600
token_max_ttl = 600
"#
        )
        .unwrap();
        let config = Config::new(file.path().to_path_buf()).unwrap();
        assert_eq!(
            Some(PathBuf::from("/var/lib/webkdc/keyring")),
            config.webkdc.keyring
        );
        assert_eq!(3600, config.webkdc.login_time_limit);
        assert_eq!(600, config.webkdc.token_max_ttl);
    }

    #[test]
    fn test_invalid_value() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[webkdc]\nlogin_time_limit = soon\n").unwrap();
        assert!(Config::new(file.path().to_path_buf()).is_err());
    }
}
