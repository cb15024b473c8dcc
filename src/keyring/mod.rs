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
//! # Keyring
//!
//! Versioned set of symmetric keys protecting tokens. New data is sealed
//! with the newest key that is already valid; sealed data is opened by
//! trying every key of the ring.
//!
//! The persisted form uses the attribute encoding:
//!
//! ```text
//! v=1;n=2;ct0=...;va0=...;kt0:4=...;kd0:16=...;ct1=...;...
//! ```
use std::io::{ErrorKind, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::config::Config;
use crate::encoding::schema::{ASCII, REQUIRED};
use crate::encoding::{self, Field, Group, Schema};
use crate::error::{Status, WebAuthError};

pub mod backend;
mod key;

pub use backend::{FernetSealer, Sealer};
pub use key::{Key, KeySize, KeyType};

/// Version of the persisted keyring format.
pub const KEYRING_VERSION: u32 = 1;

/// A key together with its validity window.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyringEntry {
    /// When the key was created.
    pub creation: DateTime<Utc>,
    /// The key is not used for sealing before this time.
    pub valid_after: DateTime<Utc>,
    pub key: Key,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Keyring {
    entries: Vec<KeyringEntry>,
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyring holding a single key valid from `now`.
    pub fn from_key(key: Key, now: DateTime<Utc>) -> Self {
        let mut ring = Self::new();
        ring.add(now, now, key);
        ring
    }

    pub fn add(&mut self, creation: DateTime<Utc>, valid_after: DateTime<Utc>, key: Key) {
        self.entries.push(KeyringEntry {
            creation,
            valid_after,
            key,
        });
    }

    /// Remove the entry at `index`.
    pub fn remove(&mut self, index: usize) -> Result<KeyringEntry, WebAuthError> {
        if index >= self.entries.len() {
            return Err(WebAuthError::new(
                Status::NotFound,
                format!("keyring index {index} out of range"),
            ));
        }
        Ok(self.entries.remove(index))
    }

    pub fn entries(&self) -> &[KeyringEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key to seal new data with at `now`.
    ///
    /// The entry with the latest `valid_after` not after `now` wins, ties go
    /// to the latest `creation`.
    pub fn encryption_key(&self, now: DateTime<Utc>) -> Result<&Key, WebAuthError> {
        self.entries
            .iter()
            .filter(|entry| entry.valid_after <= now)
            .max_by_key(|entry| (entry.valid_after, entry.creation))
            .map(|entry| &entry.key)
            .ok_or_else(|| WebAuthError::new(Status::BadKey, "no valid keys found"))
    }

    /// Seal `data` with the current encryption key.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn seal(
        &self,
        sealer: &dyn Sealer,
        data: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Vec<u8>, WebAuthError> {
        let key = self.encryption_key(now)?;
        sealer.seal(key, data)
    }

    /// Unseal `data` with whichever key of the ring sealed it.
    ///
    /// The error does not tell which keys were tried or why they failed.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn unseal(&self, sealer: &dyn Sealer, data: &[u8]) -> Result<Vec<u8>, WebAuthError> {
        for (idx, entry) in self.entries.iter().enumerate() {
            match sealer.unseal(&entry.key, data) {
                Ok(payload) => {
                    trace!("data unsealed with key {idx}");
                    return Ok(payload);
                }
                Err(err) => trace!("key {idx} rejected data: {err}"),
            }
        }
        Err(WebAuthError::new(
            Status::BadKey,
            "unable to decrypt data with any key",
        ))
    }

    /// Persisted form of the keyring.
    pub fn encode(&self) -> Result<Vec<u8>, WebAuthError> {
        let data = KeyringData {
            version: KEYRING_VERSION,
            entries: self
                .entries
                .iter()
                .map(|entry| KeyringEntryData {
                    creation: entry.creation,
                    valid_after: entry.valid_after,
                    key_type: entry.key.key_type().code(),
                    key: entry.key.data().to_vec(),
                })
                .collect(),
        };
        encoding::encode(&KEYRING_SCHEMA, &data)
    }

    /// Parse the persisted form of a keyring.
    pub fn decode(input: &[u8]) -> Result<Self, WebAuthError> {
        let data: KeyringData = encoding::decode(&KEYRING_SCHEMA, input)?;
        if data.version != KEYRING_VERSION {
            return Err(WebAuthError::new(
                Status::FileVersion,
                format!("unsupported keyring version {}", data.version),
            ));
        }
        let mut ring = Self::new();
        for (idx, entry) in data.entries.into_iter().enumerate() {
            let key = KeyType::from_code(entry.key_type)
                .and_then(|key_type| Key::new(key_type, entry.key))
                .map_err(|e| {
                    e.change(Status::Invalid, Status::Corrupt)
                        .context(format!("keyring entry {idx}"))
                })?;
            ring.add(entry.creation, entry.valid_after, key);
        }
        Ok(ring)
    }

    /// Read a keyring from `path`.
    #[tracing::instrument(level = "debug")]
    pub fn read_file(path: &Path) -> Result<Self, WebAuthError> {
        let data = std::fs::read(path).map_err(|e| {
            let status = match e.kind() {
                ErrorKind::NotFound => Status::FileNotFound,
                _ => Status::FileRead,
            };
            WebAuthError::with_source(status, format!("cannot read keyring {}", path.display()), e)
        })?;
        let ring = Self::decode(&data)
            .map_err(|e| e.context(format!("keyring {}", path.display())))?;
        debug!("read {} keys", ring.len());
        Ok(ring)
    }

    /// Read the WebKDC keyring named by the `[webkdc] keyring` setting.
    pub fn from_config(config: &Config) -> Result<Self, WebAuthError> {
        let path = config
            .webkdc
            .keyring
            .as_deref()
            .ok_or_else(|| WebAuthError::invalid("no WebKDC keyring configured"))?;
        Self::read_file(path)
    }

    /// Write the keyring to `path`, atomically replacing any existing file.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn write_file(&self, path: &Path) -> Result<(), WebAuthError> {
        let encoded = self.encode()?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let write_err = |e: std::io::Error| {
            WebAuthError::with_source(
                Status::FileWrite,
                format!("cannot write keyring {}", path.display()),
                e,
            )
        };
        let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
        file.write_all(&encoded).map_err(write_err)?;
        file.as_file().sync_all().map_err(write_err)?;
        file.persist(path).map_err(|e| write_err(e.error))?;
        debug!("wrote {} keys", self.len());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct KeyringEntryData {
    creation: DateTime<Utc>,
    valid_after: DateTime<Utc>,
    key_type: u32,
    key: Vec<u8>,
}

#[derive(Debug, Default)]
struct KeyringData {
    version: u32,
    entries: Vec<KeyringEntryData>,
}

static ENTRY_FIELDS: &[Field<KeyringEntryData>] = &[
    Field::time(
        "ct",
        "creation",
        ASCII,
        |e: &KeyringEntryData| Some(e.creation),
        |e: &mut KeyringEntryData, v| e.creation = v,
    ),
    Field::time(
        "va",
        "valid after",
        ASCII,
        |e: &KeyringEntryData| Some(e.valid_after),
        |e: &mut KeyringEntryData, v| e.valid_after = v,
    ),
    Field::uint32(
        "kt",
        "key type",
        REQUIRED,
        |e: &KeyringEntryData| Some(e.key_type),
        |e: &mut KeyringEntryData, v| e.key_type = v,
    ),
    Field::data(
        "kd",
        "key data",
        REQUIRED,
        |e: &KeyringEntryData| Some(e.key.as_slice()),
        |e: &mut KeyringEntryData, v| e.key = v,
    ),
];

static ENTRY_GROUP: Group<KeyringData, KeyringEntryData> = Group {
    desc: "keyring entry",
    fields: ENTRY_FIELDS,
    get: |k: &KeyringData| k.entries.as_slice(),
    set: |k: &mut KeyringData, v| k.entries = v,
};

static KEYRING_FIELDS: &[Field<KeyringData>] = &[
    Field::uint32(
        "v",
        "version",
        ASCII,
        |k: &KeyringData| Some(k.version),
        |k: &mut KeyringData, v| k.version = v,
    ),
    Field::repeat("n", "entries", ASCII, &ENTRY_GROUP),
];

static KEYRING_SCHEMA: Schema<KeyringData> = Schema::new("keyring", KEYRING_FIELDS);

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use tempfile::tempdir;

    use super::backend::MockSealer;
    use super::*;

    fn key(byte: u8) -> Key {
        Key::new(KeyType::Aes, vec![byte; 16]).unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap()
    }

    #[test]
    fn test_selection() {
        let now = now();
        let mut ring = Keyring::new();
        ring.add(now, now - TimeDelta::seconds(100), key(1));
        ring.add(now, now - TimeDelta::seconds(10), key(2));
        ring.add(now, now + TimeDelta::seconds(50), key(3));
        assert_eq!(&key(2), ring.encryption_key(now).unwrap());
    }

    #[test]
    fn test_selection_tie_uses_creation() {
        let now = now();
        let mut ring = Keyring::new();
        let valid = now - TimeDelta::seconds(10);
        ring.add(now - TimeDelta::seconds(5), valid, key(1));
        ring.add(now - TimeDelta::seconds(1), valid, key(2));
        ring.add(now - TimeDelta::seconds(9), valid, key(3));
        assert_eq!(&key(2), ring.encryption_key(now).unwrap());
    }

    #[test]
    fn test_no_valid_key() {
        let now = now();
        let err = Keyring::new().encryption_key(now).unwrap_err();
        assert_eq!(Status::BadKey, err.status());

        let mut ring = Keyring::new();
        ring.add(now, now + TimeDelta::seconds(1), key(1));
        ring.add(now, now + TimeDelta::seconds(50), key(2));
        let err = ring.encryption_key(now).unwrap_err();
        assert_eq!(Status::BadKey, err.status());
        assert_eq!(
            crate::error::ProtocolStatus::ServerFailure,
            err.protocol()
        );
    }

    fn mock_sealer() -> MockSealer {
        let mut sealer = MockSealer::new();
        sealer.expect_seal().returning(|key, data| {
            let mut sealed = key.data().to_vec();
            sealed.extend_from_slice(data);
            Ok(sealed)
        });
        sealer.expect_unseal().returning(|key, data| {
            data.strip_prefix(key.data())
                .map(<[u8]>::to_vec)
                .ok_or_else(|| WebAuthError::new(Status::BadHmac, "HMAC mismatch"))
        });
        sealer
    }

    #[test]
    fn test_trial_unseal_any_position() {
        let now = now();
        let sealer = mock_sealer();
        let sealed = Keyring::from_key(key(7), now)
            .seal(&sealer, b"payload", now)
            .unwrap();
        for position in 0..3 {
            let mut ring = Keyring::new();
            for i in 0..3 {
                let k = if i == position { key(7) } else { key(i + 1) };
                ring.add(now, now, k);
            }
            assert_eq!(b"payload".to_vec(), ring.unseal(&sealer, &sealed).unwrap());
        }
    }

    #[test]
    fn test_unseal_without_key() {
        let now = now();
        let sealer = mock_sealer();
        let sealed = Keyring::from_key(key(7), now)
            .seal(&sealer, b"payload", now)
            .unwrap();
        let mut ring = Keyring::new();
        ring.add(now, now, key(1));
        ring.add(now, now, key(2));
        let err = ring.unseal(&sealer, &sealed).unwrap_err();
        assert_eq!(Status::BadKey, err.status());
        assert!(!err.message().contains("HMAC"));
        let err = Keyring::new().unseal(&sealer, &sealed).unwrap_err();
        assert_eq!(Status::BadKey, err.status());
    }

    #[test]
    fn test_fernet_trial_unseal() {
        let now = now();
        let sealer = FernetSealer::new();
        let newest = Key::generate(KeyType::Aes, KeySize::Aes128).unwrap();
        let mut ring = Keyring::new();
        ring.add(now, now - TimeDelta::seconds(60), newest.clone());
        ring.add(
            now,
            now - TimeDelta::seconds(3600),
            Key::generate(KeyType::Aes, KeySize::Aes256).unwrap(),
        );
        let sealed = ring.seal(&sealer, b"data", now).unwrap();
        let old_first = {
            let mut r = Keyring::new();
            let entries = ring.entries();
            r.add(entries[1].creation, entries[1].valid_after, entries[1].key.clone());
            r.add(entries[0].creation, entries[0].valid_after, newest);
            r
        };
        assert_eq!(b"data".to_vec(), old_first.unseal(&sealer, &sealed).unwrap());
    }

    #[test]
    fn test_remove() {
        let now = now();
        let mut ring = Keyring::from_key(key(1), now);
        ring.add(now, now, key(2));
        assert_eq!(key(1), ring.remove(0).unwrap().key);
        assert_eq!(1, ring.len());
        assert_eq!(Status::NotFound, ring.remove(1).unwrap_err().status());
    }

    #[test]
    fn test_encode_form() {
        let t = DateTime::from_timestamp(1_000, 0).unwrap();
        let ring = Keyring::from_key(key(0), t);
        let mut expected = b"v=1;n=1;ct0=1000;va0=1000;kt0:4=\0\0\0\x01;kd0:16=".to_vec();
        expected.extend_from_slice(&[0; 16]);
        expected.push(b';');
        assert_eq!(expected, ring.encode().unwrap());
    }

    #[test]
    fn test_decode_errors() {
        let err = Keyring::decode(b"v=2;n=0;").unwrap_err();
        assert_eq!(Status::FileVersion, err.status());
        let err = Keyring::decode(b"v=1;n=1;ct0=1;va0=1;kt0:4=\0\0\0\x01;kd0:3=abc;").unwrap_err();
        assert_eq!(Status::Corrupt, err.status());
        let err = Keyring::decode(b"v=1;n=1;").unwrap_err();
        assert_eq!(Status::Corrupt, err.status());
        let err = Keyring::decode(b"v=1;n=1;ct0=1;va0=1;kt0:4=\0\0\0\x09;kd0:0=;").unwrap_err();
        assert_eq!(Status::Unimplemented, err.status());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keyring");
        let now = now();
        let key = Key::generate(KeyType::Aes, KeySize::Aes128).unwrap();
        let mut ring = Keyring::from_key(key, now);
        ring.add(
            now,
            now + TimeDelta::days(1),
            Key::generate(KeyType::Aes, KeySize::Aes256).unwrap(),
        );
        ring.write_file(&path).unwrap();
        assert_eq!(ring, Keyring::read_file(&path).unwrap());

        let empty = Keyring::new();
        empty.write_file(&path).unwrap();
        assert!(Keyring::read_file(&path).unwrap().is_empty());
    }

    #[test]
    fn test_from_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keyring");
        let ring = Keyring::from_key(key(4), now());
        ring.write_file(&path).unwrap();

        let mut config = Config::default();
        let err = Keyring::from_config(&config).unwrap_err();
        assert_eq!(Status::Invalid, err.status());

        config.webkdc.keyring = Some(path);
        assert_eq!(ring, Keyring::from_config(&config).unwrap());

        config.webkdc.keyring = Some(dir.path().join("missing"));
        let err = Keyring::from_config(&config).unwrap_err();
        assert_eq!(Status::FileNotFound, err.status());
    }

    #[test]
    fn test_file_errors() {
        let dir = tempdir().unwrap();
        let err = Keyring::read_file(&dir.path().join("missing")).unwrap_err();
        assert_eq!(Status::FileNotFound, err.status());

        let path = dir.path().join("future");
        std::fs::write(&path, b"v=9;n=0;").unwrap();
        let err = Keyring::read_file(&path).unwrap_err();
        assert_eq!(Status::FileVersion, err.status());
        assert!(err.message().contains("future"));

        let err = Keyring::new()
            .write_file(&dir.path().join("nodir").join("keyring"))
            .unwrap_err();
        assert_eq!(Status::FileWrite, err.status());
    }
}
