// Token/base-URL persistence behind a storage capability, plus the sealed
// credential blob format used for passphrase-protected copies.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const KEY_TOKEN: &str = "token";
pub const KEY_BASE_URL: &str = "base_url";
pub const KEY_ENVIRONMENT_OVERRIDE: &str = "environment_override";
pub const KEY_SEALED_CREDENTIALS: &str = "sealed_credentials";

/// Flat key-value persistence. The client and resolver are written against
/// this so tests run without a real storage backend.
pub trait Storage: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Key-value entries kept in one JSON file; the whole map is rewritten on
/// every set.
pub struct FileStorage {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStorage {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

/// API credentials: opaque token plus the base URL requests are issued
/// against. Persists until explicitly replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: Option<String>,
    pub base_url: String,
}

impl Session {
    pub fn load(storage: &dyn Storage, default_base_url: &str) -> Self {
        Self {
            token: storage.get(KEY_TOKEN),
            base_url: storage
                .get(KEY_BASE_URL)
                .unwrap_or_else(|| default_base_url.to_string()),
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> anyhow::Result<()> {
        if let Some(token) = &self.token {
            storage.set(KEY_TOKEN, token)?;
        }
        storage.set(KEY_BASE_URL, &self.base_url)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("wrong password or corrupted data")]
    Decryption,
}

/// Credential blob at rest: hex payload, passphrase-keyed SHA-256 checksum,
/// and a flag recording whether a passphrase was used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedCredentials {
    pub payload: String,
    pub checksum: String,
    pub protected: bool,
}

pub fn seal(session: &Session, passphrase: Option<&str>) -> anyhow::Result<SealedCredentials> {
    let payload = serde_json::to_vec(session)?;
    Ok(SealedCredentials {
        checksum: keyed_checksum(passphrase, &payload),
        payload: hex::encode(payload),
        protected: passphrase.is_some(),
    })
}

/// Inverse of [`seal`]. A wrong passphrase and a corrupted payload both
/// fail the checksum and surface the same error.
pub fn unseal(
    sealed: &SealedCredentials,
    passphrase: Option<&str>,
) -> Result<Session, CredentialError> {
    let payload = hex::decode(&sealed.payload).map_err(|_| CredentialError::Decryption)?;
    if keyed_checksum(passphrase, &payload) != sealed.checksum {
        return Err(CredentialError::Decryption);
    }
    serde_json::from_slice(&payload).map_err(|_| CredentialError::Decryption)
}

fn keyed_checksum(passphrase: Option<&str>, payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(passphrase.unwrap_or("").as_bytes());
    hasher.update([0u8]);
    hasher.update(payload);
    hex::encode(hasher.finalize())
}
