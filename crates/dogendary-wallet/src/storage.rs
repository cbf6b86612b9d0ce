//! Persistence for the encrypted vault.
//!
//! The file store mirrors extension local storage: a JSON object whose
//! `encrypted_vault` key holds the vault record. Other keys in the file are
//! preserved across writes.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::encryption::EncryptedVault;
use crate::error::WalletError;

/// Storage key of the vault record.
pub const VAULT_STORAGE_KEY: &str = "encrypted_vault";

/// Where the vault lives between sessions.
pub trait VaultStore {
    fn load(&self) -> Result<Option<EncryptedVault>, WalletError>;
    fn save(&mut self, vault: &EncryptedVault) -> Result<(), WalletError>;
    fn clear(&mut self) -> Result<(), WalletError>;

    fn exists(&self) -> Result<bool, WalletError> {
        Ok(self.load()?.is_some())
    }
}

/// Vault kept in memory only. Useful for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryVaultStore {
    vault: Option<EncryptedVault>,
}

impl MemoryVaultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VaultStore for MemoryVaultStore {
    fn load(&self) -> Result<Option<EncryptedVault>, WalletError> {
        Ok(self.vault.clone())
    }

    fn save(&mut self, vault: &EncryptedVault) -> Result<(), WalletError> {
        self.vault = Some(vault.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), WalletError> {
        self.vault = None;
        Ok(())
    }
}

/// Vault stored in a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileVaultStore {
    path: PathBuf,
}

impl FileVaultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, WalletError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(WalletError::Storage(e.to_string())),
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(WalletError::Storage(format!("{} is not a JSON object", self.path.display()))),
            Err(e) => Err(WalletError::Storage(format!("{}: {e}", self.path.display()))),
        }
    }

    /// Write via a sibling temp file and rename, so a crash never leaves a
    /// half-written vault.
    fn write_map(&self, map: &Map<String, Value>) -> Result<(), WalletError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| WalletError::Storage(e.to_string()))?;
        }
        let json = serde_json::to_vec_pretty(map).map_err(|e| WalletError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(|e| WalletError::Storage(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| WalletError::Storage(e.to_string()))
    }
}

impl VaultStore for FileVaultStore {
    fn load(&self) -> Result<Option<EncryptedVault>, WalletError> {
        let map = self.read_map()?;
        match map.get(VAULT_STORAGE_KEY) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                warn!(path = %self.path.display(), "stored vault record is malformed");
                debug!(error = %e, "vault record parse failure");
                WalletError::Decryption
            }),
        }
    }

    fn save(&mut self, vault: &EncryptedVault) -> Result<(), WalletError> {
        let mut map = self.read_map()?;
        let value = serde_json::to_value(vault).map_err(|e| WalletError::Serialization(e.to_string()))?;
        map.insert(VAULT_STORAGE_KEY.to_string(), value);
        self.write_map(&map)?;
        debug!(path = %self.path.display(), "vault saved");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), WalletError> {
        let mut map = self.read_map()?;
        if map.remove(VAULT_STORAGE_KEY).is_none() {
            return Ok(());
        }
        if map.is_empty() {
            std::fs::remove_file(&self.path).map_err(|e| WalletError::Storage(e.to_string()))?;
        } else {
            self.write_map(&map)?;
        }
        debug!(path = %self.path.display(), "vault cleared");
        Ok(())
    }
}
