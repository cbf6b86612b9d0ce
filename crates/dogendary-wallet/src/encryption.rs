//! Password-based vault encryption.
//!
//! PBKDF2-HMAC-SHA256 (600,000 rounds) stretches the password into an
//! AES-256-GCM key. Each encryption draws a fresh 16-byte salt and 12-byte
//! nonce from the OS RNG.
//!
//! # Stored format
//! ```text
//! { "salt": base64, "iv": base64, "data": base64(ciphertext ‖ tag), "version": 1 }
//! ```

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::WalletError;

pub const PBKDF2_ROUNDS: u32 = 600_000;
pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const KEY_LEN: usize = 32;
pub const VAULT_VERSION: u32 = 1;

/// The encrypted seed phrase as persisted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedVault {
    #[serde(with = "base64_bytes")]
    pub salt: [u8; SALT_LEN],
    #[serde(with = "base64_bytes")]
    pub iv: [u8; NONCE_LEN],
    #[serde(rename = "data", with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
    pub version: u32,
}

impl EncryptedVault {
    pub fn to_json(&self) -> Result<String, WalletError> {
        serde_json::to_string(self).map_err(|e| WalletError::Serialization(e.to_string()))
    }

    /// Parse a stored record. Malformed records surface as
    /// [`WalletError::Decryption`], the same as a wrong password.
    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        serde_json::from_str(json).map_err(|e| {
            debug!(error = %e, "vault record did not parse");
            WalletError::Decryption
        })
    }
}

impl fmt::Debug for EncryptedVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedVault")
            .field("version", &self.version)
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

/// Derive the 256-bit vault key from a password and salt.
pub fn derive_key(password: &str, salt: &[u8; SALT_LEN]) -> Zeroizing<[u8; KEY_LEN]> {
    stretch(password.as_bytes(), salt, PBKDF2_ROUNDS)
}

fn stretch(password: &[u8], salt: &[u8], rounds: u32) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, rounds, &mut key[..]);
    key
}

/// Encrypt a UTF-8 plaintext under `password`.
pub fn encrypt(plaintext: &str, password: &str) -> Result<EncryptedVault, WalletError> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| WalletError::Encryption(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
        .map_err(|e| WalletError::Encryption(e.to_string()))?;

    Ok(EncryptedVault { salt, iv, ciphertext, version: VAULT_VERSION })
}

/// Decrypt a vault. Every failure mode returns [`WalletError::Decryption`].
pub fn decrypt(vault: &EncryptedVault, password: &str) -> Result<Zeroizing<String>, WalletError> {
    if vault.version != VAULT_VERSION {
        debug!(version = vault.version, "unsupported vault version");
        return Err(WalletError::Decryption);
    }

    let key = derive_key(password, &vault.salt);
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| WalletError::Decryption)?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(&vault.iv), vault.ciphertext.as_slice())
            .map_err(|_| WalletError::Decryption)?,
    );

    let text = std::str::from_utf8(&plaintext).map_err(|_| {
        debug!("vault plaintext is not UTF-8");
        WalletError::Decryption
    })?;
    Ok(Zeroizing::new(text.to_owned()))
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<Vec<u8>>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = STANDARD.decode(s.as_bytes()).map_err(D::Error::custom)?;
        let len = bytes.len();
        T::try_from(bytes).map_err(|_| D::Error::custom(format!("unexpected byte length {len}")))
    }
}
