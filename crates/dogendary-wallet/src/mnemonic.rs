//! BIP-39 mnemonic generation, validation and seed derivation.

use bip39::{Language, Mnemonic};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::error::WalletError;

/// Mnemonic entropy size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum MnemonicStrength {
    /// 128 bits, 12 words.
    #[default]
    Words12,
    /// 256 bits, 24 words.
    Words24,
}

impl MnemonicStrength {
    pub fn bits(self) -> u32 {
        match self {
            Self::Words12 => 128,
            Self::Words24 => 256,
        }
    }

    pub fn word_count(self) -> usize {
        match self {
            Self::Words12 => 12,
            Self::Words24 => 24,
        }
    }

    fn entropy_len(self) -> usize {
        self.bits() as usize / 8
    }
}

impl TryFrom<u32> for MnemonicStrength {
    type Error = WalletError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            128 => Ok(Self::Words12),
            256 => Ok(Self::Words24),
            other => Err(WalletError::InvalidStrength(other)),
        }
    }
}

impl From<MnemonicStrength> for u32 {
    fn from(s: MnemonicStrength) -> u32 {
        s.bits()
    }
}

/// Generate a fresh English mnemonic from OS entropy.
pub fn generate_mnemonic(strength: MnemonicStrength) -> Result<Zeroizing<String>, WalletError> {
    let mut entropy = [0u8; 32];
    let entropy = &mut entropy[..strength.entropy_len()];
    rand::rngs::OsRng.fill_bytes(entropy);
    let result = Mnemonic::from_entropy_in(Language::English, entropy)
        .map(|m| Zeroizing::new(m.to_string()))
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()));
    entropy.zeroize();
    result
}

/// Collapse runs of whitespace to single spaces. Case is kept, so words
/// must match the lowercase wordlist exactly.
pub fn normalize_mnemonic(phrase: &str) -> Zeroizing<String> {
    Zeroizing::new(phrase.split_whitespace().collect::<Vec<_>>().join(" "))
}

pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, WalletError> {
    let normalized = normalize_mnemonic(phrase);
    Mnemonic::parse_in(Language::English, normalized.as_str())
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}

/// Wordlist membership and checksum check.
pub fn validate_mnemonic(phrase: &str) -> bool {
    parse_mnemonic(phrase).is_ok()
}

/// BIP-39 seed with an empty passphrase.
pub fn mnemonic_to_seed(phrase: &str) -> Result<Zeroizing<[u8; 64]>, WalletError> {
    let mnemonic = parse_mnemonic(phrase)?;
    Ok(Zeroizing::new(mnemonic.to_seed_normalized("")))
}
