//! Wallet error types.
//!
//! Payloads never carry passwords, mnemonics or key material.

use dogendary_core::error::{AddressError, CryptoError, EncodingError, TransactionError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Mnemonic failed wordlist or checksum validation.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Unsupported mnemonic strength in bits.
    #[error("invalid mnemonic strength: {0} bits (expected 128 or 256)")]
    InvalidStrength(u32),

    /// Wrong password or corrupted vault. The two are deliberately
    /// indistinguishable.
    #[error("invalid password")]
    Decryption,

    /// Encryption failure.
    #[error("encryption: {0}")]
    Encryption(String),

    /// Password does not meet the strength policy.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// HD wallet used before a mnemonic was loaded.
    #[error("wallet not initialized")]
    NotInitialized,

    /// A second mnemonic was loaded into an initialized wallet.
    #[error("wallet already initialized")]
    AlreadyInitialized,

    /// Invalid derivation path or account index.
    #[error("derivation error: {0}")]
    Derivation(String),

    /// A key could not be produced for the requested path or address.
    #[error("key unavailable: {0}")]
    KeyUnavailable(String),

    /// Insufficient funds to cover the transaction amount plus fees.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Confirmed spendable balance in koinu.
        have: u64,
        /// Required amount in koinu.
        need: u64,
    },

    /// Invalid monetary amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid address string.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// A special output reached a payment input list.
    #[error("special output selected as payment input: {0}")]
    SpecialOutputSelected(String),

    /// Serialization limit exceeded while building.
    #[error("format error during {step}: {source}")]
    Format {
        step: &'static str,
        source: EncodingError,
    },

    /// Signing or signature self-check failed for one input.
    #[error("signing input {index}: {reason}")]
    Signing { index: usize, reason: String },

    /// Transaction build error.
    #[error("build error: {0}")]
    Build(String),

    /// Message signature could not be parsed or checked.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Session is locked.
    #[error("wallet is locked")]
    Locked,

    /// No vault has been created yet.
    #[error("no wallet vault found")]
    VaultMissing,

    /// A vault already exists and would be overwritten.
    #[error("wallet vault already exists")]
    VaultExists,

    /// Unknown account index.
    #[error("unknown account: {0}")]
    UnknownAccount(u32),

    /// Storage I/O error.
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON encoding or decoding error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl WalletError {
    pub fn format(step: &'static str, source: EncodingError) -> Self {
        Self::Format { step, source }
    }

    /// Stable category for the request/response boundary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidMnemonic(_) | Self::InvalidStrength(_) => ErrorKind::InvalidMnemonic,
            Self::Decryption => ErrorKind::Decryption,
            Self::Encryption(_) | Self::Crypto(_) | Self::Signing { .. } => ErrorKind::Crypto,
            Self::WeakPassword(_) => ErrorKind::WeakPassword,
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::AlreadyInitialized | Self::VaultExists => ErrorKind::AlreadyInitialized,
            Self::Derivation(_) | Self::UnknownAccount(_) => ErrorKind::Derivation,
            Self::KeyUnavailable(_) => ErrorKind::KeyUnavailable,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Self::InvalidAddress(_) => ErrorKind::InvalidAddress,
            Self::SpecialOutputSelected(_) | Self::Build(_) => ErrorKind::Build,
            Self::Format { .. } => ErrorKind::Format,
            Self::Locked => ErrorKind::Locked,
            Self::VaultMissing => ErrorKind::VaultMissing,
            Self::Storage(_) | Self::Serialization(_) => ErrorKind::Storage,
        }
    }
}

impl From<TransactionError> for WalletError {
    fn from(e: TransactionError) -> Self {
        match e {
            TransactionError::Encoding(source) => Self::format("sighash", source),
            other => Self::Build(other.to_string()),
        }
    }
}

/// Coarse error category exposed across the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidMnemonic,
    Decryption,
    Crypto,
    WeakPassword,
    NotInitialized,
    AlreadyInitialized,
    Derivation,
    KeyUnavailable,
    InsufficientFunds,
    InvalidAmount,
    InvalidAddress,
    Build,
    Format,
    Locked,
    VaultMissing,
    Storage,
    InvalidRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decryption_message_is_uniform() {
        assert_eq!(WalletError::Decryption.to_string(), "invalid password");
    }

    #[test]
    fn format_error_names_step() {
        let e = WalletError::format("serialize", EncodingError::VarIntTooLarge(1 << 40));
        assert!(e.to_string().contains("serialize"));
        assert_eq!(e.kind(), ErrorKind::Format);
    }

    #[test]
    fn signing_error_names_input() {
        let e = WalletError::Signing { index: 3, reason: "verification failed".into() };
        assert_eq!(e.to_string(), "signing input 3: verification failed");
    }

    #[test]
    fn kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorKind::InsufficientFunds).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_FUNDS\"");
    }

    #[test]
    fn address_errors_convert() {
        let e: WalletError = AddressError::InvalidChecksum.into();
        assert_eq!(e.kind(), ErrorKind::InvalidAddress);
    }
}
