//! # dogendary-wallet: HD wallet core for Dogecoin.
//!
//! BIP39/BIP44 key management, an encrypted vault behind a lock/unlock
//! session, UTXO selection that never spends inscription-bearing outputs by
//! accident, and signed legacy P2PKH transaction building.
//!
//! # Modules
//!
//! - [`error`]: `WalletError` and the coarse `ErrorKind`
//! - [`mnemonic`]: phrase generation, validation and seed derivation
//! - [`keys`]: `HdWallet`, accounts, message signing
//! - [`password`]: password strength scoring
//! - [`encryption`]: PBKDF2 + AES-256-GCM vault records
//! - [`storage`]: vault persistence backends
//! - [`coin_selection`]: `UtxoManager` and selection policies
//! - [`builder`]: payment and inscription-transfer builders
//! - [`config`]: wallet configuration
//! - [`session`]: lock/unlock lifecycle over a vault store
//! - [`message`]: typed request/response boundary

pub mod builder;
pub mod coin_selection;
pub mod config;
pub mod encryption;
pub mod error;
pub mod keys;
pub mod message;
pub mod mnemonic;
pub mod password;
pub mod session;
pub mod storage;

pub use builder::{BuiltTransaction, SendRequest, TransactionBuilder, to_base_units};
pub use coin_selection::{CoinSelection, UtxoManager};
pub use config::WalletConfig;
pub use encryption::{EncryptedVault, decrypt, encrypt};
pub use error::{ErrorKind, WalletError};
pub use keys::{Account, HdWallet, KeySource, MessageSignature, SingleKey, verify_message};
pub use message::{Reply, Request, Response, SecretString};
pub use mnemonic::MnemonicStrength;
pub use password::{PasswordStrength, validate_password_strength};
pub use session::Session;
pub use storage::{FileVaultStore, MemoryVaultStore, VaultStore};
