//! # dogendary-core
//! Dogecoin chain primitives for the Dogendary wallet: network parameters,
//! base58check addresses, P2PKH scripts, legacy transaction serialization
//! and the shared fee model.

pub mod address;
pub mod constants;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod fee;
pub mod script;
pub mod serde_hex;
pub mod types;

pub use address::{Address, Network, NetworkParams};
pub use error::{AddressError, CryptoError, EncodingError, TransactionError};
pub use fee::{FeeTier, estimate_fee, estimated_tx_bytes};
pub use types::{Hash256, OutPoint, Transaction, TxInput, TxOutput, Txid, Utxo};
