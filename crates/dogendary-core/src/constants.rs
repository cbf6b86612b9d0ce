//! Protocol constants. All monetary values in koinu (1 DOGE = 10^8 koinu).

pub const COIN: u64 = 100_000_000;

/// Outputs at or below this value are not worth creating; change this small
/// is folded into the fee instead.
pub const DUST_THRESHOLD: u64 = 100_000;

/// Legacy transaction format version.
pub const TX_VERSION: u32 = 1;

pub const DEFAULT_LOCK_TIME: u32 = 0;

/// Final sequence number; disables relative lock-time and RBF signalling.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

pub const SIGHASH_ALL: u32 = 0x01;

/// Estimated bytes for a signed P2PKH input: outpoint, script length,
/// a DER signature with hash type, a compressed public key and sequence.
pub const P2PKH_INPUT_SIZE: u64 = 148;

/// Value, script length and the 25-byte P2PKH locking script.
pub const P2PKH_OUTPUT_SIZE: u64 = 34;

/// Version, lock-time and the two count varints.
pub const TX_OVERHEAD_SIZE: u64 = 10;

/// BIP44 purpose field.
pub const BIP44_PURPOSE: u32 = 44;

/// SLIP-44 coin type. Dogecoin uses 3 on testnet as well.
pub const DOGE_COIN_TYPE: u32 = 3;

/// Fee rates in koinu per 1000 bytes.
pub const FEE_RATE_LOW: u64 = 100_000;
pub const FEE_RATE_MEDIUM: u64 = 500_000;
pub const FEE_RATE_HIGH: u64 = 1_000_000;
