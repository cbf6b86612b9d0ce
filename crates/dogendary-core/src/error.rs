//! Error types for Dogecoin primitives.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("varint value {0} exceeds u32 range")] VarIntTooLarge(u64),
    #[error("unsupported 64-bit varint prefix")] UnsupportedVarIntPrefix,
    #[error("push of {0} bytes is too large")] PushTooLarge(usize),
    #[error("unexpected end of data: needed {needed}, {remaining} remaining")] UnexpectedEof { needed: usize, remaining: usize },
    #[error("{0} trailing bytes after transaction")] TrailingBytes(usize),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58: {0}")] InvalidBase58(String),
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid length: {0}")] InvalidLength(usize),
    #[error("invalid version: {0:#04x}")] InvalidVersion(u8),
    #[error("pay-to-script-hash addresses are not supported")] UnsupportedScriptHash,
    #[error("address is for {found}, expected {expected}")] WrongNetwork { expected: String, found: String },
    #[error("unknown network: {0}")] UnknownNetwork(String),
    #[error("invalid public key length: {0}")] InvalidPublicKey(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid private key")] InvalidPrivateKey,
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("signing failed")] SigningFailed,
    #[error("signature verification failed")] VerificationFailed,
    #[error("invalid signature header: {0}")] InvalidHeader(u8),
    #[error(transparent)] Encoding(#[from] EncodingError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("input index out of bounds: {index} >= {len}")] InputIndexOutOfBounds { index: usize, len: usize },
    #[error(transparent)] Encoding(#[from] EncodingError),
}
