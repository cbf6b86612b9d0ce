//! secp256k1 hashing and signing helpers.
//!
//! Transaction signatures are deterministic ECDSA (RFC 6979) over a
//! precomputed sighash, normalized to low-S and verified against the
//! signer's public key before they leave this module. Message signatures use
//! the 65-byte compact recoverable format shared by Bitcoin-family wallets.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::encoding::write_varint;
use crate::error::CryptoError;
use crate::types::Hash256;

/// Header byte offset for compact signatures made with a compressed key.
const COMPACT_HEADER_COMPRESSED: u8 = 31;
const COMPACT_HEADER_UNCOMPRESSED: u8 = 27;

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 applied twice.
pub fn sha256d(data: &[u8]) -> Hash256 {
    Hash256(Sha256::digest(Sha256::digest(data)).into())
}

/// RIPEMD-160 of SHA-256, the public-key hash carried in P2PKH scripts.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(data)).into()
}

/// A secp256k1 signing key. The secret scalar is zeroized on drop by k256.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// 33-byte SEC1 compressed public key.
    pub fn public_key(&self) -> [u8; 33] {
        compressed_public_key(self.signing_key.verifying_key())
    }

    pub fn pubkey_hash(&self) -> [u8; 20] {
        hash160(&self.public_key())
    }

    /// DER signature over a transaction sighash, low-S and self-verified.
    pub fn sign_sighash(&self, sighash: &Hash256) -> Result<Vec<u8>, CryptoError> {
        let signature: Signature = self
            .signing_key
            .sign_prehash(sighash.as_bytes())
            .map_err(|_| CryptoError::SigningFailed)?;
        let signature = signature.normalize_s().unwrap_or(signature);
        self.signing_key
            .verifying_key()
            .verify_prehash(sighash.as_bytes(), &signature)
            .map_err(|_| CryptoError::VerificationFailed)?;
        Ok(signature.to_der().as_bytes().to_vec())
    }

    /// Compact recoverable signature: header byte then `r ‖ s`.
    pub fn sign_compact(&self, hash: &Hash256) -> Result<[u8; 65], CryptoError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(hash.as_bytes())
            .map_err(|_| CryptoError::SigningFailed)?;
        let mut out = [0u8; 65];
        out[0] = COMPACT_HEADER_COMPRESSED + recovery_id.to_byte();
        out[1..].copy_from_slice(&signature.to_bytes());
        Ok(out)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

pub fn compressed_public_key(key: &VerifyingKey) -> [u8; 33] {
    let point = key.to_encoded_point(true);
    let mut out = [0u8; 33];
    out.copy_from_slice(point.as_bytes());
    out
}

/// Verify a DER signature (without the sighash-type byte) over `sighash`.
///
/// High-S signatures are normalized before verification.
pub fn verify_sighash(
    public_key: &[u8],
    sighash: &Hash256,
    der_signature: &[u8],
) -> Result<(), CryptoError> {
    let key = VerifyingKey::from_sec1_bytes(public_key).map_err(|_| CryptoError::InvalidPublicKey)?;
    let signature = Signature::from_der(der_signature).map_err(|_| CryptoError::InvalidSignature)?;
    let signature = signature.normalize_s().unwrap_or(signature);
    key.verify_prehash(sighash.as_bytes(), &signature)
        .map_err(|_| CryptoError::VerificationFailed)
}

/// `sha256d(prefix ‖ varint(len) ‖ message)`. The prefix carries its own
/// length byte.
pub fn signed_message_hash(prefix: &str, message: &str) -> Result<Hash256, CryptoError> {
    let mut buf = Vec::with_capacity(prefix.len() + message.len() + 9);
    buf.extend_from_slice(prefix.as_bytes());
    write_varint(&mut buf, message.len() as u64)?;
    buf.extend_from_slice(message.as_bytes());
    Ok(sha256d(&buf))
}

/// Recover the SEC1 public key that produced a compact signature.
///
/// Returns the key in the encoding the header declares: 33 bytes for
/// compressed, 65 for uncompressed.
pub fn recover_compact(hash: &Hash256, compact: &[u8; 65]) -> Result<Vec<u8>, CryptoError> {
    let header = compact[0];
    if !(COMPACT_HEADER_UNCOMPRESSED..COMPACT_HEADER_UNCOMPRESSED + 8).contains(&header) {
        return Err(CryptoError::InvalidHeader(header));
    }
    let compressed = header >= COMPACT_HEADER_COMPRESSED;
    let recovery_id = RecoveryId::from_byte((header - COMPACT_HEADER_UNCOMPRESSED) & 0x03)
        .ok_or(CryptoError::InvalidHeader(header))?;
    let signature =
        Signature::from_slice(&compact[1..]).map_err(|_| CryptoError::InvalidSignature)?;
    let key = VerifyingKey::recover_from_prehash(hash.as_bytes(), &signature, recovery_id)
        .map_err(|_| CryptoError::VerificationFailed)?;
    Ok(key.to_encoded_point(compressed).as_bytes().to_vec())
}
