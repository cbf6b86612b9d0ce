//! Legacy Dogecoin transaction types and the UTXO records supplied by the
//! indexer.
//!
//! All monetary values are in koinu (1 DOGE = 10^8 koinu).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::address::Address;
use crate::constants::SEQUENCE_FINAL;
use crate::crypto::sha256d;
use crate::encoding::{Reader, write_var_bytes, write_varint};
use crate::error::{EncodingError, TransactionError};

/// A 32-byte hash in the byte order the hash function produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Transaction id.
///
/// Stored in wire order (the raw double-SHA256 output); displayed and parsed
/// byte-reversed, the way explorers and indexers print it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Txid([u8; 32]);

impl Txid {
    pub fn from_wire_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_wire_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Parse the display (reversed) hex form.
    pub fn from_hex(s: &str) -> Result<Self, EncodingError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim(), &mut bytes)
            .map_err(|e| EncodingError::InvalidHex(e.to_string()))?;
        bytes.reverse();
        Ok(Self(bytes))
    }
}

impl From<Hash256> for Txid {
    fn from(hash: Hash256) -> Self {
        Self(hash.0)
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid({self})")
    }
}

impl FromStr for Txid {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Txid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Txid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Reference to a specific output of a previous transaction.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutPoint {
    pub txid: Txid,
    pub vout: u32,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// An unspent output as reported by the indexer.
///
/// `special` marks outputs bound to embedded data (inscriptions); those must
/// never be spent as ordinary payment inputs. A UTXO that carries an
/// `inscription_id` counts as special even when the flag is unset.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    pub value: u64,
    pub address: Address,
    #[serde(
        rename = "scriptPubKeyHex",
        alias = "scriptPubKey",
        alias = "script",
        with = "crate::serde_hex",
        default
    )]
    pub script_pubkey: Vec<u8>,
    #[serde(default)]
    pub confirmations: u32,
    #[serde(rename = "isSpecial", alias = "isInscription", default)]
    pub special: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inscription_id: Option<String>,
}

impl Utxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint { txid: self.txid, vout: self.vout }
    }

    pub fn is_special(&self) -> bool {
        self.special || self.inscription_id.is_some()
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmations > 0
    }

    /// The script this output is locked with; falls back to the address's
    /// P2PKH script when the indexer omitted it.
    pub fn locking_script(&self) -> Vec<u8> {
        if self.script_pubkey.is_empty() {
            self.address.script_pubkey()
        } else {
            self.script_pubkey.clone()
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxInput {
    pub previous_output: OutPoint,
    #[serde(with = "crate::serde_hex")]
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

impl TxInput {
    pub fn unsigned(previous_output: OutPoint) -> Self {
        Self { previous_output, script_sig: Vec::new(), sequence: SEQUENCE_FINAL }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxOutput {
    pub value: u64,
    #[serde(with = "crate::serde_hex")]
    pub script_pubkey: Vec<u8>,
}

impl TxOutput {
    pub fn to_address(address: &Address, value: u64) -> Self {
        Self { value, script_pubkey: address.script_pubkey() }
    }
}

/// A legacy (pre-segwit) transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
}

impl Transaction {
    /// Wire serialization:
    /// `version ‖ varint(n_in) ‖ inputs ‖ varint(n_out) ‖ outputs ‖ lock_time`.
    pub fn serialize(&self) -> Result<Vec<u8>, EncodingError> {
        let mut buf = Vec::with_capacity(self.size_hint());
        buf.extend_from_slice(&self.version.to_le_bytes());
        write_varint(&mut buf, self.inputs.len() as u64)?;
        for input in &self.inputs {
            buf.extend_from_slice(&input.previous_output.txid.to_wire_bytes());
            buf.extend_from_slice(&input.previous_output.vout.to_le_bytes());
            write_var_bytes(&mut buf, &input.script_sig)?;
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }
        write_varint(&mut buf, self.outputs.len() as u64)?;
        for output in &self.outputs {
            buf.extend_from_slice(&output.value.to_le_bytes());
            write_var_bytes(&mut buf, &output.script_pubkey)?;
        }
        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        Ok(buf)
    }

    pub fn to_hex(&self) -> Result<String, EncodingError> {
        Ok(hex::encode(self.serialize()?))
    }

    /// Parse the wire format. The whole input must be consumed.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, EncodingError> {
        let mut r = Reader::new(bytes);
        let version = r.read_u32_le()?;

        let input_count = r.read_varint()?;
        let mut inputs = Vec::with_capacity((input_count as usize).min(r.remaining() / 41));
        for _ in 0..input_count {
            let txid = Txid::from_wire_bytes(r.read_array()?);
            let vout = r.read_u32_le()?;
            let script_sig = r.read_var_bytes()?.to_vec();
            let sequence = r.read_u32_le()?;
            inputs.push(TxInput { previous_output: OutPoint { txid, vout }, script_sig, sequence });
        }

        let output_count = r.read_varint()?;
        let mut outputs = Vec::with_capacity((output_count as usize).min(r.remaining() / 9));
        for _ in 0..output_count {
            let value = r.read_u64_le()?;
            let script_pubkey = r.read_var_bytes()?.to_vec();
            outputs.push(TxOutput { value, script_pubkey });
        }

        let lock_time = r.read_u32_le()?;
        r.finish()?;
        Ok(Self { version, inputs, outputs, lock_time })
    }

    pub fn from_hex(s: &str) -> Result<Self, EncodingError> {
        let bytes = hex::decode(s.trim()).map_err(|e| EncodingError::InvalidHex(e.to_string()))?;
        Self::deserialize(&bytes)
    }

    /// Double SHA-256 of the serialized transaction.
    pub fn txid(&self) -> Result<Txid, EncodingError> {
        Ok(Txid::from(sha256d(&self.serialize()?)))
    }

    /// Legacy signature hash for input `index`.
    ///
    /// Every scriptSig is emptied except the one at `index`, which is
    /// replaced by `script_code` (the spent output's scriptPubKey). The
    /// 4-byte little-endian `sighash_type` is appended before hashing.
    pub fn signature_hash(
        &self,
        index: usize,
        script_code: &[u8],
        sighash_type: u32,
    ) -> Result<Hash256, TransactionError> {
        if index >= self.inputs.len() {
            return Err(TransactionError::InputIndexOutOfBounds { index, len: self.inputs.len() });
        }
        let mut preimage_tx = self.clone();
        for (i, input) in preimage_tx.inputs.iter_mut().enumerate() {
            input.script_sig = if i == index { script_code.to_vec() } else { Vec::new() };
        }
        let mut preimage = preimage_tx.serialize()?;
        preimage.extend_from_slice(&sighash_type.to_le_bytes());
        Ok(sha256d(&preimage))
    }

    /// Sum of output values, `None` on overflow.
    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs.iter().try_fold(0u64, |acc, o| acc.checked_add(o.value))
    }

    fn size_hint(&self) -> usize {
        let inputs: usize = self.inputs.iter().map(|i| 41 + i.script_sig.len() + 2).sum();
        let outputs: usize = self.outputs.iter().map(|o| 9 + o.script_pubkey.len() + 2).sum();
        10 + inputs + outputs
    }
}
