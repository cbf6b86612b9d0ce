//! Dogecoin network parameters and base58check P2PKH addresses.
//!
//! An address is a version byte followed by the 20-byte HASH160 of a
//! compressed public key, encoded with base58check. Mainnet addresses start
//! with `D`, testnet addresses with `n`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::DOGE_COIN_TYPE;
use crate::crypto::hash160;
use crate::error::AddressError;
use crate::script::p2pkh_script_pubkey;

/// Version bytes and prefixes for one Dogecoin network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    pub name: &'static str,
    pub message_prefix: &'static str,
    pub pubkey_hash: u8,
    pub script_hash: u8,
    pub wif: u8,
    pub bip32_public: u32,
    pub bip32_private: u32,
    pub coin_type: u32,
}

pub const MAINNET_PARAMS: NetworkParams = NetworkParams {
    name: "mainnet",
    message_prefix: "\x19Dogecoin Signed Message:\n",
    pubkey_hash: 0x1e,
    script_hash: 0x16,
    wif: 0x9e,
    bip32_public: 0x02fa_cafd,
    bip32_private: 0x02fa_c398,
    coin_type: DOGE_COIN_TYPE,
};

pub const TESTNET_PARAMS: NetworkParams = NetworkParams {
    name: "testnet",
    message_prefix: "\x19Dogecoin Signed Message:\n",
    pubkey_hash: 0x71,
    script_hash: 0xc4,
    wif: 0xf1,
    bip32_public: 0x0435_87cf,
    bip32_private: 0x0435_8394,
    coin_type: DOGE_COIN_TYPE,
};

/// Dogecoin network selector.
///
/// # Examples
///
/// ```
/// use dogendary_core::address::Network;
/// assert_eq!(Network::default(), Network::Mainnet);
/// assert_eq!(Network::Testnet.params().pubkey_hash, 0x71);
/// assert_eq!("testnet".parse::<Network>().unwrap(), Network::Testnet);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn params(self) -> &'static NetworkParams {
        match self {
            Network::Mainnet => &MAINNET_PARAMS,
            Network::Testnet => &TESTNET_PARAMS,
        }
    }

    /// Look up the network whose P2PKH version byte is `version`.
    pub fn from_pubkey_hash_version(version: u8) -> Option<Self> {
        [Network::Mainnet, Network::Testnet]
            .into_iter()
            .find(|n| n.params().pubkey_hash == version)
    }

    /// Look up the network whose WIF version byte is `version`.
    pub fn from_wif_version(version: u8) -> Option<Self> {
        [Network::Mainnet, Network::Testnet]
            .into_iter()
            .find(|n| n.params().wif == version)
    }

    fn is_script_hash_version(version: u8) -> bool {
        version == MAINNET_PARAMS.script_hash || version == TESTNET_PARAMS.script_hash
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.params().name)
    }
}

impl FromStr for Network {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" | "dogecoin" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            _ => Err(AddressError::UnknownNetwork(s.to_string())),
        }
    }
}

/// A pay-to-public-key-hash address on a specific network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    network: Network,
    pubkey_hash: [u8; 20],
}

impl Address {
    pub fn from_pubkey_hash(pubkey_hash: [u8; 20], network: Network) -> Self {
        Self { network, pubkey_hash }
    }

    /// Address for a SEC1 public key (33 bytes compressed or 65 uncompressed).
    pub fn from_public_key(public_key: &[u8], network: Network) -> Result<Self, AddressError> {
        if public_key.len() != 33 && public_key.len() != 65 {
            return Err(AddressError::InvalidPublicKey(public_key.len()));
        }
        Ok(Self::from_pubkey_hash(hash160(public_key), network))
    }

    pub fn pubkey_hash(&self) -> &[u8; 20] {
        &self.pubkey_hash
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Base58check encoding: version byte, hash, 4-byte double-SHA256 checksum.
    pub fn encode(&self) -> String {
        let mut payload = Vec::with_capacity(21);
        payload.push(self.network.params().pubkey_hash);
        payload.extend_from_slice(&self.pubkey_hash);
        bs58::encode(payload).with_check().into_string()
    }

    /// Decode a base58check P2PKH address for either network.
    pub fn decode(s: &str) -> Result<Self, AddressError> {
        let payload = bs58::decode(s.trim())
            .with_check(None)
            .into_vec()
            .map_err(|e| match e {
                bs58::decode::Error::InvalidChecksum { .. } => AddressError::InvalidChecksum,
                other => AddressError::InvalidBase58(other.to_string()),
            })?;

        if payload.len() != 21 {
            return Err(AddressError::InvalidLength(payload.len()));
        }

        let version = payload[0];
        if Network::is_script_hash_version(version) {
            return Err(AddressError::UnsupportedScriptHash);
        }
        let network =
            Network::from_pubkey_hash_version(version).ok_or(AddressError::InvalidVersion(version))?;

        let mut pubkey_hash = [0u8; 20];
        pubkey_hash.copy_from_slice(&payload[1..]);
        Ok(Self { network, pubkey_hash })
    }

    /// Decode and require the address to belong to `network`.
    pub fn decode_for(s: &str, network: Network) -> Result<Self, AddressError> {
        let address = Self::decode(s)?;
        address.require_network(network)?;
        Ok(address)
    }

    pub fn require_network(&self, network: Network) -> Result<(), AddressError> {
        if self.network != network {
            return Err(AddressError::WrongNetwork {
                expected: network.to_string(),
                found: self.network.to_string(),
            });
        }
        Ok(())
    }

    /// The standard P2PKH locking script paying to this address.
    pub fn script_pubkey(&self) -> Vec<u8> {
        p2pkh_script_pubkey(&self.pubkey_hash)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}
