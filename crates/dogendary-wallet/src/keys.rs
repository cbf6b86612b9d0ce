//! Hierarchical deterministic key management.
//!
//! Accounts live at `m/44'/3'/index'/0/0`. Public account data is cached;
//! private keys are re-derived for each use and dropped (zeroized) as soon as
//! the caller is done with them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bip32::{ChildNumber, DerivationPath, XPrv};
use dogendary_core::address::{Address, Network};
use dogendary_core::constants::BIP44_PURPOSE;
use dogendary_core::crypto::{KeyPair, hash160, recover_compact, signed_message_hash};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::{Zeroize, Zeroizing};

use crate::error::WalletError;
use crate::mnemonic::{self, MnemonicStrength};

const HARDENED_LIMIT: u32 = 1 << 31;

/// Derivation path for account `index` on `network`.
///
/// # Examples
///
/// ```
/// use dogendary_core::address::Network;
/// use dogendary_wallet::keys::account_path;
/// assert_eq!(account_path(Network::Mainnet, 2), "m/44'/3'/2'/0/0");
/// ```
pub fn account_path(network: Network, index: u32) -> String {
    format!("m/{BIP44_PURPOSE}'/{}'/{index}'/0/0", network.params().coin_type)
}

/// Public data for one derived account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Hex of the first four bytes of the public-key hash.
    pub id: String,
    pub index: u32,
    pub address: Address,
    pub derivation_path: String,
    #[serde(with = "dogendary_core::serde_hex")]
    pub public_key: [u8; 33],
    pub label: String,
}

fn default_label(index: u32) -> String {
    if index == 0 {
        "Main Account".to_string()
    } else {
        format!("Account {}", index + 1)
    }
}

/// Where to find a private key: an account index or an explicit path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPath {
    Index(u32),
    Path(String),
}

impl From<u32> for KeyPath {
    fn from(index: u32) -> Self {
        KeyPath::Index(index)
    }
}

impl From<&str> for KeyPath {
    fn from(path: &str) -> Self {
        KeyPath::Path(path.to_string())
    }
}

/// Compact recoverable message signature, base64 when displayed.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MessageSignature(pub [u8; 65]);

impl MessageSignature {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn from_base64(s: &str) -> Result<Self, WalletError> {
        let bytes = STANDARD
            .decode(s.trim())
            .map_err(|e| WalletError::Build(format!("signature is not base64: {e}")))?;
        let len = bytes.len();
        let bytes: [u8; 65] = bytes
            .try_into()
            .map_err(|_| WalletError::Build(format!("signature must be 65 bytes, got {len}")))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for MessageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for MessageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageSignature({})", self.to_base64())
    }
}

/// Produces the signing key that controls an address.
///
/// The returned key is meant to live for exactly one signing step.
pub trait KeySource {
    fn key_for(&self, address: &Address) -> Result<KeyPair, WalletError>;
}

enum WalletState {
    Uninitialized,
    Initialized {
        // Never logged or serialized.
        _mnemonic: Zeroizing<String>,
        master: XPrv,
    },
}

/// HD wallet: Uninitialized until a mnemonic is loaded, then Initialized for
/// the rest of its life.
pub struct HdWallet {
    network: Network,
    state: WalletState,
    accounts: BTreeMap<u32, Account>,
}

impl HdWallet {
    pub fn new(network: Network) -> Self {
        Self { network, state: WalletState::Uninitialized, accounts: BTreeMap::new() }
    }

    /// Shorthand for [`HdWallet::new`] followed by [`HdWallet::init_from_mnemonic`].
    pub fn from_mnemonic(phrase: &str, network: Network) -> Result<Self, WalletError> {
        let mut wallet = Self::new(network);
        wallet.init_from_mnemonic(phrase)?;
        Ok(wallet)
    }

    pub fn generate_mnemonic(strength: MnemonicStrength) -> Result<Zeroizing<String>, WalletError> {
        mnemonic::generate_mnemonic(strength)
    }

    pub fn validate_mnemonic(phrase: &str) -> bool {
        mnemonic::validate_mnemonic(phrase)
    }

    pub fn init_from_mnemonic(&mut self, phrase: &str) -> Result<(), WalletError> {
        if self.is_initialized() {
            return Err(WalletError::AlreadyInitialized);
        }
        let seed = mnemonic::mnemonic_to_seed(phrase)?;
        let master = XPrv::new(&seed[..]).map_err(|e| WalletError::Derivation(e.to_string()))?;
        self.state = WalletState::Initialized {
            _mnemonic: mnemonic::normalize_mnemonic(phrase),
            master,
        };
        debug!(network = %self.network, "HD wallet initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, WalletState::Initialized { .. })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Derive (or re-derive) the account at `index` and cache it.
    pub fn derive_account(&mut self, index: u32) -> Result<Account, WalletError> {
        let path = self.index_path(index)?;
        let child = self.derive_xprv(&path)?;
        let public_key = child.public_key().to_bytes();
        let address = Address::from_public_key(&public_key, self.network)?;

        let account = Account {
            id: hex::encode(&hash160(&public_key)[..4]),
            index,
            address,
            derivation_path: path,
            public_key,
            label: default_label(index),
        };
        info!(index, address = %account.address, "account derived");
        self.accounts.insert(index, account.clone());
        Ok(account)
    }

    pub fn account(&self, index: u32) -> Option<&Account> {
        self.accounts.get(&index)
    }

    /// Cached accounts in index order.
    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.values().cloned().collect()
    }

    pub fn account_for_address(&self, address: &Address) -> Option<&Account> {
        self.accounts.values().find(|a| &a.address == address)
    }

    /// Raw 32-byte private key, re-derived on every call.
    pub fn private_key_bytes(
        &self,
        at: impl Into<KeyPath>,
    ) -> Result<Zeroizing<[u8; 32]>, WalletError> {
        let path = match at.into() {
            KeyPath::Index(index) => self.index_path(index)?,
            KeyPath::Path(path) => path,
        };
        let child = self.derive_xprv(&path)?;
        let mut bytes = child.private_key().to_bytes();
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&bytes);
        bytes.as_mut_slice().zeroize();
        Ok(key)
    }

    /// Signing key for account `index`.
    pub fn key_pair(&self, index: u32) -> Result<KeyPair, WalletError> {
        let path = self.index_path(index)?;
        let child = self.derive_xprv(&path)?;
        Ok(KeyPair::from_signing_key(child.private_key().clone()))
    }

    /// Compressed-key WIF: `base58check(version ‖ key ‖ 0x01)`.
    pub fn private_key_wif(&self, index: u32) -> Result<Zeroizing<String>, WalletError> {
        let key = self.private_key_bytes(index)?;
        let mut payload = Zeroizing::new(Vec::with_capacity(34));
        payload.push(self.network.params().wif);
        payload.extend_from_slice(&key[..]);
        payload.push(0x01);
        Ok(Zeroizing::new(bs58::encode(&payload[..]).with_check().into_string()))
    }

    /// Sign `message` with the prefixed-message scheme for account `index`.
    pub fn sign_message(&self, message: &str, index: u32) -> Result<MessageSignature, WalletError> {
        let key = self.key_pair(index)?;
        let hash = signed_message_hash(self.network.params().message_prefix, message)?;
        Ok(MessageSignature(key.sign_compact(&hash)?))
    }

    fn index_path(&self, index: u32) -> Result<String, WalletError> {
        if index >= HARDENED_LIMIT {
            return Err(WalletError::Derivation(format!(
                "account index {index} must be below 2^31"
            )));
        }
        Ok(account_path(self.network, index))
    }

    fn master(&self) -> Result<&XPrv, WalletError> {
        match &self.state {
            WalletState::Initialized { master, .. } => Ok(master),
            WalletState::Uninitialized => Err(WalletError::NotInitialized),
        }
    }

    fn derive_xprv(&self, path: &str) -> Result<XPrv, WalletError> {
        let master = self.master()?;
        let parsed = DerivationPath::from_str(path)
            .map_err(|e| WalletError::Derivation(format!("{path}: {e}")))?;
        parsed.iter().try_fold(master.clone(), |key, child: ChildNumber| {
            key.derive_child(child)
                .map_err(|_| WalletError::KeyUnavailable(format!("no key at {path}")))
        })
    }
}

impl KeySource for HdWallet {
    fn key_for(&self, address: &Address) -> Result<KeyPair, WalletError> {
        let account = self
            .account_for_address(address)
            .ok_or_else(|| WalletError::KeyUnavailable(format!("no account owns {address}")))?;
        self.key_pair(account.index)
    }
}

impl fmt::Debug for HdWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdWallet")
            .field("network", &self.network)
            .field("initialized", &self.is_initialized())
            .field("accounts", &self.accounts.len())
            .finish()
    }
}

/// A single imported key, e.g. from WIF.
#[derive(Debug, Clone)]
pub struct SingleKey {
    key: KeyPair,
    address: Address,
}

impl SingleKey {
    pub fn new(key: KeyPair, network: Network) -> Self {
        let address = Address::from_pubkey_hash(key.pubkey_hash(), network);
        Self { key, address }
    }

    /// Parse a compressed-key WIF string.
    pub fn from_wif(wif: &str) -> Result<Self, WalletError> {
        let payload = Zeroizing::new(
            bs58::decode(wif.trim())
                .with_check(None)
                .into_vec()
                .map_err(|_| WalletError::KeyUnavailable("malformed WIF".into()))?,
        );
        if payload.len() != 34 || payload[33] != 0x01 {
            return Err(WalletError::KeyUnavailable("WIF must encode a compressed key".into()));
        }
        let network = Network::from_wif_version(payload[0])
            .ok_or_else(|| WalletError::KeyUnavailable("unknown WIF version".into()))?;
        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(&payload[1..33]);
        Ok(Self::new(KeyPair::from_secret_bytes(&secret)?, network))
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl KeySource for SingleKey {
    fn key_for(&self, address: &Address) -> Result<KeyPair, WalletError> {
        if address != &self.address {
            return Err(WalletError::KeyUnavailable(format!("key does not control {address}")));
        }
        Ok(self.key.clone())
    }
}

/// Check a message signature against `address`.
///
/// Returns `Ok(false)` for a well-formed signature by some other key.
pub fn verify_message(
    address: &Address,
    message: &str,
    signature: &MessageSignature,
) -> Result<bool, WalletError> {
    let hash = signed_message_hash(address.network().params().message_prefix, message)?;
    let public_key = recover_compact(&hash, &signature.0)?;
    let recovered = Address::from_public_key(&public_key, address.network())?;
    Ok(&recovered == address)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon \
                           abandon abandon abandon abandon abandon about";

    fn wallet() -> HdWallet {
        HdWallet::from_mnemonic(ABANDON, Network::Mainnet).unwrap()
    }

    #[test]
    fn reference_account_zero() {
        let account = wallet().derive_account(0).unwrap();
        assert_eq!(account.address.to_string(), "DBus3bamQjgJULBJtYXpEzDWQRwF5iwxgC");
        assert_eq!(
            hex::encode(account.public_key),
            "02cc6b0dc33aabcf3a23643e5e2919a80c50fb3dd2129ce409bbc5f0d4643d05e0"
        );
        assert_eq!(account.derivation_path, "m/44'/3'/0'/0/0");
        assert_eq!(account.label, "Main Account");
        assert_eq!(account.id.len(), 8);
    }

    #[test]
    fn reference_accounts_one_and_two() {
        let mut w = wallet();
        assert_eq!(w.derive_account(1).unwrap().address.to_string(), "DEiUcV7xvCRdpQmsW3i8T9EVsb7zeiUQRt");
        assert_eq!(w.derive_account(2).unwrap().address.to_string(), "D9NBWKR2NrcD71vm36AvG2Vx5DwCDXgLiz");
        assert_eq!(w.account(1).unwrap().label, "Account 2");
    }

    #[test]
    fn testnet_uses_same_path_and_testnet_prefix() {
        let mut w = HdWallet::from_mnemonic(ABANDON, Network::Testnet).unwrap();
        let account = w.derive_account(0).unwrap();
        assert_eq!(account.address.to_string(), "naxvmcKgLi92MJkVvNBGVPooeJKY4wHDxY");
        assert_eq!(account.derivation_path, "m/44'/3'/0'/0/0");
    }

    #[test]
    fn derivation_is_deterministic() {
        let mut a = wallet();
        let mut b = wallet();
        for i in [0, 7, 49] {
            let first = a.derive_account(i).unwrap();
            assert_eq!(first, a.derive_account(i).unwrap());
            assert_eq!(first, b.derive_account(i).unwrap());
        }
    }

    #[test]
    fn uninitialized_operations_fail() {
        let mut w = HdWallet::new(Network::Mainnet);
        assert!(!w.is_initialized());
        assert_eq!(w.derive_account(0), Err(WalletError::NotInitialized));
        assert_eq!(w.private_key_bytes(0).unwrap_err(), WalletError::NotInitialized);
        assert_eq!(w.sign_message("hi", 0).unwrap_err(), WalletError::NotInitialized);
    }

    #[test]
    fn second_init_rejected() {
        let mut w = wallet();
        assert_eq!(w.init_from_mnemonic(ABANDON), Err(WalletError::AlreadyInitialized));
    }

    #[test]
    fn invalid_mnemonic_rejected() {
        let mut w = HdWallet::new(Network::Mainnet);
        assert!(matches!(
            w.init_from_mnemonic("abandon abandon abandon"),
            Err(WalletError::InvalidMnemonic(_))
        ));
        assert!(!w.is_initialized());
    }

    #[test]
    fn hardened_range_index_rejected() {
        let mut w = wallet();
        assert!(matches!(w.derive_account(1 << 31), Err(WalletError::Derivation(_))));
    }

    #[test]
    fn malformed_path_rejected() {
        assert!(matches!(
            wallet().private_key_bytes("m/44'/x"),
            Err(WalletError::Derivation(_))
        ));
    }

    #[test]
    fn private_key_by_index_matches_path() {
        let w = wallet();
        let by_index = w.private_key_bytes(1).unwrap();
        let by_path = w.private_key_bytes("m/44'/3'/1'/0/0").unwrap();
        assert_eq!(*by_index, *by_path);
    }

    #[test]
    fn private_key_bytes_rebuild_account_key() {
        let mut w = wallet();
        let account = w.derive_account(0).unwrap();
        let secret = w.private_key_bytes(0).unwrap();
        let key = KeyPair::from_secret_bytes(&secret).unwrap();
        assert_eq!(key.public_key(), account.public_key);
        assert_eq!(key.public_key(), w.key_pair(0).unwrap().public_key());
    }

    #[test]
    fn reference_wif() {
        let w = wallet();
        assert_eq!(
            w.private_key_wif(0).unwrap().as_str(),
            "QPkeC1ZfHx3c9g7WTj9cQ8gnvk2iSAfAcbq1aVAWjNTwDAKfZUzx"
        );
    }

    #[test]
    fn wif_roundtrip_through_single_key() {
        let mut w = wallet();
        let account = w.derive_account(2).unwrap();
        let single = SingleKey::from_wif(&w.private_key_wif(2).unwrap()).unwrap();
        assert_eq!(single.address(), &account.address);
        assert!(single.key_for(&account.address).is_ok());
    }

    #[test]
    fn key_source_requires_known_address() {
        let mut w = wallet();
        let a0 = w.derive_account(0).unwrap();
        assert!(w.key_for(&a0.address).is_ok());
        let stranger = Address::from_pubkey_hash([9; 20], Network::Mainnet);
        assert!(matches!(w.key_for(&stranger), Err(WalletError::KeyUnavailable(_))));
    }

    #[test]
    fn message_sign_and_verify() {
        let mut w = wallet();
        let account = w.derive_account(0).unwrap();
        let sig = w.sign_message("much wow", 0).unwrap();
        assert!((31..=34).contains(&sig.0[0]));
        assert!(verify_message(&account.address, "much wow", &sig).unwrap());
        assert!(!verify_message(&account.address, "such fake", &sig).unwrap());

        let parsed = MessageSignature::from_base64(&sig.to_string()).unwrap();
        assert_eq!(parsed, sig);
    }

    #[test]
    fn message_signature_is_deterministic() {
        let w = wallet();
        assert_eq!(w.sign_message("x", 0).unwrap(), w.sign_message("x", 0).unwrap());
    }

    #[test]
    fn account_serializes_camel_case() {
        let account = wallet().derive_account(0).unwrap();
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["derivationPath"], "m/44'/3'/0'/0/0");
        assert_eq!(json["address"], "DBus3bamQjgJULBJtYXpEzDWQRwF5iwxgC");
        assert!(json["publicKey"].as_str().unwrap().starts_with("02cc6b"));
    }

    #[test]
    fn debug_does_not_leak() {
        let dbg = format!("{:?}", wallet());
        assert!(!dbg.contains("abandon"));
    }
}
