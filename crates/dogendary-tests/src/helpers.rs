//! Shared fixtures for the integration tests.

use dogendary_core::address::{Address, Network};
use dogendary_core::crypto::KeyPair;
use dogendary_core::encoding::Reader;
use dogendary_core::types::{Txid, Utxo};
use dogendary_wallet::{HdWallet, SingleKey};

/// BIP39 test vector phrase.
pub const ABANDON: &str = "abandon abandon abandon abandon abandon abandon \
                           abandon abandon abandon abandon abandon about";

/// Passes the strength check.
pub const PASSWORD: &str = "Str0ng!Pass123";

/// `m/44'/3'/0'/0/0` of [`ABANDON`] on mainnet.
pub const ABANDON_ADDRESS_0: &str = "DBus3bamQjgJULBJtYXpEzDWQRwF5iwxgC";
pub const ABANDON_ADDRESS_1: &str = "DEiUcV7xvCRdpQmsW3i8T9EVsb7zeiUQRt";
pub const ABANDON_ADDRESS_2: &str = "D9NBWKR2NrcD71vm36AvG2Vx5DwCDXgLiz";
pub const ABANDON_TESTNET_ADDRESS_0: &str = "naxvmcKgLi92MJkVvNBGVPooeJKY4wHDxY";

/// Some mainnet address no test key owns.
pub fn stranger() -> Address {
    Address::from_pubkey_hash([0xEE; 20], Network::Mainnet)
}

/// [`ABANDON`] wallet with the first `accounts` accounts derived.
pub fn abandon_wallet(network: Network, accounts: u32) -> HdWallet {
    let mut wallet = HdWallet::from_mnemonic(ABANDON, network).expect("valid test phrase");
    for index in 0..accounts {
        wallet.derive_account(index).expect("derivable index");
    }
    wallet
}

/// A single-key signer on mainnet.
pub fn single_key(seed: u8) -> SingleKey {
    let key = KeyPair::from_secret_bytes(&[seed; 32]).expect("valid scalar");
    SingleKey::new(key, Network::Mainnet)
}

/// An ordinary UTXO; `tag` makes the outpoint unique.
pub fn utxo(owner: &Address, tag: u8, value: u64, confirmations: u32) -> Utxo {
    Utxo {
        txid: Txid::from_wire_bytes([tag; 32]),
        vout: u32::from(tag),
        value,
        address: *owner,
        script_pubkey: owner.script_pubkey(),
        confirmations,
        special: false,
        inscription_id: None,
    }
}

/// An inscription-bearing UTXO.
pub fn special_utxo(owner: &Address, tag: u8, value: u64) -> Utxo {
    Utxo {
        special: true,
        inscription_id: Some(format!("{}i0", hex_tag(tag))),
        ..utxo(owner, tag, value, 1)
    }
}

fn hex_tag(tag: u8) -> String {
    format!("{tag:02x}").repeat(32)
}

/// Split a P2PKH scriptSig into (DER signature, sighash type, public key).
pub fn split_script_sig(script: &[u8]) -> (Vec<u8>, u8, Vec<u8>) {
    let mut r = Reader::new(script);
    let sig_len = r.read_u8().expect("sig push") as usize;
    let sig = r.read_bytes(sig_len).expect("sig bytes");
    let pk_len = r.read_u8().expect("pubkey push") as usize;
    let pk = r.read_bytes(pk_len).expect("pubkey bytes").to_vec();
    r.finish().expect("nothing after pubkey");
    let (hash_type, der) = sig.split_last().expect("non-empty signature");
    (der.to_vec(), *hash_type, pk)
}
