//! End-to-end flows through the public wallet API.
//!
//! Covers:
//! - Vault lifecycle on disk (create, lock, unlock from a fresh session,
//!   password change, reset)
//! - Known-answer derivation for the BIP39 test phrase
//! - Payment building with signature verification per input
//! - Inscription transfer layout
//! - The JSON request boundary

use dogendary_core::address::{Address, Network};
use dogendary_core::constants::{COIN, DUST_THRESHOLD, SIGHASH_ALL};
use dogendary_core::crypto::{hash160, verify_sighash};
use dogendary_core::fee::estimate_fee;
use dogendary_core::types::Transaction;
use dogendary_tests::helpers::*;
use dogendary_wallet::{
    FileVaultStore, MemoryVaultStore, Reply, Request, Response, SendRequest, Session,
    TransactionBuilder, VaultStore, WalletConfig, WalletError, decrypt, encrypt,
    verify_message,
};

fn file_session(path: &std::path::Path) -> Session<FileVaultStore> {
    Session::new(FileVaultStore::new(path), WalletConfig::default())
}

/// Check every input's signature against the sighash it commits to.
fn assert_inputs_signed(tx: &Transaction, spent: &[dogendary_core::types::Utxo]) {
    assert_eq!(tx.inputs.len(), spent.len());
    for (index, utxo) in spent.iter().enumerate() {
        assert_eq!(tx.inputs[index].previous_output, utxo.outpoint());
        let (der, hash_type, pubkey) = split_script_sig(&tx.inputs[index].script_sig);
        assert_eq!(u32::from(hash_type), SIGHASH_ALL);
        assert_eq!(&hash160(&pubkey), utxo.address.pubkey_hash());
        let sighash = tx.signature_hash(index, &utxo.locking_script(), SIGHASH_ALL).unwrap();
        verify_sighash(&pubkey, &sighash, &der).unwrap();
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

#[test]
fn abandon_phrase_known_addresses() {
    let wallet = abandon_wallet(Network::Mainnet, 3);
    let addresses: Vec<String> = wallet.accounts().iter().map(|a| a.address.to_string()).collect();
    assert_eq!(addresses, [ABANDON_ADDRESS_0, ABANDON_ADDRESS_1, ABANDON_ADDRESS_2]);

    let testnet = abandon_wallet(Network::Testnet, 1);
    assert_eq!(testnet.accounts()[0].address.to_string(), ABANDON_TESTNET_ADDRESS_0);
}

#[test]
fn derivation_is_deterministic_across_instances() {
    let a = abandon_wallet(Network::Mainnet, 51);
    let b = abandon_wallet(Network::Mainnet, 51);
    assert_eq!(a.accounts(), b.accounts());

    let mut seen = std::collections::HashSet::new();
    for account in a.accounts() {
        assert!(seen.insert(account.address), "duplicate address at {}", account.index);
    }
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

#[test]
fn vault_encrypt_decrypt_scenario() {
    let vault = encrypt("test seed phrase", PASSWORD).unwrap();
    assert_eq!(decrypt(&vault, PASSWORD).unwrap().as_str(), "test seed phrase");
    assert_eq!(decrypt(&vault, "wrong").unwrap_err(), WalletError::Decryption);
}

#[test]
fn vault_lifecycle_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    let mut first = file_session(&path);
    let account = first.create_wallet(ABANDON, PASSWORD).unwrap();
    assert_eq!(account.address.to_string(), ABANDON_ADDRESS_0);
    first.lock();
    assert!(!first.is_unlocked());

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let record = &raw["encrypted_vault"];
    assert_eq!(record["version"], 1);
    assert_eq!(record["salt"].as_str().unwrap().len(), 24);
    assert_eq!(record["iv"].as_str().unwrap().len(), 16);
    assert!(!std::fs::read_to_string(&path).unwrap().contains("abandon"));

    // A fresh process sees the same vault.
    let mut second = file_session(&path);
    assert!(second.has_vault().unwrap());
    assert_eq!(second.unlock("Wr0ng!Pass1234").unwrap_err(), WalletError::Decryption);
    let accounts = second.unlock(PASSWORD).unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].address.to_string(), ABANDON_ADDRESS_0);
    assert_eq!(second.create_account().unwrap().address.to_string(), ABANDON_ADDRESS_1);

    second.change_password(PASSWORD, "N3w!Passphrase99").unwrap();
    let mut third = file_session(&path);
    assert_eq!(third.unlock(PASSWORD).unwrap_err(), WalletError::Decryption);
    third.unlock("N3w!Passphrase99").unwrap();

    third.reset().unwrap();
    assert!(!third.is_unlocked());
    assert!(!path.exists());
    assert_eq!(file_session(&path).unlock(PASSWORD).unwrap_err(), WalletError::VaultMissing);
}

#[test]
fn file_store_keeps_unrelated_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, r#"{"settings":{"theme":"dark"}}"#).unwrap();

    let mut session = file_session(&path);
    session.create_wallet(ABANDON, PASSWORD).unwrap();
    session.reset().unwrap();

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["settings"]["theme"], "dark");
    assert!(raw.get("encrypted_vault").is_none());
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[test]
fn session_send_signs_every_input() {
    let mut session = Session::new(MemoryVaultStore::new(), WalletConfig::default());
    session.create_wallet(ABANDON, PASSWORD).unwrap();
    let a0 = session.active_account().unwrap().address;
    let a1 = session.create_account().unwrap().address;

    let utxos = vec![utxo(&a0, 1, COIN, 3), utxo(&a1, 2, COIN, 5), utxo(&a0, 3, 50 * COIN, 0)];
    let request = SendRequest {
        to: stranger().to_string(),
        amount: 1.5,
        fee: None,
        fee_rate_per_kb: 100_000,
    };
    let built = session.send(&request, &utxos).unwrap();
    let tx = built.transaction.clone().unwrap();

    // The unconfirmed 50 DOGE output is ignored; both confirmed coins are needed.
    assert_eq!(tx.inputs.len(), 2);
    let spent: Vec<_> = tx
        .inputs
        .iter()
        .map(|i| utxos.iter().find(|u| u.outpoint() == i.previous_output).unwrap().clone())
        .collect();
    assert_inputs_signed(&tx, &spent);

    assert_eq!(tx.outputs[0].value, 150_000_000);
    assert_eq!(tx.outputs[0].script_pubkey, stranger().script_pubkey());
    assert_eq!(built.fee, estimate_fee(2, 2, 100_000));
    assert_eq!(built.change, 2 * COIN - 150_000_000 - built.fee);
    assert_eq!(tx.outputs[1].script_pubkey, spent[0].address.script_pubkey());

    let reparsed = Transaction::from_hex(&built.tx_hex).unwrap();
    assert_eq!(reparsed, tx);
    assert_eq!(reparsed.txid().unwrap(), built.txid);
}

#[test]
fn payment_reference_numbers() {
    let wallet = abandon_wallet(Network::Mainnet, 1);
    let owner = wallet.accounts()[0].address;
    let request = SendRequest {
        to: ABANDON_ADDRESS_1.into(),
        amount: 1.0,
        fee: None,
        fee_rate_per_kb: 100_000,
    };
    let utxos = [utxo(&owner, 7, 3 * COIN, 3)];
    let built = TransactionBuilder::new(Network::Mainnet)
        .build_transaction(&request, &utxos, &wallet)
        .unwrap();

    assert_eq!(built.fee, 37_400);
    assert_eq!(built.change, 199_962_600);
    assert_inputs_signed(built.transaction.as_ref().unwrap(), &utxos);
}

#[test]
fn inscription_transfer_layout() {
    let wallet = abandon_wallet(Network::Mainnet, 1);
    let owner = wallet.accounts()[0].address;
    let inscription = special_utxo(&owner, 1, 100_000);
    let other_inscription = special_utxo(&owner, 2, 50 * COIN);
    let padding = utxo(&owner, 3, 2 * COIN, 4);
    let utxos = vec![inscription.clone(), other_inscription, padding.clone()];

    let built = TransactionBuilder::new(Network::Mainnet)
        .build_inscription_transfer(&inscription, ABANDON_ADDRESS_2, 100_000, &utxos, &wallet)
        .unwrap();
    let tx = built.transaction.as_ref().unwrap();

    assert_eq!(tx.inputs.len(), 2);
    assert_eq!(tx.inputs[0].previous_output, inscription.outpoint());
    assert_eq!(tx.inputs[1].previous_output, padding.outpoint());
    assert_inputs_signed(tx, &[inscription.clone(), padding.clone()]);

    let recipient: Address = ABANDON_ADDRESS_2.parse().unwrap();
    assert_eq!(tx.outputs[0].value, 100_000);
    assert_eq!(tx.outputs[0].script_pubkey, recipient.script_pubkey());
    assert_eq!(built.fee, 37_400);
    assert_eq!(tx.outputs[1].value, 2 * COIN - 37_400);
    assert!(tx.outputs[1].value > DUST_THRESHOLD);
    assert_eq!(tx.outputs[1].script_pubkey, owner.script_pubkey());
}

#[test]
fn inscription_transfer_without_padding_fails() {
    let wallet = abandon_wallet(Network::Mainnet, 1);
    let owner = wallet.accounts()[0].address;
    let inscription = special_utxo(&owner, 1, 100_000);
    let err = TransactionBuilder::new(Network::Mainnet)
        .build_inscription_transfer(
            &inscription,
            ABANDON_ADDRESS_2,
            100_000,
            &[inscription.clone(), special_utxo(&owner, 2, 10 * COIN)],
            &wallet,
        )
        .unwrap_err();
    assert!(matches!(err, WalletError::InsufficientFunds { .. }));
}

#[test]
fn wrong_network_recipient_rejected() {
    let wallet = abandon_wallet(Network::Mainnet, 1);
    let owner = wallet.accounts()[0].address;
    let request = SendRequest {
        to: ABANDON_TESTNET_ADDRESS_0.into(),
        amount: 1.0,
        fee: None,
        fee_rate_per_kb: 100_000,
    };
    let err = TransactionBuilder::new(Network::Mainnet)
        .build_transaction(&request, &[utxo(&owner, 1, 5 * COIN, 1)], &wallet)
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidAddress(_)));
}

// ---------------------------------------------------------------------------
// Request boundary
// ---------------------------------------------------------------------------

#[test]
fn json_boundary_round() {
    let mut session = Session::new(MemoryVaultStore::new(), WalletConfig::default());

    let reply = session.handle_json(&format!(
        r#"{{"type":"IMPORT_WALLET","data":{{"mnemonic":"{ABANDON}","password":"{PASSWORD}"}}}}"#
    ));
    let Reply::Ok { data: Response::Account(account) } = reply else {
        panic!("unexpected reply: {reply:?}");
    };
    assert_eq!(account.address.to_string(), ABANDON_ADDRESS_0);

    let reply = session.handle(Request::CreateAccount);
    assert!(reply.is_ok());

    let reply = session.handle_json(r#"{"type":"GET_ACCOUNTS"}"#);
    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["data"]["type"], "ACCOUNTS");
    assert_eq!(json["data"]["data"]["accounts"][1]["address"], ABANDON_ADDRESS_1);

    let reply = session.handle_json(r#"{"type":"SIGN_MESSAGE","data":{"message":"such wow"}}"#);
    let Reply::Ok { data: Response::Signature { signature } } = reply else {
        panic!("unexpected reply: {reply:?}");
    };
    let sig = dogendary_wallet::MessageSignature::from_base64(&signature).unwrap();
    assert!(verify_message(&ABANDON_ADDRESS_0.parse().unwrap(), "such wow", &sig).unwrap());

    let reply = session.handle_json(r#"{"type":"RESET_WALLET"}"#);
    assert!(reply.is_ok());
    assert!(!session.store().exists().unwrap());
}
