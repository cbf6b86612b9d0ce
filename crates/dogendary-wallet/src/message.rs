//! Typed request/response boundary.
//!
//! Hosts hand the core a [`Request`] parsed from JSON
//! (`{"type": "UNLOCK_WALLET", "data": {...}}`) and get back a [`Reply`]
//! that is either `ok` with a [`Response`] or `error` with an [`ErrorKind`]
//! and a message. Unknown tags and malformed payloads fail at parse time.

use std::fmt;

use dogendary_core::address::Address;
use dogendary_core::types::Utxo;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;
use zeroize::Zeroizing;

use crate::builder::{BuiltTransaction, SendRequest};
use crate::error::{ErrorKind, WalletError};
use crate::keys::{Account, MessageSignature, verify_message};
use crate::mnemonic::{self, MnemonicStrength};
use crate::password::{PasswordStrength, validate_password_strength};
use crate::session::Session;
use crate::storage::VaultStore;

/// A string that is zeroized on drop and redacted in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Zeroizing::new(s.into()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(***)")
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(Zeroizing::new(String::deserialize(deserializer)?)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Request {
    GenerateMnemonic { strength: MnemonicStrength },
    ValidateMnemonic { mnemonic: SecretString },
    CheckPassword { password: SecretString },
    CreateWallet { mnemonic: SecretString, password: SecretString },
    ImportWallet { mnemonic: SecretString, password: SecretString },
    UnlockWallet { password: SecretString },
    LockWallet,
    ChangePassword { old_password: SecretString, new_password: SecretString },
    ResetWallet,
    GetStatus,
    GetAccounts,
    CreateAccount,
    SetActiveAccount { index: u32 },
    SignMessage { message: String },
    VerifyMessage { address: Address, message: String, signature: String },
    SendTransaction { request: SendRequest, utxos: Vec<Utxo> },
    TransferInscription { inscription: Utxo, recipient: String, fee_rate_per_kb: u64, utxos: Vec<Utxo> },
}

impl Request {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Response {
    Mnemonic { mnemonic: SecretString },
    Valid { valid: bool },
    PasswordStrength(PasswordStrength),
    Account(Account),
    Accounts { accounts: Vec<Account>, active: Option<u32> },
    Status { has_vault: bool, unlocked: bool },
    Signature { signature: String },
    Transaction(BuiltTransaction),
    Done,
}

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Reply {
    Ok { data: Response },
    Error { kind: ErrorKind, message: String },
}

impl Reply {
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok { .. })
    }

    /// Reply for input that did not parse as a [`Request`].
    pub fn invalid_request(message: impl fmt::Display) -> Self {
        Reply::Error { kind: ErrorKind::InvalidRequest, message: message.to_string() }
    }
}

impl From<Result<Response, WalletError>> for Reply {
    fn from(result: Result<Response, WalletError>) -> Self {
        match result {
            Ok(data) => Reply::Ok { data },
            Err(e) => Reply::Error { kind: e.kind(), message: e.to_string() },
        }
    }
}

impl<S: VaultStore> Session<S> {
    /// Dispatch one request.
    pub fn handle(&mut self, request: Request) -> Reply {
        let tag = request_tag(&request);
        let reply: Reply = self.dispatch(request).into();
        if let Reply::Error { kind, .. } = &reply {
            debug!(request = tag, ?kind, "request failed");
        }
        reply
    }

    /// Parse and dispatch a JSON request.
    pub fn handle_json(&mut self, json: &str) -> Reply {
        match Request::from_json(json) {
            Ok(request) => self.handle(request),
            Err(e) => Reply::invalid_request(e),
        }
    }

    fn dispatch(&mut self, request: Request) -> Result<Response, WalletError> {
        match request {
            Request::GenerateMnemonic { strength } => {
                let phrase = mnemonic::generate_mnemonic(strength)?;
                Ok(Response::Mnemonic { mnemonic: SecretString::new(phrase.as_str()) })
            }
            Request::ValidateMnemonic { mnemonic } => Ok(Response::Valid {
                valid: mnemonic::validate_mnemonic(mnemonic.expose()),
            }),
            Request::CheckPassword { password } => {
                Ok(Response::PasswordStrength(validate_password_strength(password.expose())))
            }
            Request::CreateWallet { mnemonic, password }
            | Request::ImportWallet { mnemonic, password } => self
                .create_wallet(mnemonic.expose(), password.expose())
                .map(Response::Account),
            Request::UnlockWallet { password } => {
                let accounts = self.unlock(password.expose())?;
                Ok(Response::Accounts { accounts, active: Some(0) })
            }
            Request::LockWallet => {
                self.lock();
                Ok(Response::Done)
            }
            Request::ChangePassword { old_password, new_password } => {
                self.change_password(old_password.expose(), new_password.expose())?;
                Ok(Response::Done)
            }
            Request::ResetWallet => {
                self.reset()?;
                Ok(Response::Done)
            }
            Request::GetStatus => {
                self.lock_if_idle();
                Ok(Response::Status { has_vault: self.has_vault()?, unlocked: self.is_unlocked() })
            }
            Request::GetAccounts => {
                let accounts = self.accounts()?;
                let active = self.active_account()?.index;
                Ok(Response::Accounts { accounts, active: Some(active) })
            }
            Request::CreateAccount => self.create_account().map(Response::Account),
            Request::SetActiveAccount { index } => self.set_active_account(index).map(Response::Account),
            Request::SignMessage { message } => {
                let signature = self.sign_message(&message)?;
                Ok(Response::Signature { signature: signature.to_base64() })
            }
            Request::VerifyMessage { address, message, signature } => {
                let signature = MessageSignature::from_base64(&signature)?;
                Ok(Response::Valid { valid: verify_message(&address, &message, &signature)? })
            }
            Request::SendTransaction { request, utxos } => {
                self.send(&request, &utxos).map(Response::Transaction)
            }
            Request::TransferInscription { inscription, recipient, fee_rate_per_kb, utxos } => self
                .transfer_inscription(&inscription, &recipient, fee_rate_per_kb, &utxos)
                .map(Response::Transaction),
        }
    }
}

fn request_tag(request: &Request) -> &'static str {
    match request {
        Request::GenerateMnemonic { .. } => "GENERATE_MNEMONIC",
        Request::ValidateMnemonic { .. } => "VALIDATE_MNEMONIC",
        Request::CheckPassword { .. } => "CHECK_PASSWORD",
        Request::CreateWallet { .. } => "CREATE_WALLET",
        Request::ImportWallet { .. } => "IMPORT_WALLET",
        Request::UnlockWallet { .. } => "UNLOCK_WALLET",
        Request::LockWallet => "LOCK_WALLET",
        Request::ChangePassword { .. } => "CHANGE_PASSWORD",
        Request::ResetWallet => "RESET_WALLET",
        Request::GetStatus => "GET_STATUS",
        Request::GetAccounts => "GET_ACCOUNTS",
        Request::CreateAccount => "CREATE_ACCOUNT",
        Request::SetActiveAccount { .. } => "SET_ACTIVE_ACCOUNT",
        Request::SignMessage { .. } => "SIGN_MESSAGE",
        Request::VerifyMessage { .. } => "VERIFY_MESSAGE",
        Request::SendTransaction { .. } => "SEND_TRANSACTION",
        Request::TransferInscription { .. } => "TRANSFER_INSCRIPTION",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalletConfig;
    use crate::storage::MemoryVaultStore;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon \
                           abandon abandon abandon abandon abandon about";

    fn session() -> Session<MemoryVaultStore> {
        Session::new(MemoryVaultStore::new(), WalletConfig::default())
    }

    #[test]
    fn parses_tagged_requests() {
        let req = Request::from_json(r#"{"type":"UNLOCK_WALLET","data":{"password":"pw"}}"#).unwrap();
        assert!(matches!(req, Request::UnlockWallet { .. }));
        let req = Request::from_json(r#"{"type":"LOCK_WALLET"}"#).unwrap();
        assert_eq!(req, Request::LockWallet);
        let req = Request::from_json(r#"{"type":"SET_ACTIVE_ACCOUNT","data":{"index":2}}"#).unwrap();
        assert_eq!(req, Request::SetActiveAccount { index: 2 });
    }

    #[test]
    fn rejects_unknown_and_malformed() {
        assert!(Request::from_json(r#"{"type":"GET_DRC20_TOKENS"}"#).is_err());
        assert!(Request::from_json(r#"{"type":"UNLOCK_WALLET","data":{}}"#).is_err());
        assert!(Request::from_json(r#"{"type":"GENERATE_MNEMONIC","data":{"strength":160}}"#).is_err());

        let reply = session().handle_json("not json");
        assert!(matches!(reply, Reply::Error { kind: ErrorKind::InvalidRequest, .. }));
    }

    #[test]
    fn debug_redacts_secrets() {
        let req = Request::UnlockWallet { password: SecretString::new("hunter2") };
        let dbg = format!("{req:?}");
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn locked_session_reports_kind() {
        let reply = session().handle(Request::GetAccounts);
        assert_eq!(
            reply,
            Reply::Error { kind: ErrorKind::Locked, message: "wallet is locked".into() }
        );
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "LOCKED");
    }

    #[test]
    fn full_flow_through_requests() {
        let mut s = session();
        let create = format!(
            r#"{{"type":"CREATE_WALLET","data":{{"mnemonic":"{ABANDON}","password":"Str0ng!Pass123"}}}}"#
        );
        let reply = s.handle_json(&create);
        assert!(reply.is_ok(), "{reply:?}");

        let reply = s.handle(Request::SignMessage { message: "wow".into() });
        let Reply::Ok { data: Response::Signature { signature } } = reply else {
            panic!("unexpected reply: {reply:?}");
        };

        let reply = s.handle(Request::VerifyMessage {
            address: "DBus3bamQjgJULBJtYXpEzDWQRwF5iwxgC".parse().unwrap(),
            message: "wow".into(),
            signature,
        });
        assert_eq!(reply, Reply::Ok { data: Response::Valid { valid: true } });

        assert!(s.handle(Request::LockWallet).is_ok());
        let reply = s.handle(Request::UnlockWallet { password: SecretString::new("bad") });
        assert_eq!(
            reply,
            Reply::Error { kind: ErrorKind::Decryption, message: "invalid password".into() }
        );
    }

    #[test]
    fn status_and_generate() {
        let mut s = session();
        assert_eq!(
            s.handle(Request::GetStatus),
            Reply::Ok { data: Response::Status { has_vault: false, unlocked: false } }
        );
        let reply = s.handle(Request::GenerateMnemonic { strength: MnemonicStrength::Words24 });
        let Reply::Ok { data: Response::Mnemonic { mnemonic } } = reply else {
            panic!("unexpected reply");
        };
        assert_eq!(mnemonic.expose().split_whitespace().count(), 24);
    }
}
