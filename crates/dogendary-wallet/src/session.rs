//! The unlocked wallet session.
//!
//! A [`Session`] is owned by the host application and passed by reference;
//! there is no global wallet state. It is either `Locked` (nothing secret in
//! memory) or `Unlocked` (the decrypted seed and derived accounts).
//! [`Session::lock`] is the only way back to `Locked`, and dropping the
//! unlocked state zeroizes the mnemonic and master key.

use std::time::Instant;

use dogendary_core::address::Network;
use dogendary_core::types::Utxo;
use tracing::{debug, info, warn};

use crate::builder::{BuiltTransaction, SendRequest, TransactionBuilder};
use crate::config::WalletConfig;
use crate::encryption;
use crate::error::WalletError;
use crate::keys::{Account, HdWallet, MessageSignature};
use crate::mnemonic;
use crate::password::validate_password_strength;
use crate::storage::VaultStore;

struct Unlocked {
    wallet: HdWallet,
    active_account: u32,
    last_activity: Instant,
}

enum SessionState {
    Locked,
    Unlocked(Box<Unlocked>),
}

/// Wallet session bound to a vault store.
pub struct Session<S: VaultStore> {
    store: S,
    config: WalletConfig,
    state: SessionState,
}

impl<S: VaultStore> Session<S> {
    pub fn new(store: S, config: WalletConfig) -> Self {
        Self { store, config, state: SessionState::Locked }
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn network(&self) -> Network {
        self.config.network
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn has_vault(&self) -> Result<bool, WalletError> {
        self.store.exists()
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.state, SessionState::Unlocked(_))
    }

    /// Create (or import) a wallet: validate, derive account 0, encrypt and
    /// persist the vault, and leave the session unlocked.
    pub fn create_wallet(&mut self, phrase: &str, password: &str) -> Result<Account, WalletError> {
        if self.store.exists()? {
            return Err(WalletError::VaultExists);
        }
        if !mnemonic::validate_mnemonic(phrase) {
            return Err(WalletError::InvalidMnemonic("checksum or wordlist mismatch".into()));
        }
        check_password(password)?;

        let mut wallet = HdWallet::from_mnemonic(phrase, self.config.network)?;
        let account = wallet.derive_account(0)?;
        let normalized = mnemonic::normalize_mnemonic(phrase);
        let vault = encryption::encrypt(&normalized, password)?;
        self.store.save(&vault)?;

        info!(network = %self.config.network, address = %account.address, "wallet created");
        self.state = SessionState::Unlocked(Box::new(Unlocked {
            wallet,
            active_account: 0,
            last_activity: Instant::now(),
        }));
        Ok(account)
    }

    /// Decrypt the vault and restore account 0. Further accounts are
    /// re-derived on demand.
    pub fn unlock(&mut self, password: &str) -> Result<Vec<Account>, WalletError> {
        let vault = self.store.load()?.ok_or(WalletError::VaultMissing)?;
        let phrase = encryption::decrypt(&vault, password).inspect_err(|_| {
            warn!("unlock rejected");
        })?;
        let mut wallet = HdWallet::from_mnemonic(&phrase, self.config.network)?;
        wallet.derive_account(0)?;
        let accounts = wallet.accounts();

        info!(network = %self.config.network, "wallet unlocked");
        self.state = SessionState::Unlocked(Box::new(Unlocked {
            wallet,
            active_account: 0,
            last_activity: Instant::now(),
        }));
        Ok(accounts)
    }

    /// Drop all key material and return to `Locked`.
    pub fn lock(&mut self) {
        if self.is_unlocked() {
            info!("wallet locked");
        }
        self.state = SessionState::Locked;
    }

    /// Alias of [`Session::lock`].
    pub fn clear(&mut self) {
        self.lock();
    }

    /// Re-encrypt the vault under a new password.
    pub fn change_password(&mut self, old: &str, new: &str) -> Result<(), WalletError> {
        let vault = self.store.load()?.ok_or(WalletError::VaultMissing)?;
        let phrase = encryption::decrypt(&vault, old)?;
        check_password(new)?;
        let replacement = encryption::encrypt(&phrase, new)?;
        self.store.save(&replacement)?;
        info!("vault password changed");
        Ok(())
    }

    /// Destroy the vault and lock.
    pub fn reset(&mut self) -> Result<(), WalletError> {
        self.lock();
        self.store.clear()?;
        warn!("wallet reset, vault destroyed");
        Ok(())
    }

    pub fn accounts(&mut self) -> Result<Vec<Account>, WalletError> {
        Ok(self.unlocked()?.wallet.accounts())
    }

    pub fn active_account(&mut self) -> Result<Account, WalletError> {
        let unlocked = self.unlocked()?;
        unlocked
            .wallet
            .account(unlocked.active_account)
            .cloned()
            .ok_or(WalletError::UnknownAccount(unlocked.active_account))
    }

    /// Derive the next account index.
    pub fn create_account(&mut self) -> Result<Account, WalletError> {
        let unlocked = self.unlocked()?;
        let next = unlocked
            .wallet
            .accounts()
            .last()
            .map_or(0, |a| a.index + 1);
        unlocked.wallet.derive_account(next)
    }

    pub fn set_active_account(&mut self, index: u32) -> Result<Account, WalletError> {
        let unlocked = self.unlocked()?;
        let account = unlocked
            .wallet
            .account(index)
            .cloned()
            .ok_or(WalletError::UnknownAccount(index))?;
        unlocked.active_account = index;
        debug!(index, "active account changed");
        Ok(account)
    }

    pub fn sign_message(&mut self, message: &str) -> Result<MessageSignature, WalletError> {
        let unlocked = self.unlocked()?;
        unlocked.wallet.sign_message(message, unlocked.active_account)
    }

    /// Build and sign a payment from the wallet's accounts.
    pub fn send(&mut self, request: &SendRequest, utxos: &[Utxo]) -> Result<BuiltTransaction, WalletError> {
        let network = self.config.network;
        let unlocked = self.unlocked()?;
        TransactionBuilder::new(network).build_transaction(request, utxos, &unlocked.wallet)
    }

    pub fn transfer_inscription(
        &mut self,
        special: &Utxo,
        recipient: &str,
        fee_rate_per_kb: u64,
        utxos: &[Utxo],
    ) -> Result<BuiltTransaction, WalletError> {
        let network = self.config.network;
        let unlocked = self.unlocked()?;
        TransactionBuilder::new(network).build_inscription_transfer(
            special,
            recipient,
            fee_rate_per_kb,
            utxos,
            &unlocked.wallet,
        )
    }

    /// Record user activity.
    pub fn touch(&mut self) {
        self.touch_at(Instant::now());
    }

    pub fn touch_at(&mut self, now: Instant) {
        if let SessionState::Unlocked(unlocked) = &mut self.state {
            unlocked.last_activity = now;
        }
    }

    /// Lock if idle longer than the configured timeout. Returns whether the
    /// session locked.
    pub fn lock_if_idle(&mut self) -> bool {
        self.lock_if_idle_at(Instant::now())
    }

    pub fn lock_if_idle_at(&mut self, now: Instant) -> bool {
        let idle = match &self.state {
            SessionState::Unlocked(u) => now.saturating_duration_since(u.last_activity),
            SessionState::Locked => return false,
        };
        if idle >= self.config.auto_lock {
            info!(idle_secs = idle.as_secs(), "auto-lock");
            self.state = SessionState::Locked;
            return true;
        }
        false
    }

    /// The unlocked state, after enforcing auto-lock and recording activity.
    fn unlocked(&mut self) -> Result<&mut Unlocked, WalletError> {
        let now = Instant::now();
        self.lock_if_idle_at(now);
        match &mut self.state {
            SessionState::Unlocked(unlocked) => {
                unlocked.last_activity = now;
                Ok(&mut **unlocked)
            }
            SessionState::Locked => Err(WalletError::Locked),
        }
    }
}

fn check_password(password: &str) -> Result<(), WalletError> {
    let strength = validate_password_strength(password);
    if strength.is_valid {
        Ok(())
    } else {
        Err(WalletError::WeakPassword(strength.feedback.join("; ")))
    }
}
