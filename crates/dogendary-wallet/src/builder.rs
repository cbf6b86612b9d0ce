//! Legacy P2PKH transaction construction and signing.
//!
//! Build flow:
//! 1. Convert the display amount to koinu and select inputs
//! 2. Lay out the payment output plus change when it clears the dust limit
//! 3. Sign every input against its own legacy sighash, in input order
//! 4. Serialize and compute the txid

use dogendary_core::address::{Address, Network};
use dogendary_core::constants::{COIN, DEFAULT_LOCK_TIME, DUST_THRESHOLD, SIGHASH_ALL, TX_VERSION};
use dogendary_core::fee::{FeeTier, estimate_fee};
use dogendary_core::script::p2pkh_script_sig;
use dogendary_core::types::{Transaction, TxInput, TxOutput, Txid, Utxo};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::coin_selection::UtxoManager;
use crate::error::WalletError;
use crate::keys::KeySource;

/// A payment request in display units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub to: String,
    /// Amount in DOGE.
    pub amount: f64,
    /// Absolute fee in DOGE. Estimated from `fee_rate_per_kb` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
    #[serde(default = "default_fee_rate")]
    pub fee_rate_per_kb: u64,
}

fn default_fee_rate() -> u64 {
    FeeTier::Low.rate_per_kb()
}

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltTransaction {
    pub tx_hex: String,
    pub txid: Txid,
    /// Effective fee in koinu: inputs minus outputs, dust included.
    pub fee: u64,
    /// Change returned to the payer, zero when it fell under the dust limit.
    pub change: u64,
    #[serde(skip)]
    pub transaction: Option<Transaction>,
}

/// Convert a DOGE amount to koinu, rounding half away from zero.
///
/// # Examples
///
/// ```
/// use dogendary_wallet::builder::to_base_units;
/// assert_eq!(to_base_units(1.5).unwrap(), 150_000_000);
/// assert_eq!(to_base_units(0.00000001).unwrap(), 1);
/// assert!(to_base_units(0.0).is_err());
/// ```
pub fn to_base_units(amount: f64) -> Result<u64, WalletError> {
    match convert_units(amount)? {
        0 => Err(WalletError::InvalidAmount(format!("{amount} rounds to zero"))),
        units => Ok(units),
    }
}

fn convert_units(amount: f64) -> Result<u64, WalletError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(WalletError::InvalidAmount(format!("{amount} is not a valid amount")));
    }
    let units = (amount * COIN as f64).round();
    if units >= u64::MAX as f64 {
        return Err(WalletError::InvalidAmount(format!("{amount} overflows")));
    }
    Ok(units as u64)
}

/// Builds and signs legacy transactions for one network.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    network: Network,
    lock_time: u32,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new(Network::default())
    }
}

impl TransactionBuilder {
    pub fn new(network: Network) -> Self {
        Self { network, lock_time: DEFAULT_LOCK_TIME }
    }

    pub fn set_lock_time(&mut self, lock_time: u32) -> &mut Self {
        self.lock_time = lock_time;
        self
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Same estimator coin selection uses.
    pub fn estimate_fee(input_count: usize, output_count: usize, fee_rate_per_kb: u64) -> u64 {
        estimate_fee(input_count, output_count, fee_rate_per_kb)
    }

    /// Build and sign a payment.
    ///
    /// Without a caller-supplied fee the 2-in/2-out estimate is the floor and
    /// selection raises it for each input beyond two. A caller-supplied fee is
    /// used as is.
    pub fn build_transaction(
        &self,
        request: &SendRequest,
        utxos: &[Utxo],
        keys: &dyn KeySource,
    ) -> Result<BuiltTransaction, WalletError> {
        let to = Address::decode_for(&request.to, self.network)?;
        let amount = to_base_units(request.amount)?;
        let fixed_fee = request.fee.map(convert_units).transpose()?;

        let (rate, min_fee) = match fixed_fee {
            Some(fee) => (0, fee),
            None => (request.fee_rate_per_kb, estimate_fee(2, 2, request.fee_rate_per_kb)),
        };
        amount
            .checked_add(min_fee)
            .ok_or_else(|| WalletError::InvalidAmount("amount plus fee overflows".into()))?;

        let manager = UtxoManager::from_utxos(utxos.to_vec());
        let selection = manager.select_payment(amount, rate, min_fee)?.ok_or_else(|| {
            WalletError::InsufficientFunds {
                have: manager.confirmed_spendable_balance(),
                need: amount + min_fee,
            }
        })?;
        let (selected, fee) = (selection.selected, selection.fee);
        debug!(inputs = selected.len(), fee, "payment inputs selected");

        let total = sum_values(&selected)?;
        let need = amount.saturating_add(fee);
        if total < need {
            return Err(WalletError::InsufficientFunds { have: total, need });
        }
        if let Some(special) = selected.iter().find(|u| u.is_special()) {
            return Err(WalletError::SpecialOutputSelected(special.outpoint().to_string()));
        }

        let mut outputs = vec![TxOutput::to_address(&to, amount)];
        let change = total - need;
        let change = if change > DUST_THRESHOLD {
            outputs.push(TxOutput::to_address(&selected[0].address, change));
            change
        } else {
            0
        };

        let built = self.sign_and_assemble(&selected, outputs, keys)?;
        info!(
            txid = %built.txid,
            inputs = selected.len(),
            amount,
            fee = built.fee,
            change = built.change,
            "transaction built"
        );
        debug_assert_eq!(built.change, change);
        Ok(built)
    }

    /// Move one special UTXO, unsplit, to `recipient`.
    ///
    /// The special input is spent first so its value lands in output 0.
    /// Ordinary confirmed UTXOs pay the fee; change above dust goes back to
    /// the first padding input's address. Other special UTXOs are never used
    /// as padding.
    pub fn build_inscription_transfer(
        &self,
        special: &Utxo,
        recipient: &str,
        fee_rate_per_kb: u64,
        utxos: &[Utxo],
        keys: &dyn KeySource,
    ) -> Result<BuiltTransaction, WalletError> {
        let to = Address::decode_for(recipient, self.network)?;
        if !special.is_special() {
            return Err(WalletError::Build(format!(
                "{} is not a special output",
                special.outpoint()
            )));
        }

        let padding_pool: Vec<Utxo> = utxos
            .iter()
            .filter(|u| u.outpoint() != special.outpoint())
            .cloned()
            .collect();
        let manager = UtxoManager::from_utxos(padding_pool);
        let padding = manager.select_padding(fee_rate_per_kb, 1).ok_or_else(|| {
            WalletError::InsufficientFunds {
                have: manager.confirmed_spendable_balance(),
                need: estimate_fee(2, 2, fee_rate_per_kb),
            }
        })?;
        if let Some(bad) = padding.selected.iter().find(|u| u.is_special()) {
            return Err(WalletError::SpecialOutputSelected(bad.outpoint().to_string()));
        }

        let mut inputs = Vec::with_capacity(1 + padding.selected.len());
        inputs.push(special.clone());
        inputs.extend(padding.selected.iter().cloned());

        let mut outputs = vec![TxOutput::to_address(&to, special.value)];
        let change = padding.total.saturating_sub(padding.fee);
        if change > DUST_THRESHOLD {
            outputs.push(TxOutput::to_address(&padding.selected[0].address, change));
        }

        let built = self.sign_and_assemble(&inputs, outputs, keys)?;
        info!(
            txid = %built.txid,
            special = %special.outpoint(),
            padding = padding.selected.len(),
            fee = built.fee,
            "inscription transfer built"
        );
        Ok(built)
    }

    /// Sign each input in order, then serialize.
    ///
    /// Input `i` is signed over the legacy sighash in which only its own
    /// scriptSig slot holds the spent output's script. Each key is dropped
    /// before the next input is touched.
    fn sign_and_assemble(
        &self,
        spent: &[Utxo],
        outputs: Vec<TxOutput>,
        keys: &dyn KeySource,
    ) -> Result<BuiltTransaction, WalletError> {
        let mut tx = Transaction {
            version: TX_VERSION,
            inputs: spent.iter().map(|u| TxInput::unsigned(u.outpoint())).collect(),
            outputs,
            lock_time: self.lock_time,
        };

        let mut script_sigs = Vec::with_capacity(spent.len());
        for (index, utxo) in spent.iter().enumerate() {
            if !utxo.script_pubkey.is_empty() && utxo.script_pubkey != utxo.address.script_pubkey() {
                return Err(WalletError::Build(format!(
                    "input {index} script does not pay {}",
                    utxo.address
                )));
            }
            let script_code = utxo.locking_script();
            let sighash = tx
                .signature_hash(index, &script_code, SIGHASH_ALL)
                .map_err(WalletError::from)?;

            let key = keys.key_for(&utxo.address)?;
            if &key.pubkey_hash() != utxo.address.pubkey_hash() {
                return Err(WalletError::KeyUnavailable(format!(
                    "key for input {index} does not match {}",
                    utxo.address
                )));
            }
            let mut signature = key
                .sign_sighash(&sighash)
                .map_err(|e| WalletError::Signing { index, reason: e.to_string() })?;
            let public_key = key.public_key();
            drop(key);

            signature.push(SIGHASH_ALL as u8);
            let script_sig = p2pkh_script_sig(&signature, &public_key)
                .map_err(|e| WalletError::format("script_sig", e))?;
            script_sigs.push(script_sig);
        }
        for (input, script_sig) in tx.inputs.iter_mut().zip(script_sigs) {
            input.script_sig = script_sig;
        }

        let raw = tx.serialize().map_err(|e| WalletError::format("serialize", e))?;
        let txid = Txid::from(dogendary_core::crypto::sha256d(&raw));

        let input_total = sum_values(spent)?;
        let output_total = tx
            .total_output_value()
            .ok_or_else(|| WalletError::InvalidAmount("output total overflows".into()))?;
        let fee = input_total
            .checked_sub(output_total)
            .ok_or_else(|| WalletError::Build("outputs exceed inputs".into()))?;
        let change = tx.outputs.get(1).map_or(0, |o| o.value);

        Ok(BuiltTransaction { tx_hex: hex::encode(&raw), txid, fee, change, transaction: Some(tx) })
    }
}

fn sum_values(utxos: &[Utxo]) -> Result<u64, WalletError> {
    utxos
        .iter()
        .try_fold(0u64, |acc, u| acc.checked_add(u.value))
        .ok_or_else(|| WalletError::InvalidAmount("input total overflows".into()))
}
