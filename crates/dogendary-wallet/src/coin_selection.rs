//! UTXO classification and largest-first coin selection.
//!
//! The manager partitions an indexer snapshot into spendable and special
//! outputs. Special outputs (inscriptions and anything else bound to
//! embedded data) never reach a selection result. Only confirmed outputs are
//! eligible; zero-confirmation outputs are skipped everywhere.

use std::collections::HashSet;

use dogendary_core::fee::estimate_fee;
use dogendary_core::types::{OutPoint, Txid, Utxo};
use tracing::{debug, warn};

use crate::error::WalletError;

/// Outputs assumed by selection: payment plus change.
const SELECTION_OUTPUTS: usize = 2;

/// Outcome of a selection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinSelection {
    pub selected: Vec<Utxo>,
    /// Sum of the selected values.
    pub total: u64,
    /// Fee estimate for the selected input count.
    pub fee: u64,
}

/// Working set of UTXOs for one operation.
#[derive(Debug, Clone, Default)]
pub struct UtxoManager {
    utxos: Vec<Utxo>,
    spendable: Vec<Utxo>,
    special: Vec<Utxo>,
    special_outpoints: HashSet<OutPoint>,
}

impl UtxoManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_utxos(utxos: Vec<Utxo>) -> Self {
        let mut manager = Self::new();
        manager.set_utxos(utxos);
        manager
    }

    /// Replace the working set. Repeated outpoints keep their first entry.
    pub fn set_utxos(&mut self, utxos: Vec<Utxo>) {
        let reported = utxos.len();
        let mut seen = HashSet::with_capacity(reported);
        let utxos: Vec<Utxo> = utxos.into_iter().filter(|u| seen.insert(u.outpoint())).collect();
        if utxos.len() < reported {
            warn!(dropped = reported - utxos.len(), "duplicate outpoints in utxo set");
        }

        let (special, spendable): (Vec<Utxo>, Vec<Utxo>) =
            utxos.iter().cloned().partition(Utxo::is_special);
        self.special_outpoints = special.iter().map(Utxo::outpoint).collect();
        debug!(
            total = utxos.len(),
            spendable = spendable.len(),
            special = special.len(),
            "utxo set replaced"
        );
        self.utxos = utxos;
        self.spendable = spendable;
        self.special = special;
    }

    pub fn utxos(&self) -> &[Utxo] {
        &self.utxos
    }

    /// Every non-special UTXO, confirmed or not.
    pub fn spendable_utxos(&self) -> &[Utxo] {
        &self.spendable
    }

    pub fn special_utxos(&self) -> &[Utxo] {
        &self.special
    }

    pub fn is_special(&self, txid: &Txid, vout: u32) -> bool {
        self.special_outpoints.contains(&OutPoint { txid: *txid, vout })
    }

    pub fn total_balance(&self) -> u64 {
        self.utxos.iter().map(|u| u.value).fold(0, u64::saturating_add)
    }

    pub fn spendable_balance(&self) -> u64 {
        self.spendable.iter().map(|u| u.value).fold(0, u64::saturating_add)
    }

    /// What selection could draw on: confirmed, non-special value.
    pub fn confirmed_spendable_balance(&self) -> u64 {
        self.eligible().iter().map(|u| u.value).fold(0, u64::saturating_add)
    }

    /// Largest-first selection covering `target` plus the fee for the
    /// selected input count at `fee_rate_per_kb`.
    ///
    /// Returns an empty list when nothing qualifies or the eligible total is
    /// insufficient; callers treat that as insufficient funds.
    pub fn select_utxos(&self, target: u64, fee_rate_per_kb: u64) -> Result<Vec<Utxo>, WalletError> {
        if target == 0 {
            return Err(WalletError::InvalidAmount("selection target must be non-zero".into()));
        }
        Ok(self
            .select_with_fixed_inputs(target, fee_rate_per_kb, 0, 0)
            .map(|s| s.selected)
            .unwrap_or_default())
    }

    /// Inputs for a payment of `amount`, with the fee re-estimated for each
    /// input count and never below `min_fee`. A rate of zero makes `min_fee`
    /// the exact fee.
    pub fn select_payment(
        &self,
        amount: u64,
        fee_rate_per_kb: u64,
        min_fee: u64,
    ) -> Result<Option<CoinSelection>, WalletError> {
        if amount == 0 {
            return Err(WalletError::InvalidAmount("payment amount must be non-zero".into()));
        }
        Ok(self.select_with_fixed_inputs(amount, fee_rate_per_kb, 0, min_fee))
    }

    /// Ordinary UTXOs that pay the fee for spending `fixed_inputs` other
    /// inputs alongside them. `None` if the eligible set cannot cover it.
    pub fn select_padding(&self, fee_rate_per_kb: u64, fixed_inputs: usize) -> Option<CoinSelection> {
        self.select_with_fixed_inputs(0, fee_rate_per_kb, fixed_inputs, 0)
    }

    fn select_with_fixed_inputs(
        &self,
        target: u64,
        fee_rate_per_kb: u64,
        fixed_inputs: usize,
        min_fee: u64,
    ) -> Option<CoinSelection> {
        let needed = |count: usize| {
            let fee = estimate_fee(fixed_inputs + count, SELECTION_OUTPUTS, fee_rate_per_kb)
                .max(min_fee);
            (fee, target.saturating_add(fee))
        };

        let (fee, need) = needed(0);
        if need == 0 {
            return Some(CoinSelection { selected: Vec::new(), total: 0, fee });
        }

        let mut selected = Vec::new();
        let mut total: u64 = 0;
        for utxo in self.eligible() {
            total = total.saturating_add(utxo.value);
            selected.push(utxo.clone());
            let (fee, need) = needed(selected.len());
            if total >= need {
                debug!(inputs = selected.len(), total, fee, "selection satisfied");
                return Some(CoinSelection { selected, total, fee });
            }
        }
        debug!(candidates = selected.len(), total, target, "selection insufficient");
        None
    }

    /// Confirmed spendable UTXOs, largest value first.
    fn eligible(&self) -> Vec<&Utxo> {
        let mut eligible: Vec<&Utxo> = self
            .spendable
            .iter()
            .filter(|u| u.is_confirmed() && !u.is_special())
            .collect();
        eligible.sort_by(|a, b| b.value.cmp(&a.value));
        eligible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dogendary_core::address::{Address, Network};

    fn utxo(tag: u8, value: u64, confirmations: u32, special: bool) -> Utxo {
        Utxo {
            txid: Txid::from_wire_bytes([tag; 32]),
            vout: 0,
            value,
            address: Address::from_pubkey_hash([1; 20], Network::Mainnet),
            script_pubkey: Vec::new(),
            confirmations,
            special,
            inscription_id: None,
        }
    }

    fn reference_set() -> UtxoManager {
        UtxoManager::from_utxos(vec![
            utxo(1, 5_000_000, 6, false),
            utxo(2, 3_000_000, 3, false),
            utxo(3, 100, 1, true),
        ])
    }

    #[test]
    fn reference_scenario_picks_largest_only() {
        let selected = reference_set().select_utxos(4_000_000, 1000).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, 5_000_000);
    }

    #[test]
    fn partitions_special() {
        let m = reference_set();
        assert_eq!(m.spendable_utxos().len(), 2);
        assert_eq!(m.special_utxos().len(), 1);
        assert!(m.is_special(&Txid::from_wire_bytes([3; 32]), 0));
        assert!(!m.is_special(&Txid::from_wire_bytes([1; 32]), 0));
        assert_eq!(m.total_balance(), 8_000_100);
        assert_eq!(m.spendable_balance(), 8_000_000);
    }

    #[test]
    fn inscription_id_counts_as_special() {
        let mut marked = utxo(4, 9_000_000, 10, false);
        marked.inscription_id = Some("deadbeefi0".into());
        let m = UtxoManager::from_utxos(vec![marked, utxo(5, 1_000_000, 1, false)]);
        assert_eq!(m.special_utxos().len(), 1);
        let selected = m.select_utxos(500_000, 0).unwrap();
        assert!(selected.iter().all(|u| u.inscription_id.is_none()));
    }

    #[test]
    fn accumulates_until_fee_covered() {
        let m = UtxoManager::from_utxos(vec![
            utxo(1, 1_000_000, 1, false),
            utxo(2, 1_000_000, 1, false),
            utxo(3, 1_000_000, 1, false),
        ]);
        // Two inputs would need 2_037_400 at 100k/kB.
        let selected = m.select_utxos(2_000_000, 100_000).unwrap();
        assert_eq!(selected.len(), 3);
        let total: u64 = selected.iter().map(|u| u.value).sum();
        assert!(total >= 2_000_000 + estimate_fee(3, 2, 100_000));
    }

    #[test]
    fn skips_unconfirmed() {
        let m = UtxoManager::from_utxos(vec![utxo(1, 50_000_000, 0, false), utxo(2, 2_000_000, 1, false)]);
        let selected = m.select_utxos(1_000_000, 1000).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, 2_000_000);
        assert_eq!(m.confirmed_spendable_balance(), 2_000_000);
    }

    #[test]
    fn insufficient_returns_empty() {
        let m = reference_set();
        assert!(m.select_utxos(8_000_000, 1000).unwrap().is_empty());
        assert!(UtxoManager::new().select_utxos(1, 0).unwrap().is_empty());
    }

    #[test]
    fn zero_target_rejected() {
        assert!(matches!(reference_set().select_utxos(0, 1000), Err(WalletError::InvalidAmount(_))));
    }

    #[test]
    fn padding_covers_fee_for_fixed_input() {
        let m = reference_set();
        let padding = m.select_padding(100_000, 1).unwrap();
        assert_eq!(padding.selected.len(), 1);
        assert_eq!(padding.fee, estimate_fee(2, 2, 100_000));
        assert!(padding.selected.iter().all(|u| !u.is_special()));
    }

    #[test]
    fn padding_unavailable() {
        let m = UtxoManager::from_utxos(vec![utxo(9, 1_000, 1, false)]);
        assert!(m.select_padding(1_000_000, 1).is_none());
    }

    #[test]
    fn payment_fee_tracks_input_count() {
        let m = UtxoManager::from_utxos(vec![
            utxo(1, 1_000_000, 1, false),
            utxo(2, 1_000_000, 1, false),
            utxo(3, 1_000_000, 1, false),
        ]);
        let floor = estimate_fee(2, 2, 100_000);
        let selection = m.select_payment(2_000_000, 100_000, floor).unwrap().unwrap();
        assert_eq!(selection.selected.len(), 3);
        assert_eq!(selection.fee, estimate_fee(3, 2, 100_000));

        let single = m.select_payment(500_000, 100_000, floor).unwrap().unwrap();
        assert_eq!(single.selected.len(), 1);
        assert_eq!(single.fee, floor);
    }

    #[test]
    fn payment_with_fixed_fee_ignores_input_count() {
        let m = UtxoManager::from_utxos(vec![utxo(1, 1_000_000, 1, false), utxo(2, 1_000_000, 1, false)]);
        let selection = m.select_payment(1_500_000, 0, 1_000).unwrap().unwrap();
        assert_eq!(selection.selected.len(), 2);
        assert_eq!(selection.fee, 1_000);
        assert!(m.select_payment(1_999_001, 0, 1_000).unwrap().is_none());
        assert!(matches!(m.select_payment(0, 0, 1_000), Err(WalletError::InvalidAmount(_))));
    }

    #[test]
    fn duplicate_outpoints_counted_once() {
        let m = UtxoManager::from_utxos(vec![
            utxo(1, 2_000_000, 3, false),
            utxo(1, 2_000_000, 3, false),
            utxo(2, 100, 1, true),
            utxo(2, 100, 1, true),
        ]);
        assert_eq!(m.utxos().len(), 2);
        assert_eq!(m.spendable_utxos().len(), 1);
        assert_eq!(m.special_utxos().len(), 1);
        assert_eq!(m.total_balance(), 2_000_100);
        assert_eq!(m.confirmed_spendable_balance(), 2_000_000);
        assert!(m.select_utxos(3_000_000, 0).unwrap().is_empty());
    }

    #[test]
    fn replacing_the_set_forgets_old_entries() {
        let mut m = reference_set();
        m.set_utxos(vec![utxo(7, 1, 1, false)]);
        assert_eq!(m.utxos().len(), 1);
        assert!(!m.is_special(&Txid::from_wire_bytes([3; 32]), 0));
    }
}
