//! The size and fee model shared by coin selection and transaction building.
//!
//! Every caller that needs a fee goes through [`estimate_fee`]; there is no
//! second formula anywhere in the workspace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    FEE_RATE_HIGH, FEE_RATE_LOW, FEE_RATE_MEDIUM, P2PKH_INPUT_SIZE, P2PKH_OUTPUT_SIZE,
    TX_OVERHEAD_SIZE,
};

/// Estimated serialized size of a signed all-P2PKH transaction.
///
/// # Examples
///
/// ```
/// use dogendary_core::fee::estimated_tx_bytes;
/// assert_eq!(estimated_tx_bytes(1, 2), 226);
/// ```
pub fn estimated_tx_bytes(input_count: usize, output_count: usize) -> u64 {
    (input_count as u64)
        .saturating_mul(P2PKH_INPUT_SIZE)
        .saturating_add((output_count as u64).saturating_mul(P2PKH_OUTPUT_SIZE))
        .saturating_add(TX_OVERHEAD_SIZE)
}

/// Fee in koinu for the given shape at `fee_rate_per_kb`, rounded up to the
/// next whole koinu.
///
/// # Examples
///
/// ```
/// use dogendary_core::fee::estimate_fee;
/// assert_eq!(estimate_fee(1, 2, 100_000), 22_600);
/// assert_eq!(estimate_fee(1, 1, 1), 1);
/// ```
pub fn estimate_fee(input_count: usize, output_count: usize, fee_rate_per_kb: u64) -> u64 {
    estimated_tx_bytes(input_count, output_count)
        .saturating_mul(fee_rate_per_kb)
        .div_ceil(1000)
}

/// Named fee rates offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeTier {
    Low,
    #[default]
    Medium,
    High,
}

impl FeeTier {
    pub const ALL: [FeeTier; 3] = [FeeTier::Low, FeeTier::Medium, FeeTier::High];

    /// Rate in koinu per 1000 bytes.
    pub fn rate_per_kb(self) -> u64 {
        match self {
            FeeTier::Low => FEE_RATE_LOW,
            FeeTier::Medium => FEE_RATE_MEDIUM,
            FeeTier::High => FEE_RATE_HIGH,
        }
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeeTier::Low => "low",
            FeeTier::Medium => "medium",
            FeeTier::High => "high",
        })
    }
}

impl FromStr for FeeTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(FeeTier::Low),
            "medium" => Ok(FeeTier::Medium),
            "high" => Ok(FeeTier::High),
            other => Err(format!("unknown fee tier: {other}")),
        }
    }
}
