//! Wallet configuration.
//!
//! Provides [`WalletConfig`] with defaults for network, data directory,
//! auto-lock timeout and fee tier.

use std::path::PathBuf;
use std::time::Duration;

use dogendary_core::address::Network;
use dogendary_core::fee::FeeTier;

pub const DEFAULT_AUTO_LOCK: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_VAULT_FILE: &str = "storage.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConfig {
    pub network: Network,
    /// Root directory for persistent data.
    pub data_dir: PathBuf,
    /// Idle time after which an unlocked session locks itself.
    pub auto_lock: Duration,
    pub default_fee_tier: FeeTier,
    /// File name of the vault store inside `data_dir`.
    pub vault_file: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("dogendary");
        Self {
            network: Network::Mainnet,
            data_dir,
            auto_lock: DEFAULT_AUTO_LOCK,
            default_fee_tier: FeeTier::Low,
            vault_file: DEFAULT_VAULT_FILE.to_string(),
        }
    }
}

impl WalletConfig {
    /// Path to the vault store file. Testnet gets its own subdirectory.
    pub fn vault_path(&self) -> PathBuf {
        match self.network {
            Network::Mainnet => self.data_dir.join(&self.vault_file),
            Network::Testnet => self.data_dir.join("testnet").join(&self.vault_file),
        }
    }

    pub fn default_fee_rate(&self) -> u64 {
        self.default_fee_tier.rate_per_kb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = WalletConfig::default();
        assert_eq!(cfg.network, Network::Mainnet);
        assert_eq!(cfg.auto_lock, Duration::from_secs(300));
        assert_eq!(cfg.default_fee_rate(), 100_000);
        assert!(cfg.data_dir.ends_with("dogendary"));
    }

    #[test]
    fn testnet_vault_is_separate() {
        let mut cfg = WalletConfig { data_dir: PathBuf::from("/tmp/d"), ..Default::default() };
        assert_eq!(cfg.vault_path(), PathBuf::from("/tmp/d/storage.json"));
        cfg.network = Network::Testnet;
        assert_eq!(cfg.vault_path(), PathBuf::from("/tmp/d/testnet/storage.json"));
    }
}
