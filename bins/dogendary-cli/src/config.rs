//! CLI configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use dogendary_core::address::Network;
use dogendary_core::fee::FeeTier;
use dogendary_wallet::WalletConfig;
use zeroize::Zeroizing;

pub const PASSWORD_ENV: &str = "DOGENDARY_PASSWORD";
pub const NEW_PASSWORD_ENV: &str = "DOGENDARY_NEW_PASSWORD";

#[derive(Clone, Debug)]
pub struct Config {
    pub wallet: WalletConfig,
}

impl Config {
    /// Load configuration from `DOGENDARY_*` environment variables, falling
    /// back to [`WalletConfig::default`].
    pub fn from_env() -> Result<Self> {
        let mut wallet = WalletConfig::default();

        if let Ok(dir) = std::env::var("DOGENDARY_DATA_DIR") {
            wallet.data_dir = PathBuf::from(dir);
        }
        if let Ok(network) = std::env::var("DOGENDARY_NETWORK") {
            wallet.network = parse_network(&network)?;
        }
        if let Ok(tier) = std::env::var("DOGENDARY_FEE_TIER") {
            wallet.default_fee_tier = tier
                .parse::<FeeTier>()
                .map_err(|e| anyhow::anyhow!("{e}"))
                .context("DOGENDARY_FEE_TIER must be low, medium or high")?;
        }
        if let Ok(secs) = std::env::var("DOGENDARY_AUTO_LOCK_SECS") {
            let secs: u64 = secs
                .parse()
                .context("DOGENDARY_AUTO_LOCK_SECS must be a positive integer")?;
            wallet.auto_lock = Duration::from_secs(secs);
        }

        Ok(Config { wallet })
    }
}

/// Parse a network name ("mainnet" or "testnet").
pub fn parse_network(s: &str) -> Result<Network> {
    s.parse::<Network>().context("network must be 'mainnet' or 'testnet'")
}

/// Read a password from `env_var`, or prompt without echo.
pub fn password_from_env_or_prompt(env_var: &str, prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(password) = std::env::var(env_var) {
        return Ok(Zeroizing::new(password));
    }
    rpassword::prompt_password(format!("{prompt}: "))
        .map(Zeroizing::new)
        .context("Failed to read password")
}
