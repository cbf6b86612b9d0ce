//! dogendary: command-line front end for the Dogendary wallet core.
//!
//! Manages the encrypted vault, derives accounts, signs messages and builds
//! signed transactions from UTXO sets supplied as JSON files. Nothing here
//! talks to the network; broadcasting is left to the caller.

mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use dogendary_core::address::{Address, Network};
use dogendary_core::fee::FeeTier;
use dogendary_core::types::Utxo;
use dogendary_wallet::{
    FileVaultStore, MessageSignature, MnemonicStrength, SendRequest, Session, mnemonic,
    validate_password_strength, verify_message,
};
use serde::Serialize;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::config::{Config, NEW_PASSWORD_ENV, PASSWORD_ENV, password_from_env_or_prompt};

/// Dogendary wallet command-line interface.
#[derive(Parser)]
#[command(name = "dogendary")]
#[command(version, about = "Dogecoin HD wallet core")]
struct Cli {
    /// Network (mainnet or testnet). Overrides DOGENDARY_NETWORK.
    #[arg(long, global = true)]
    network: Option<Network>,

    /// Data directory. Overrides DOGENDARY_DATA_DIR.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mnemonic phrase utilities.
    Mnemonic {
        #[command(subcommand)]
        action: MnemonicAction,
    },
    /// Password strength utilities.
    Password {
        #[command(subcommand)]
        action: PasswordAction,
    },
    /// Encrypted vault management.
    Vault {
        #[command(subcommand)]
        action: VaultAction,
    },
    /// Account derivation.
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Sign a message with an account key.
    SignMessage(SignMessageArgs),
    /// Verify a signed message.
    VerifyMessage(VerifyMessageArgs),
    /// Build and sign a payment.
    Send(SendArgs),
    /// Build and sign an inscription transfer.
    TransferInscription(TransferInscriptionArgs),
}

#[derive(Subcommand)]
enum MnemonicAction {
    /// Generate a new phrase.
    Generate {
        /// Number of words (12 or 24).
        #[arg(long, default_value_t = 12)]
        words: usize,
    },
    /// Check a phrase's wordlist and checksum. Prompts when omitted.
    Validate { phrase: Option<String> },
}

#[derive(Subcommand)]
enum PasswordAction {
    /// Score a password read from DOGENDARY_PASSWORD or the terminal.
    Check,
}

#[derive(Subcommand)]
enum VaultAction {
    /// Create a vault from a new or imported phrase.
    Create {
        /// Import this phrase instead of generating one.
        #[arg(long)]
        mnemonic: Option<String>,
        /// Words in a generated phrase (12 or 24).
        #[arg(long, default_value_t = 12)]
        words: usize,
    },
    /// Check the password and print the restored accounts.
    Unlock,
    /// Re-encrypt the vault under a new password.
    ChangePassword,
    /// Destroy the vault.
    Reset {
        /// Required; the vault cannot be recovered without the phrase.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Derive the account at one index.
    Derive {
        #[arg(long)]
        index: u32,
    },
    /// List the first `count` accounts.
    List {
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
}

#[derive(Args)]
struct SignMessageArgs {
    message: String,
    /// Account index to sign with.
    #[arg(long, default_value_t = 0)]
    account: u32,
}

#[derive(Args)]
struct VerifyMessageArgs {
    message: String,
    #[arg(long)]
    address: Address,
    /// Base64 compact signature.
    #[arg(long)]
    signature: String,
}

#[derive(Args)]
struct SpendArgs {
    /// JSON file holding an array of UTXOs.
    #[arg(long)]
    utxos: PathBuf,
    /// Number of accounts whose keys may sign inputs.
    #[arg(long, default_value_t = 1)]
    accounts: u32,
    /// Fee tier used when no explicit fee or rate is given.
    #[arg(long)]
    fee_tier: Option<FeeTier>,
    /// Fee rate in koinu per kilobyte.
    #[arg(long, conflicts_with = "fee_tier")]
    fee_rate: Option<u64>,
}

#[derive(Args)]
struct SendArgs {
    /// Recipient address.
    #[arg(long)]
    to: String,
    /// Amount in DOGE.
    #[arg(long)]
    amount: f64,
    /// Absolute fee in DOGE; skips fee estimation.
    #[arg(long)]
    fee: Option<f64>,
    #[command(flatten)]
    spend: SpendArgs,
}

#[derive(Args)]
struct TransferInscriptionArgs {
    /// Recipient address.
    #[arg(long)]
    to: String,
    /// JSON file holding the inscription-bearing UTXO.
    #[arg(long)]
    inscription: PathBuf,
    #[command(flatten)]
    spend: SpendArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    let mut config = Config::from_env()?;
    if let Some(network) = cli.network {
        config.wallet.network = network;
    }
    if let Some(dir) = cli.data_dir {
        config.wallet.data_dir = dir;
    }
    debug!(network = %config.wallet.network, vault = %config.wallet.vault_path().display(), "configuration loaded");

    match cli.command {
        Commands::Mnemonic { action } => match action {
            MnemonicAction::Generate { words } => mnemonic_generate(words),
            MnemonicAction::Validate { phrase } => mnemonic_validate(phrase),
        },
        Commands::Password { action: PasswordAction::Check } => password_check(),
        Commands::Vault { action } => match action {
            VaultAction::Create { mnemonic, words } => vault_create(&config, mnemonic, words),
            VaultAction::Unlock => vault_unlock(&config),
            VaultAction::ChangePassword => vault_change_password(&config),
            VaultAction::Reset { yes } => vault_reset(&config, yes),
        },
        Commands::Account { action } => match action {
            AccountAction::Derive { index } => account_derive(&config, index),
            AccountAction::List { count } => account_list(&config, count),
        },
        Commands::SignMessage(args) => sign_message(&config, args),
        Commands::VerifyMessage(args) => verify(args),
        Commands::Send(args) => send(&config, args),
        Commands::TransferInscription(args) => transfer_inscription(&config, args),
    }
}

fn mnemonic_generate(words: usize) -> Result<()> {
    let phrase = mnemonic::generate_mnemonic(strength_for(words)?)?;
    println!("{}", phrase.as_str());
    Ok(())
}

fn mnemonic_validate(phrase: Option<String>) -> Result<()> {
    let phrase = match phrase {
        Some(p) => Zeroizing::new(p),
        None => password_from_env_or_prompt("DOGENDARY_MNEMONIC", "Mnemonic")?,
    };
    let valid = mnemonic::validate_mnemonic(&phrase);
    print_json(&serde_json::json!({ "valid": valid }))?;
    if !valid {
        bail!("invalid mnemonic");
    }
    Ok(())
}

fn password_check() -> Result<()> {
    let password = password_from_env_or_prompt(PASSWORD_ENV, "Password")?;
    print_json(&validate_password_strength(&password))
}

fn vault_create(config: &Config, phrase: Option<String>, words: usize) -> Result<()> {
    let mut session = open_session(config);
    if session.has_vault()? {
        bail!("vault already exists: {}", config.wallet.vault_path().display());
    }

    let (phrase, generated) = match phrase {
        Some(p) => (Zeroizing::new(p), false),
        None => (mnemonic::generate_mnemonic(strength_for(words)?)?, true),
    };

    let password = password_from_env_or_prompt(PASSWORD_ENV, "Enter vault password")?;
    if std::env::var(PASSWORD_ENV).is_err() {
        let confirm = Zeroizing::new(
            rpassword::prompt_password("Confirm password: ").context("Failed to read password")?,
        );
        if password != confirm {
            bail!("Passwords do not match");
        }
    }

    let account = session.create_wallet(&phrase, &password).context("Failed to create vault")?;

    if generated {
        eprintln!("\nRECOVERY PHRASE (write it down, it will not be shown again):");
        eprintln!("  {}\n", phrase.as_str());
    }
    info!(vault = %config.wallet.vault_path().display(), "vault created");
    print_json(&account)
}

fn vault_unlock(config: &Config) -> Result<()> {
    let mut session = open_session(config);
    let password = password_from_env_or_prompt(PASSWORD_ENV, "Vault password")?;
    let accounts = session.unlock(&password).context("Failed to unlock vault")?;
    print_json(&accounts)
}

fn vault_change_password(config: &Config) -> Result<()> {
    let mut session = open_session(config);
    let old = password_from_env_or_prompt(PASSWORD_ENV, "Current password")?;
    let new = password_from_env_or_prompt(NEW_PASSWORD_ENV, "New password")?;
    session.change_password(&old, &new).context("Failed to change password")?;
    eprintln!("Password changed.");
    Ok(())
}

fn vault_reset(config: &Config, yes: bool) -> Result<()> {
    if !yes {
        bail!("refusing to destroy the vault without --yes");
    }
    let mut session = open_session(config);
    session.reset().context("Failed to reset vault")?;
    eprintln!("Vault destroyed: {}", config.wallet.vault_path().display());
    Ok(())
}

fn account_derive(config: &Config, index: u32) -> Result<()> {
    let mut session = unlocked_session(config, index.saturating_add(1))?;
    let account = session.set_active_account(index)?;
    print_json(&account)
}

fn account_list(config: &Config, count: u32) -> Result<()> {
    let mut session = unlocked_session(config, count)?;
    print_json(&session.accounts()?)
}

fn sign_message(config: &Config, args: SignMessageArgs) -> Result<()> {
    let mut session = unlocked_session(config, args.account.saturating_add(1))?;
    let account = session.set_active_account(args.account)?;
    let signature = session.sign_message(&args.message)?;
    print_json(&serde_json::json!({
        "address": account.address,
        "message": args.message,
        "signature": signature.to_base64(),
    }))
}

fn verify(args: VerifyMessageArgs) -> Result<()> {
    let signature = MessageSignature::from_base64(&args.signature)?;
    let valid = verify_message(&args.address, &args.message, &signature)?;
    print_json(&serde_json::json!({ "valid": valid }))?;
    if !valid {
        bail!("signature does not match {}", args.address);
    }
    Ok(())
}

fn send(config: &Config, args: SendArgs) -> Result<()> {
    let utxos = read_json::<Vec<Utxo>>(&args.spend.utxos)?;
    let request = SendRequest {
        to: args.to,
        amount: args.amount,
        fee: args.fee,
        fee_rate_per_kb: fee_rate(config, &args.spend),
    };
    let mut session = unlocked_session(config, args.spend.accounts)?;
    let built = session.send(&request, &utxos).context("Failed to build transaction")?;
    print_json(&built)
}

fn transfer_inscription(config: &Config, args: TransferInscriptionArgs) -> Result<()> {
    let inscription = read_json::<Utxo>(&args.inscription)?;
    let utxos = read_json::<Vec<Utxo>>(&args.spend.utxos)?;
    let rate = fee_rate(config, &args.spend);
    let mut session = unlocked_session(config, args.spend.accounts)?;
    let built = session
        .transfer_inscription(&inscription, &args.to, rate, &utxos)
        .context("Failed to build inscription transfer")?;
    print_json(&built)
}

fn open_session(config: &Config) -> Session<FileVaultStore> {
    let store = FileVaultStore::new(config.wallet.vault_path());
    Session::new(store, config.wallet.clone())
}

/// Unlock the vault and derive the first `accounts` accounts.
fn unlocked_session(config: &Config, accounts: u32) -> Result<Session<FileVaultStore>> {
    let mut session = open_session(config);
    if !session.has_vault()? {
        bail!("no vault at {} (run `dogendary vault create`)", config.wallet.vault_path().display());
    }
    let password = password_from_env_or_prompt(PASSWORD_ENV, "Vault password")?;
    session.unlock(&password).context("Failed to unlock vault")?;
    for _ in 1..accounts.max(1) {
        session.create_account()?;
    }
    Ok(session)
}

fn fee_rate(config: &Config, spend: &SpendArgs) -> u64 {
    match (spend.fee_rate, spend.fee_tier) {
        (Some(rate), _) => rate,
        (None, Some(tier)) => tier.rate_per_kb(),
        (None, None) => config.wallet.default_fee_rate(),
    }
}

fn strength_for(words: usize) -> Result<MnemonicStrength> {
    match words {
        12 => Ok(MnemonicStrength::Words12),
        24 => Ok(MnemonicStrength::Words24),
        _ => bail!("word count must be 12 or 24"),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
