//! Lander CLI
//!
//! Lands a pre-built legacy message: the message is decoded, its compute
//! budget replaced, signed with the given keypairs and rebroadcast until the
//! network confirms it.
//!
//! ```text
//! lander send --message <BASE58> --keypair payer.json [--keypair cosigner.json]
//! ```

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solana_sdk::message::Message;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lander::compat::skeleton_from_message;
use lander::config::Config;
use lander::metrics::metrics;
use lander::rpc_manager::validate_rpc_url;
use lander::wallet::WalletManager;
use lander::{StateCallback, SubmissionObserver, SubmissionState, TransactionLander};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "lander.toml", global = true)]
    config: String,

    /// RPC endpoint, overrides the config file
    #[arg(long, env = "LANDER_RPC_URL", global = true)]
    url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Budget, sign and land a base58-encoded legacy message
    Send {
        /// Serialized legacy message, base58
        #[arg(short, long)]
        message: String,

        /// Keypair files; repeat for every required signer
        #[arg(short, long = "keypair")]
        keypairs: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(url) = &args.url {
        config.rpc.url = url.clone();
    }
    config.validate()?;

    init_logging(
        args.verbose,
        args.json_logs || config.monitoring.json_logs,
        &config.monitoring.log_level,
    )?;

    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Send { message, keypairs } => run_send(&config, &message, keypairs).await,
    }
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, json: bool, default_level: &str) -> Result<()> {
    let default_filter = if verbose {
        "lander=debug,info".to_string()
    } else {
        format!("lander={},warn", default_level)
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    let initialized = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };
    initialized.context("Failed to initialize logging")?;

    Ok(())
}

/// Load configuration from file with fallback to defaults
fn load_config(path: &str) -> Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path))
    } else {
        let mut config = Config::default();
        config.apply_env();
        Ok(config)
    }
}

fn decode_message(encoded: &str) -> Result<Message> {
    let bytes = bs58::decode(encoded.trim())
        .into_vec()
        .context("Message is not valid base58")?;
    bincode::deserialize(&bytes).context("Message is not a serialized legacy message")
}

async fn run_send(config: &Config, encoded_message: &str, keypairs: Vec<String>) -> Result<()> {
    let keypair_paths = if keypairs.is_empty() {
        config.wallet.keypair_paths.clone()
    } else {
        keypairs
    };
    let wallet = WalletManager::from_files(&keypair_paths).context("Failed to load wallet")?;
    info!(signers = ?wallet.pubkeys(), "Loaded signing keys");

    let message = decode_message(encoded_message)?;
    let skeleton = skeleton_from_message(&message)?;
    if skeleton.fee_payer != wallet.fee_payer() {
        warn!(
            fee_payer = %skeleton.fee_payer,
            first_signer = %wallet.fee_payer(),
            "Message fee payer differs from the first keypair"
        );
    }

    let endpoint = validate_rpc_url(&config.rpc.url)?;
    info!(endpoint = %endpoint, "Connecting to RPC");
    let lander = TransactionLander::connect(config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received shutdown signal, cancelling submission");
            ctrl_c.cancel();
        }
    });

    let observer: &dyn SubmissionObserver = &StateCallback(|state: &SubmissionState| {
        info!(state = %state, "Submission state");
    });

    let signers = wallet.signers();
    let result = lander
        .sign_and_send_with_cancel(skeleton, &signers, Some(observer), &cancel)
        .await;

    if config.monitoring.enable_metrics {
        match metrics().render() {
            Ok(text) => println!("{}", text),
            Err(e) => error!(error = %e, "Failed to render metrics"),
        }
    }

    match result {
        Ok(signature) => {
            println!("{}", signature);
            Ok(())
        }
        Err(e) => {
            error!(category = e.category(), error = %e, "Submission failed");
            Err(e.into())
        }
    }
}
