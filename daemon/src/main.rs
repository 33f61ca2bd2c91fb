//! Tessera daemon: keeps a local replica in sync with the authority and drives the wallet.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tessera_network::AuthorityClient;
use tessera_node::{init_logging, NodeConfig, ShutdownController, SyncStatus, TesseraNode};
use tessera_store::LedgerStore;
use tessera_types::{Address, Amount, TokenId};
use tessera_wallet_core::{keys, Wallet};

#[derive(Parser)]
#[command(name = "tessera-daemon", about = "Tessera replica node and wallet")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "TESSERA_CONFIG")]
    config: Option<PathBuf>,

    /// Chain to replicate.
    #[arg(long, env = "TESSERA_CHAIN_ID")]
    chain_id: Option<u64>,

    /// Base URL of the authority's HTTP API.
    #[arg(long, env = "TESSERA_AUTHORITY_URL")]
    authority_url: Option<String>,

    /// Expected block validator address.
    #[arg(long, env = "TESSERA_AUTHORITY_ADDRESS")]
    authority_address: Option<String>,

    /// Data directory for ledger storage.
    #[arg(long, env = "TESSERA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Pause between block fetches while catching up, in milliseconds.
    #[arg(long, env = "TESSERA_BLOCK_FETCH_DELAY_MS")]
    block_fetch_delay_ms: Option<u64>,

    /// Cross-check aggregate state hashes against the authority after each catch-up.
    #[arg(long, env = "TESSERA_VERIFY_STATE_HASHES")]
    verify_state_hashes: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TESSERA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TESSERA_LOG_FORMAT")]
    log_format: Option<String>,

    /// Serve Prometheus metrics while running.
    #[arg(long, env = "TESSERA_ENABLE_METRICS")]
    metrics: bool,

    /// Address of the metrics endpoint.
    #[arg(long, env = "TESSERA_METRICS_ADDR")]
    metrics_addr: Option<String>,

    /// Hex private key for wallet commands.
    #[arg(long, env = "TESSERA_WALLET_KEY", hide_env_values = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Keep the replica in sync until interrupted.
    Run,
    /// Run one sync cycle and exit.
    Sync,
    /// Print the effective configuration as TOML.
    Config,
    /// Generate a new key pair.
    Keygen,
    /// Show the wallet's balance, tokens and outstanding transaction.
    Balance,
    /// Show the outstanding transaction, if any.
    Pending,
    /// Submit the outstanding transaction again.
    Resubmit,
    /// Send coins.
    Transfer { to: Address, value: Amount },
    /// Hand a token to another address.
    TransferToken { to: Address, token_id: u64 },
    /// Burn a token by sending it to the zero address.
    BurnToken { token_id: u64 },
}

impl Cli {
    /// File settings as the base, flags and env vars on top.
    fn node_config(&self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => NodeConfig::default(),
        };
        if let Some(chain_id) = self.chain_id {
            config.chain_id = chain_id;
        }
        if let Some(url) = &self.authority_url {
            config.authority_url = url.clone();
        }
        if let Some(address) = &self.authority_address {
            config.authority_address = Some(address.clone());
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(delay) = self.block_fetch_delay_ms {
            config.block_fetch_delay_ms = delay;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        config.verify_state_hashes |= self.verify_state_hashes;
        config.enable_metrics |= self.metrics;
        if let Some(addr) = &self.metrics_addr {
            config.metrics_addr = addr.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = cli.node_config()?;

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            return Ok(());
        }
        Command::Keygen => {
            let pair = keys::generate()?;
            println!("address:     {}", keys::address_of(&pair));
            println!("private key: {}", keys::export_private_key(&pair.private));
            return Ok(());
        }
        _ => {}
    }

    init_logging(config.log_format()?, &config.log_level)?;

    let wallet_keys = cli
        .key
        .as_deref()
        .map(keys::import_private_key)
        .transpose()
        .context("parsing wallet key")?;
    if let Some(pair) = &wallet_keys {
        if config.wallet_address.is_none() {
            config.wallet_address = Some(keys::address_of(pair).to_string());
        }
    }

    let node = TesseraNode::open(config.clone())?;

    match cli.command {
        Command::Run => {
            tracing::info!(
                chain = config.chain_id,
                authority = %config.authority_url,
                "starting tessera replica"
            );
            let shutdown = ShutdownController::new();
            let run = node.run(&shutdown);
            tokio::pin!(run);
            tokio::select! {
                result = &mut run => result?,
                _ = shutdown.wait_for_signal() => {
                    shutdown.shutdown();
                    run.await?;
                }
            }
            tracing::info!("tessera daemon exited cleanly");
        }
        Command::Sync => {
            let outcome = node.sync_once().await?;
            let status = match outcome.status {
                SyncStatus::InSync => "in sync",
                SyncStatus::CaughtUp => "caught up",
            };
            println!(
                "{status} at block {} ({}), {} block(s) applied",
                outcome.head.latest_block_number, outcome.head.latest_hash, outcome.blocks_applied
            );
        }
        command => {
            let pair = wallet_keys.context("wallet commands need --key or TESSERA_WALLET_KEY")?;
            // Fee, nonce and balances come from the replica, so bring it up to date first.
            node.sync_once().await?;
            let wallet = Wallet::new(
                pair,
                config.chain_id()?,
                node.store().clone(),
                node.authority(),
            )?;
            wallet_command(&wallet, command).await?;
        }
    }

    Ok(())
}

async fn wallet_command<S, A>(wallet: &Wallet<S, A>, command: Command) -> anyhow::Result<()>
where
    S: LedgerStore,
    A: AuthorityClient,
{
    let submission = match command {
        Command::Balance => {
            let portfolio = wallet.portfolio()?;
            println!("address: {}", portfolio.address);
            println!("balance: {}", portfolio.balance);
            println!("nonce:   {}", portfolio.nonce);
            if let Some(block) = portfolio.synced_block {
                println!("synced:  block {block}");
            }
            for token in &portfolio.tokens {
                println!("token:   {token}");
            }
            if let Some(pending) = &portfolio.pending {
                println!(
                    "pending: {} (nonce {}, {} to {})",
                    pending.hash, pending.nonce, pending.value, pending.to
                );
            }
            return Ok(());
        }
        Command::Pending => {
            for pending in wallet.pending()? {
                let tx = &pending.signed.transaction;
                println!(
                    "{} nonce {} {:?} {} -> {} value {} since {}",
                    pending.signed.hash()?,
                    tx.nonce,
                    tx.kind,
                    tx.from,
                    tx.to,
                    tx.value,
                    pending.submitted_at.as_secs()
                );
            }
            return Ok(());
        }
        Command::Resubmit => wallet.resubmit_pending().await?,
        Command::Transfer { to, value } => wallet.transfer(to, value).await?,
        Command::TransferToken { to, token_id } => {
            wallet.transfer_token(to, TokenId::new(token_id)).await?
        }
        Command::BurnToken { token_id } => wallet.burn_token(TokenId::new(token_id)).await?,
        Command::Run | Command::Sync | Command::Config | Command::Keygen => return Ok(()),
    };
    println!("submitted {} (nonce {})", submission.hash, submission.nonce);
    Ok(())
}
