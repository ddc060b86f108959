//! Vigil daemon: boots a genesis network in memory and drives requests
//! through the node's queue.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};
use vigil_crypto::generate_keypair;
use vigil_node::{init_logging, spawn_node, Node, NodeConfig, NodeHandle};
use vigil_types::{AccountId, Amount};

#[derive(Parser)]
#[command(name = "vigil-daemon", about = "Vigil DPoS ledger daemon")]
struct Cli {
    /// Path to a TOML configuration file. CLI flags and env vars override
    /// its values.
    #[arg(long, env = "VIGIL_CONFIG")]
    config: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "VIGIL_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level filter, e.g. "info" or "debug,vigil_ledger=trace".
    #[arg(long, env = "VIGIL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Number of genesis delegates to bootstrap.
    #[arg(long, env = "VIGIL_GENESIS_DELEGATES")]
    delegates: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a fixed workload and print the resulting ledger as JSON.
    Demo {
        /// User accounts to open and fund from genesis.
        #[arg(long, default_value_t = 5)]
        users: usize,

        /// Random transfers between users.
        #[arg(long, default_value_t = 20)]
        transfers: usize,

        /// Print Prometheus metrics to stderr when done.
        #[arg(long)]
        metrics: bool,
    },
    /// Submit random transfers until interrupted, then print the ledger.
    Run {
        #[arg(long, default_value_t = 5)]
        users: usize,

        /// Milliseconds between transfers.
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => NodeConfig::default(),
    };
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(delegates) = cli.delegates {
        config.genesis_delegates = delegates;
    }

    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    init_logging(config.log_format()?, &config.log_level);

    match cli.command {
        Command::Demo {
            users,
            transfers,
            metrics,
        } => demo(&config, users, transfers, metrics).await,
        Command::Run { users, interval_ms } => run(&config, users, interval_ms).await,
        Command::Config => Ok(()),
    }
}

/// A booted network: the node behind its queue, plus who is in it.
struct Network {
    handle: NodeHandle,
    task: tokio::task::JoinHandle<Node>,
    genesis: AccountId,
    delegates: usize,
}

fn boot(config: &NodeConfig) -> Result<Network> {
    let mut node = Node::from_config(config)?;
    let genesis = node.open_genesis(generate_keypair(), &config.genesis_username)?;
    let delegates = node
        .bootstrap_genesis_delegates(genesis, config.genesis_delegates)
        .len();
    info!(%genesis, delegates, summary = ?node.summary(), "network booted");

    let (handle, task) = spawn_node(node, config.queue_capacity);
    Ok(Network {
        handle,
        task,
        genesis,
        delegates,
    })
}

/// Open `count` users, fund each with an equal cut of what genesis holds
/// and have each vote for a few genesis delegates.
async fn open_users(network: &Network, count: usize) -> Result<Vec<AccountId>> {
    let snapshot = network.handle.snapshot().await?;
    let available = snapshot
        .accounts
        .iter()
        .find(|account| account.id == network.genesis)
        .map(|account| account.balance)
        .context("genesis account missing from snapshot")?;
    let Some((funding, _)) = available.split(count + 1) else {
        return Ok(Vec::new());
    };

    let mut users = Vec::with_capacity(count);
    for i in 0..count {
        let id = network.handle.open_account(&format!("user_{i}")).await?;
        network.handle.transfer(network.genesis, id, funding).await?;
        let tokens = pick_votes(network.delegates);
        if !tokens.is_empty() {
            network.handle.elect(id, tokens).await?;
        }
        users.push(id);
    }
    info!(users = users.len(), %funding, "users opened");
    Ok(users)
}

fn pick_votes(delegates: usize) -> Vec<String> {
    let candidates: Vec<usize> = (1..=delegates).collect();
    candidates
        .choose_multiple(&mut rand::thread_rng(), delegates.min(3))
        .map(|i| format!("+genesis_{i}"))
        .collect()
}

fn pick_transfer(users: &[AccountId]) -> Option<(AccountId, AccountId, Amount)> {
    let mut rng = rand::thread_rng();
    let pair: Vec<&AccountId> = users.choose_multiple(&mut rng, 2).collect();
    match pair.as_slice() {
        [from, to] => Some((**from, **to, Amount::from_units(rng.gen_range(1..=50)))),
        _ => None,
    }
}

async fn submit_transfer(handle: &NodeHandle, users: &[AccountId]) -> Result<()> {
    let Some((from, to, amount)) = pick_transfer(users) else {
        bail!("need at least two users to transfer between");
    };
    match handle.transfer(from, to, amount).await {
        Ok(outcome) => info!(
            %from,
            %to,
            %amount,
            forger = %outcome.forger,
            credits = outcome.credits.len(),
            "transfer settled"
        ),
        Err(e) => warn!(%from, %to, %amount, error = %e, "transfer rejected"),
    }
    Ok(())
}

async fn demo(config: &NodeConfig, users: usize, transfers: usize, metrics: bool) -> Result<()> {
    let network = boot(config)?;
    let accounts = open_users(&network, users).await?;
    for _ in 0..transfers {
        submit_transfer(&network.handle, &accounts).await?;
    }

    let snapshot = network.handle.snapshot().await?;
    drop(network.handle);
    let node = network.task.await?;
    info!(summary = ?node.summary(), "demo finished");

    println!("{}", snapshot.to_json()?);
    if metrics {
        eprintln!("{}", node.metrics().encode_text()?);
    }
    Ok(())
}

async fn run(config: &NodeConfig, users: usize, interval_ms: u64) -> Result<()> {
    let network = boot(config)?;
    let accounts = open_users(&network, users).await?;

    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            result = &mut shutdown => {
                result.context("failed to listen for ctrl-c")?;
                info!("received SIGINT, shutting down");
                break;
            }
            _ = interval.tick() => submit_transfer(&network.handle, &accounts).await?,
        }
    }

    let snapshot = network.handle.snapshot().await?;
    drop(network.handle);
    let node = network.task.await?;
    info!(summary = ?node.summary(), "node stopped");
    println!("{}", snapshot.to_json()?);
    Ok(())
}
