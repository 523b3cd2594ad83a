//! # Vault Admin
//!
//! Maintenance commands over the local vault cache file.
//!
//! ```bash
//! cargo run --bin vault_admin -- stats
//! cargo run --bin vault_admin -- clear-prefix defi_llama_apy_cache
//! cargo run --bin vault_admin -- first-deposit 0xabc...
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use vault_metrics_sdk::{
    admin::{AdminCommand, AdminOutcome},
    cache::{CacheManager, FileStore},
    types::conversions::string_to_address,
};

/// Vault cache maintenance
#[derive(Parser)]
#[command(name = "vault_admin")]
#[command(about = "Inspect and invalidate the local vault cache", long_about = None)]
#[command(version)]
struct Cli {
    /// Cache file (defaults to VAULT_CACHE_PATH, then .vault-cache.json)
    #[arg(long, env = "VAULT_CACHE_PATH", default_value = ".vault-cache.json")]
    cache_path: String,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear concentrated-liquidity claim scans
    ClearShadow,
    /// Clear Liquidity Book transfer scans
    ClearMetro,
    /// Clear every rewards scan
    ClearAll,
    /// Clear every key starting with PREFIX
    ClearPrefix { prefix: String },
    /// Key counts per category
    Stats,
    /// Show the recorded first deposit of ADDRESS
    FirstDeposit { address: String },
}

impl Commands {
    fn into_admin(self) -> Result<AdminCommand> {
        Ok(match self {
            Commands::ClearShadow => AdminCommand::ClearShadow,
            Commands::ClearMetro => AdminCommand::ClearMetro,
            Commands::ClearAll => AdminCommand::ClearAll,
            Commands::ClearPrefix { prefix } => AdminCommand::ClearPrefix(prefix),
            Commands::Stats => AdminCommand::Stats,
            Commands::FirstDeposit { address } => AdminCommand::FirstDeposit {
                address: string_to_address(&address)?,
            },
        })
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let store = FileStore::open(&cli.cache_path)
        .with_context(|| format!("opening cache file {}", cli.cache_path))?;
    let cache = CacheManager::new(Arc::new(store));

    let outcome: AdminOutcome = cli.command.into_admin()?.execute(&cache);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome);
    }
    Ok(())
}
