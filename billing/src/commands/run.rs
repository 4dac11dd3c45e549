// Copyright (c) 2024 Botho Foundation

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::config::Config;
use crate::ledger::{Ledger, SharedLedger};
use crate::rpc::{start_rpc_server, RpcState};

/// Build the shared ledger for a node, seeded from config.
pub fn seeded_ledger(config: &Config) -> Result<SharedLedger> {
    let ledger = Ledger::with_users(config.seed_users())
        .map_err(|e| anyhow::anyhow!("Failed to seed ledger: {}", e))?;
    Ok(SharedLedger::new(ledger))
}

/// Run the node
pub fn run(config_path: &Path, port: Option<u16>) -> Result<()> {
    let mut config =
        Config::load(config_path).context("No config found. Run 'billing init' first.")?;
    if let Some(port) = port {
        config.rpc.port = port;
    }

    let ledger = seeded_ledger(&config)?;
    for user in &config.users {
        info!(name = %user.name, rating = user.rating, "Seeded user");
    }

    println!("Billing node starting. Press Ctrl+C to stop.");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async { run_async(config, ledger).await })
}

async fn run_async(config: Config, ledger: SharedLedger) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    })?;

    let rpc_addr = config.rpc.socket_addr()?;
    let rpc_state = Arc::new(RpcState::new(ledger));

    let server = tokio::spawn(async move {
        if let Err(e) = start_rpc_server(rpc_addr, rpc_state).await {
            error!("RPC server error: {}", e);
        }
    });

    while !shutdown.load(Ordering::SeqCst) {
        if server.is_finished() {
            anyhow::bail!("RPC server stopped unexpectedly");
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    info!("Shutting down...");
    server.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserConfig;

    #[test]
    fn test_seeded_ledger_from_config() {
        let config = Config::default();
        let ledger = seeded_ledger(&config).unwrap();
        let names: Vec<_> = ledger
            .list_users()
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["boris", "maria", "oleg"]);
    }

    #[test]
    fn test_seeded_ledger_rejects_duplicates() {
        let mut config = Config::default();
        config.users.push(UserConfig {
            name: "boris".to_string(),
            rating: 1,
        });
        assert!(seeded_ledger(&config).is_err());
    }
}
