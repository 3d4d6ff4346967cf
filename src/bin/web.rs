//! Web front-end: serves the scan trigger, stats, and preview API.
//!
//! Runs without a camera: acquisition is retried lazily on each scan
//! request, and the stats endpoint keeps answering from the persisted
//! counters file either way.

use anyhow::Result;
use fibertrace::{FiberTraceConfig, Scanner, StatsStore};
use std::sync::{Arc, Mutex};

fn main() -> Result<()> {
    fibertrace::init_logging();

    let config = FiberTraceConfig::load_or_default();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    let scanner = Arc::new(Mutex::new(Scanner::new(&config)));
    let store = StatsStore::new(&config.storage.data_file);

    let cleanup = scanner.clone();
    ctrlc::set_handler(move || {
        if let Ok(mut scanner) = cleanup.lock() {
            scanner.shutdown();
        }
        std::process::exit(0);
    })?;

    fibertrace::server::serve(&config.server, scanner, store)?;
    Ok(())
}
