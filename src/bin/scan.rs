//! Interactive press-ENTER-to-scan front-end.
//!
//! Mirrors the conveyor rig workflow: place an item under the camera,
//! press ENTER, watch the LEDs and gate move, and read the text dashboard.

use anyhow::{Context, Result};
use fibertrace::{Counters, FiberTraceConfig, Scanner};
use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex};

fn main() -> Result<()> {
    fibertrace::init_logging();

    let config = FiberTraceConfig::load_or_default();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    let scanner = Arc::new(Mutex::new(Scanner::new(&config)));

    // Standalone mode requires a working capture path up front; without a
    // camera this front-end is useless.
    scanner
        .lock()
        .expect("scanner lock")
        .check_capture()
        .context("no capture capability available; check the camera connection")?;

    let cleanup = scanner.clone();
    ctrlc::set_handler(move || {
        println!("\nExiting...");
        if let Ok(mut scanner) = cleanup.lock() {
            scanner.shutdown();
        }
        std::process::exit(0);
    })
    .context("could not install shutdown handler")?;

    println!("FiberTrace scanner ready.");
    println!(" 1) Place WHITE or BLUE material under the camera.");
    println!(" 2) Press ENTER to scan the item.");
    println!(" 3) Watch the LEDs, gate, and dashboard below.");
    println!("Press CTRL+C to quit.\n");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!(">>> Press ENTER to SCAN the current item...");
        std::io::stdout().flush()?;
        if lines.next().is_none() {
            break; // stdin closed
        }

        let mut guard = scanner.lock().expect("scanner lock");
        match guard.scan() {
            Ok(outcome) => {
                println!("RESULT: {} ({})", outcome.result.decision, outcome.result.composition);
                print_dashboard(&outcome.counters);
            }
            Err(e) => println!("WARNING: scan failed: {}", e),
        }
    }

    scanner.lock().expect("scanner lock").shutdown();
    Ok(())
}

fn print_dashboard(counters: &Counters) {
    println!("\n================ FiberTrace Dashboard ================");
    println!(" Total items scanned : {}", counters.total_scanned);
    println!(" Good (cotton)       : {}", counters.good_count);
    println!(" Bad (poly-blend)    : {}", counters.bad_count);
    println!(" Bale purity         : {:.1}%", counters.purity());
    println!(" Last update         : {}", counters.last_update_display());
    println!("======================================================\n");
}
