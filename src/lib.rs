//! FiberTrace: a color-based bale scanner demo.
//!
//! Classifies the item under a camera as GOOD (cotton) or BAD (poly-blend)
//! from average color in a central region of interest, drives two indicator
//! LEDs and a gate servo through a timed sequence, and persists running
//! counters to a file shared with a web dashboard.
//!
//! # Components
//! - Frame acquisition with a primary camera path and an external
//!   still-capture fallback ([`capture`])
//! - A pure, deterministic color classifier ([`classifier`])
//! - LED/gate-servo sequencing over an `embedded-hal` seam ([`actuator`])
//! - Durable counters with atomic whole-file replacement ([`stats`])
//! - One serialized scan loop shared by the interactive and web
//!   front-ends ([`scan`], [`server`])
//!
//! # Usage
//! ```rust,no_run
//! use fibertrace::{FiberTraceConfig, Scanner};
//!
//! let config = FiberTraceConfig::load_or_default();
//! let mut scanner = Scanner::new(&config);
//! match scanner.scan() {
//!     Ok(outcome) => println!("{}: {}", outcome.result.decision, outcome.result.composition),
//!     Err(e) => eprintln!("scan failed: {}", e),
//! }
//! ```

pub mod actuator;
pub mod capture;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod scan;
pub mod server;
pub mod stats;
pub mod types;

// Testing utilities - synthetic frames for offline testing
pub mod testing;

// Re-exports for convenience
pub use actuator::{ActuatorController, ActuatorState, GateAngles};
pub use capture::{CameraSource, FrameSource};
pub use config::FiberTraceConfig;
pub use errors::ScannerError;
pub use scan::{ScanOutcome, ScanPhase, Scanner};
pub use stats::{Counters, StatsStore};
pub use types::{ClassificationResult, Decision, Frame};

/// Initialize logging for the scanner.
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "fibertrace=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
