use thiserror::Error;

/// Error taxonomy for the scanner.
///
/// Corrupt persisted statistics are deliberately absent: `StatsStore::load`
/// recovers from them silently by resetting to zeroed counters.
#[derive(Debug, Error)]
pub enum ScannerError {
    /// No frame could be produced by either acquisition path. Recoverable;
    /// the scan aborts with counters and actuators untouched.
    #[error("frame acquisition failed: {0}")]
    Acquisition(String),

    /// Camera or actuator hardware unavailable at startup. The system
    /// degrades to simulate-only operation where possible.
    #[error("hardware initialization failed: {0}")]
    HardwareInit(String),

    /// An LED or gate-servo command could not be applied.
    #[error("actuation failed: {0}")]
    Actuation(String),

    /// The counters file could not be written.
    #[error("stats persistence failed: {0}")]
    Persistence(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("server error: {0}")]
    Server(String),
}
