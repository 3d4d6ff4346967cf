//! Durable scan counters shared with the dashboard reader.
//!
//! The counters file is the single source of truth between the scan loop
//! (read-modify-write) and the web dashboard (read-only polling). Writes
//! replace the whole file atomically so a concurrent reader never observes
//! a partially-written document.

use crate::errors::ScannerError;
use crate::types::Decision;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Running scan statistics.
///
/// Invariant: `good_count + bad_count == total_scanned`. Counters are
/// created zeroed when no persisted state exists, mutated exactly once per
/// completed scan, and only ever overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    #[serde(default)]
    pub total_scanned: u64,
    #[serde(default)]
    pub good_count: u64,
    #[serde(default)]
    pub bad_count: u64,
    /// Unix timestamp in float seconds; 0 means "never".
    #[serde(default)]
    pub last_update: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result: Option<Decision>,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            total_scanned: 0,
            good_count: 0,
            bad_count: 0,
            last_update: 0.0,
            last_result: None,
        }
    }
}

impl Counters {
    /// Produce the counters after recording one scan.
    pub fn update(&self, decision: Decision) -> Counters {
        let mut next = self.clone();
        next.total_scanned += 1;
        match decision {
            Decision::Good => next.good_count += 1,
            Decision::Bad => next.bad_count += 1,
        }
        next.last_result = Some(decision);
        next.last_update = unix_now();
        next
    }

    /// Good share of all scans as a percentage, one decimal. 0.0 when
    /// nothing has been scanned.
    pub fn purity(&self) -> f64 {
        if self.total_scanned == 0 {
            return 0.0;
        }
        let raw = self.good_count as f64 / self.total_scanned as f64 * 100.0;
        (raw * 10.0).round() / 10.0
    }

    /// Human-readable last update, "Never" when nothing was recorded.
    pub fn last_update_display(&self) -> String {
        if self.last_update <= 0.0 {
            return "Never".to_string();
        }
        let secs = self.last_update.trunc() as i64;
        let nanos = (self.last_update.fract() * 1e9) as u32;
        match chrono::DateTime::from_timestamp(secs, nanos) {
            Some(dt) => dt
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            None => "Never".to_string(),
        }
    }

    /// Check the counting invariant. Violations mark the persisted state as
    /// corrupt.
    pub fn is_consistent(&self) -> bool {
        self.good_count + self.bad_count == self.total_scanned
    }
}

/// Current Unix time in float seconds.
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Load/save access to the persisted counters file.
#[derive(Debug, Clone)]
pub struct StatsStore {
    path: PathBuf,
}

impl StatsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load persisted counters. Missing, unreadable, or inconsistent state
    /// is recovered silently by starting from zeroed counters; it is never
    /// surfaced as an error.
    pub fn load(&self) -> Counters {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No persisted stats at {:?}, starting fresh", self.path);
                return Counters::default();
            }
            Err(e) => {
                log::warn!(
                    "Could not read stats file {:?} ({}), starting fresh",
                    self.path,
                    e
                );
                return Counters::default();
            }
        };

        match serde_json::from_str::<Counters>(&raw) {
            Ok(counters) if counters.is_consistent() => counters,
            Ok(counters) => {
                log::warn!(
                    "Stats file {:?} violates good+bad==total ({}+{}!={}), starting fresh",
                    self.path,
                    counters.good_count,
                    counters.bad_count,
                    counters.total_scanned
                );
                Counters::default()
            }
            Err(e) => {
                log::warn!(
                    "Stats file {:?} is corrupt ({}), starting fresh",
                    self.path,
                    e
                );
                Counters::default()
            }
        }
    }

    /// Durably overwrite the persisted counters, stamping a fresh
    /// `last_update`. The file is replaced atomically (temp write + rename)
    /// so the dashboard reader never sees a partial record.
    pub fn save(&self, counters: &mut Counters) -> Result<(), ScannerError> {
        counters.last_update = unix_now();

        let payload = serde_json::to_string(counters)
            .map_err(|e| ScannerError::Persistence(format!("serialize counters: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ScannerError::Persistence(format!("create stats directory: {}", e))
                })?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)
            .map_err(|e| ScannerError::Persistence(format!("write {:?}: {}", tmp, e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| ScannerError::Persistence(format!("replace {:?}: {}", self.path, e)))?;

        log::debug!("Persisted counters to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_good_and_bad() {
        let counters = Counters {
            total_scanned: 5,
            good_count: 3,
            bad_count: 2,
            last_update: 0.0,
            last_result: None,
        };

        let good = counters.update(Decision::Good);
        assert_eq!(good.total_scanned, 6);
        assert_eq!(good.good_count, 4);
        assert_eq!(good.bad_count, 2);
        assert_eq!(good.last_result, Some(Decision::Good));
        assert!(good.last_update > 0.0);

        let bad = counters.update(Decision::Bad);
        assert_eq!(bad.total_scanned, 6);
        assert_eq!(bad.good_count, 3);
        assert_eq!(bad.bad_count, 3);
        assert_eq!(bad.last_result, Some(Decision::Bad));
    }

    #[test]
    fn test_update_preserves_invariant() {
        let mut counters = Counters::default();
        for i in 0..10 {
            let decision = if i % 3 == 0 {
                Decision::Bad
            } else {
                Decision::Good
            };
            counters = counters.update(decision);
            assert!(counters.is_consistent());
        }
        assert_eq!(counters.total_scanned, 10);
    }

    #[test]
    fn test_purity() {
        let counters = Counters {
            total_scanned: 3,
            good_count: 2,
            bad_count: 1,
            last_update: 0.0,
            last_result: None,
        };
        assert_eq!(counters.purity(), 66.7);

        assert_eq!(Counters::default().purity(), 0.0);
    }

    #[test]
    fn test_last_update_display_never() {
        assert_eq!(Counters::default().last_update_display(), "Never");

        let stamped = Counters {
            last_update: 1_700_000_000.0,
            ..Counters::default()
        };
        let display = stamped.last_update_display();
        assert_ne!(display, "Never");
        assert!(display.contains('-')); // date-formatted
    }
}
