//! The scan loop: capture, classify, actuate, persist.
//!
//! One [`Scanner`] serializes every scan regardless of which front-end
//! triggered it. The interactive prompt and the web handler are two callers
//! of the same operation, sharing a `Arc<Mutex<Scanner>>`; concurrent
//! triggers queue on the lock and never interleave.

use crate::actuator::ActuatorController;
use crate::capture::{CameraSource, FrameSource};
use crate::classifier;
use crate::config::FiberTraceConfig;
use crate::errors::ScannerError;
use crate::stats::{Counters, StatsStore};
use crate::types::{ClassificationResult, Frame};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Scan orchestration phase, for logs and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Capturing,
    Classifying,
    Actuating,
    Persisting,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanPhase::Idle => "idle",
            ScanPhase::Capturing => "capturing",
            ScanPhase::Classifying => "classifying",
            ScanPhase::Actuating => "actuating",
            ScanPhase::Persisting => "persisting",
        };
        f.write_str(name)
    }
}

/// Result of one completed scan, returned to the triggering front-end.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    #[serde(flatten)]
    pub result: ClassificationResult,
    pub counters: Counters,
}

/// Owns the acquisition, classification, actuation, and persistence parts
/// and runs them in strict order. No ambient globals: all hardware handles
/// and counters live here.
pub struct Scanner {
    source: Box<dyn FrameSource + Send>,
    actuator: ActuatorController,
    store: StatsStore,
    counters: Counters,
    color_margin: f64,
    dwell: Duration,
    preview_path: Option<PathBuf>,
    jpeg_quality: u8,
    phase: ScanPhase,
}

impl Scanner {
    /// Build the production scanner from configuration. Never fails:
    /// missing hardware degrades (lazy camera init, simulated actuator) so
    /// the web front-end stays usable.
    pub fn new(config: &FiberTraceConfig) -> Self {
        let source = Box::new(CameraSource::new(&config.camera, &config.fallback));
        let actuator = ActuatorController::simulated(
            config.actuator.pins,
            config.actuator.angles,
            Duration::from_millis(config.actuator.settle_ms),
        );
        log::warn!("No GPIO backend wired into this build; actuator is simulate-only");

        let store = StatsStore::new(&config.storage.data_file);
        Self::assemble(source, actuator, store, config)
    }

    /// Build a scanner around explicit parts. Used to wire a real GPIO
    /// backend or to substitute test doubles.
    pub fn with_parts(
        source: Box<dyn FrameSource + Send>,
        actuator: ActuatorController,
        store: StatsStore,
        config: &FiberTraceConfig,
    ) -> Self {
        Self::assemble(source, actuator, store, config)
    }

    fn assemble(
        source: Box<dyn FrameSource + Send>,
        mut actuator: ActuatorController,
        store: StatsStore,
        config: &FiberTraceConfig,
    ) -> Self {
        // Bring outputs to neutral up front; init failures degrade inside
        // the controller.
        if let Err(e) = actuator.init() {
            log::warn!("Actuator init failed: {}", e);
        }

        let counters = store.load();
        log::info!(
            "Loaded counters: {} scanned ({} good / {} bad)",
            counters.total_scanned,
            counters.good_count,
            counters.bad_count
        );

        Self {
            source,
            actuator,
            store,
            counters,
            color_margin: config.classifier.color_margin,
            dwell: Duration::from_millis(config.scan.dwell_ms),
            preview_path: config.storage.preview_file.as_ref().map(PathBuf::from),
            jpeg_quality: config.storage.jpeg_quality,
            phase: ScanPhase::Idle,
        }
    }

    /// Run one full scan cycle: capture, classify, actuate (with dwell and
    /// reset), then update and persist the counters.
    ///
    /// Failures during capture or actuation leave the counters untouched
    /// and the actuator back at neutral. A failed persist is reported after
    /// the in-memory counters were already committed; the next successful
    /// scan rewrites the whole file.
    pub fn scan(&mut self) -> Result<ScanOutcome, ScannerError> {
        self.enter(ScanPhase::Capturing);
        let frame = match self.source.acquire() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Scan aborted during capture: {}", e);
                self.enter(ScanPhase::Idle);
                return Err(e);
            }
        };

        self.enter(ScanPhase::Classifying);
        let result = classifier::classify(&frame, self.color_margin);
        log::info!(
            "RESULT: {} ({}, purity {:.1}%)",
            result.decision,
            result.composition,
            result.purity
        );
        self.write_preview(&frame);

        self.enter(ScanPhase::Actuating);
        if let Err(e) = self.actuator.actuate(result.decision) {
            log::error!("Actuation failed: {}", e);
            let _ = self.actuator.reset();
            self.enter(ScanPhase::Idle);
            return Err(e);
        }
        if !self.dwell.is_zero() {
            std::thread::sleep(self.dwell);
        }
        if let Err(e) = self.actuator.reset() {
            log::error!("Actuator reset failed: {}", e);
            self.enter(ScanPhase::Idle);
            return Err(e);
        }

        self.enter(ScanPhase::Persisting);
        self.counters = self.counters.update(result.decision);
        let saved = self.store.save(&mut self.counters);
        self.enter(ScanPhase::Idle);
        saved?;

        Ok(ScanOutcome {
            result,
            counters: self.counters.clone(),
        })
    }

    /// Capture a frame and encode it for live monitoring, independent of
    /// the scan/classify/actuate pipeline.
    pub fn preview_jpeg(&mut self) -> Result<Vec<u8>, ScannerError> {
        let frame = self.source.acquire()?;
        frame.encode_jpeg(self.jpeg_quality)
    }

    /// Force the acquisition path to come up. The interactive front-end
    /// calls this at startup, where a missing capture capability is fatal.
    pub fn check_capture(&mut self) -> Result<(), ScannerError> {
        self.source.acquire().map(|_| ())
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Return outputs to neutral on shutdown. Best-effort.
    pub fn shutdown(&mut self) {
        log::info!("Shutting down: returning actuator to neutral");
        if let Err(e) = self.actuator.reset() {
            log::warn!("Could not reset actuator on shutdown: {}", e);
        }
    }

    fn enter(&mut self, phase: ScanPhase) {
        log::debug!("Scan phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    fn write_preview(&self, frame: &Frame) {
        let Some(path) = &self.preview_path else {
            return;
        };
        match frame.encode_jpeg(self.jpeg_quality) {
            Ok(jpeg) => {
                if let Err(e) = std::fs::write(path, jpeg) {
                    log::warn!("Could not write preview snapshot {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not encode preview snapshot: {}", e),
        }
    }
}
