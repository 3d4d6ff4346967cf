//! End-to-end scan loop tests with synthetic frames and the simulated
//! actuator backend: ordering, counter updates, failure handling, and
//! trigger serialization.

use fibertrace::actuator::{simulated_backend, ActuatorController, ActuatorEvent, EventLog};
use fibertrace::testing::{uniform_frame, FailingSource, StaticSource};
use fibertrace::{Decision, FiberTraceConfig, Scanner, ScannerError, StatsStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Configuration with no sleeps and a stats file inside `dir`.
fn test_config(dir: &tempfile::TempDir) -> FiberTraceConfig {
    let mut config = FiberTraceConfig::default();
    config.scan.dwell_ms = 0;
    config.actuator.settle_ms = 0;
    config.storage.data_file = dir
        .path()
        .join("fibertrace_data.json")
        .to_string_lossy()
        .into_owned();
    config
}

fn scanner_with_frame(
    config: &FiberTraceConfig,
    rgb: [u8; 3],
) -> (Scanner, EventLog) {
    let (backend, log) = simulated_backend(&config.actuator.pins);
    let actuator = ActuatorController::new(
        Box::new(backend),
        config.actuator.pins,
        config.actuator.angles,
        Duration::ZERO,
    );
    let source = Box::new(StaticSource::new(uniform_frame(640, 480, rgb)));
    let store = StatsStore::new(&config.storage.data_file);
    let scanner = Scanner::with_parts(source, actuator, store, config);
    log.lock().unwrap().clear(); // drop the init-to-neutral events
    (scanner, log)
}

/// Events of one complete actuation sequence for a decision, with the
/// simulated servo's 20 000-tick period.
fn expected_sequence(config: &FiberTraceConfig, decision: Decision) -> Vec<ActuatorEvent> {
    let pins = config.actuator.pins;
    let (on, off, angle) = match decision {
        Decision::Good => (pins.green_led, pins.red_led, config.actuator.angles.good),
        Decision::Bad => (pins.red_led, pins.green_led, config.actuator.angles.bad),
    };
    let duty = |angle: f64| ((2.5 + angle / 18.0) / 100.0 * 20_000.0).round() as u16;
    vec![
        ActuatorEvent::PinHigh(on),
        ActuatorEvent::PinLow(off),
        ActuatorEvent::Duty {
            pin: pins.servo,
            duty: duty(angle),
        },
        ActuatorEvent::Duty {
            pin: pins.servo,
            duty: 0,
        },
        ActuatorEvent::PinLow(pins.green_led),
        ActuatorEvent::PinLow(pins.red_led),
        ActuatorEvent::Duty {
            pin: pins.servo,
            duty: duty(config.actuator.angles.center),
        },
        ActuatorEvent::Duty {
            pin: pins.servo,
            duty: 0,
        },
    ]
}

#[test]
fn test_good_scan_updates_counters_and_actuates() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let (mut scanner, log) = scanner_with_frame(&config, [230, 230, 230]); // white

    let outcome = scanner.scan().unwrap();
    assert_eq!(outcome.result.decision, Decision::Good);
    assert_eq!(outcome.counters.total_scanned, 1);
    assert_eq!(outcome.counters.good_count, 1);
    assert_eq!(outcome.counters.bad_count, 0);

    let events = log.lock().unwrap().clone();
    assert_eq!(events, expected_sequence(&config, Decision::Good));
}

#[test]
fn test_bad_scan_swaps_led_and_angle() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let (mut scanner, log) = scanner_with_frame(&config, [40, 40, 210]); // blue

    let outcome = scanner.scan().unwrap();
    assert_eq!(outcome.result.decision, Decision::Bad);
    assert_eq!(outcome.counters.bad_count, 1);

    let events = log.lock().unwrap().clone();
    assert_eq!(events, expected_sequence(&config, Decision::Bad));
}

#[test]
fn test_scan_persists_before_returning() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let (mut scanner, _log) = scanner_with_frame(&config, [230, 230, 230]);

    scanner.scan().unwrap();

    // An external reader sees the committed counters immediately.
    let reloaded = StatsStore::new(&config.storage.data_file).load();
    assert_eq!(reloaded.total_scanned, 1);
    assert_eq!(reloaded.good_count, 1);
    assert_eq!(reloaded.last_result, Some(Decision::Good));
    assert!(reloaded.last_update > 0.0);
}

#[test]
fn test_counters_survive_scanner_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);

    {
        let (mut scanner, _log) = scanner_with_frame(&config, [40, 40, 210]);
        scanner.scan().unwrap();
        scanner.scan().unwrap();
    }

    let (mut scanner, _log) = scanner_with_frame(&config, [230, 230, 230]);
    let outcome = scanner.scan().unwrap();
    assert_eq!(outcome.counters.total_scanned, 3);
    assert_eq!(outcome.counters.good_count, 1);
    assert_eq!(outcome.counters.bad_count, 2);
}

#[test]
fn test_acquisition_failure_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);

    let (backend, log) = simulated_backend(&config.actuator.pins);
    let actuator = ActuatorController::new(
        Box::new(backend),
        config.actuator.pins,
        config.actuator.angles,
        Duration::ZERO,
    );
    let store = StatsStore::new(&config.storage.data_file);
    let mut scanner = Scanner::with_parts(Box::new(FailingSource), actuator, store, &config);
    log.lock().unwrap().clear();

    let err = scanner.scan().unwrap_err();
    assert!(matches!(err, ScannerError::Acquisition(_)));

    // No actuation, no counter change, no stats file.
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(scanner.counters().total_scanned, 0);
    assert!(!std::path::Path::new(&config.storage.data_file).exists());
}

#[test]
fn test_concurrent_triggers_serialize() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let (scanner, log) = scanner_with_frame(&config, [230, 230, 230]);
    let scanner = Arc::new(Mutex::new(scanner));

    let mut handles = Vec::new();
    for _ in 0..2 {
        let scanner = scanner.clone();
        handles.push(std::thread::spawn(move || {
            scanner.lock().unwrap().scan().unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Exactly two counter increments, no lost update.
    let counters = {
        let guard = scanner.lock().unwrap();
        guard.counters().clone()
    };
    assert_eq!(counters.total_scanned, 2);
    assert_eq!(counters.good_count, 2);

    // Exactly two complete, non-interleaved actuation sequences.
    let events = log.lock().unwrap().clone();
    let expected = expected_sequence(&config, Decision::Good);
    assert_eq!(events.len(), expected.len() * 2);
    assert_eq!(&events[..expected.len()], expected.as_slice());
    assert_eq!(&events[expected.len()..], expected.as_slice());
}

#[test]
fn test_purity_matches_counter_ratio() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let (mut scanner, _log) = scanner_with_frame(&config, [230, 230, 230]);

    for _ in 0..3 {
        scanner.scan().unwrap();
    }

    let counters = scanner.counters();
    assert_eq!(
        counters.good_count + counters.bad_count,
        counters.total_scanned
    );
    assert_eq!(counters.purity(), 100.0);
}
