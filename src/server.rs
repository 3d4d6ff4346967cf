//! Web front-end: scan trigger, stats query, and preview endpoints.
//!
//! - `GET  /api/stats`   — counters plus computed purity, read from the
//!   persisted file exactly like an external dashboard would.
//! - `POST /api/scan`    — run one full scan cycle and return the outcome.
//! - `GET  /api/preview` — JPEG of the current camera view.
//!
//! Scan requests route through the shared serialized [`Scanner`]; the
//! stats endpoint deliberately bypasses it so polling keeps working while
//! a scan is in flight.

use crate::config::ServerConfig;
use crate::errors::ScannerError;
use crate::scan::Scanner;
use crate::stats::StatsStore;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tiny_http::{Header, Method, Request, Response, Server};

/// Serve the API until the process exits.
pub fn serve(
    config: &ServerConfig,
    scanner: Arc<Mutex<Scanner>>,
    store: StatsStore,
) -> Result<(), ScannerError> {
    let server = Server::http(&config.bind_addr).map_err(|e| {
        ScannerError::Server(format!("could not bind {}: {}", config.bind_addr, e))
    })?;
    log::info!("Dashboard API listening on http://{}", config.bind_addr);

    for request in server.incoming_requests() {
        handle(request, &scanner, &store);
    }
    Ok(())
}

fn handle(request: Request, scanner: &Arc<Mutex<Scanner>>, store: &StatsStore) {
    log::debug!("{} {}", request.method(), request.url());

    match (request.method(), request.url()) {
        (&Method::Get, "/api/stats") => respond_json(request, 200, stats_payload(store)),
        (&Method::Post, "/api/scan") => {
            let (status, body) = scan_payload(scanner);
            respond_json(request, status, body);
        }
        (&Method::Get, "/api/preview") => match preview_jpeg(scanner) {
            Ok(jpeg) => respond_jpeg(request, jpeg),
            Err(e) => respond_json(
                request,
                503,
                json!({ "success": false, "error": e.to_string() }),
            ),
        },
        _ => respond_json(request, 404, json!({ "error": "not found" })),
    }
}

/// Dashboard query payload: raw counters plus derived purity and a
/// human-readable last update.
pub fn stats_payload(store: &StatsStore) -> serde_json::Value {
    let counters = store.load();
    json!({
        "total_scanned": counters.total_scanned,
        "good_count": counters.good_count,
        "bad_count": counters.bad_count,
        "purity": counters.purity(),
        "last_update": counters.last_update_display(),
        "last_result": counters.last_result,
    })
}

/// Run one scan through the shared scanner and shape the HTTP payload.
pub fn scan_payload(scanner: &Arc<Mutex<Scanner>>) -> (u16, serde_json::Value) {
    let mut guard = match scanner.lock() {
        Ok(guard) => guard,
        Err(_) => {
            return (
                500,
                json!({ "success": false, "error": "scanner unavailable" }),
            )
        }
    };

    match guard.scan() {
        Ok(outcome) => match serde_json::to_value(&outcome) {
            Ok(mut body) => {
                body["success"] = json!(true);
                (200, body)
            }
            Err(e) => (
                500,
                json!({ "success": false, "error": format!("encode outcome: {}", e) }),
            ),
        },
        Err(e) => (500, json!({ "success": false, "error": e.to_string() })),
    }
}

fn preview_jpeg(scanner: &Arc<Mutex<Scanner>>) -> Result<Vec<u8>, ScannerError> {
    let mut guard = scanner
        .lock()
        .map_err(|_| ScannerError::Server("scanner unavailable".to_string()))?;
    guard.preview_jpeg()
}

fn respond_json(request: Request, status: u16, body: serde_json::Value) {
    let response = Response::from_string(body.to_string())
        .with_status_code(status)
        .with_header(content_type("application/json"));
    if let Err(e) = request.respond(response) {
        log::warn!("Failed to send response: {}", e);
    }
}

fn respond_jpeg(request: Request, jpeg: Vec<u8>) {
    let response = Response::from_data(jpeg).with_header(content_type("image/jpeg"));
    if let Err(e) = request.respond(response) {
        log::warn!("Failed to send preview: {}", e);
    }
}

fn content_type(value: &str) -> Header {
    // Static names and ASCII values; construction cannot fail.
    Header::from_bytes(&b"Content-Type"[..], value.as_bytes()).expect("valid header")
}
