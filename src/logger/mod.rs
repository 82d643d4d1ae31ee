//! Logger module
//!
//! Provides logging utilities for the router including:
//! - Server lifecycle logging
//! - Route registration logging
//! - Access logging (common or JSON)
//! - Handler failure, warning and error logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, routes: usize) {
    write_info("======================================");
    write_info("Router started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Registered endpoints: {routes}"));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_server_shutdown(addr: &SocketAddr) {
    write_info(&format!("[Shutdown] Listener on {addr} closed"));
}

pub fn log_route_registered(endpoint: &str) {
    write_info(&format!("[Route] Registered {endpoint}"));
}

pub fn log_route_replaced(endpoint: &str) {
    log_warning(&format!(
        "Route {endpoint} registered again; previous handlers discarded"
    ));
}

pub fn log_handler_replaced(endpoint: &str, method: &str) {
    log_warning(&format!(
        "{} handler for {endpoint} replaced",
        method.to_uppercase()
    ));
}

pub fn log_handler_failed(method: &str, url: &str, message: &str) {
    log_error(&format!("Handler for {method} {url} failed: {message}"));
}

pub fn log_handler_panicked(method: &str, url: &str, message: &str) {
    log_error(&format!("Handler for {method} {url} panicked: {message}"));
}

/// Error returned by a handler after it had already sent its response
pub fn log_late_handler_error(method: &str, url: &str, message: &str) {
    log_warning(&format!(
        "Handler for {method} {url} failed after responding: {message}"
    ));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}
