//! Access log format module
//!
//! Supports two formats:
//! - `common` (Common Log Format - CLF)
//! - `json` (one JSON object per line)

use chrono::{DateTime, Local};
use serde::Serialize;

/// One dispatched request/response pair
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    /// Client address
    pub remote_addr: String,
    #[serde(serialize_with = "serialize_time")]
    pub time: DateTime<Local>,
    pub method: String,
    /// Original request target, query string included
    pub url: String,
    pub status: u16,
    pub body_bytes: usize,
    /// Dispatch time in microseconds
    pub request_time_us: u64,
}

fn serialize_time<S: serde::Serializer>(time: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&time.to_rfc3339())
}

impl AccessLogEntry {
    /// Create an entry stamped with the current local time
    pub fn new(remote_addr: String, method: String, url: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            url,
            status: 200,
            body_bytes: 0,
            request_time_us: 0,
        }
    }

    /// Render the entry. Unknown format names fall back to `common`.
    pub fn format(&self, format: &str) -> String {
        match format {
            "json" => self.format_json(),
            _ => self.format_common(),
        }
    }

    /// `$remote_addr - - [$time_local] "$method $url" $status $body_bytes $request_time`
    fn format_common(&self) -> String {
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;
        format!(
            "{} - - [{}] \"{} {}\" {} {} {request_time:.3}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.url,
            self.status,
            self.body_bytes,
        )
    }

    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.format_common())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "192.168.1.1:50000".to_string(),
            "POST".to_string(),
            "/hello?a=1".to_string(),
        );
        entry.status = 201;
        entry.body_bytes = 42;
        entry.request_time_us = 1600;
        entry
    }

    #[test]
    fn test_format_common() {
        let log = create_test_entry().format("common");
        assert!(log.starts_with("192.168.1.1:50000 - - ["));
        assert!(log.contains("\"POST /hello?a=1\" 201 42"));
        assert!(log.ends_with("0.002"), "got: {log}");
    }

    #[test]
    fn test_format_json() {
        let log = create_test_entry().format("json");
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["method"], "POST");
        assert_eq!(value["url"], "/hello?a=1");
        assert_eq!(value["status"], 201);
        assert_eq!(value["body_bytes"], 42);
        assert!(value["time"].is_string());
    }

    #[test]
    fn test_unknown_format_falls_back_to_common() {
        let entry = create_test_entry();
        assert_eq!(entry.format("combined"), entry.format("common"));
    }
}
