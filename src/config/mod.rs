// Configuration module entry point
// Loads server, logging, performance and HTTP settings

mod types;

use std::net::SocketAddr;

pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

use crate::error::RouterError;

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from `config.toml` in the working directory
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional. `FLUX_*` environment variables override file values,
    /// e.g. `FLUX_SERVER__PORT=8080`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("FLUX").separator("__"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .build()?;

        settings.try_deserialize()
    }

    /// Socket address for the configured host and the given port
    pub fn socket_addr(&self, port: u16) -> Result<SocketAddr, RouterError> {
        format!("{}:{}", self.server.host, port)
            .parse()
            .map_err(|e| RouterError::InvalidAddress(format!("{}:{port}: {e}", self.server.host)))
    }

    /// Connection timeout: the larger of the read and write timeouts
    pub fn connection_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(std::cmp::max(
            self.performance.read_timeout,
            self.performance.write_timeout,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let cfg = Config::load_from("does-not-exist/flux").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.performance.keep_alive_timeout, 75);
        assert_eq!(cfg.http.max_body_size, 10_485_760);
        assert_eq!(cfg.logging.access_log_format, "common");
        assert!(cfg.server.workers.is_none());
    }

    #[test]
    fn test_load_reads_default_config_file() {
        // Tests run from the package root, next to config.toml
        let cfg = Config::load().unwrap();
        assert_eq!(cfg.logging.access_log_format, "common");
        assert_eq!(cfg.performance.read_timeout, 30);
        assert_eq!(cfg.http.max_body_size, 10_485_760);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = Config::default();
        let addr = cfg.socket_addr(4000).unwrap();
        assert_eq!(addr.port(), 4000);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn test_socket_addr_invalid_host() {
        let mut cfg = Config::default();
        cfg.server.host = "not a host".to_string();
        assert!(matches!(
            cfg.socket_addr(80),
            Err(RouterError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_connection_timeout_takes_max() {
        let mut cfg = Config::default();
        cfg.performance.read_timeout = 5;
        cfg.performance.write_timeout = 12;
        assert_eq!(cfg.connection_timeout().as_secs(), 12);
    }
}
