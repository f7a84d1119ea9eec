use std::env;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Top-level configuration for the binary.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Reads `.env` (if present) and then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("FEASIBILITY_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("FEASIBILITY_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };
        let log_level =
            lookup("FEASIBILITY_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost {
                host: self.host.clone(),
                source,
            })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("FEASIBILITY_PORT must be a valid u16, got '{0}'")]
    InvalidPort(String),

    #[error("FEASIBILITY_HOST must parse to an IPv4 or IPv6 address, got '{host}'")]
    InvalidHost {
        host: String,
        source: std::net::AddrParseError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(|_| None).expect("defaults load");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn environment_values_override_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("FEASIBILITY_HOST", "0.0.0.0"),
            ("FEASIBILITY_PORT", " 9090 "),
            ("FEASIBILITY_LOG_LEVEL", "debug"),
        ]))
        .expect("config loads");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(
            config.server.socket_addr().expect("valid addr"),
            SocketAddr::new(IpAddr::from([0, 0, 0, 0]), 9090)
        );
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("FEASIBILITY_PORT", "70000")]))
            .expect_err("port out of range");
        assert!(matches!(err, ConfigError::InvalidPort(ref raw) if raw == "70000"));
    }

    #[test]
    fn localhost_resolves_to_loopback() {
        let server = ServerConfig {
            host: "LocalHost".to_string(),
            port: 3000,
        };
        assert_eq!(
            server.socket_addr().expect("localhost resolves"),
            SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000)
        );
    }

    #[test]
    fn unparseable_host_is_rejected() {
        let server = ServerConfig {
            host: "not a host".to_string(),
            port: 3000,
        };
        let err = server.socket_addr().expect_err("host must be an ip");
        assert!(err.to_string().contains("not a host"));
    }
}
