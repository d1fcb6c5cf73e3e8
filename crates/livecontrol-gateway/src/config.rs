//! Gateway configuration types.
//!
//! Configuration comes from environment variables, with defaults suitable for
//! local development:
//!
//! | Variable                      | Default                 |
//! |-------------------------------|-------------------------|
//! | `LISTEN_ADDR`                 | `0.0.0.0:8080`          |
//! | `DATA_DIR`                    | `/data/livecontrol`     |
//! | `GATEWAY_ID`                  | `gateway-local`         |
//! | `PRESENCE_TTL_SECONDS`        | `65`                    |
//! | `PRESENCE_PURGE_SECONDS`      | `30`                    |
//! | `BUS_CAPACITY`                | `1024`                  |

use std::str::FromStr;
use std::time::Duration;

use livecontrol_hub::HubConfig;
use serde::Deserialize;

/// Configuration for the gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Directory holding the metadata database.
    #[serde(default = "GatewayConfig::default_data_dir")]
    pub data_dir: String,

    /// Identity of this gateway instance, recorded in presence records.
    #[serde(default = "GatewayConfig::default_gateway_id")]
    pub gateway_id: String,

    /// Allowed CORS origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// How long a hub stays online without a heartbeat, in seconds.
    #[serde(default = "GatewayConfig::default_presence_ttl")]
    pub presence_ttl_seconds: u64,

    /// How often expired presence records are swept, in seconds.
    #[serde(default = "GatewayConfig::default_presence_purge")]
    pub presence_purge_seconds: u64,

    /// Number of bus messages that may be queued before publishing fails.
    #[serde(default = "GatewayConfig::default_bus_capacity")]
    pub bus_capacity: usize,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    fn default_data_dir() -> String {
        "/data/livecontrol".to_string()
    }

    fn default_gateway_id() -> String {
        "gateway-local".to_string()
    }

    const fn default_max_body() -> usize {
        64 * 1024
    }

    const fn default_request_timeout() -> u64 {
        10
    }

    const fn default_presence_ttl() -> u64 {
        65
    }

    const fn default_presence_purge() -> u64 {
        30
    }

    const fn default_bus_capacity() -> usize {
        1024
    }

    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Unset variables keep their default; unparsable ones are logged and
    /// also keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(dir) = lookup("DATA_DIR") {
            config.data_dir = dir;
        }
        if let Some(id) = lookup("GATEWAY_ID") {
            config.gateway_id = id;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        parse_into(&lookup, "PRESENCE_TTL_SECONDS", &mut config.presence_ttl_seconds);
        parse_into(&lookup, "PRESENCE_PURGE_SECONDS", &mut config.presence_purge_seconds);
        parse_into(&lookup, "BUS_CAPACITY", &mut config.bus_capacity);
        parse_into(&lookup, "MAX_BODY_BYTES", &mut config.max_body_bytes);
        parse_into(&lookup, "REQUEST_TIMEOUT_SECONDS", &mut config.request_timeout_seconds);

        config
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get the presence sweep interval as a `Duration`.
    #[must_use]
    pub fn presence_purge_interval(&self) -> Duration {
        Duration::from_secs(self.presence_purge_seconds.max(1))
    }

    /// Hub lifetime settings derived from this configuration.
    #[must_use]
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            presence_ttl_seconds: self.presence_ttl_seconds,
            ..HubConfig::default()
        }
    }
}

fn parse_into<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut T) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => tracing::warn!(key, value = %raw, "Ignoring invalid configuration value"),
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            data_dir: Self::default_data_dir(),
            gateway_id: Self::default_gateway_id(),
            cors_origins: vec!["*".to_string()],
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
            presence_ttl_seconds: Self::default_presence_ttl(),
            presence_purge_seconds: Self::default_presence_purge(),
            bus_capacity: Self::default_bus_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.presence_ttl_seconds, 65);
        assert_eq!(config.bus_capacity, 1024);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
    }

    #[test]
    fn env_overrides_defaults() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("GATEWAY_ID", "gw-7"),
            ("PRESENCE_TTL_SECONDS", "120"),
            ("BUS_CAPACITY", "16"),
            ("CORS_ORIGINS", "http://a.example, http://b.example"),
        ]));

        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.gateway_id, "gw-7");
        assert_eq!(config.presence_ttl_seconds, 120);
        assert_eq!(config.bus_capacity, 16);
        assert_eq!(
            config.cors_origins,
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );
        assert_eq!(config.data_dir, "/data/livecontrol");
    }

    #[test]
    fn invalid_numbers_keep_defaults() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("PRESENCE_TTL_SECONDS", "soon"),
            ("BUS_CAPACITY", "-1"),
        ]));
        assert_eq!(config.presence_ttl_seconds, 65);
        assert_eq!(config.bus_capacity, 1024);
    }

    #[test]
    fn hub_config_uses_presence_ttl() {
        let config = GatewayConfig {
            presence_ttl_seconds: 90,
            ..GatewayConfig::default()
        };
        assert_eq!(config.hub_config().presence_ttl(), Duration::from_secs(90));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }
}
