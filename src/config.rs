//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP/WebSocket server to.
    pub listen_addr: SocketAddr,

    /// Capacity of each connection's outbound frame queue. Frames routed
    /// to a full queue are dropped.
    pub outbound_buffer_capacity: usize,

    /// Timeout in seconds for REST requests.
    pub request_timeout_secs: u64,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            outbound_buffer_capacity: 256,
            request_timeout_secs: 30,
            log_format: LogFormat::Text,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// `LISTEN_ADDR` wins over `PORT`; with neither set the relay binds
    /// `0.0.0.0:3000`. Calls `dotenvy::dotenv().ok()` to optionally load
    /// a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as a
    /// [`SocketAddr`], or `PORT` is set but is not a valid port number.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`RelayConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_addr = match (lookup("LISTEN_ADDR"), lookup("PORT")) {
            (Some(addr), _) => addr.parse()?,
            (None, Some(port)) => SocketAddr::from(([0, 0, 0, 0], port.trim().parse::<u16>()?)),
            (None, None) => defaults.listen_addr,
        };

        let outbound_buffer_capacity = parse_or(
            lookup("OUTBOUND_BUFFER_CAPACITY"),
            defaults.outbound_buffer_capacity,
        )
        .max(1);
        let request_timeout_secs =
            parse_or(lookup("REQUEST_TIMEOUT_SECS"), defaults.request_timeout_secs);

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            outbound_buffer_capacity,
            request_timeout_secs,
            log_format,
        })
    }
}

/// Parses `value` as `T`, returning `default` on missing or invalid input.
fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
