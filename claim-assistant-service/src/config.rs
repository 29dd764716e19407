use claim_flow::Pacing;
use std::{net::SocketAddr, str::FromStr, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Settings read from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Claim analysis backend. Unset means the in-memory demo backend.
    pub backend_url: Option<String>,
    pub backend_timeout: Duration,
    pub pacing: Pacing,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Pacing::default();
        let pacing = Pacing {
            typing: millis(&lookup, "TYPING_DELAY_MS", defaults.typing)?,
            result_read: millis(&lookup, "MENU_DELAY_MS", defaults.result_read)?,
            simulation_read: millis(&lookup, "SIMULATION_MENU_DELAY_MS", defaults.simulation_read)?,
            empty_guard: millis(&lookup, "EMPTY_GUARD_DELAY_MS", defaults.empty_guard)?,
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT", 3000)?,
            backend_url: lookup("BACKEND_URL").filter(|url| !url.trim().is_empty()),
            backend_timeout: Duration::from_secs(parsed(&lookup, "BACKEND_TIMEOUT_SECS", 120)?),
            pacing,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind_addr, self.port);
        addr.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: addr,
        })
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let default_ms = default.as_millis() as u64;
    parsed(lookup, name, default_ms).map(Duration::from_millis)
}
