//! Presence client configuration parsed from environment variables.

use std::str::FromStr;
use std::time::Duration;

use crate::connection::ReconnectPolicy;
use crate::error::ConfigError;

/// Backend address used when `VAULT_BACKEND_URL` is unset at runtime.
///
/// Taken from `VAULT_BACKEND_URL` at build time when present.
pub const DEFAULT_BACKEND_URL: &str = match option_env!("VAULT_BACKEND_URL") {
    Some(url) => url,
    None => "http://localhost:8000",
};
pub const REALTIME_WS_PATH: &str = "/api/realtime/ws";
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

pub const BACKEND_URL_VAR: &str = "VAULT_BACKEND_URL";
pub const MAX_RECONNECT_ATTEMPTS_VAR: &str = "PRESENCE_MAX_RECONNECT_ATTEMPTS";
pub const RECONNECT_DELAY_MS_VAR: &str = "PRESENCE_RECONNECT_DELAY_MS";
pub const CONNECT_TIMEOUT_MS_VAR: &str = "PRESENCE_CONNECT_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceConfig {
    /// HTTP(S) address of the vault backend, e.g. `https://vault.example.com`.
    pub backend_url: String,
    pub reconnect: ReconnectPolicy,
    /// Upper bound on one opening handshake; expiry counts as unreachable.
    pub connect_timeout: Duration,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL)
    }
}

impl PresenceConfig {
    #[must_use]
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            reconnect: ReconnectPolicy::default(),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }

    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `VAULT_BACKEND_URL`: default [`DEFAULT_BACKEND_URL`]
    /// - `PRESENCE_MAX_RECONNECT_ATTEMPTS`: default 5
    /// - `PRESENCE_RECONNECT_DELAY_MS`: default 3000
    /// - `PRESENCE_CONNECT_TIMEOUT_MS`: default 10000
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set but unparsable or the
    /// backend address has an unsupported scheme.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend_url = non_empty(lookup(BACKEND_URL_VAR)).unwrap_or_else(|| DEFAULT_BACKEND_URL.to_owned());
        socket_base(&backend_url)?;

        let max_attempts = parse_var(&lookup, MAX_RECONNECT_ATTEMPTS_VAR, DEFAULT_MAX_RECONNECT_ATTEMPTS)?;
        let delay_ms = parse_var(&lookup, RECONNECT_DELAY_MS_VAR, DEFAULT_RECONNECT_DELAY_MS)?;
        let connect_timeout_ms = parse_var(&lookup, CONNECT_TIMEOUT_MS_VAR, DEFAULT_CONNECT_TIMEOUT_MS)?;

        Ok(Self {
            backend_url,
            reconnect: ReconnectPolicy {
                max_attempts,
                delay: Duration::from_millis(delay_ms),
            },
            connect_timeout: Duration::from_millis(connect_timeout_ms),
        })
    }

    /// Socket URL for this backend, with `user_id` as a query parameter when given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBackendUrl`] when the backend address does
    /// not start with `http(s)://` or `ws(s)://`.
    pub fn ws_url(&self, user_id: Option<&str>) -> Result<String, ConfigError> {
        let base = socket_base(&self.backend_url)?;
        let mut url = format!("{base}{REALTIME_WS_PATH}");
        if let Some(user_id) = user_id {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("user_id", user_id)
                .finish();
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }
}

/// Swap the HTTP scheme for its WebSocket counterpart and drop trailing slashes.
fn socket_base(backend_url: &str) -> Result<String, ConfigError> {
    let trimmed = backend_url.trim().trim_end_matches('/');
    let (scheme, rest) = if let Some(rest) = trimmed.strip_prefix("https://") {
        ("wss", rest)
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        ("ws", rest)
    } else if let Some(rest) = trimmed.strip_prefix("wss://") {
        ("wss", rest)
    } else if let Some(rest) = trimmed.strip_prefix("ws://") {
        ("ws", rest)
    } else {
        return Err(ConfigError::InvalidBackendUrl(backend_url.to_owned()));
    };

    if rest.is_empty() {
        return Err(ConfigError::InvalidBackendUrl(backend_url.to_owned()));
    }
    Ok(format!("{scheme}://{rest}"))
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    let Some(raw) = non_empty(lookup(var)) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) => Ok(value),
        Err(_) => Err(ConfigError::InvalidVar { var, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
