//! Master server configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Optional values that are missing or do
//! not parse fall back to their defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{HeartbeatPolicy, RegistryRules};
use crate::persistence::LockSettings;

/// Default game port assumed when a request carries no `port`.
pub const DEFAULT_GAME_PORT: u16 = 27910;

/// Default liveness timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: i64 = 620;

/// Which record store backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Text file shared by every process pointing at the same path.
    File,
    /// Process-local memory; lost on restart.
    Memory,
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Top-level master server configuration.
///
/// Loaded once at startup via [`MasterConfig::from_env`].
#[derive(Debug, Clone)]
pub struct MasterConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:27900`).
    pub listen_addr: SocketAddr,

    /// Port assumed for callers that send no `port` parameter.
    pub default_port: u16,

    /// Seconds after the last ping/heartbeat before an entry expires.
    pub timeout_secs: i64,

    /// Record store backend.
    pub store_kind: StoreKind,

    /// Data file of the file backend.
    pub store_path: PathBuf,

    /// Lock acquisition attempts before a request fails.
    pub lock_retries: u32,

    /// Milliseconds between lock acquisition attempts.
    pub lock_backoff_ms: u64,

    /// Whether a heartbeat from an unknown server registers it.
    pub heartbeat_registers: bool,

    /// Whether to take the caller address from `X-Forwarded-For`.
    pub trust_forwarded_for: bool,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 27900)),
            default_port: DEFAULT_GAME_PORT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            store_kind: StoreKind::File,
            store_path: PathBuf::from("masterserver.txt"),
            lock_retries: 10,
            lock_backoff_ms: 100,
            heartbeat_registers: false,
            trust_forwarded_for: false,
        }
    }
}

impl MasterConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to [`MasterConfig::default`] values when a variable is not
    /// set. Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` or `MASTER_STORE_BACKEND` is set but
    /// cannot be parsed, or if the resulting values fail
    /// [`MasterConfig::validate`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr: SocketAddr = match std::env::var("LISTEN_ADDR") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let store_kind = match std::env::var("MASTER_STORE_BACKEND") {
            Ok(v) => v.parse::<StoreKind>()?,
            Err(_) => defaults.store_kind,
        };

        let store_path = std::env::var("MASTER_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.store_path);

        let config = Self {
            listen_addr,
            default_port: parse_env("MASTER_DEFAULT_PORT", defaults.default_port),
            timeout_secs: parse_env("MASTER_TIMEOUT_SECS", defaults.timeout_secs),
            store_kind,
            store_path,
            lock_retries: parse_env("MASTER_LOCK_RETRIES", defaults.lock_retries),
            lock_backoff_ms: parse_env("MASTER_LOCK_BACKOFF_MS", defaults.lock_backoff_ms),
            heartbeat_registers: parse_env_bool(
                "MASTER_HEARTBEAT_REGISTERS",
                defaults.heartbeat_registers,
            ),
            trust_forwarded_for: parse_env_bool(
                "MASTER_TRUST_FORWARDED_FOR",
                defaults.trust_forwarded_for,
            ),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects combinations the registry cannot run with.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid setting.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_port == 0 {
            return Err("MASTER_DEFAULT_PORT must be in 1..=65535".to_string());
        }
        if self.timeout_secs <= 0 {
            return Err("MASTER_TIMEOUT_SECS must be positive".to_string());
        }
        if self.lock_retries == 0 {
            return Err("MASTER_LOCK_RETRIES must be at least 1".to_string());
        }
        Ok(())
    }

    /// Transition rules derived from this configuration.
    #[must_use]
    pub const fn rules(&self) -> RegistryRules {
        RegistryRules {
            timeout_secs: self.timeout_secs,
            heartbeat_policy: if self.heartbeat_registers {
                HeartbeatPolicy::Register
            } else {
                HeartbeatPolicy::RefreshOnly
            },
        }
    }

    /// Lock retry settings derived from this configuration.
    #[must_use]
    pub const fn lock_settings(&self) -> LockSettings {
        LockSettings {
            retries: self.lock_retries,
            backoff: Duration::from_millis(self.lock_backoff_ms),
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    parse_bool(std::env::var(key).ok().as_deref(), default)
}

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
