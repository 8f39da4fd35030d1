use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub valuation: ValuationSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = ValuationSettings::default();
        let fetch_timeout_ms = numeric_var(
            "APP_FETCH_TIMEOUT_MS",
            defaults.fetch_timeout.as_millis() as u64,
        )?;
        let persist_attempts = numeric_var("APP_PERSIST_ATTEMPTS", defaults.persist_attempts as u64)?;
        let persist_backoff_ms = numeric_var("APP_PERSIST_BACKOFF_MS", defaults.persist_backoff_ms)?;

        if fetch_timeout_ms == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "APP_FETCH_TIMEOUT_MS",
            });
        }
        if persist_attempts == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "APP_PERSIST_ATTEMPTS",
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            valuation: ValuationSettings {
                fetch_timeout: Duration::from_millis(fetch_timeout_ms),
                persist_attempts: persist_attempts as usize,
                persist_backoff_ms,
                persist_max_delay: defaults.persist_max_delay,
            },
        })
    }
}

fn numeric_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidSetting { name }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
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
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// I/O bounds for the valuation pipeline. The calculation itself is never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuationSettings {
    /// Applies to each catalog, config, market and history lookup.
    pub fetch_timeout: Duration,
    /// Total audit write attempts, including the first.
    pub persist_attempts: usize,
    /// Backoff unit; retry n waits this many milliseconds times 2^n.
    pub persist_backoff_ms: u64,
    pub persist_max_delay: Duration,
}

impl Default for ValuationSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_millis(2_000),
            persist_attempts: 3,
            persist_backoff_ms: 50,
            persist_max_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSetting { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSetting { name } => {
                write!(f, "{name} must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidSetting { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_FETCH_TIMEOUT_MS",
            "APP_PERSIST_ATTEMPTS",
            "APP_PERSIST_BACKOFF_MS",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.valuation, ValuationSettings::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_valuation_bounds_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_FETCH_TIMEOUT_MS", "750");
        env::set_var("APP_PERSIST_ATTEMPTS", "5");
        env::set_var("APP_PERSIST_BACKOFF_MS", "20");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.valuation.fetch_timeout, Duration::from_millis(750));
        assert_eq!(config.valuation.persist_attempts, 5);
        assert_eq!(config.valuation.persist_backoff_ms, 20);
        reset_env();
    }

    #[test]
    fn rejects_zero_attempts() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PERSIST_ATTEMPTS", "0");

        match AppConfig::load() {
            Err(ConfigError::InvalidSetting { name }) => assert_eq!(name, "APP_PERSIST_ATTEMPTS"),
            other => panic!("expected invalid setting, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_FETCH_TIMEOUT_MS", "soon");

        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidSetting {
                name: "APP_FETCH_TIMEOUT_MS"
            })
        ));
        reset_env();
    }
}
