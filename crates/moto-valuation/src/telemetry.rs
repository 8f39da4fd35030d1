use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("APP_LOG_LEVEL '{directives}' is not a valid log filter")]
    InvalidLogLevel {
        directives: String,
        #[source]
        source: ParseError,
    },
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Which setting produced the active log filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOrigin {
    RustLog,
    AppLogLevel,
}

/// Install the global subscriber for the valuation service.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (filter, origin) = select_filter(rust_log.as_deref(), &config.log_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::AlreadyInstalled)?;

    tracing::debug!(?origin, "log filter installed");
    Ok(())
}

/// A parsable, non-empty `RUST_LOG` wins; anything else falls back to
/// `APP_LOG_LEVEL`, which must parse.
fn select_filter(
    rust_log: Option<&str>,
    configured: &str,
) -> Result<(EnvFilter, FilterOrigin), TelemetryError> {
    let from_env = rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok());
    if let Some(filter) = from_env {
        return Ok((filter, FilterOrigin::RustLog));
    }

    EnvFilter::try_new(configured)
        .map(|filter| (filter, FilterOrigin::AppLogLevel))
        .map_err(|source| TelemetryError::InvalidLogLevel {
            directives: configured.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn configured_level_applies_without_rust_log() {
        let (filter, origin) = select_filter(None, "info,moto_valuation=debug").expect("valid");

        assert_eq!(origin, FilterOrigin::AppLogLevel);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn rust_log_overrides_the_configured_level() {
        let (filter, origin) = select_filter(Some("warn"), "debug").expect("valid");

        assert_eq!(origin, FilterOrigin::RustLog);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn blank_or_broken_rust_log_falls_back() {
        for rust_log in ["", "  ", "moto_valuation=loud"] {
            let (_, origin) = select_filter(Some(rust_log), "info").expect("valid");
            assert_eq!(origin, FilterOrigin::AppLogLevel);
        }
    }

    #[test]
    fn broken_configured_level_names_the_setting() {
        match select_filter(None, "moto_valuation=loud") {
            Err(err @ TelemetryError::InvalidLogLevel { .. }) => {
                assert!(err.to_string().contains("APP_LOG_LEVEL 'moto_valuation=loud'"));
            }
            other => panic!("expected invalid log level, got {other:?}"),
        }
    }
}
