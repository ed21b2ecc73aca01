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
    pub reasoning: ReasoningConfig,
    pub coverage: CoverageConfig,
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

        let reasoning = ReasoningConfig {
            api_key: env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            model: env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-opus-4-5".to_string()),
            base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            request_timeout: parse_timeout("REASONING_TIMEOUT_SECS", 60)?,
            decision_max_tokens: parse_tokens("DECISION_MAX_TOKENS", 1500)?,
            appeal_max_tokens: parse_tokens("APPEAL_MAX_TOKENS", 900)?,
        };

        let coverage = CoverageConfig {
            base_url: env::var("COVERAGE_API_URL").unwrap_or_else(|_| {
                "https://www.cms.gov/medicare-coverage-database/api/articles".to_string()
            }),
            request_timeout: parse_timeout("COVERAGE_TIMEOUT_SECS", 10)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            reasoning,
            coverage,
        })
    }
}

fn parse_timeout(var: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    let secs = env::var(var)
        .unwrap_or_else(|_| default_secs.to_string())
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidTimeout { var })?;
    if secs == 0 {
        return Err(ConfigError::InvalidTimeout { var });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_tokens(var: &'static str, default_tokens: u32) -> Result<u32, ConfigError> {
    let tokens = env::var(var)
        .unwrap_or_else(|_| default_tokens.to_string())
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidTokenBudget { var })?;
    if tokens == 0 {
        return Err(ConfigError::InvalidTokenBudget { var });
    }
    Ok(tokens)
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Connection settings for the external reasoning service.
#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub decision_max_tokens: u32,
    pub appeal_max_tokens: u32,
}

/// Connection settings for the third-party coverage database.
#[derive(Debug, Clone)]
pub struct CoverageConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout { var: &'static str },
    InvalidTokenBudget { var: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout { var } => {
                write!(f, "{var} must be a positive number of seconds")
            }
            ConfigError::InvalidTokenBudget { var } => {
                write!(f, "{var} must be a positive token count")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
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
        for var in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "ANTHROPIC_API_KEY",
            "ANTHROPIC_MODEL",
            "ANTHROPIC_BASE_URL",
            "REASONING_TIMEOUT_SECS",
            "DECISION_MAX_TOKENS",
            "APPEAL_MAX_TOKENS",
            "COVERAGE_API_URL",
            "COVERAGE_TIMEOUT_SECS",
        ] {
            env::remove_var(var);
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
        assert_eq!(config.reasoning.decision_max_tokens, 1500);
        assert_eq!(config.reasoning.appeal_max_tokens, 900);
        assert_eq!(config.coverage.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn rejects_zero_reasoning_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("REASONING_TIMEOUT_SECS", "0");
        let err = AppConfig::load().expect_err("zero timeout rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidTimeout {
                var: "REASONING_TIMEOUT_SECS"
            }
        ));
        env::remove_var("REASONING_TIMEOUT_SECS");
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        env::remove_var("APP_HOST");
    }
}
