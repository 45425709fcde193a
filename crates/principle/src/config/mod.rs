use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::workflows::principle::PrinciplePolicy;

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
            "test" | "ci" | "staging" => Self::Test,
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
    pub upstream: UpstreamConfig,
    pub policy: PrinciplePolicy,
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
        let telemetry = TelemetryConfig {
            log_level,
            include_targets: environment != AppEnvironment::Production,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry,
            upstream: UpstreamConfig::from_env()?,
            policy: policy_from_env()?,
        })
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
    pub include_targets: bool,
}

/// Base URLs and transport settings for the domain services the workflow calls.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub asset_master_url: String,
    pub branch_service_url: String,
    pub customer_master_url: String,
    pub loan_service_url: String,
    pub event_bus_url: Option<String>,
    pub timeout_ms: u64,
    pub api_token: Option<String>,
}

impl UpstreamConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_ms = parse_var("UPSTREAM_TIMEOUT_MS", 5_000)?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "UPSTREAM_TIMEOUT_MS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            asset_master_url: url_var("ASSET_MASTER_URL", "http://127.0.0.1:8081")?,
            branch_service_url: url_var("BRANCH_SERVICE_URL", "http://127.0.0.1:8082")?,
            customer_master_url: url_var("CUSTOMER_MASTER_URL", "http://127.0.0.1:8083")?,
            loan_service_url: url_var("LOAN_SERVICE_URL", "http://127.0.0.1:8084")?,
            event_bus_url: optional_var("EVENT_BUS_URL")
                .map(|value| validate_url("EVENT_BUS_URL", value))
                .transpose()?,
            timeout_ms,
            api_token: optional_var("UPSTREAM_API_TOKEN"),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn policy_from_env() -> Result<PrinciplePolicy, ConfigError> {
    let defaults = PrinciplePolicy::default();
    Ok(PrinciplePolicy {
        min_applicant_age: parse_var("POLICY_MIN_APPLICANT_AGE", defaults.min_applicant_age)?,
        max_applicant_age: parse_var("POLICY_MAX_APPLICANT_AGE", defaults.max_applicant_age)?,
        max_age_at_maturity: parse_var("POLICY_MAX_AGE_AT_MATURITY", defaults.max_age_at_maturity)?,
        max_asset_age_years: parse_var("POLICY_MAX_ASSET_AGE_YEARS", defaults.max_asset_age_years)?,
        max_asset_age_at_maturity: parse_var(
            "POLICY_MAX_ASSET_AGE_AT_MATURITY",
            defaults.max_asset_age_at_maturity,
        )?,
        max_overdue_days: parse_var("POLICY_MAX_OVERDUE_DAYS", defaults.max_overdue_days)?,
        max_installment_ratio: parse_var(
            "POLICY_MAX_INSTALLMENT_RATIO",
            defaults.max_installment_ratio,
        )?,
    })
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_var(key) {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

fn url_var(key: &'static str, default: &str) -> Result<String, ConfigError> {
    let value = optional_var(key).unwrap_or_else(|| default.to_string());
    validate_url(key, value)
}

fn validate_url(key: &'static str, value: String) -> Result<String, ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(ConfigError::InvalidUrl { key, value })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidUrl { key: &'static str, value: String },
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidUrl { key, value } => {
                write!(f, "{key} must be an http(s) URL, found '{value}'")
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} has an invalid value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidUrl { .. }
            | ConfigError::InvalidValue { .. } => None,
        }
    }
}
