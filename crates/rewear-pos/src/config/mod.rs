use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::matching::MatchOptions;
use crate::session::{StaffAccount, StaffDirectory};

/// Accounts used outside production when `REWEAR_STAFF_ACCOUNTS` is unset.
pub const DEVELOPMENT_STAFF_ACCOUNTS: &str = "admin:1234:admin,kasse:1234:staff";

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
    pub matching: MatchOptions,
    pub staff: Vec<StaffAccount>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("REWEAR_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("REWEAR_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("REWEAR_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("REWEAR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let matching = matching_from_env()?;

        let staff_raw = match env::var("REWEAR_STAFF_ACCOUNTS") {
            Ok(raw) => raw,
            Err(_) if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingStaffAccounts)
            }
            Err(_) => DEVELOPMENT_STAFF_ACCOUNTS.to_string(),
        };
        let staff = StaffDirectory::parse(&staff_raw).map_err(ConfigError::InvalidStaffAccounts)?;
        if staff.is_empty() {
            return Err(ConfigError::MissingStaffAccounts);
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            matching,
            staff,
        })
    }
}

/// Matcher options from `REWEAR_MATCH_MIN_SCORE` and `REWEAR_MATCH_LIMIT`,
/// without the server and staff settings `AppConfig::load` also demands.
pub fn load_matching() -> Result<MatchOptions, ConfigError> {
    dotenvy::dotenv().ok();
    matching_from_env()
}

fn matching_from_env() -> Result<MatchOptions, ConfigError> {
    let mut matching = MatchOptions::default();
    if let Ok(raw) = env::var("REWEAR_MATCH_MIN_SCORE") {
        matching.min_score = parse_min_score(&raw).ok_or(ConfigError::InvalidMinScore(raw))?;
    }
    if let Ok(raw) = env::var("REWEAR_MATCH_LIMIT") {
        matching.limit = parse_match_limit(&raw).ok_or(ConfigError::InvalidMatchLimit(raw))?;
    }
    Ok(matching)
}

/// A similarity threshold between 0 and 1 inclusive.
pub fn parse_min_score(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| (0.0..=1.0).contains(value))
}

/// A shortlist length of at least one.
pub fn parse_match_limit(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|value| *value > 0)
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

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidMinScore(String),
    InvalidMatchLimit(String),
    MissingStaffAccounts,
    InvalidStaffAccounts(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "REWEAR_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "REWEAR_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMinScore(raw) => write!(
                f,
                "REWEAR_MATCH_MIN_SCORE must be a number between 0 and 1 (got '{raw}')"
            ),
            ConfigError::InvalidMatchLimit(raw) => write!(
                f,
                "REWEAR_MATCH_LIMIT must be a positive integer (got '{raw}')"
            ),
            ConfigError::MissingStaffAccounts => {
                write!(f, "REWEAR_STAFF_ACCOUNTS must list at least one account")
            }
            ConfigError::InvalidStaffAccounts(reason) => {
                write!(f, "REWEAR_STAFF_ACCOUNTS is malformed: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidMinScore(_)
            | ConfigError::InvalidMatchLimit(_)
            | ConfigError::MissingStaffAccounts
            | ConfigError::InvalidStaffAccounts(_) => None,
        }
    }
}
