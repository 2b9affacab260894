use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
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
    pub cache: CacheConfig,
    pub engine: EngineConfig,
    pub dataset_path: Option<PathBuf>,
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

        let enabled = match env::var("APP_CACHE_ENABLED") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidCacheFlag)?,
            Err(_) => true,
        };
        let fleet_ttl = read_ttl("APP_CACHE_FLEET_TTL_SECS", CacheConfig::DEFAULT_FLEET_TTL)?;
        let history_ttl =
            read_ttl("APP_CACHE_HISTORY_TTL_SECS", CacheConfig::DEFAULT_HISTORY_TTL)?;

        let alert_threshold = match env::var("APP_ALERT_THRESHOLD") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite() && (0.0..=100.0).contains(value))
                .ok_or(ConfigError::InvalidAlertThreshold)?,
            Err(_) => EngineConfig::DEFAULT_ALERT_THRESHOLD,
        };

        let confidence_seed = match env::var("APP_CONFIDENCE_SEED") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidConfidenceSeed)?,
            ),
            Err(_) => None,
        };

        let dataset_path = env::var("APP_DATASET_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            cache: CacheConfig {
                enabled,
                fleet_ttl,
                history_ttl,
            },
            engine: EngineConfig {
                alert_threshold,
                confidence_seed,
            },
            dataset_path,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn read_ttl(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidTtl { key }),
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Read-through cache lifetimes per query class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub fleet_ttl: Duration,
    pub history_ttl: Duration,
}

impl CacheConfig {
    pub const DEFAULT_FLEET_TTL: Duration = Duration::from_secs(60);
    pub const DEFAULT_HISTORY_TTL: Duration = Duration::from_secs(3600);

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fleet_ttl: Self::DEFAULT_FLEET_TTL,
            history_ttl: Self::DEFAULT_HISTORY_TTL,
        }
    }
}

/// Scoring engine knobs exposed to operators.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub alert_threshold: f64,
    pub confidence_seed: Option<u64>,
}

impl EngineConfig {
    pub const DEFAULT_ALERT_THRESHOLD: f64 = 60.0;
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alert_threshold: Self::DEFAULT_ALERT_THRESHOLD,
            confidence_seed: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCacheFlag,
    InvalidTtl { key: &'static str },
    InvalidAlertThreshold,
    InvalidConfidenceSeed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCacheFlag => {
                write!(f, "APP_CACHE_ENABLED must be true/false, yes/no, on/off or 1/0")
            }
            ConfigError::InvalidTtl { key } => {
                write!(f, "{key} must be a whole number of seconds")
            }
            ConfigError::InvalidAlertThreshold => {
                write!(f, "APP_ALERT_THRESHOLD must be a number between 0 and 100")
            }
            ConfigError::InvalidConfidenceSeed => {
                write!(f, "APP_CONFIDENCE_SEED must be a valid u64")
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
