use std::str::FromStr;

use config::{Config, ConfigError, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::ConnectOptions;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(serde::Deserialize)]
pub struct ApplicationSettings {
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,

    /// HS256 signing secret for session tokens.
    pub jwt_secret: SecretString,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub session_hours: i64,

    /// Directory served under `/assets`.
    pub assets_dir: String,
}

#[derive(serde::Deserialize)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: SecretString,
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,

    pub database_name: String,
    pub require_ssl: bool,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub acquire_timeout_secs: u64,
}

#[derive(serde::Deserialize)]
pub struct TelemetrySettings {
    pub service_name: String,
    /// Default filter when `RUST_LOG` is not set.
    pub log_filter: String,
    /// OTLP collector; spans are only exported when this is set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl DatabaseSettings {
    /// Options for the application pool. SQL statements are logged at trace
    /// level so they stay out of the default filter.
    pub fn connect_options(&self) -> PgConnectOptions {
        let ssl_mode = match self.require_ssl {
            true => PgSslMode::Require,
            false => PgSslMode::Prefer,
        };
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(self.password.expose_secret())
            .database(&self.database_name)
            .ssl_mode(ssl_mode)
            .log_statements(tracing_log::log::LevelFilter::Trace)
    }
}

/// Deployment profile; picks the YAML file layered over `base.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Environment::Local, Environment::Production]
            .into_iter()
            .find(|env| env.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "unknown APP_ENVIRONMENT `{s}`, expected `local` or `production`"
                ))
            })
    }
}

/// Layers `configurations/base.yaml`, the file named by `APP_ENVIRONMENT`
/// (default `local`) and `APP_*` environment variables, in that order.
/// Nested keys use `__`, as in `APP_DATABASE__HOST`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let dir = std::env::current_dir()
        .map_err(|e| ConfigError::Message(format!("no current directory: {e}")))?
        .join("configurations");
    let environment = std::env::var("APP_ENVIRONMENT")
        .map_or(Ok(Environment::Local), |name| name.parse::<Environment>())?;

    Config::builder()
        .add_source(File::from(dir.join("base")))
        .add_source(File::from(dir.join(environment.as_str())))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}
