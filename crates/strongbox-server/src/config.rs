//! Server configuration with layered loading and environment variable interpolation.

use figment::{
    providers::{Env, Format, Toml},
    value::{Dict, Map, Value},
    Error as FigmentError, Figment, Metadata, Profile, Provider,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::source::DocumentFormat;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "strongbox.toml";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "STRONGBOX_CONFIG";

/// Prefix for environment variable overrides, e.g. `STRONGBOX_AUTH__TOKEN`.
pub const ENV_PREFIX: &str = "STRONGBOX_";

/// Errors that can occur when loading or parsing server configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error from the Figment configuration library.
    #[error("Configuration error: {0}")]
    Figment(Box<FigmentError>),

    /// The specified configuration file was not found.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration is invalid or malformed.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<FigmentError> for ConfigError {
    fn from(err: FigmentError) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StrongboxConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Shared-token authentication.
    pub auth: AuthConfig,

    /// Where the secrets document is loaded from.
    pub source: SourceConfig,
}

impl StrongboxConfig {
    /// Loads configuration from `$STRONGBOX_CONFIG`, falling back to
    /// `strongbox.toml`.
    ///
    /// When neither file exists, configuration is read from the environment
    /// alone.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

        if path.exists() {
            return Self::load_from(path);
        }

        tracing::debug!(
            path = %path.display(),
            "Configuration file not found, reading environment only"
        );
        Self::from_figment(Figment::new().merge(env_provider()))
    }

    /// Loads configuration from the specified file path.
    ///
    /// Environment variables prefixed with `STRONGBOX_` override file settings.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let figment = Figment::new()
            .merge(InterpolatingToml::file(path)?)
            .merge(env_provider());

        Self::from_figment(figment)
    }

    /// Parses configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Self::from_figment(Figment::new().merge(InterpolatingToml::string(content)))
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config = figment.extract::<Self>()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks constraints that deserialisation alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token.expose_secret().is_empty() {
            return Err(ConfigError::Invalid("auth.token must not be empty".into()));
        }

        match &self.source {
            SourceConfig::File { path, .. } => {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::Invalid("source.path must not be empty".into()));
                }
            }
            SourceConfig::S3(s3) => {
                if s3.bucket.is_empty() {
                    return Err(ConfigError::Invalid("source.bucket must not be empty".into()));
                }
                if s3.key.is_empty() {
                    return Err(ConfigError::Invalid("source.key must not be empty".into()));
                }
            }
        }

        Ok(())
    }
}

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address and port to bind the server to.
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Time to wait for in-flight requests during shutdown.
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

const fn default_bind_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8420)
}

const fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Shared-token authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// The token every request must present.
    #[serde(deserialize_with = "deserialize_secret")]
    pub token: SecretString,
}

/// Secrets document source.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// A document on the local filesystem.
    File {
        /// Path to the document.
        path: PathBuf,

        /// Document format; inferred from the file extension when absent.
        #[serde(default)]
        format: Option<DocumentFormat>,
    },
    /// A document in S3 or S3-compatible object storage.
    S3(S3SourceConfig),
}

/// Configuration for loading the secrets document from S3.
///
/// Credentials are taken from the standard `AWS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct S3SourceConfig {
    /// Bucket holding the document.
    pub bucket: String,

    /// Object key of the document.
    pub key: String,

    /// AWS region; falls back to `AWS_REGION`/`AWS_DEFAULT_REGION`.
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible storage.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Allow plain HTTP endpoints.
    #[serde(default)]
    pub allow_http: bool,

    /// Document format; inferred from the key's extension when absent.
    #[serde(default)]
    pub format: Option<DocumentFormat>,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(serde::de::Error::custom)
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let parse = |digits: &str| {
        digits
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("Invalid duration: {s}"))
    };

    if let Some(stripped) = s.strip_suffix("ms") {
        parse(stripped).map(Duration::from_millis)
    } else if let Some(stripped) = s.strip_suffix('s') {
        parse(stripped).map(Duration::from_secs)
    } else if let Some(stripped) = s.strip_suffix('m') {
        parse(stripped).map(|mins| Duration::from_secs(mins * 60))
    } else {
        parse(s).map(Duration::from_secs)
    }
}

/// Expands `${VAR_NAME}` references in configuration strings.
///
/// Unset variables expand to the empty string.
fn interpolate_env(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let var_name: String = chars.by_ref().take_while(|&ch| ch != '}').collect();
            if let Ok(val) = std::env::var(&var_name) {
                result.push_str(&val);
            }
        } else {
            result.push(c);
        }
    }

    result
}

fn interpolate_value(value: Value) -> Value {
    match value {
        Value::String(_, s) => Value::from(interpolate_env(&s)),
        Value::Dict(tag, dict) => Value::Dict(
            tag,
            dict.into_iter()
                .map(|(k, v)| (k, interpolate_value(v)))
                .collect(),
        ),
        Value::Array(tag, arr) => {
            Value::Array(tag, arr.into_iter().map(interpolate_value).collect())
        }
        other => other,
    }
}

/// TOML configuration provider with environment variable interpolation.
///
/// Supports `${VAR_NAME}` syntax, so the token can live in the environment
/// while the rest of the configuration is checked in.
pub struct InterpolatingToml {
    content: String,
}

impl InterpolatingToml {
    /// Creates an interpolating TOML provider from a file path.
    pub fn file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|_| ConfigError::FileNotFound(path.as_ref().display().to_string()))?;
        Ok(Self { content })
    }

    /// Creates an interpolating TOML provider from a string.
    pub fn string(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

impl Provider for InterpolatingToml {
    fn metadata(&self) -> Metadata {
        Metadata::named("Interpolating TOML")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, FigmentError> {
        let base_data = Toml::string(&self.content).data()?;

        Ok(base_data
            .into_iter()
            .map(|(profile, dict)| {
                let dict: Dict = dict
                    .into_iter()
                    .map(|(k, v)| (k, interpolate_value(v)))
                    .collect();
                (profile, dict)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("60").unwrap(), Duration::from_secs(60));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn config_from_string() {
        let config = StrongboxConfig::parse(
            r#"
            [server]
            bind_address = "0.0.0.0:9000"
            shutdown_timeout = "5s"

            [auth]
            token = "s3cret"

            [source]
            kind = "file"
            path = "/etc/strongbox/secrets.yaml"
        "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.auth.token.expose_secret(), "s3cret");
        match config.source {
            SourceConfig::File { path, format } => {
                assert_eq!(path, PathBuf::from("/etc/strongbox/secrets.yaml"));
                assert!(format.is_none());
            }
            SourceConfig::S3(_) => panic!("expected file source"),
        }
    }

    #[test]
    fn config_defaults() {
        let config = StrongboxConfig::parse(
            r#"
            [auth]
            token = "t"

            [source]
            kind = "file"
            path = "secrets.yaml"
        "#,
        )
        .unwrap();

        assert_eq!(
            config.server.bind_address,
            "127.0.0.1:8420".parse().unwrap()
        );
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(30));
    }

    #[test]
    fn config_s3_source() {
        let config = StrongboxConfig::parse(
            r#"
            [auth]
            token = "t"

            [source]
            kind = "s3"
            bucket = "team-secrets"
            key = "prod/secrets.json"
            region = "eu-west-1"
            endpoint = "http://localhost:9000"
            allow_http = true
            format = "json"
        "#,
        )
        .unwrap();

        let SourceConfig::S3(s3) = config.source else {
            panic!("expected s3 source");
        };
        assert_eq!(s3.bucket, "team-secrets");
        assert_eq!(s3.key, "prod/secrets.json");
        assert_eq!(s3.region.as_deref(), Some("eu-west-1"));
        assert_eq!(s3.endpoint.as_deref(), Some("http://localhost:9000"));
        assert!(s3.allow_http);
        assert_eq!(s3.format, Some(DocumentFormat::Json));
    }

    #[test]
    fn config_requires_auth_token() {
        let result = StrongboxConfig::parse(
            r#"
            [source]
            kind = "file"
            path = "secrets.yaml"
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Figment(_))));
    }

    #[test]
    fn config_rejects_empty_token() {
        let result = StrongboxConfig::parse(
            r#"
            [auth]
            token = ""

            [source]
            kind = "file"
            path = "secrets.yaml"
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn config_rejects_empty_bucket() {
        let result = StrongboxConfig::parse(
            r#"
            [auth]
            token = "t"

            [source]
            kind = "s3"
            bucket = ""
            key = "secrets.yaml"
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn token_is_redacted_in_debug() {
        let config = StrongboxConfig::parse(
            r#"
            [auth]
            token = "do-not-print-me"

            [source]
            kind = "file"
            path = "secrets.yaml"
        "#,
        )
        .unwrap();

        assert!(!format!("{config:?}").contains("do-not-print-me"));
    }

    #[test]
    fn interpolates_environment_variables() {
        std::env::set_var("STRONGBOX_TEST_INTERPOLATED_TOKEN", "from-env");

        let config = StrongboxConfig::parse(
            r#"
            [auth]
            token = "${STRONGBOX_TEST_INTERPOLATED_TOKEN}"

            [source]
            kind = "file"
            path = "secrets.yaml"
        "#,
        )
        .unwrap();

        assert_eq!(config.auth.token.expose_secret(), "from-env");
    }

    #[test]
    fn interpolation_leaves_plain_text_alone() {
        assert_eq!(interpolate_env("no variables here"), "no variables here");
        assert_eq!(interpolate_env("cost: $5"), "cost: $5");
        assert_eq!(
            interpolate_env("${STRONGBOX_TEST_SURELY_UNSET_VARIABLE}suffix"),
            "suffix"
        );
    }

    #[test]
    fn load_from_missing_file() {
        let result = StrongboxConfig::load_from("/nonexistent/strongbox.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [auth]
            token = "file-token"

            [source]
            kind = "file"
            path = "secrets.json"
            "#
        )
        .unwrap();

        let config = StrongboxConfig::load_from(file.path()).unwrap();
        assert_eq!(config.auth.token.expose_secret(), "file-token");
    }
}
