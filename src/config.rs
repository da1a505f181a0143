//! Configuration management for RAX File Server
//!
//! Settings are layered: built-in defaults, an optional `config.toml`,
//! `RAX_FS_*` environment variables, and finally command-line flags.

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::SessionPolicy;
use crate::auth::session::{DEFAULT_SESSION_TTL, REMEMBERED_SESSION_TTL};

const DEFAULT_CONFIG_FILE: &str = "config";
const ENV_PREFIX: &str = "RAX_FS";
/// Longest accepted session lifetime: ten years.
const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Command-line flags. Every flag overrides the matching config key.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "rax-file-server", version, about = "Share a directory over HTTP(S)")]
pub struct Cli {
    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub bind: Option<String>,

    /// Directory to serve (created if missing)
    #[arg(long)]
    pub dir: Option<String>,

    /// Login username; authentication is off unless both username and password are set
    #[arg(long)]
    pub username: Option<String>,

    /// Login password
    #[arg(long)]
    pub password: Option<String>,

    /// Serve HTTPS (`--tls false` for plain HTTP)
    #[arg(long)]
    pub tls: Option<bool>,

    /// PEM certificate file; a self-signed one is generated when omitted
    #[arg(long)]
    pub cert: Option<String>,

    /// PEM private key file
    #[arg(long)]
    pub key: Option<String>,

    /// Config file name without extension
    #[arg(long)]
    pub config: Option<String>,
}

/// Complete server configuration, fixed for the life of the process.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind
    pub bind_address: String,

    /// Listening port
    pub port: u16,

    /// Directory shared by the server
    pub root_dir: String,

    /// Static login; empty disables authentication
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,

    /// Serve over TLS
    pub tls_enabled: bool,

    /// Operator-supplied PEM files; both or neither
    #[serde(default)]
    pub cert_file: Option<String>,
    #[serde(default)]
    pub key_file: Option<String>,

    /// Token lifetimes
    pub session_ttl_secs: u64,
    pub remember_ttl_secs: u64,

    /// Request body limit for uploads
    pub max_upload_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            root_dir: ".".to_string(),
            username: String::new(),
            password: String::new(),
            tls_enabled: true,
            cert_file: None,
            key_file: None,
            session_ttl_secs: DEFAULT_SESSION_TTL.as_secs(),
            remember_ttl_secs: REMEMBERED_SESSION_TTL.as_secs(),
            max_upload_mb: 1024,
        }
    }
}

impl ServerConfig {
    /// Load configuration with file, environment, and CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();
        let file = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);

        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("root_dir", defaults.root_dir)?
            .set_default("tls_enabled", defaults.tls_enabled)?
            .set_default("session_ttl_secs", defaults.session_ttl_secs.to_string())?
            .set_default("remember_ttl_secs", defaults.remember_ttl_secs.to_string())?
            .set_default("max_upload_mb", defaults.max_upload_mb.to_string())?
            .add_source(File::with_name(file).required(cli.config.is_some()))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .set_override_option("port", cli.port.map(i64::from))?
            .set_override_option("bind_address", cli.bind.clone())?
            .set_override_option("root_dir", cli.dir.clone())?
            .set_override_option("username", cli.username.clone())?
            .set_override_option("password", cli.password.clone())?
            .set_override_option("tls_enabled", cli.tls)?
            .set_override_option("cert_file", cli.cert.clone())?
            .set_override_option("key_file", cli.key.clone())?
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.root_dir.is_empty() {
            return Err(ConfigError::Message("root_dir cannot be empty".into()));
        }

        if self.cert_file.is_some() != self.key_file.is_some() {
            return Err(ConfigError::Message(
                "cert_file and key_file must be given together".into(),
            ));
        }

        if self.session_ttl_secs == 0 || self.remember_ttl_secs == 0 {
            return Err(ConfigError::Message(
                "session lifetimes must be greater than 0".into(),
            ));
        }

        if self.session_ttl_secs > MAX_SESSION_TTL_SECS
            || self.remember_ttl_secs > MAX_SESSION_TTL_SECS
        {
            return Err(ConfigError::Message(format!(
                "session lifetimes cannot exceed {} seconds",
                MAX_SESSION_TTL_SECS
            )));
        }

        if self.max_upload_mb == 0 {
            return Err(ConfigError::Message(
                "max_upload_mb must be greater than 0".into(),
            ));
        }

        self.socket_addr().map(|_| ())
    }

    /// Bind address and port as a socket address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            ConfigError::Message(format!("invalid bind_address {:?}", self.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root_dir)
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            default_ttl: Duration::from_secs(self.session_ttl_secs),
            remembered_ttl: Duration::from_secs(self.remember_ttl_secs),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}
