use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Directory relative schema folders resolve against: the crate's own location.
pub const PLUGIN_DIR: &str = env!("CARGO_MANIFEST_DIR");

/// Plugin options. Every field is optional on input and falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoloadOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub schemas_folder: PathBuf,
    /// Base for a relative `schemas_folder`. `None` means [`PLUGIN_DIR`].
    pub base_dir: Option<PathBuf>,
}

impl Default for AutoloadOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 27017,
            user: "anonymous".to_string(),
            password: "mypassword".to_string(),
            dbname: "mydb".to_string(),
            schemas_folder: PathBuf::from("./mymodels"),
            base_dir: None,
        }
    }
}

impl AutoloadOptions {
    /// Literal template substitution. Credentials are not escaped, so a user
    /// or password containing `@`, `:` or `/` produces a malformed URI.
    pub fn connection_uri(&self) -> String {
        format!(
            "mongodb://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.dbname
        )
    }

    /// Connection URI with the password masked, for log lines.
    pub fn redacted_uri(&self) -> String {
        format!(
            "mongodb://{}:****@{}:{}/{}",
            self.user, self.host, self.port, self.dbname
        )
    }

    pub fn models_path(&self) -> PathBuf {
        let base = self
            .base_dir
            .as_deref()
            .unwrap_or_else(|| Path::new(PLUGIN_DIR));
        base.join(&self.schemas_folder)
    }
}

/// Host process configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub log_dir: Option<PathBuf>,
    pub sync_indexes: bool,
    pub autoload: AutoloadOptions,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = AutoloadOptions::default();

        let port = match env::var("MONGO_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid MONGO_PORT '{}': {}", raw, e))?,
            Err(_) => defaults.port,
        };

        let autoload = AutoloadOptions {
            host: env::var("MONGO_HOST").unwrap_or(defaults.host),
            port,
            user: env::var("MONGO_USER").unwrap_or(defaults.user),
            password: env::var("MONGO_PASSWORD").unwrap_or(defaults.password),
            dbname: env::var("MONGO_DBNAME").unwrap_or(defaults.dbname),
            schemas_folder: env::var("SCHEMAS_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.schemas_folder),
            base_dir: env::var("SCHEMAS_BASE_DIR").ok().map(PathBuf::from),
        };

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        let log_dir = env::var("LOG_DIR").ok().map(PathBuf::from);

        let sync_indexes = env::var("SYNC_INDEXES")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Config {
            server_host,
            server_port,
            log_dir,
            sync_indexes,
            autoload,
        })
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.server_host, self.server_port);
        addr.parse().map_err(|e| anyhow::anyhow!("Invalid socket address: {}", e))
    }
}
