//! Service configuration: application constants plus the environment-driven
//! settings the pipeline and server need at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "carbaudit";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default chat-completions endpoint of the AI gateway.
const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
/// Default evaluation model served through the gateway.
const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8787";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CARBAUDIT_GATEWAY_KEY is not configured")]
    MissingGatewayKey,

    #[error("Invalid CARBAUDIT_BIND_ADDR '{0}'")]
    InvalidBindAddr(String),

    #[error("Invalid CARBAUDIT_GATEWAY_TIMEOUT_SECS '{0}'")]
    InvalidTimeout(String),
}

/// Runtime settings, resolved once in `main` and shared read-only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Chat-completions URL of the AI gateway.
    pub gateway_url: String,
    /// Bearer credential for the gateway.
    pub gateway_key: String,
    /// Model identifier passed on every evaluation call.
    pub model: String,
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// SQLite file holding audit_reports / audit_issues.
    pub db_path: PathBuf,
    /// Per-request timeout for the gateway call.
    pub gateway_timeout_secs: u64,
}

impl AppConfig {
    /// Read configuration from `CARBAUDIT_*` environment variables.
    /// Only the gateway key is mandatory; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let gateway_key = std::env::var("CARBAUDIT_GATEWAY_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingGatewayKey)?;

        let gateway_url = std::env::var("CARBAUDIT_GATEWAY_URL")
            .unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string());

        let model =
            std::env::var("CARBAUDIT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let bind_raw = std::env::var("CARBAUDIT_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_raw.clone()))?;

        let db_path = std::env::var("CARBAUDIT_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_db_path());

        let gateway_timeout_secs = match std::env::var("CARBAUDIT_GATEWAY_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
            Err(_) => DEFAULT_GATEWAY_TIMEOUT_SECS,
        };

        Ok(Self {
            gateway_url,
            gateway_key,
            model,
            bind_addr,
            db_path,
            gateway_timeout_secs,
        })
    }
}

/// Get the application data directory
/// ~/.carbaudit/ on all platforms
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(".carbaudit")
}

/// Default SQLite database location when CARBAUDIT_DB_PATH is unset.
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("carbaudit.db")
}

/// Default tracing filter: this crate at info, dependencies at warn.
pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info,warn")
}
