//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Email configuration. When absent, notification emails are skipped.
    #[serde(default)]
    pub email: Option<EmailSettings>,
    /// Account-request approval behavior.
    #[serde(default)]
    pub approval: ApprovalConfig,
    /// Certificate rendering configuration.
    #[serde(default)]
    pub certificates: CertificateConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
    /// Instance name used in email templates and certificates.
    #[serde(default = "default_instance_name")]
    pub instance_name: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Transactional email settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    /// Provider kind: `smtp`, `sendgrid`, or `mailgun`.
    pub provider: String,
    /// From address.
    pub from_address: String,
    /// From display name.
    #[serde(default = "default_instance_name")]
    pub from_name: String,
    /// SMTP host (smtp provider).
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP port (smtp provider).
    #[serde(default)]
    pub smtp_port: Option<u16>,
    /// SMTP username (smtp provider).
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// SMTP password (smtp provider).
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// Negotiate STARTTLS with the SMTP host.
    #[serde(default = "default_true")]
    pub smtp_tls: bool,
    /// API key (sendgrid/mailgun providers).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sending domain (mailgun provider).
    #[serde(default)]
    pub domain: Option<String>,
    /// Use the Mailgun EU region.
    #[serde(default)]
    pub eu_region: bool,
}

/// Account-request approval behavior.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApprovalConfig {
    /// When true, approving a request whose department name cannot be
    /// resolved fails; when false the user is provisioned without a
    /// department and a warning is logged.
    #[serde(default)]
    pub require_department: bool,
}

/// Certificate rendering configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CertificateConfig {
    /// URL of the certificate render service. When absent, certificates are
    /// recorded but no document is attached to the email.
    #[serde(default)]
    pub render_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_instance_name() -> String {
    "Rollcall".to_string()
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (via dotenvy, if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `ROLLCALL_ENV`)
    /// 4. Environment variables with `ROLLCALL_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("ROLLCALL_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ROLLCALL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("ROLLCALL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
