// src/core/config_manager.rs
//! Unified configuration: defaults, an optional `config.yaml` overlay per
//! environment, then environment variables on top

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::dispatch::{DispatchMode, DispatchSettings};
use crate::mail::{MailBackend, SmtpConfig, ASSESSMENT_SUBJECT};

const CONFIG_FILE: &str = "config.yaml";
const CONSOLE_FROM_ADDRESS: &str = "noreply@localhost";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: String,
    pub server: ServerConfig,
    pub mail: MailConfig,
    pub dispatch: DispatchSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub uploads_dir: PathBuf,
    /// Largest accepted CSV upload, in MiB
    pub max_upload_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 5000,
            uploads_dir: PathBuf::from("../uploads"),
            max_upload_mb: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub backend: MailBackend,
    pub from_name: String,
    pub from_address: Option<String>,
    pub smtp: SmtpConfig,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            backend: MailBackend::Smtp,
            from_name: "Talent Acquisition".to_string(),
            from_address: None,
            smtp: SmtpConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DispatchSection {
    mode: DispatchMode,
    concurrency: usize,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            mode: DispatchMode::Resend,
            concurrency: 1,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvironmentSection {
    server: ServerConfig,
    mail: MailConfig,
    dispatch: DispatchSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    local: EnvironmentSection,
    production: EnvironmentSection,
}

impl ConfigManager {
    /// Load configuration for the current process
    pub fn load() -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let environment = env("ENVIRONMENT").unwrap_or_else(|| "local".to_string());
        info!("Loading configuration for environment: {}", environment);

        let section = Self::read_config_file(Path::new(CONFIG_FILE), &environment)?;
        Self::from_sources(environment, section, env)
    }

    /// Defaults plus the given variable lookup, without reading `config.yaml`
    pub fn from_vars(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let environment = env("ENVIRONMENT").unwrap_or_else(|| "local".to_string());
        Self::from_sources(environment, EnvironmentSection::default(), env)
    }

    fn read_config_file(path: &Path, environment: &str) -> Result<EnvironmentSection> {
        if !path.exists() {
            return Ok(EnvironmentSection::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        info!("Applied configuration overlay from {}", path.display());
        Ok(match environment {
            "production" => file.production,
            _ => file.local,
        })
    }

    fn from_sources(
        environment: String,
        section: EnvironmentSection,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let EnvironmentSection {
            mut server,
            mut mail,
            dispatch,
        } = section;

        if let Some(port) = parse_var(&env, "PORT")? {
            server.port = port;
        }
        if let Some(address) = env("BIND_ADDRESS") {
            server.address = address;
        }
        if let Some(dir) = env("UPLOADS_DIR") {
            server.uploads_dir = PathBuf::from(dir);
        }
        server.uploads_dir = resolve_path(&server.uploads_dir)?;
        if let Some(limit) = parse_var(&env, "MAX_UPLOAD_MB")? {
            server.max_upload_mb = limit;
        }
        server.max_upload_mb = server.max_upload_mb.max(1);

        if let Some(backend) = parse_var::<MailBackend>(&env, "MAIL_BACKEND")? {
            mail.backend = backend;
        }
        if let Some(host) = env("SMTP_HOST") {
            mail.smtp.host = host;
        }
        if let Some(port) = parse_var(&env, "SMTP_PORT")? {
            mail.smtp.port = port;
        }
        if let Some(use_tls) = parse_var(&env, "SMTP_TLS")? {
            mail.smtp.use_tls = use_tls;
        }
        if let Some(timeout) = parse_var(&env, "SMTP_TIMEOUT_SECS")? {
            mail.smtp.timeout_secs = timeout;
        }
        if let Some(user) = env("SMTP_USER") {
            mail.smtp.username = Some(user);
        }
        if let Some(pass) = env("SMTP_PASS") {
            mail.smtp.password = Some(pass);
        }
        if let Some(name) = env("MAIL_FROM_NAME") {
            mail.from_name = name;
        }
        if let Some(address) = env("MAIL_FROM_ADDRESS") {
            mail.from_address = Some(address);
        }

        // Gmail-style relays only accept the authenticated account as sender
        if mail.from_address.is_none() {
            mail.from_address = match mail.backend {
                MailBackend::Smtp => mail.smtp.username.clone(),
                MailBackend::Console => Some(CONSOLE_FROM_ADDRESS.to_string()),
            };
        }

        let mode = match env("DISPATCH_MODE") {
            Some(raw) => raw.parse::<DispatchMode>().map_err(anyhow::Error::msg)?,
            None => dispatch.mode,
        };
        let concurrency = parse_var(&env, "DISPATCH_CONCURRENCY")?
            .unwrap_or(dispatch.concurrency)
            .max(1);

        let dispatch = DispatchSettings {
            from_name: mail.from_name.clone(),
            from_address: mail.from_address.clone(),
            subject: ASSESSMENT_SUBJECT.to_string(),
            concurrency,
            mode,
        };

        Ok(Self {
            environment,
            server,
            mail,
            dispatch,
        })
    }

    /// SMTP is selected but `SMTP_USER`/`SMTP_PASS` are not both set
    pub fn missing_smtp_credentials(&self) -> bool {
        self.mail.backend == MailBackend::Smtp && !self.mail.smtp.has_credentials()
    }

    /// Only warns: credentials matter at send time, not at startup
    pub fn warn_on_missing_credentials(&self) {
        if self.missing_smtp_credentials() {
            warn!("SMTP_USER or SMTP_PASS not set. Configure them before sending emails.");
        }
    }

    /// Ensure all required directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        use crate::core::FsOps;

        FsOps::ensure_dir_exists(&self.server.uploads_dir).await
    }
}

fn parse_var<T>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e))
        })
        .transpose()
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(current_dir.join(path))
    }
}
