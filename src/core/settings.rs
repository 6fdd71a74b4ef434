use crate::core::models::Destination;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_POLL_INTERVAL: &str = "APP_AFORO_TIEMPO_ESPERA";
pub const ENV_INFLUX_SERVER: &str = "APP_AFORO_INFLUX_SERVER";
pub const ENV_INFLUX_ORG: &str = "APP_AFORO_INFLUX_ORG";
pub const ENV_INFLUX_BUCKET: &str = "APP_AFORO_INFLUX_BUCKET";
pub const ENV_INFLUX_TOKEN: &str = "APP_AFORO_INFLUX_TOKEN";
pub const ENV_INFLUX_SSLVERIFY: &str = "APP_AFORO_INFLUX_SSLVERIFY";
pub const ENV_INFLUX_CACERT: &str = "APP_AFORO_INFLUX_SSL_CACERT";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub poll_interval_secs: u64,
    pub service: ServiceSettings,
    pub influx: InfluxSettings,
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            service: ServiceSettings::default(),
            influx: InfluxSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub landing_url: String,
    pub ajax_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            landing_url: "https://termaria.deporsite.net/ocupacion-aforo".to_string(),
            ajax_url: "https://termaria.deporsite.net/ajax/TInnova_v2/Listado_OcupacionAforo/llamadaAjax/obtenerOcupacion".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ServiceSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluxSettings {
    pub url: String,
    pub org: String,
    pub bucket: String,
    pub token: String,
    pub verify_tls: bool,
    pub ca_cert: Option<PathBuf>,
    pub measurement: String,
}

impl Default for InfluxSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            org: String::new(),
            bucket: String::new(),
            token: String::new(),
            verify_tls: true,
            ca_cert: None,
            measurement: "aforo".to_string(),
        }
    }
}

impl InfluxSettings {
    pub fn destination(&self) -> Destination {
        Destination {
            org: self.org.clone(),
            bucket: self.bucket.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value, env) in [
            ("influx.url", &self.url, ENV_INFLUX_SERVER),
            ("influx.org", &self.org, ENV_INFLUX_ORG),
            ("influx.bucket", &self.bucket, ENV_INFLUX_BUCKET),
            ("influx.token", &self.token, ENV_INFLUX_TOKEN),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} is not set (config file or {})", name, env);
            }
        }
        if self.measurement.trim().is_empty() {
            anyhow::bail!("influx.measurement must not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub json: bool,
    pub journald: bool,
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("aforo-poller").join("config.toml"))
    }

    /// Loads the config file (explicit path or the default location) and then
    /// applies `APP_AFORO_*` environment overrides. Logging is not set up yet
    /// at this point, so the caller logs the returned source.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_path(),
        };

        let (mut settings, source) = match path {
            Some(path) if explicit.is_some() || path.exists() => {
                (Self::load_file(&path)?, ConfigSource::File(path))
            }
            path => (Self::default(), ConfigSource::Defaults(path)),
        };

        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok((settings, source))
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        settings.normalize();
        Ok(settings)
    }

    /// An empty `ca_cert` in the file means "use the system roots".
    fn normalize(&mut self) {
        if self
            .influx
            .ca_cert
            .as_deref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            self.influx.ca_cert = None;
        }
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_POLL_INTERVAL) {
            self.poll_interval_secs = value.trim().parse().with_context(|| {
                format!(
                    "{} must be a number of seconds, got {:?}",
                    ENV_POLL_INTERVAL, value
                )
            })?;
        }
        if let Some(value) = lookup(ENV_INFLUX_SERVER) {
            self.influx.url = value;
        }
        if let Some(value) = lookup(ENV_INFLUX_ORG) {
            self.influx.org = value;
        }
        if let Some(value) = lookup(ENV_INFLUX_BUCKET) {
            self.influx.bucket = value;
        }
        if let Some(value) = lookup(ENV_INFLUX_TOKEN) {
            self.influx.token = value;
        }
        if let Some(value) = lookup(ENV_INFLUX_SSLVERIFY) {
            self.influx.verify_tls = parse_tls_flag(&value)?;
        }
        if let Some(value) = lookup(ENV_INFLUX_CACERT) {
            self.influx.ca_cert = if value.is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than zero");
        }
        if self.service.landing_url.trim().is_empty() || self.service.ajax_url.trim().is_empty() {
            anyhow::bail!("service.landing_url and service.ajax_url must be set");
        }
        if self.service.request_timeout_secs == 0 {
            anyhow::bail!("service.request_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

/// Where the settings came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults(Option<PathBuf>),
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => tracing::info!(path = %path.display(), "Loaded config"),
            ConfigSource::Defaults(path) => {
                tracing::info!(?path, "Config file not found, using defaults")
            }
        }
    }
}

fn parse_tls_flag(value: &str) -> Result<bool> {
    match value {
        "True" | "true" | "yes" => Ok(true),
        "False" | "false" | "no" => Ok(false),
        other => anyhow::bail!("{} has an invalid value: {:?}", ENV_INFLUX_SSLVERIFY, other),
    }
}
