//! Configuration for the dlpsync CLI.
//!
//! A YAML or TOML file (picked by extension) merged with `DLPSYNC_*`
//! environment variables over built-in defaults, credential resolution
//! (env var, keyring, plaintext), and translation to
//! `dlpsync_core::SyncConfig`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use dlpsync_api::{
    DEFAULT_AUTH_URL, DEFAULT_DATA_PATTERN_URL, DEFAULT_DATA_PROFILE_URL, Endpoints, TlsMode,
};
use dlpsync_core::{ApiSettings, SyncConfig, TenantConfig};

/// Keyring service the API keys are stored under.
pub const KEYRING_SERVICE: &str = "dlpsync";

const ENV_PREFIX: &str = "DLPSYNC_";
const DEFAULT_FILE: &str = "config.yaml";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for tenant '{tenant}'")]
    NoCredentials { tenant: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── File structs ────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Authoritative tenant; never written to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<TenantEntry>,

    /// Tenants that receive the source's configuration, in run order.
    #[serde(default)]
    pub destinations: Vec<TenantEntry>,

    /// Endpoint and transport overrides.
    #[serde(default)]
    pub api: ApiSection,
}

/// One tenant's credentials.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TenantEntry {
    /// Display name; defaults to `Source` or `Tenant <n>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// OAuth2 client ID of the service account.
    #[serde(default)]
    pub service_account: String,

    /// API key (plaintext; prefer keyring or env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Tenant service group ID. YAML files often leave it unquoted.
    #[serde(default, deserialize_with = "string_or_number")]
    pub tsg_id: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ApiSection {
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    #[serde(default = "default_data_pattern_url")]
    pub data_pattern_url: String,

    #[serde(default = "default_data_profile_url")]
    pub data_profile_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Extra CA certificate (PEM), for TLS-inspecting proxies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub insecure: bool,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            auth_url: default_auth_url(),
            data_pattern_url: default_data_pattern_url(),
            data_profile_url: default_data_profile_url(),
            timeout: default_timeout(),
            ca_cert: None,
            insecure: false,
        }
    }
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.into()
}
fn default_data_pattern_url() -> String {
    DEFAULT_DATA_PATTERN_URL.into()
}
fn default_data_profile_url() -> String {
    DEFAULT_DATA_PROFILE_URL.into()
}
fn default_timeout() -> u64 {
    30
}

fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(u64),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

// ── Tenant roles ────────────────────────────────────────────────────

/// Where a tenant sits in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Destination,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Destination => "destination",
        })
    }
}

impl Config {
    /// Every configured tenant with its effective name, source first.
    pub fn tenants(&self) -> impl Iterator<Item = (Role, String, &TenantEntry)> {
        let source = self
            .source
            .iter()
            .map(|entry| (Role::Source, entry.effective_name(Role::Source, 0), entry));
        let destinations = self.destinations.iter().enumerate().map(|(i, entry)| {
            (
                Role::Destination,
                entry.effective_name(Role::Destination, i),
                entry,
            )
        });
        source.chain(destinations)
    }
}

impl TenantEntry {
    /// Configured name, or the positional default (`index` is 0-based).
    pub fn effective_name(&self, role: Role, index: usize) -> String {
        match (&self.name, role) {
            (Some(name), _) => name.clone(),
            (None, Role::Source) => "Source".into(),
            (None, Role::Destination) => format!("Tenant {}", index + 1),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Platform config path (`~/.config/dlpsync/config.toml` on Linux).
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "dlpsync", "dlpsync").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("dlpsync");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Pick the file to load: an explicit path, else `./config.yaml` when
/// present, else the platform path.
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from(DEFAULT_FILE);
    if local.is_file() {
        return local;
    }
    config_path()
}

// ── Config loading ──────────────────────────────────────────────────

/// Load `path` merged with `DLPSYNC_*` environment variables
/// (`__` separates nesting, e.g. `DLPSYNC_API__TIMEOUT=60`).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
    figment = if is_yaml {
        figment.merge(Yaml::file(path))
    } else {
        figment.merge(Toml::file(path))
    };
    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["config"]));

    Ok(figment.extract()?)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a tenant's API key: `api_key_env` variable, then the system
/// keyring (`dlpsync` / `<tenant>/api-key`), then plaintext `api_key`.
pub fn resolve_api_key(entry: &TenantEntry, tenant: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = entry.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(keyring_entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{tenant}/api-key")) {
        if let Ok(secret) = keyring_entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(ref key) = entry.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        tenant: tenant.into(),
    })
}

fn tenant_config(entry: &TenantEntry, name: String) -> Result<TenantConfig, ConfigError> {
    if entry.service_account.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: format!("{name}.service_account"),
            reason: "must not be empty".into(),
        });
    }
    if entry.tsg_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: format!("{name}.tsg_id"),
            reason: "must not be empty".into(),
        });
    }
    let api_key = resolve_api_key(entry, &name)?;
    Ok(TenantConfig {
        name,
        service_account: entry.service_account.clone(),
        api_key,
        tsg_id: entry.tsg_id.clone(),
    })
}

fn api_settings(api: &ApiSection) -> Result<ApiSettings, ConfigError> {
    let invalid_url = |field: &str, value: &str| ConfigError::Validation {
        field: format!("api.{field}"),
        reason: format!("invalid URL: {value}"),
    };

    let auth_url = url::Url::parse(&api.auth_url).map_err(|_| invalid_url("auth_url", &api.auth_url))?;
    let endpoints = Endpoints::new(&api.data_pattern_url, &api.data_profile_url).map_err(|_| {
        invalid_url(
            "data_pattern_url/data_profile_url",
            &format!("{} / {}", api.data_pattern_url, api.data_profile_url),
        )
    })?;

    let tls = if api.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca) = api.ca_cert {
        TlsMode::CustomCa(ca.clone())
    } else {
        TlsMode::System
    };

    Ok(ApiSettings {
        auth_url,
        endpoints,
        tls,
        timeout: Duration::from_secs(api.timeout),
    })
}

/// Build the runtime configuration, resolving every tenant's API key.
pub fn to_sync_config(config: &Config) -> Result<SyncConfig, ConfigError> {
    let source_entry = config.source.as_ref().ok_or_else(|| ConfigError::Validation {
        field: "source".into(),
        reason: "no source tenant configured".into(),
    })?;
    if config.destinations.is_empty() {
        return Err(ConfigError::Validation {
            field: "destinations".into(),
            reason: "at least one destination tenant is required".into(),
        });
    }

    let source = tenant_config(source_entry, source_entry.effective_name(Role::Source, 0))?;
    let destinations = config
        .destinations
        .iter()
        .enumerate()
        .map(|(i, entry)| tenant_config(entry, entry.effective_name(Role::Destination, i)))
        .collect::<Result<Vec<_>, _>>()?;

    let sync = SyncConfig {
        source,
        destinations,
        api: api_settings(&config.api)?,
    };
    sync.validate().map_err(|e| ConfigError::Validation {
        field: "destinations".into(),
        reason: e.to_string(),
    })?;
    Ok(sync)
}
