// ── Runtime tenant configuration ──
//
// These types describe *how* to reach a tenant. They carry credentials
// and endpoint tuning but never touch disk: the CLI resolves files,
// environment and keyring, then hands a `SyncConfig` in.

use std::fmt;
use std::time::Duration;

use dlpsync_api::{DEFAULT_AUTH_URL, Endpoints, TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// Credentials and scope for one tenant.
#[derive(Clone)]
pub struct TenantConfig {
    /// Display name; also the key destinations are selected by.
    pub name: String,
    pub service_account: String,
    pub api_key: SecretString,
    /// Tenant service group the token is scoped to.
    pub tsg_id: String,
}

impl TenantConfig {
    /// OAuth2 scope requested for this tenant.
    pub fn scope(&self) -> String {
        format!("tsg_id:{}", self.tsg_id)
    }
}

impl fmt::Debug for TenantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantConfig")
            .field("name", &self.name)
            .field("service_account", &self.service_account)
            .field("api_key", &"[REDACTED]")
            .field("tsg_id", &self.tsg_id)
            .finish()
    }
}

/// Where the remote service lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub auth_url: Url,
    pub endpoints: Endpoints,
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl ApiSettings {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            auth_url: default_auth_url(),
            endpoints: Endpoints::default(),
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

fn default_auth_url() -> Url {
    Url::parse(DEFAULT_AUTH_URL).unwrap_or_else(|_| unreachable!("default auth URL is valid"))
}

/// Everything a run needs: one source, any number of destinations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub source: TenantConfig,
    pub destinations: Vec<TenantConfig>,
    pub api: ApiSettings,
}

impl SyncConfig {
    /// Reject configurations no run could succeed with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.destinations.is_empty() {
            return Err(CoreError::Config {
                message: "no destination tenants configured".into(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for tenant in &self.destinations {
            if !seen.insert(tenant.name.as_str()) {
                return Err(CoreError::Config {
                    message: format!("destination name '{}' is used more than once", tenant.name),
                });
            }
        }
        Ok(())
    }
}
