// ── Tenant sessions ──
//
// Authenticates the source and every destination up front. The source
// must succeed; a destination that fails is reported as rejected and
// left out of the run.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use dlpsync_api::{ClientCredentials, DlpClient};

use crate::config::{ApiSettings, TenantConfig};
use crate::error::CoreError;
use crate::model::{Entity, EntityId, EntityKind};
use crate::store::{Authenticator, EntityStore};

// ── API-backed store ─────────────────────────────────────────────────

/// [`EntityStore`] over one tenant's authenticated [`DlpClient`].
pub struct TenantStore {
    name: String,
    client: DlpClient,
}

impl TenantStore {
    pub fn new(name: impl Into<String>, client: DlpClient) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }
}

impl EntityStore for TenantStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_all(&self, kind: EntityKind) -> Result<Vec<Entity>, CoreError> {
        let raw = match kind {
            EntityKind::Pattern => self.client.list_data_patterns().await,
            EntityKind::Profile => self.client.list_data_profiles().await,
        }
        .map_err(|e| CoreError::fetch(kind, e))?;

        debug!(tenant = %self.name, %kind, count = raw.len(), "listed");
        raw.into_iter()
            .map(|value| Entity::from_value(kind, value))
            .collect()
    }

    async fn create(&self, kind: EntityKind, body: &Entity) -> Result<Entity, CoreError> {
        let body = body.to_value();
        let response = match kind {
            EntityKind::Pattern => self.client.create_data_pattern(&body).await?,
            EntityKind::Profile => self.client.create_data_profile(&body).await?,
        };
        response_entity(kind, response)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        body: &Entity,
    ) -> Result<Entity, CoreError> {
        let id = id.to_string();
        let body = body.to_value();
        let response = match kind {
            EntityKind::Pattern => self.client.update_data_pattern(&id, &body).await?,
            EntityKind::Profile => self.client.update_data_profile(&id, &body).await?,
        };
        response_entity(kind, response)
    }
}

/// Write responses are not always objects; wrap anything else.
fn response_entity(kind: EntityKind, response: Value) -> Result<Entity, CoreError> {
    match response {
        Value::Object(_) => Entity::from_value(kind, response),
        other => Ok(Entity::from_map(
            [("response".to_owned(), other)].into_iter().collect(),
        )),
    }
}

// ── Authenticator ────────────────────────────────────────────────────

/// Exchanges client credentials for a bearer token per tenant.
#[derive(Debug, Clone, Default)]
pub struct ApiAuthenticator {
    settings: ApiSettings,
}

impl ApiAuthenticator {
    pub fn new(settings: ApiSettings) -> Self {
        Self { settings }
    }
}

impl Authenticator for ApiAuthenticator {
    type Store = TenantStore;

    async fn authenticate(&self, tenant: &TenantConfig) -> Result<TenantStore, CoreError> {
        let credentials = ClientCredentials {
            service_account: tenant.service_account.clone(),
            api_key: tenant.api_key.clone(),
            scope: tenant.scope(),
        };
        let client = DlpClient::connect(
            &self.settings.auth_url,
            &credentials,
            self.settings.endpoints.clone(),
            &self.settings.transport(),
        )
        .await
        .map_err(|e| auth_failure(&tenant.name, e.into()))?;

        Ok(TenantStore::new(tenant.name.clone(), client))
    }
}

fn auth_failure(tenant: &str, err: CoreError) -> CoreError {
    let message = match err {
        CoreError::AuthenticationFailed { message, .. } => message,
        other => other.to_string(),
    };
    CoreError::AuthenticationFailed {
        tenant: tenant.to_owned(),
        message,
    }
}

// ── Session ──────────────────────────────────────────────────────────

/// A destination that could not be authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedTenant {
    pub name: String,
    pub reason: String,
}

/// Authenticated stores for one run.
pub struct Session<S> {
    pub source: S,
    pub destinations: Vec<S>,
    pub rejected: Vec<RejectedTenant>,
}

/// Authenticate `source` then each destination in order.
///
/// A source failure is returned as the error. Destination failures are
/// collected in [`Session::rejected`].
pub async fn establish<A: Authenticator>(
    authenticator: &A,
    source: &TenantConfig,
    destinations: &[TenantConfig],
) -> Result<Session<A::Store>, CoreError> {
    let source_store = authenticator
        .authenticate(source)
        .await
        .map_err(|e| auth_failure(&source.name, e))?;
    info!(tenant = %source.name, "source authenticated");

    let mut stores = Vec::with_capacity(destinations.len());
    let mut rejected = Vec::new();
    for tenant in destinations {
        match authenticator.authenticate(tenant).await {
            Ok(store) => {
                info!(tenant = %tenant.name, "destination authenticated");
                stores.push(store);
            }
            Err(e) => {
                let reason = match e {
                    CoreError::AuthenticationFailed { message, .. } => message,
                    other => other.to_string(),
                };
                warn!(tenant = %tenant.name, %reason, "destination rejected");
                rejected.push(RejectedTenant {
                    name: tenant.name.clone(),
                    reason,
                });
            }
        }
    }

    Ok(Session {
        source: source_store,
        destinations: stores,
        rejected,
    })
}
