// ── Tenant access seams ──
//
// The engine never talks HTTP itself. It reads and writes through an
// `EntityStore` per tenant and obtains stores from an `Authenticator`.
// `tenant.rs` holds the implementations backed by `dlpsync-api`; tests
// plug in in-memory fakes.

use std::future::Future;

use crate::config::TenantConfig;
use crate::error::CoreError;
use crate::model::{Entity, EntityId, EntityKind};

/// Read/write access to one tenant's entity collections.
pub trait EntityStore: Send + Sync {
    /// Tenant name, for logs and reports.
    fn name(&self) -> &str;

    /// Every entity of `kind`, predefined ones included.
    fn list_all(
        &self,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Vec<Entity>, CoreError>> + Send;

    /// Create `body` and return the service's response.
    fn create(
        &self,
        kind: EntityKind,
        body: &Entity,
    ) -> impl Future<Output = Result<Entity, CoreError>> + Send;

    /// Replace entity `id` with `body` and return the service's response.
    fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        body: &Entity,
    ) -> impl Future<Output = Result<Entity, CoreError>> + Send;

    /// Entities of `kind`, optionally restricted to custom ones.
    fn list(
        &self,
        kind: EntityKind,
        custom_only: bool,
    ) -> impl Future<Output = Result<Vec<Entity>, CoreError>> + Send {
        async move {
            let mut entities = self.list_all(kind).await?;
            if custom_only {
                entities.retain(|e| e.is_custom(kind));
            }
            Ok(entities)
        }
    }
}

/// Turns tenant credentials into an authenticated store.
pub trait Authenticator: Send + Sync {
    type Store: EntityStore;

    fn authenticate(
        &self,
        tenant: &TenantConfig,
    ) -> impl Future<Output = Result<Self::Store, CoreError>> + Send;
}
