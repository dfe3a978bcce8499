//! Reconciliation engine between `dlpsync-api` and the `dlpsync` CLI.
//!
//! One source tenant is authoritative; its custom data patterns and data
//! profiles are pushed to any number of destination tenants. IDs are
//! tenant-local, so entities are joined by name and every ID a profile
//! embeds is translated before it is compared or written.
//!
//! - **[`Synchronizer`]** runs the two phases (patterns, then profiles)
//!   for each selected destination and returns a [`SyncReport`].
//! - **[`classify`]** splits a source collection into create / update /
//!   identical against one destination, using an order-insensitive
//!   structural [`Diff`].
//! - **[`apply_plan`]** writes a [`Plan`] with per-item failure isolation.
//! - **[`remap`]** rewrites pattern and profile references through typed
//!   [`IdentityMap`]s; it never mutates its input.
//! - **[`EntityStore`]** / **[`Authenticator`]** are the seams to the
//!   remote service. [`TenantStore`] and [`ApiAuthenticator`] implement
//!   them over `dlpsync-api`.

pub mod apply;
pub mod config;
pub mod diff;
pub mod error;
pub mod identity;
pub mod model;
pub mod normalize;
pub mod plan;
pub mod remap;
pub mod report;
pub mod store;
pub mod sync;
pub mod tenant;

// ── Primary re-exports ──────────────────────────────────────────────
pub use apply::{ApplyFailure, ApplyOutcome, Operation, apply_plan};
pub use config::{ApiSettings, SyncConfig, TenantConfig};
pub use diff::{Change, Diff};
pub use error::CoreError;
pub use identity::{IdentityMap, PatternIdMap, ProfileIdMap};
pub use model::{Entity, EntityId, EntityKind};
pub use normalize::normalize;
pub use plan::{PendingUpdate, Plan, classify};
pub use remap::{ReferenceMaps, remap_pattern_refs, remap_profile_refs};
pub use report::{DestinationReport, KindCounts, KindReport, SyncReport, TenantReport, UpdateEntry};
pub use store::{Authenticator, EntityStore};
pub use sync::{RunOptions, SyncOutcome, Synchronizer};
pub use tenant::{ApiAuthenticator, RejectedTenant, Session, TenantStore, establish};
