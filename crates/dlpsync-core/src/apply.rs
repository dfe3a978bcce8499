// ── Plan execution ──
//
// Writes a classified plan to one destination. Every item is attempted;
// a failed create or update is recorded and the next item proceeds.
// Nothing is ever deleted.

use serde::Serialize;
use strum::Display;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{Entity, EntityId};
use crate::normalize::normalize;
use crate::plan::{PendingUpdate, Plan};
use crate::remap::ReferenceMaps;
use crate::store::EntityStore;

/// Which write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
}

/// One item that could not be written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplyFailure {
    pub name: String,
    pub operation: Operation,
    pub message: String,
}

/// What applying a plan actually did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplyOutcome {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub errors: Vec<ApplyFailure>,
}

impl ApplyOutcome {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn fail(&mut self, name: &str, operation: Operation, err: &CoreError) {
        warn!(entity = name, %operation, error = %err, "write failed");
        self.errors.push(ApplyFailure {
            name: name.to_owned(),
            operation,
            message: err.to_string(),
        });
    }
}

/// Creates first (plan order), then updates (plan order).
pub async fn apply_plan<S: EntityStore>(
    store: &S,
    plan: &Plan,
    refs: ReferenceMaps<'_>,
) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();

    for entity in &plan.to_create {
        let name = entity.display_name();
        match create_one(store, plan, entity, refs).await {
            Ok(()) => outcome.created.push(name.to_owned()),
            Err(e) => outcome.fail(name, Operation::Create, &e),
        }
    }

    for pending in &plan.to_update {
        let name = pending.name();
        match update_one(store, plan, pending, refs).await {
            Ok(()) => outcome.updated.push(name.to_owned()),
            Err(e) => outcome.fail(name, Operation::Update, &e),
        }
    }

    info!(
        tenant = store.name(),
        kind = %plan.kind,
        created = outcome.created.len(),
        updated = outcome.updated.len(),
        failed = outcome.errors.len(),
        "applied"
    );
    outcome
}

async fn create_one<S: EntityStore>(
    store: &S,
    plan: &Plan,
    entity: &Entity,
    refs: ReferenceMaps<'_>,
) -> Result<(), CoreError> {
    refuse_predefined(plan, entity)?;
    let body = refs.rewrite(&normalize(entity));
    debug!(tenant = store.name(), kind = %plan.kind, entity = entity.display_name(), "create");
    store.create(plan.kind, &body).await?;
    Ok(())
}

async fn update_one<S: EntityStore>(
    store: &S,
    plan: &Plan,
    pending: &PendingUpdate,
    refs: ReferenceMaps<'_>,
) -> Result<(), CoreError> {
    refuse_predefined(plan, &pending.source)?;
    let target: EntityId = pending.destination.require_id(plan.kind)?;
    let body = refs.rewrite(&normalize(&pending.source));
    debug!(tenant = store.name(), kind = %plan.kind, entity = pending.name(), id = %target, "update");
    store.update(plan.kind, &target, &body).await?;
    Ok(())
}

fn refuse_predefined(plan: &Plan, entity: &Entity) -> Result<(), CoreError> {
    if entity.is_predefined(plan.kind) {
        return Err(CoreError::ReadOnly {
            kind: plan.kind,
            name: entity.display_name().to_owned(),
        });
    }
    Ok(())
}
