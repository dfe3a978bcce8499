// ── Run report ──
//
// Plain serializable values assembled by the orchestrator and rendered
// by the CLI as a table, JSON or YAML. Built and discarded per run.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::apply::ApplyOutcome;
use crate::diff::Diff;
use crate::model::Entity;
use crate::plan::Plan;
use crate::tenant::RejectedTenant;

/// A planned update and what differs.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateEntry {
    pub name: String,
    pub diff: Diff,
}

/// Tallies for one entity kind at one destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub to_create: usize,
    pub to_update: usize,
    pub identical: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
}

/// Plan and, when executed, outcome for one entity kind.
///
/// Serializes with a `counts` field computed from the lists.
#[derive(Debug, Clone, Default)]
pub struct KindReport {
    pub to_create: Vec<String>,
    pub to_update: Vec<UpdateEntry>,
    pub identical: Vec<String>,
    pub applied: Option<ApplyOutcome>,
}

impl KindReport {
    pub fn from_plan(plan: &Plan) -> Self {
        let names = |entities: &[Entity]| {
            entities
                .iter()
                .map(|e| e.display_name().to_owned())
                .collect::<Vec<_>>()
        };
        Self {
            to_create: names(&plan.to_create),
            to_update: plan
                .to_update
                .iter()
                .map(|u| UpdateEntry {
                    name: u.name().to_owned(),
                    diff: u.diff.clone(),
                })
                .collect(),
            identical: names(&plan.identical),
            applied: None,
        }
    }

    /// Attach what executing the plan did.
    #[must_use]
    pub fn with_outcome(mut self, outcome: ApplyOutcome) -> Self {
        self.applied = Some(outcome);
        self
    }

    pub fn counts(&self) -> KindCounts {
        let applied = self.applied.as_ref();
        KindCounts {
            to_create: self.to_create.len(),
            to_update: self.to_update.len(),
            identical: self.identical.len(),
            created: applied.map_or(0, |a| a.created.len()),
            updated: applied.map_or(0, |a| a.updated.len()),
            errors: applied.map_or(0, |a| a.errors.len()),
        }
    }

    /// Creates plus updates the plan calls for.
    pub fn pending_writes(&self) -> usize {
        self.to_create.len() + self.to_update.len()
    }

    pub fn has_errors(&self) -> bool {
        self.applied.as_ref().is_some_and(ApplyOutcome::has_errors)
    }
}

impl Serialize for KindReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.applied.is_some() { 5 } else { 4 };
        let mut state = serializer.serialize_struct("KindReport", fields)?;
        state.serialize_field("counts", &self.counts())?;
        state.serialize_field("to_create", &self.to_create)?;
        state.serialize_field("to_update", &self.to_update)?;
        state.serialize_field("identical", &self.identical)?;
        if let Some(applied) = &self.applied {
            state.serialize_field("applied", applied)?;
        } else {
            state.skip_field("applied")?;
        }
        state.end()
    }
}

/// Both phases at one destination.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TenantReport {
    pub patterns: KindReport,
    pub profiles: KindReport,
}

impl TenantReport {
    pub fn pending_writes(&self) -> usize {
        self.patterns.pending_writes() + self.profiles.pending_writes()
    }

    pub fn has_errors(&self) -> bool {
        self.patterns.has_errors() || self.profiles.has_errors()
    }
}

/// Result for one destination: a full report, or the error that ended
/// its processing.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DestinationReport {
    Synced(TenantReport),
    Failed { error: String },
}

impl DestinationReport {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Everything one run did or would do.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub source_name: String,
    /// Custom data patterns at the source.
    pub source_patterns: usize,
    /// Custom data profiles at the source.
    pub source_profiles: usize,
    pub dry_run: bool,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedTenant>,
    /// Keyed by destination name, in processing order.
    pub destinations: IndexMap<String, DestinationReport>,
}

impl SyncReport {
    /// Any destination failed or any item failed to write.
    pub fn has_failures(&self) -> bool {
        self.destinations.values().any(|d| match d {
            DestinationReport::Synced(t) => t.has_errors(),
            failed => failed.is_failed(),
        })
    }

    /// Any destination still has creates or updates to make.
    pub fn has_pending_writes(&self) -> bool {
        self.destinations.values().any(|d| match d {
            DestinationReport::Synced(t) => t.pending_writes() > 0,
            DestinationReport::Failed { .. } => false,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::apply::{ApplyFailure, Operation};
    use crate::model::EntityKind;
    use crate::plan::PendingUpdate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entity(name: &str) -> Entity {
        Entity::from_value(EntityKind::Pattern, json!({"id": name, "name": name})).unwrap()
    }

    fn plan() -> Plan {
        let mut plan = Plan::empty(EntityKind::Pattern);
        plan.to_create = vec![entity("A"), entity("B")];
        plan.to_update = vec![PendingUpdate {
            source: entity("C"),
            destination: entity("C"),
            diff: Diff::between(&json!({"x": 1}), &json!({"x": 2})),
        }];
        plan.identical = vec![entity("D")];
        plan
    }

    #[test]
    fn counts_follow_plan_and_outcome() {
        let report = KindReport::from_plan(&plan());
        let counts = report.counts();
        assert_eq!(counts.to_create, 2);
        assert_eq!(counts.to_update, 1);
        assert_eq!(counts.identical, 1);
        assert_eq!(counts.created, 0);
        assert_eq!(report.pending_writes(), 3);
        assert!(!report.has_errors());

        let report = report.with_outcome(ApplyOutcome {
            created: vec!["A".into()],
            updated: vec!["C".into()],
            errors: vec![ApplyFailure {
                name: "B".into(),
                operation: Operation::Create,
                message: "HTTP 409".into(),
            }],
        });
        let counts = report.counts();
        assert_eq!(counts.created, 1);
        assert_eq!(counts.updated, 1);
        assert_eq!(counts.errors, 1);
        assert!(report.has_errors());
    }

    #[test]
    fn failed_destination_serializes_as_error_only() {
        let failed = DestinationReport::Failed {
            error: "Failed to list data patterns: timed out".into(),
        };
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"error": "Failed to list data patterns: timed out"})
        );
        assert!(failed.is_failed());
    }

    #[test]
    fn executed_report_serializes_counts_from_outcome() {
        let report = KindReport::from_plan(&plan()).with_outcome(ApplyOutcome {
            created: vec!["A".into(), "B".into()],
            ..ApplyOutcome::default()
        });
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["counts"]["created"], 2);
        assert_eq!(value["counts"]["errors"], 0);
        assert_eq!(value["applied"]["created"], json!(["A", "B"]));
    }

    #[test]
    fn pending_writes_ignore_failed_destinations() {
        let mut destinations = IndexMap::new();
        destinations.insert(
            "Broken".to_owned(),
            DestinationReport::Failed {
                error: "timed out".into(),
            },
        );
        let mut report = SyncReport {
            source_name: "HQ".into(),
            source_patterns: 0,
            source_profiles: 0,
            dry_run: true,
            generated_at: Utc::now(),
            rejected: Vec::new(),
            destinations,
        };
        assert!(!report.has_pending_writes());
        assert!(report.has_failures());

        report.destinations.insert(
            "Prod".to_owned(),
            DestinationReport::Synced(TenantReport {
                patterns: KindReport::from_plan(&plan()),
                profiles: KindReport::default(),
            }),
        );
        assert!(report.has_pending_writes());
    }

    #[test]
    fn dry_run_report_omits_applied() {
        let value = serde_json::to_value(KindReport::from_plan(&plan())).unwrap();
        assert!(value.get("applied").is_none());
        assert_eq!(value["counts"]["to_create"], 2);
        assert_eq!(value["counts"]["identical"], 1);
        assert_eq!(value["to_create"], json!(["A", "B"]));
        assert_eq!(value["to_update"][0]["name"], "C");
    }
}
