// ── Classification ──
//
// Splits a source collection into what a destination is missing, what
// it holds in a different shape, and what already matches.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::diff::Diff;
use crate::error::CoreError;
use crate::model::{Entity, EntityKind};
use crate::normalize::normalize;
use crate::remap::ReferenceMaps;

/// A source entity whose destination counterpart differs.
#[derive(Debug, Clone, Serialize)]
pub struct PendingUpdate {
    /// The source entity as fetched (not normalized, not rewritten).
    pub source: Entity,
    /// The destination entity it replaces; its ID is the update target.
    pub destination: Entity,
    pub diff: Diff,
}

impl PendingUpdate {
    pub fn name(&self) -> &str {
        self.source.display_name()
    }
}

/// What one destination needs for one entity kind.
#[derive(Debug, Clone)]
pub struct Plan {
    pub kind: EntityKind,
    pub to_create: Vec<Entity>,
    pub to_update: Vec<PendingUpdate>,
    pub identical: Vec<Entity>,
}

impl Plan {
    pub fn empty(kind: EntityKind) -> Self {
        Self {
            kind,
            to_create: Vec::new(),
            to_update: Vec::new(),
            identical: Vec::new(),
        }
    }
}

/// Classify `source` against `destination`.
///
/// Both sides are indexed by name. A source name seen twice keeps its
/// first position and its last value; a destination name seen twice
/// keeps its last value. Matched pairs are normalized and the source
/// side rewritten through `refs` before comparison.
pub fn classify(
    kind: EntityKind,
    source: &[Entity],
    destination: &[Entity],
    refs: ReferenceMaps<'_>,
) -> Result<Plan, CoreError> {
    let mut source_by_name: IndexMap<&str, &Entity> = IndexMap::with_capacity(source.len());
    for entity in source {
        source_by_name.insert(entity.require_name(kind)?, entity);
    }

    let mut dest_by_name: HashMap<&str, &Entity> = HashMap::with_capacity(destination.len());
    for entity in destination {
        dest_by_name.insert(entity.require_name(kind)?, entity);
    }

    let mut plan = Plan::empty(kind);
    for (name, src) in source_by_name {
        let Some(dst) = dest_by_name.get(name) else {
            plan.to_create.push(src.clone());
            continue;
        };

        let wanted = refs.rewrite(&normalize(src));
        let current = normalize(dst);
        let diff = Diff::between(&wanted.into_value(), &current.into_value());

        if diff.is_empty() {
            plan.identical.push(src.clone());
        } else {
            plan.to_update.push(PendingUpdate {
                source: src.clone(),
                destination: (*dst).clone(),
                diff,
            });
        }
    }

    Ok(plan)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::identity::{PatternIdMap, ProfileIdMap};
    use crate::model::EntityId;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn list(kind: EntityKind, items: Value) -> Vec<Entity> {
        items
            .as_array()
            .unwrap()
            .iter()
            .map(|v| Entity::from_value(kind, v.clone()).unwrap())
            .collect()
    }

    fn names(entities: &[Entity]) -> Vec<&str> {
        entities.iter().map(Entity::display_name).collect()
    }

    #[test]
    fn source_only_entity_is_created() {
        let source = list(EntityKind::Pattern, json!([{"name": "SSN", "id": "p1"}]));

        let plan = classify(EntityKind::Pattern, &source, &[], ReferenceMaps::none()).unwrap();

        assert_eq!(names(&plan.to_create), vec!["SSN"]);
        assert!(plan.to_update.is_empty());
        assert!(plan.identical.is_empty());
    }

    #[test]
    fn metadata_and_order_differences_are_identical() {
        let source = list(
            EntityKind::Pattern,
            json!([{
                "id": "p1", "name": "SSN", "version": 4, "updated_by": "alice",
                "regexes": [{"regex": "a"}, {"regex": "b"}],
                "supported_confidence_levels": ["high", "low"]
            }]),
        );
        let dest = list(
            EntityKind::Pattern,
            json!([{
                "id": "zz", "name": "SSN", "version": 1, "tenant_id": "t2",
                "regexes": [{"regex": "b"}, {"regex": "a"}],
                "supported_confidence_levels": ["low"]
            }]),
        );

        let plan = classify(EntityKind::Pattern, &source, &dest, ReferenceMaps::none()).unwrap();

        assert_eq!(names(&plan.identical), vec!["SSN"]);
        assert!(plan.to_create.is_empty() && plan.to_update.is_empty());
    }

    #[test]
    fn changed_body_is_an_update_against_destination() {
        let source = list(EntityKind::Pattern, json!([{"id": "p1", "name": "SSN", "description": "new"}]));
        let dest = list(EntityKind::Pattern, json!([{"id": "d1", "name": "SSN", "description": "old"}]));

        let plan = classify(EntityKind::Pattern, &source, &dest, ReferenceMaps::none()).unwrap();

        assert_eq!(plan.to_update.len(), 1);
        let pending = &plan.to_update[0];
        assert_eq!(pending.name(), "SSN");
        assert_eq!(pending.destination.id(), Some(EntityId::from("d1")));
        assert_eq!(pending.diff.len(), 1);
    }

    #[test]
    fn output_follows_source_order() {
        let source = list(
            EntityKind::Pattern,
            json!([
                {"id": "1", "name": "C"},
                {"id": "2", "name": "A"},
                {"id": "3", "name": "B"}
            ]),
        );

        let plan = classify(EntityKind::Pattern, &source, &[], ReferenceMaps::none()).unwrap();

        assert_eq!(names(&plan.to_create), vec!["C", "A", "B"]);
    }

    #[test]
    fn duplicate_source_name_keeps_first_position_last_value() {
        let source = list(
            EntityKind::Pattern,
            json!([
                {"id": "1", "name": "A", "description": "first"},
                {"id": "2", "name": "B"},
                {"id": "3", "name": "A", "description": "second"}
            ]),
        );

        let plan = classify(EntityKind::Pattern, &source, &[], ReferenceMaps::none()).unwrap();

        assert_eq!(names(&plan.to_create), vec!["A", "B"]);
        assert_eq!(plan.to_create[0].get("description"), Some(&json!("second")));
    }

    #[test]
    fn references_are_rewritten_before_comparison() {
        let source = list(
            EntityKind::Profile,
            json!([{
                "id": 1, "name": "PCI", "profile_type": "custom",
                "detection_rules": [
                    {"rule_type": "simple", "expression_tree": {"rule_item": {"id": "p1"}}},
                    {"rule_type": "multi_profile", "multi_profile": {"data_profile_ids": [7]}}
                ]
            }]),
        );
        let dest = list(
            EntityKind::Profile,
            json!([{
                "id": 40, "name": "PCI", "profile_type": "custom",
                "detection_rules": [
                    {"rule_type": "multi_profile", "multi_profile": {"data_profile_ids": [70]}},
                    {"rule_type": "simple", "expression_tree": {"rule_item": {"id": "p9"}}}
                ]
            }]),
        );
        let patterns: PatternIdMap = [(EntityId::from("p1"), EntityId::from("p9"))]
            .into_iter()
            .collect();
        let profiles: ProfileIdMap = [(EntityId::from(7), EntityId::from(70))]
            .into_iter()
            .collect();

        let plan = classify(
            EntityKind::Profile,
            &source,
            &dest,
            ReferenceMaps::new(&patterns, &profiles),
        )
        .unwrap();

        assert_eq!(names(&plan.identical), vec!["PCI"]);

        // Without the maps the same pair differs.
        let unmapped =
            classify(EntityKind::Profile, &source, &dest, ReferenceMaps::none()).unwrap();
        assert_eq!(unmapped.to_update.len(), 1);
    }

    #[test]
    fn unnamed_entity_fails_classification() {
        let source = list(EntityKind::Pattern, json!([{"id": "p1"}]));

        let err = classify(EntityKind::Pattern, &source, &[], ReferenceMaps::none()).unwrap_err();

        assert!(matches!(err, CoreError::MissingField { field: "name", .. }));
    }
}
