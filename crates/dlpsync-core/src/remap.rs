// ── Cross-reference rewriting ──
//
// Profiles point at patterns (advance rules, expression trees) and at
// other profiles (multi-profile rules) by ID. Before a profile is
// compared with or written to a destination, every reference is
// translated into the destination's ID space.
//
// Every function here builds a new value; inputs are never mutated.
// References with no counterpart at the destination are passed through
// unchanged. That can leave a dangling reference, or worse point at an
// unrelated entity if the ID spaces overlap, so each one is traced.

use serde_json::Value;
use tracing::debug;

use crate::identity::{IdentityMap, PatternIdMap, ProfileIdMap};
use crate::model::{Entity, EntityId, KindMarker};

const ADVANCE_RULES: &str = "advance_data_patterns_rules";
const DETECTION_RULES: &str = "detection_rules";
const CONDITIONS: &str = "conditions";
const RULE_ITEMS: &str = "rule_items";
const EXPRESSION_TREE: &str = "expression_tree";
const RULE_ITEM: &str = "rule_item";
const SUB_EXPRESSIONS: &str = "sub_expressions";
const RULE_TYPE: &str = "rule_type";
const MULTI_PROFILE: &str = "multi_profile";
const DATA_PROFILE_IDS: &str = "data_profile_ids";

/// Discriminant of a `detection_rules[]` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionRuleType {
    /// Pattern expression tree.
    Simple,
    /// Composition of other profiles.
    MultiProfile,
    /// Anything the engine does not interpret.
    Other,
}

impl DetectionRuleType {
    pub fn of(rule: &Value) -> Self {
        match rule.get(RULE_TYPE).and_then(Value::as_str) {
            Some("simple") => Self::Simple,
            Some(MULTI_PROFILE) => Self::MultiProfile,
            _ => Self::Other,
        }
    }
}

// ── Public entry points ──────────────────────────────────────────────

/// Rewrite every data-pattern reference in `profile`:
/// `advance_data_patterns_rules[].conditions[].rule_items[].id` and every
/// `rule_item.id` in each `detection_rules[].expression_tree`.
pub fn remap_pattern_refs(profile: &Entity, patterns: &PatternIdMap) -> Entity {
    rewrite_entity(profile, |key, value| match key {
        ADVANCE_RULES => Some(map_array(value, |rule| remap_advance_rule(rule, patterns))),
        DETECTION_RULES => Some(map_array(value, |rule| {
            with_fields(rule, |key, value| {
                (key == EXPRESSION_TREE).then(|| remap_expression(value, patterns))
            })
        })),
        _ => None,
    })
}

/// Rewrite the `data_profile_ids` of every multi-profile detection rule.
pub fn remap_profile_refs(profile: &Entity, profiles: &ProfileIdMap) -> Entity {
    rewrite_entity(profile, |key, value| {
        (key == DETECTION_RULES).then(|| {
            map_array(value, |rule| {
                if DetectionRuleType::of(rule) == DetectionRuleType::MultiProfile {
                    remap_multi_profile_rule(rule, profiles)
                } else {
                    rule.clone()
                }
            })
        })
    })
}

/// Rewrite one expression-tree node and, depth-first, all of its
/// `sub_expressions`. Tree shape and child order are preserved.
pub fn remap_expression(node: &Value, patterns: &PatternIdMap) -> Value {
    with_fields(node, |key, value| match key {
        RULE_ITEM => Some(remap_id_field(value, patterns)),
        SUB_EXPRESSIONS => Some(map_array(value, |child| remap_expression(child, patterns))),
        _ => None,
    })
}

/// The identity maps a rewrite should apply. Either side may be absent:
/// data patterns carry no references at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceMaps<'a> {
    pub patterns: Option<&'a PatternIdMap>,
    pub profiles: Option<&'a ProfileIdMap>,
}

impl<'a> ReferenceMaps<'a> {
    /// No rewriting.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(patterns: &'a PatternIdMap, profiles: &'a ProfileIdMap) -> Self {
        Self {
            patterns: Some(patterns),
            profiles: Some(profiles),
        }
    }

    /// Apply the pattern map, then the profile map.
    pub fn rewrite(&self, entity: &Entity) -> Entity {
        let rewritten = match self.patterns {
            Some(patterns) => remap_pattern_refs(entity, patterns),
            None => entity.clone(),
        };
        match self.profiles {
            Some(profiles) => remap_profile_refs(&rewritten, profiles),
            None => rewritten,
        }
    }
}

// ── Rule shapes ──────────────────────────────────────────────────────

fn remap_advance_rule(rule: &Value, patterns: &PatternIdMap) -> Value {
    with_fields(rule, |key, conditions| {
        (key == CONDITIONS).then(|| {
            map_array(conditions, |condition| {
                with_fields(condition, |key, items| {
                    (key == RULE_ITEMS)
                        .then(|| map_array(items, |item| remap_id_field(item, patterns)))
                })
            })
        })
    })
}

/// Profile IDs live at `multi_profile.data_profile_ids`; a flat
/// `data_profile_ids` on the rule itself is rewritten as well.
fn remap_multi_profile_rule(rule: &Value, profiles: &ProfileIdMap) -> Value {
    with_fields(rule, |key, value| match key {
        MULTI_PROFILE => Some(with_fields(value, |key, ids| {
            (key == DATA_PROFILE_IDS).then(|| remap_id_list(ids, profiles))
        })),
        DATA_PROFILE_IDS => Some(remap_id_list(value, profiles)),
        _ => None,
    })
}

fn remap_id_list<K: KindMarker>(ids: &Value, map: &IdentityMap<K>) -> Value {
    map_array(ids, |id| translate(id, map).unwrap_or_else(|| id.clone()))
}

/// Rewrite the `id` field of a `{id, ...}` reference object.
fn remap_id_field<K: KindMarker>(item: &Value, map: &IdentityMap<K>) -> Value {
    with_fields(item, |key, id| {
        (key == "id").then(|| translate(id, map).unwrap_or_else(|| id.clone()))
    })
}

fn translate<K: KindMarker>(raw: &Value, map: &IdentityMap<K>) -> Option<Value> {
    let id = EntityId::from_json(raw)?;
    if let Some(dest) = map.get(&id) {
        return Some(dest.to_json());
    }
    debug!(kind = %K::KIND, %id, "reference has no counterpart at destination; left unchanged");
    None
}

// ── Structural helpers ───────────────────────────────────────────────

fn rewrite_entity(
    entity: &Entity,
    mut rewrite: impl FnMut(&str, &Value) -> Option<Value>,
) -> Entity {
    Entity::from_map(
        entity
            .fields()
            .iter()
            .map(|(key, value)| {
                let next = rewrite(key, value).unwrap_or_else(|| value.clone());
                (key.clone(), next)
            })
            .collect(),
    )
}

/// Copy an object, replacing each field for which `rewrite` returns
/// `Some`. Non-objects are copied unchanged.
fn with_fields(node: &Value, mut rewrite: impl FnMut(&str, &Value) -> Option<Value>) -> Value {
    match node {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, value)| {
                    let next = rewrite(key, value).unwrap_or_else(|| value.clone());
                    (key.clone(), next)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Copy an array, mapping each element. Non-arrays (including `null`)
/// are copied unchanged.
fn map_array(node: &Value, f: impl FnMut(&Value) -> Value) -> Value {
    match node {
        Value::Array(items) => Value::Array(items.iter().map(f).collect()),
        other => other.clone(),
    }
}
