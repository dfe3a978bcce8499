// ── Entity payloads ──
//
// Entities stay schemaless JSON objects: the engine touches only the
// handful of fields it needs (name, id, type, references) and carries
// everything else verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity_id::EntityId;
use super::kind::EntityKind;
use crate::error::CoreError;

const PREDEFINED: &str = "predefined";
const CUSTOM: &str = "custom";

/// A data pattern or data profile exactly as a tenant returned it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(Map<String, Value>);

impl Entity {
    /// Accept a listing item; anything but a JSON object is rejected.
    pub fn from_value(kind: EntityKind, value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            _ => Err(CoreError::NotAnObject { kind }),
        }
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn id(&self) -> Option<EntityId> {
        self.0.get("id").and_then(EntityId::from_json)
    }

    pub fn require_name(&self, kind: EntityKind) -> Result<&str, CoreError> {
        self.name()
            .ok_or(CoreError::MissingField { kind, field: "name" })
    }

    pub fn require_id(&self, kind: EntityKind) -> Result<EntityId, CoreError> {
        self.id().ok_or(CoreError::MissingField { kind, field: "id" })
    }

    /// Name for logs and reports; never fails.
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or("<unnamed>")
    }

    /// Built-in, read-only entity.
    pub fn is_predefined(&self, kind: EntityKind) -> bool {
        self.0.get(kind.type_field()).and_then(Value::as_str) == Some(PREDEFINED)
    }

    /// Custom (user-authored) entity, as the listing filter defines it:
    /// a pattern is custom unless marked predefined; a profile is custom
    /// only when explicitly marked so.
    pub fn is_custom(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Pattern => !self.is_predefined(kind),
            EntityKind::Profile => {
                self.0.get(kind.type_field()).and_then(Value::as_str) == Some(CUSTOM)
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Entity> for Value {
    fn from(entity: Entity) -> Self {
        entity.into_value()
    }
}

/// Keep only custom entities of `kind`.
pub fn custom_only(kind: EntityKind, entities: &[Entity]) -> Vec<Entity> {
    entities
        .iter()
        .filter(|e| e.is_custom(kind))
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(value: Value) -> Entity {
        Entity::from_value(EntityKind::Pattern, value).unwrap()
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = Entity::from_value(EntityKind::Profile, json!([1, 2])).unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotAnObject {
                kind: EntityKind::Profile
            }
        ));
    }

    #[test]
    fn reads_name_and_id() {
        let e = entity(json!({"id": "p1", "name": "SSN"}));
        assert_eq!(e.name(), Some("SSN"));
        assert_eq!(e.id(), Some(EntityId::from("p1")));
    }

    #[test]
    fn missing_name_is_an_error() {
        let e = entity(json!({"id": "p1"}));
        assert!(matches!(
            e.require_name(EntityKind::Pattern),
            Err(CoreError::MissingField { field: "name", .. })
        ));
        assert_eq!(e.display_name(), "<unnamed>");
    }

    #[test]
    fn pattern_without_type_counts_as_custom() {
        assert!(entity(json!({"name": "A"})).is_custom(EntityKind::Pattern));
        assert!(entity(json!({"name": "A", "type": "custom"})).is_custom(EntityKind::Pattern));
        assert!(!entity(json!({"name": "A", "type": "predefined"})).is_custom(EntityKind::Pattern));
    }

    #[test]
    fn profile_must_be_explicitly_custom() {
        let untyped = entity(json!({"name": "P"}));
        let custom = entity(json!({"name": "P", "profile_type": "custom"}));
        let builtin = entity(json!({"name": "P", "profile_type": "predefined"}));

        assert!(!untyped.is_custom(EntityKind::Profile));
        assert!(custom.is_custom(EntityKind::Profile));
        assert!(!builtin.is_custom(EntityKind::Profile));
        assert!(builtin.is_predefined(EntityKind::Profile));
    }

    #[test]
    fn custom_only_filters_by_kind() {
        let all = vec![
            entity(json!({"name": "A", "type": "predefined"})),
            entity(json!({"name": "B", "type": "custom"})),
        ];
        let custom = custom_only(EntityKind::Pattern, &all);
        assert_eq!(custom.len(), 1);
        assert_eq!(custom[0].name(), Some("B"));
    }
}
