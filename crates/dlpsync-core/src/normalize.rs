// ── Metadata stripping ──
//
// Tenant-assigned bookkeeping fields differ between tenants for the
// same logical entity. They are removed before every comparison and
// before every write.

use crate::model::Entity;

/// Top-level fields that are never compared and never written.
pub const METADATA_FIELDS: [&str; 8] = [
    "id",
    "created_at",
    "created_by",
    "updated_at",
    "updated_by",
    "version",
    "tenant",
    "tenant_id",
];

/// Copy of `entity` without the [`METADATA_FIELDS`]. Nested structures
/// are kept verbatim, including any nested `id` fields (those are
/// references, not metadata).
pub fn normalize(entity: &Entity) -> Entity {
    let fields = entity
        .fields()
        .iter()
        .filter(|(key, _)| !METADATA_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Entity::from_map(fields)
}
