// ── Domain model ──
//
// Entity payloads, their identifiers, and the kind tags that keep
// pattern and profile ID spaces apart.

pub mod entity;
pub mod entity_id;
pub mod kind;

pub use entity::{Entity, custom_only};
pub use entity_id::EntityId;
pub use kind::{EntityKind, KindMarker, Patterns, Profiles};
