// ── Entity kinds ──

use serde::{Deserialize, Serialize};
use strum::Display;

/// The two entity collections a tenant exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[strum(serialize = "data pattern")]
    Pattern,
    #[strum(serialize = "data profile")]
    Profile,
}

impl EntityKind {
    /// Field that tells predefined entities from custom ones.
    pub fn type_field(self) -> &'static str {
        match self {
            Self::Pattern => "type",
            Self::Profile => "profile_type",
        }
    }
}

/// Type-level tag for an entity kind.
///
/// Lets identity maps for patterns and profiles be distinct types, so a
/// profile map can never be passed where a pattern map is expected.
pub trait KindMarker {
    const KIND: EntityKind;
}

/// Marker for data patterns.
#[derive(Debug, Clone, Copy)]
pub enum Patterns {}

/// Marker for data profiles.
#[derive(Debug, Clone, Copy)]
pub enum Profiles {}

impl KindMarker for Patterns {
    const KIND: EntityKind = EntityKind::Pattern;
}

impl KindMarker for Profiles {
    const KIND: EntityKind = EntityKind::Profile;
}
