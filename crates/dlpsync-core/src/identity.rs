// ── Name-based identity maps ──
//
// IDs are local to a tenant; names are the only join key. A map is
// built fresh for every destination on every run and never persisted.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use crate::error::CoreError;
use crate::model::{Entity, EntityId, KindMarker, Patterns, Profiles};

/// Source-ID to destination-ID translation for one entity kind and one
/// destination.
pub struct IdentityMap<K: KindMarker> {
    ids: HashMap<EntityId, EntityId>,
    _kind: PhantomData<fn() -> K>,
}

/// Translates data-pattern IDs.
pub type PatternIdMap = IdentityMap<Patterns>;

/// Translates data-profile IDs.
pub type ProfileIdMap = IdentityMap<Profiles>;

impl<K: KindMarker> IdentityMap<K> {
    pub fn empty() -> Self {
        Self {
            ids: HashMap::new(),
            _kind: PhantomData,
        }
    }

    /// Join `source` and `destination` on name.
    ///
    /// Source entities whose name is absent at the destination get no
    /// entry. When several destination entities share a name the last one
    /// listed wins.
    pub fn build(source: &[Entity], destination: &[Entity]) -> Result<Self, CoreError> {
        let kind = K::KIND;

        let mut dest_by_name: HashMap<&str, EntityId> = HashMap::with_capacity(destination.len());
        for entity in destination {
            dest_by_name.insert(entity.require_name(kind)?, entity.require_id(kind)?);
        }

        let mut ids = HashMap::new();
        for entity in source {
            let name = entity.require_name(kind)?;
            if let Some(dest_id) = dest_by_name.get(name) {
                ids.insert(entity.require_id(kind)?, dest_id.clone());
            }
        }

        Ok(Self {
            ids,
            _kind: PhantomData,
        })
    }

    pub fn get(&self, source_id: &EntityId) -> Option<&EntityId> {
        self.ids.get(source_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<K: KindMarker> Default for IdentityMap<K> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: KindMarker> Clone for IdentityMap<K> {
    fn clone(&self) -> Self {
        Self {
            ids: self.ids.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: KindMarker> fmt::Debug for IdentityMap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityMap")
            .field("kind", &K::KIND)
            .field("ids", &self.ids)
            .finish()
    }
}

impl<K: KindMarker> FromIterator<(EntityId, EntityId)> for IdentityMap<K> {
    fn from_iter<I: IntoIterator<Item = (EntityId, EntityId)>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
            _kind: PhantomData,
        }
    }
}
