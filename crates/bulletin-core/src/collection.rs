//! # Entity Collection
//!
//! A normalized, keyed, ordered container for one entity type.
//!
//! [`EntityCollection`] stores entities in an insertion-ordered map from id to
//! `Arc<E>`. The map's key order *is* the collection's id sequence, so the
//! normalization invariant (every id has exactly one entity and vice versa)
//! holds by construction rather than by bookkeeping.
//!
//! Ordering is decided per collection:
//! - [`EntityCollection::new`] keeps insertion order
//! - [`EntityCollection::sorted_by`] keeps comparator order after every mutation
//!
//! Entities are shared behind `Arc`. A mutation replaces only the entities it
//! touches, so untouched entities keep their identity across transitions and
//! identity-keyed selectors stay cached.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bulletin_core::EntityCollection;
//!
//! let mut posts = EntityCollection::<Post>::sorted_by(|a, b| b.date.cmp(&a.date));
//! posts.add_one(post);
//! posts.upsert_many(fetched)?;
//! let newest_first = posts.get_all();
//! ```

use crate::errors::CollectionError;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// A record with a globally unique, stable identifier.
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Identifier type. Never changes for the lifetime of an entity.
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Partial record used by upserts and updates.
    type Patch: EntityPatch<Self>;

    /// Human-readable kind used in error messages (e.g. `"post"`).
    const KIND: &'static str;

    /// The entity's identifier.
    fn id(&self) -> &Self::Id;
}

/// A partial record for an entity: an id plus any subset of its fields.
///
/// Full entities convert into patches via `From<E>`, so any API taking a
/// patch also accepts a complete record.
pub trait EntityPatch<E: Entity>: Clone + fmt::Debug + Send + Sync + From<E> {
    /// Identifier of the entity this patch targets.
    fn id(&self) -> &E::Id;

    /// Shallow-merge the present fields into `entity`, leaving absent fields untouched.
    ///
    /// Implementations must not alter the entity's id.
    fn apply_to(self, entity: &mut E);

    /// Build a new entity from this patch when the id is not yet known.
    ///
    /// Fails with [`CollectionError::IncompleteRecord`] when a required field
    /// is absent.
    fn into_entity(self) -> Result<E, CollectionError>;
}

/// Comparator deciding the display order of a sorted collection.
pub type SortComparer<E> = fn(&E, &E) -> Ordering;

/// A normalized, keyed, ordered collection of entities.
#[derive(Clone)]
pub struct EntityCollection<E: Entity> {
    entities: IndexMap<E::Id, Arc<E>>,
    sort_comparer: Option<SortComparer<E>>,
}

impl<E: Entity> Default for EntityCollection<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityCollection<E> {
    /// Create an empty collection that keeps insertion order.
    pub fn new() -> Self {
        Self {
            entities: IndexMap::new(),
            sort_comparer: None,
        }
    }

    /// Create an empty collection kept in `comparer` order.
    pub fn sorted_by(comparer: SortComparer<E>) -> Self {
        Self {
            entities: IndexMap::new(),
            sort_comparer: Some(comparer),
        }
    }

    // ─── Queries ─────────────────────────────────────────────

    /// All entities in collection order.
    pub fn get_all(&self) -> Vec<Arc<E>> {
        self.entities.values().cloned().collect()
    }

    /// Get an entity by id.
    pub fn get(&self, id: &E::Id) -> Option<&Arc<E>> {
        self.entities.get(id)
    }

    /// All ids in collection order.
    pub fn ids(&self) -> impl Iterator<Item = &E::Id> + '_ {
        self.entities.keys()
    }

    /// All entities in collection order, without cloning.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<E>> + '_ {
        self.entities.values()
    }

    /// The first entity in collection order (the newest, for date-sorted kinds).
    pub fn first(&self) -> Option<&Arc<E>> {
        self.entities.first().map(|(_, entity)| entity)
    }

    /// Check if an id is present.
    pub fn contains(&self, id: &E::Id) -> bool {
        self.entities.contains_key(id)
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Check that the entities are in comparator order.
    ///
    /// Always true for insertion-ordered collections.
    pub fn is_ordered(&self) -> bool {
        match self.sort_comparer {
            None => true,
            Some(compare) => self
                .entities
                .values()
                .zip(self.entities.values().skip(1))
                .all(|(a, b)| compare(a, b) != Ordering::Greater),
        }
    }

    // ─── Mutations ───────────────────────────────────────────

    /// Insert a new entity. Returns `false` (and changes nothing) if the id is
    /// already present; use an upsert to update existing entities.
    pub fn add_one(&mut self, entity: E) -> bool {
        if self.entities.contains_key(entity.id()) {
            return false;
        }
        self.entities.insert(entity.id().clone(), Arc::new(entity));
        self.resort();
        true
    }

    /// Insert every entity whose id is not yet present. Returns the number inserted.
    pub fn add_many(&mut self, entities: impl IntoIterator<Item = E>) -> usize {
        let mut inserted = 0;
        for entity in entities {
            if !self.entities.contains_key(entity.id()) {
                self.entities.insert(entity.id().clone(), Arc::new(entity));
                inserted += 1;
            }
        }
        if inserted > 0 {
            self.resort();
        }
        inserted
    }

    /// Replace the entire contents of the collection.
    ///
    /// A later record with a repeated id replaces the earlier one.
    pub fn set_all(&mut self, entities: impl IntoIterator<Item = E>) {
        self.entities.clear();
        for entity in entities {
            self.entities.insert(entity.id().clone(), Arc::new(entity));
        }
        self.resort();
    }

    /// Insert an entity, replacing any existing entity with the same id wholesale.
    pub fn set_one(&mut self, entity: E) {
        self.entities.insert(entity.id().clone(), Arc::new(entity));
        self.resort();
    }

    /// Upsert a single record. See [`upsert_many`](Self::upsert_many).
    pub fn upsert_one(&mut self, record: impl Into<E::Patch>) -> Result<(), CollectionError> {
        self.upsert_many(std::iter::once(record)).map(|_| ())
    }

    /// Insert-if-absent, merge-if-present for every record.
    ///
    /// Known ids are shallow-merged (fields absent from the record are kept);
    /// unknown ids are inserted. The batch is applied atomically: if any new
    /// record is incomplete, nothing is applied. Returns the number of
    /// distinct ids touched.
    pub fn upsert_many<P>(
        &mut self,
        records: impl IntoIterator<Item = P>,
    ) -> Result<usize, CollectionError>
    where
        P: Into<E::Patch>,
    {
        // Staged in first-touch order so new ids append in batch order.
        let mut staged: IndexMap<E::Id, E> = IndexMap::new();
        for record in records {
            let patch: E::Patch = record.into();
            let id = patch.id().clone();
            if let Some(pending) = staged.get_mut(&id) {
                patch.apply_to(pending);
                continue;
            }
            let next = match self.entities.get(&id) {
                Some(existing) => {
                    let mut merged = E::clone(existing);
                    patch.apply_to(&mut merged);
                    merged
                }
                None => patch.into_entity()?,
            };
            staged.insert(id, next);
        }

        let touched = staged.len();
        for (id, entity) in staged {
            self.entities.insert(id, Arc::new(entity));
        }
        if touched > 0 {
            self.resort();
        }
        Ok(touched)
    }

    /// Merge a patch into an existing entity.
    ///
    /// Fails with [`CollectionError::NotFound`] if the id is unknown; the
    /// collection is left unchanged.
    pub fn update_one(&mut self, patch: E::Patch) -> Result<(), CollectionError> {
        let id = patch.id().clone();
        let slot = self
            .entities
            .get_mut(&id)
            .ok_or_else(|| CollectionError::not_found(E::KIND, &id))?;
        let mut next = E::clone(slot);
        patch.apply_to(&mut next);
        *slot = Arc::new(next);
        self.resort();
        Ok(())
    }

    /// Modify an existing entity with a closure.
    ///
    /// Fails with [`CollectionError::NotFound`] if the id is unknown and with
    /// [`CollectionError::IdChanged`] if the closure rewrites the id. Either
    /// way the collection is left unchanged.
    pub fn modify_one(
        &mut self,
        id: &E::Id,
        f: impl FnOnce(&mut E),
    ) -> Result<(), CollectionError> {
        let slot = self
            .entities
            .get_mut(id)
            .ok_or_else(|| CollectionError::not_found(E::KIND, id))?;
        let mut next = E::clone(slot);
        f(&mut next);
        if next.id() != id {
            return Err(CollectionError::IdChanged {
                kind: E::KIND,
                id: id.to_string(),
                attempted: next.id().to_string(),
            });
        }
        *slot = Arc::new(next);
        self.resort();
        Ok(())
    }

    /// Modify every entity with a closure that reports whether it changed anything.
    ///
    /// Only entities for which `f` returns `true` are replaced. Returns the
    /// number of changed entities, or [`CollectionError::IdChanged`] (with
    /// nothing applied) if any id was rewritten.
    pub fn modify_each(
        &mut self,
        mut f: impl FnMut(&mut E) -> bool,
    ) -> Result<usize, CollectionError> {
        let mut replaced = Vec::new();
        for (id, entity) in &self.entities {
            let mut next = E::clone(entity);
            if !f(&mut next) {
                continue;
            }
            if next.id() != id {
                return Err(CollectionError::IdChanged {
                    kind: E::KIND,
                    id: id.to_string(),
                    attempted: next.id().to_string(),
                });
            }
            replaced.push((id.clone(), next));
        }

        let changed = replaced.len();
        for (id, next) in replaced {
            if let Some(slot) = self.entities.get_mut(&id) {
                *slot = Arc::new(next);
            }
        }
        if changed > 0 {
            self.resort();
        }
        Ok(changed)
    }

    /// Remove an entity, returning it if it existed.
    pub fn remove_one(&mut self, id: &E::Id) -> Option<Arc<E>> {
        self.entities.shift_remove(id)
    }

    /// Remove every listed id. Returns the number actually removed.
    pub fn remove_many<'a>(&mut self, ids: impl IntoIterator<Item = &'a E::Id>) -> usize
    where
        E::Id: 'a,
    {
        ids.into_iter()
            .filter(|id| self.entities.shift_remove(*id).is_some())
            .count()
    }

    /// Remove every entity.
    pub fn remove_all(&mut self) {
        self.entities.clear();
    }

    /// Restore comparator order if a mutation broke it.
    ///
    /// The sort is stable, so entities with equal sort keys keep their
    /// relative order, and an already-ordered collection is not touched.
    fn resort(&mut self) {
        let Some(compare) = self.sort_comparer else {
            return;
        };
        if !self.is_ordered() {
            self.entities.sort_by(|_, a, _, b| compare(a, b));
        }
    }
}

impl<E: Entity> fmt::Debug for EntityCollection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCollection")
            .field("kind", &E::KIND)
            .field("sorted", &self.sort_comparer.is_some())
            .field("entities", &self.entities)
            .finish()
    }
}

impl<E: Entity + PartialEq> PartialEq for EntityCollection<E> {
    fn eq(&self, other: &Self) -> bool {
        self.entities.len() == other.entities.len()
            && self
                .entities
                .iter()
                .zip(other.entities.iter())
                .all(|((id_a, a), (id_b, b))| id_a == id_b && a == b)
    }
}

impl<E: Entity + Eq> Eq for EntityCollection<E> {}

// ─── Serde Support ───────────────────────────────────────────

impl<E> Serialize for EntityCollection<E>
where
    E: Entity + Serialize,
    E::Id: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let ids: Vec<&E::Id> = self.entities.keys().collect();
        let mut state = serializer.serialize_struct("EntityCollection", 2)?;
        state.serialize_field("ids", &ids)?;
        state.serialize_field("entities", &self.entities)?;
        state.end()
    }
}
