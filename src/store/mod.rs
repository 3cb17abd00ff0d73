//! Dual-indexed entity collections and the record store contract.
//!
//! Ownership model:
//! - `Collection<E>` owns the entities of one kind, indexed by stable identity
//!   and by import-scoped lookup key.
//! - `RecordStore` owns the committed `Catalog` and swaps in whole collections
//!   on commit, so a phase is visible to later phases all at once or not at all.
//! - `Transaction<E>` is the per-phase working copy. Dropping it without
//!   calling `commit` discards the phase.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::RwLock;

use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::data::{Document, EntityKind, Framework, ResourceType, Topic};
use crate::errors::IngestError;
use crate::types::{DocumentId, FrameworkId, LookupKey, ResourceTypeId, TopicId};

/// File-backed store implementation.
pub mod file_store;

pub use file_store::FileRecordStore;

/// An entity kind that can live in a `Collection`.
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Stable identity used for upsert and deduplication.
    type Id: Clone
        + Eq
        + Hash
        + fmt::Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Kind tag for this entity.
    const KIND: EntityKind;

    /// Stable identity of this entity.
    fn id(&self) -> &Self::Id;

    /// Import-scoped lookup key, when the kind has one.
    fn lookup_key(&self) -> Option<LookupKey>;

    /// Borrow this kind's collection from a catalog.
    fn collection(catalog: &Catalog) -> &Collection<Self>;

    /// Wrap a replacement collection of this kind for `RecordStore::commit`.
    fn into_change(collection: Collection<Self>) -> CollectionChange;
}

/// Result of a single upsert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No entity with this identity existed.
    Inserted,
    /// An entity with this identity existed and at least one field changed.
    Updated,
    /// An entity with this identity existed with identical fields.
    Unchanged,
}

/// Entities of one kind, indexed by identity and by lookup key.
///
/// Iteration follows first-insertion order; updates keep an entity's position.
#[derive(Clone)]
pub struct Collection<E: Entity> {
    records: IndexMap<E::Id, E>,
    by_key: HashMap<LookupKey, E::Id>,
}

impl<E: Entity> Default for Collection<E> {
    fn default() -> Self {
        Self {
            records: IndexMap::new(),
            by_key: HashMap::new(),
        }
    }
}

impl<E: Entity> fmt::Debug for Collection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("kind", &E::KIND)
            .field("len", &self.records.len())
            .field("keys", &self.by_key.len())
            .finish()
    }
}

impl<E: Entity> Collection<E> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a collection by upserting `records` in order.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = E>,
    {
        let mut collection = Self::new();
        for record in records {
            collection.upsert(record);
        }
        collection
    }

    /// Rebuild a collection from stored records and its lookup-key index.
    ///
    /// Keys naming an identity absent from `records` are dropped. Records keep
    /// the given order; duplicates keep the last copy at the first position.
    pub fn from_parts<R, K>(records: R, keys: K) -> Self
    where
        R: IntoIterator<Item = E>,
        K: IntoIterator<Item = (LookupKey, E::Id)>,
    {
        let mut collection = Self::new();
        for record in records {
            collection.records.insert(record.id().clone(), record);
        }
        for (key, id) in keys {
            if collection.records.contains_key(&id) {
                collection.by_key.insert(key, id);
            }
        }
        collection
    }

    /// Insert `entity`, or overwrite the entity that shares its identity.
    ///
    /// The entity becomes the resolution target for its lookup key even when
    /// another entity was registered under the same key before.
    pub fn upsert(&mut self, entity: E) -> UpsertOutcome {
        let id = entity.id().clone();
        let key = entity.lookup_key();
        let outcome = match self.records.get_mut(&id) {
            Some(existing) => {
                let previous_key = existing.lookup_key();
                let outcome = if *existing == entity {
                    UpsertOutcome::Unchanged
                } else {
                    UpsertOutcome::Updated
                };
                *existing = entity;
                if let Some(previous) = previous_key
                    && Some(previous) != key
                    && self.by_key.get(&previous) == Some(&id)
                {
                    self.by_key.remove(&previous);
                }
                outcome
            }
            None => {
                self.records.insert(id.clone(), entity);
                UpsertOutcome::Inserted
            }
        };
        if let Some(key) = key {
            self.by_key.insert(key, id);
        }
        outcome
    }

    /// Entity with identity `id`.
    pub fn get(&self, id: &E::Id) -> Option<&E> {
        self.records.get(id)
    }

    /// Entity currently registered under lookup key `key`.
    ///
    /// `None` also covers keys whose entity has not been imported yet.
    pub fn find_by_lookup_key(&self, key: LookupKey) -> Option<&E> {
        self.by_key.get(&key).and_then(|id| self.records.get(id))
    }

    /// Edit the entity with identity `id` in place.
    ///
    /// The lookup-key index is left untouched, so `edit` must not change the
    /// entity's identity or lookup key. Returns `false` when no entity has `id`.
    pub fn modify(&mut self, id: &E::Id, edit: impl FnOnce(&mut E)) -> bool {
        match self.records.get_mut(id) {
            Some(entity) => {
                edit(entity);
                true
            }
            None => false,
        }
    }

    /// Lookup-key index entries, in no particular order.
    pub fn lookup_keys(&self) -> impl Iterator<Item = (LookupKey, &E::Id)> {
        self.by_key.iter().map(|(key, id)| (*key, id))
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the collection holds no entities.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.records.values()
    }

    /// Consume the collection, returning entities in insertion order.
    pub fn into_records(self) -> Vec<E> {
        self.records.into_values().collect()
    }
}

/// Committed state of every entity kind.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    /// Committed resource types.
    pub resource_types: Collection<ResourceType>,
    /// Committed frameworks.
    pub frameworks: Collection<Framework>,
    /// Committed topics.
    pub topics: Collection<Topic>,
    /// Committed documents.
    pub documents: Collection<Document>,
}

impl Catalog {
    /// Borrow the collection of kind `E`.
    pub fn collection<E: Entity>(&self) -> &Collection<E> {
        E::collection(self)
    }

    /// Entity counts per kind, in phase order.
    pub fn counts(&self) -> [(EntityKind, usize); 4] {
        [
            (EntityKind::ResourceType, self.resource_types.len()),
            (EntityKind::Framework, self.frameworks.len()),
            (EntityKind::Topic, self.topics.len()),
            (EntityKind::Document, self.documents.len()),
        ]
    }

    fn apply(&mut self, change: CollectionChange) {
        match change {
            CollectionChange::ResourceTypes(collection) => self.resource_types = collection,
            CollectionChange::Frameworks(collection) => self.frameworks = collection,
            CollectionChange::Topics(collection) => self.topics = collection,
            CollectionChange::Documents(collection) => self.documents = collection,
        }
    }
}

/// Replacement contents for one collection, produced by a committed phase.
#[derive(Clone, Debug)]
pub enum CollectionChange {
    /// Replaces `Catalog::resource_types`.
    ResourceTypes(Collection<ResourceType>),
    /// Replaces `Catalog::frameworks`.
    Frameworks(Collection<Framework>),
    /// Replaces `Catalog::topics`.
    Topics(Collection<Topic>),
    /// Replaces `Catalog::documents`.
    Documents(Collection<Document>),
}

impl CollectionChange {
    /// Kind of the collection being replaced.
    pub fn kind(&self) -> EntityKind {
        match self {
            CollectionChange::ResourceTypes(_) => EntityKind::ResourceType,
            CollectionChange::Frameworks(_) => EntityKind::Framework,
            CollectionChange::Topics(_) => EntityKind::Topic,
            CollectionChange::Documents(_) => EntityKind::Document,
        }
    }
}

/// Persistence backend for ingested entities.
///
/// `commit` must make the replaced collection visible to every later
/// `snapshot` call before it returns.
pub trait RecordStore: Send + Sync {
    /// Return a copy of the committed state.
    fn snapshot(&self) -> Result<Catalog, IngestError>;
    /// Atomically replace one collection.
    fn commit(&self, change: CollectionChange) -> Result<(), IngestError>;
}

/// Working copy of one collection for the duration of a phase.
pub struct Transaction<'s, E: Entity> {
    store: &'s dyn RecordStore,
    committed: Catalog,
    working: Collection<E>,
}

impl<'s, E: Entity> Transaction<'s, E> {
    /// Snapshot `store` and start a working copy of kind `E`.
    pub fn begin(store: &'s dyn RecordStore) -> Result<Self, IngestError> {
        let committed = store.snapshot()?;
        let working = E::collection(&committed).clone();
        Ok(Self {
            store,
            committed,
            working,
        })
    }

    /// Committed state as of `begin`, for resolving references to other kinds.
    pub fn committed(&self) -> &Catalog {
        &self.committed
    }

    /// Working collection, including rows upserted earlier in this phase.
    pub fn working(&self) -> &Collection<E> {
        &self.working
    }

    /// Upsert into the working collection.
    pub fn upsert(&mut self, entity: E) -> UpsertOutcome {
        self.working.upsert(entity)
    }

    /// Edit an entity of the working collection in place; see `Collection::modify`.
    pub fn modify(&mut self, id: &E::Id, edit: impl FnOnce(&mut E)) -> bool {
        self.working.modify(id, edit)
    }

    /// Resolve a lookup key against the working collection.
    pub fn find_by_lookup_key(&self, key: LookupKey) -> Option<&E> {
        self.working.find_by_lookup_key(key)
    }

    /// Hand the working collection to the store.
    pub fn commit(self) -> Result<(), IngestError> {
        self.store.commit(E::into_change(self.working))
    }
}

/// In-memory record store.
#[derive(Default)]
pub struct MemoryRecordStore {
    catalog: RwLock<Catalog>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `catalog`.
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
        }
    }
}

impl RecordStore for MemoryRecordStore {
    fn snapshot(&self) -> Result<Catalog, IngestError> {
        self.catalog
            .read()
            .map_err(|_| IngestError::Store("catalog lock poisoned".into()))
            .map(|guard| guard.clone())
    }

    fn commit(&self, change: CollectionChange) -> Result<(), IngestError> {
        self.catalog
            .write()
            .map_err(|_| IngestError::Store("catalog lock poisoned".into()))?
            .apply(change);
        Ok(())
    }
}

impl Entity for ResourceType {
    type Id = ResourceTypeId;
    const KIND: EntityKind = EntityKind::ResourceType;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn lookup_key(&self) -> Option<LookupKey> {
        Some(self.key)
    }

    fn collection(catalog: &Catalog) -> &Collection<Self> {
        &catalog.resource_types
    }

    fn into_change(collection: Collection<Self>) -> CollectionChange {
        CollectionChange::ResourceTypes(collection)
    }
}

impl Entity for Framework {
    type Id = FrameworkId;
    const KIND: EntityKind = EntityKind::Framework;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn lookup_key(&self) -> Option<LookupKey> {
        Some(self.key)
    }

    fn collection(catalog: &Catalog) -> &Collection<Self> {
        &catalog.frameworks
    }

    fn into_change(collection: Collection<Self>) -> CollectionChange {
        CollectionChange::Frameworks(collection)
    }
}

impl Entity for Topic {
    type Id = TopicId;
    const KIND: EntityKind = EntityKind::Topic;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn lookup_key(&self) -> Option<LookupKey> {
        Some(self.key)
    }

    fn collection(catalog: &Catalog) -> &Collection<Self> {
        &catalog.topics
    }

    fn into_change(collection: Collection<Self>) -> CollectionChange {
        CollectionChange::Topics(collection)
    }
}

impl Entity for Document {
    type Id = DocumentId;
    const KIND: EntityKind = EntityKind::Document;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn lookup_key(&self) -> Option<LookupKey> {
        None
    }

    fn collection(catalog: &Catalog) -> &Collection<Self> {
        &catalog.documents
    }

    fn into_change(collection: Collection<Self>) -> CollectionChange {
        CollectionChange::Documents(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framework(id: FrameworkId, key: LookupKey, name: &str) -> Framework {
        Framework {
            id,
            key,
            name: name.to_string(),
        }
    }

    #[test]
    fn upsert_updates_in_place_without_growing() {
        let mut collection = Collection::new();
        assert_eq!(
            collection.upsert(framework(1, 10, "UIKit")),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            collection.upsert(framework(2, 11, "AppKit")),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            collection.upsert(framework(1, 10, "UIKit Renamed")),
            UpsertOutcome::Updated
        );
        assert_eq!(
            collection.upsert(framework(1, 10, "UIKit Renamed")),
            UpsertOutcome::Unchanged
        );

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get(&1).unwrap().name, "UIKit Renamed");
        let order: Vec<FrameworkId> = collection.iter().map(|f| f.id).collect();
        assert_eq!(order, vec![1, 2]);
    }

    #[test]
    fn colliding_lookup_keys_resolve_to_latest_upsert() {
        let mut collection = Collection::new();
        collection.upsert(framework(1, 7, "First"));
        collection.upsert(framework(2, 7, "Second"));

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.find_by_lookup_key(7).unwrap().id, 2);
        assert_eq!(collection.get(&1).unwrap().name, "First");
    }

    #[test]
    fn rekeyed_entity_releases_its_old_key() {
        let mut collection = Collection::new();
        collection.upsert(framework(1, 7, "Foo"));
        collection.upsert(framework(1, 8, "Foo"));

        assert!(collection.find_by_lookup_key(7).is_none());
        assert_eq!(collection.find_by_lookup_key(8).unwrap().id, 1);
    }

    #[test]
    fn rekeyed_entity_keeps_key_claimed_by_another() {
        let mut collection = Collection::new();
        collection.upsert(framework(1, 7, "Foo"));
        collection.upsert(framework(2, 7, "Bar"));
        collection.upsert(framework(1, 8, "Foo"));

        assert_eq!(collection.find_by_lookup_key(7).unwrap().id, 2);
        assert_eq!(collection.find_by_lookup_key(8).unwrap().id, 1);
    }

    #[test]
    fn from_records_replays_in_order() {
        let collection = Collection::from_records(vec![
            framework(1, 5, "A"),
            framework(2, 5, "B"),
            framework(1, 6, "A2"),
        ]);
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.find_by_lookup_key(5).unwrap().id, 2);
        assert_eq!(collection.find_by_lookup_key(6).unwrap().name, "A2");
        let names: Vec<String> = collection.into_records().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["A2".to_string(), "B".to_string()]);
    }

    #[test]
    fn from_parts_restores_the_key_index_as_given() {
        let original = Collection::from_records(vec![
            framework(1, 7, "A"),
            framework(2, 7, "B"),
            framework(1, 7, "A"),
        ]);
        assert_eq!(original.find_by_lookup_key(7).unwrap().id, 1);

        let keys: Vec<(LookupKey, FrameworkId)> =
            original.lookup_keys().map(|(key, id)| (key, *id)).collect();
        let restored = Collection::from_parts(original.clone().into_records(), keys);
        assert_eq!(restored.find_by_lookup_key(7).unwrap().id, 1);
        assert_eq!(restored.len(), 2);

        let stale = Collection::from_parts(vec![framework(1, 7, "A")], vec![(9, 4)]);
        assert!(stale.find_by_lookup_key(9).is_none());
    }

    #[test]
    fn modify_keeps_the_key_index() {
        let mut collection = Collection::new();
        collection.upsert(framework(1, 7, "A"));
        collection.upsert(framework(2, 7, "B"));

        assert!(collection.modify(&1, |entity| entity.name = "A2".to_string()));
        assert!(!collection.modify(&3, |entity| entity.name = "missing".to_string()));
        assert_eq!(collection.get(&1).unwrap().name, "A2");
        assert_eq!(collection.find_by_lookup_key(7).unwrap().id, 2);
    }

    #[test]
    fn dropped_transaction_is_not_visible() {
        let store = MemoryRecordStore::new();
        {
            let mut txn = Transaction::<Framework>::begin(&store).unwrap();
            txn.upsert(framework(1, 1, "Foo"));
            assert_eq!(txn.working().len(), 1);
        }
        assert!(store.snapshot().unwrap().frameworks.is_empty());
    }

    #[test]
    fn committed_transaction_is_visible_to_later_snapshots() {
        let store = MemoryRecordStore::new();
        let mut txn = Transaction::<Framework>::begin(&store).unwrap();
        txn.upsert(framework(1, 1, "Foo"));
        assert!(txn.find_by_lookup_key(1).is_some());
        assert!(txn.committed().frameworks.is_empty());
        txn.commit().unwrap();

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.collection::<Framework>().len(), 1);
        assert_eq!(snapshot.frameworks.find_by_lookup_key(1).unwrap().name, "Foo");
        assert!(snapshot.topics.is_empty());
    }

    #[test]
    fn collection_change_reports_its_kind() {
        let change = Framework::into_change(Collection::new());
        assert_eq!(change.kind(), EntityKind::Framework);
        let change = Document::into_change(Collection::new());
        assert_eq!(change.kind(), EntityKind::Document);
    }
}
