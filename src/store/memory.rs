// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory, typed resource store (spec §4.1, C1).
//!
//! One [`MemoryStore<S>`] backs one resource kind; the control-plane wires
//! many of them together (see [`crate::store::Store`]) the way the spec's
//! "tagged variant over a closed set of resource types" design note (§9)
//! describes, while keeping each kind statically typed in Rust.

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::error::{CoreError, CoreResult};
use crate::model::{Metadata, Resource, ResourceId};

use super::watch::{KindWatcher, WatchEvent};

const WATCH_CHANNEL_CAPACITY: usize = 1024;

/// Typed, in-memory resource store for one resource kind.
pub struct MemoryStore<S> {
    entries: DashMap<ResourceId, Resource<S>>,
    events: broadcast::Sender<WatchEvent<S>>,
}

impl<S: Clone + Send + Sync + 'static> Default for MemoryStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Send + Sync + 'static> MemoryStore<S> {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        Self {
            entries: DashMap::new(),
            events,
        }
    }

    fn emit(&self, event: WatchEvent<S>) {
        // No active watchers is not an error; `send` just reports so.
        let _ = self.events.send(event);
    }

    /// Create a new resource. Fails with `Conflict` if one already exists
    /// at this id.
    pub fn create(&self, id: ResourceId, metadata: Metadata, spec: S) -> CoreResult<Resource<S>> {
        if self.entries.contains_key(&id) {
            return Err(CoreError::Conflict(id.to_string()));
        }
        let mut metadata = metadata;
        metadata.version = 1;
        let resource = Resource {
            id: id.clone(),
            metadata,
            spec,
        };
        self.entries.insert(id, resource.clone());
        self.emit(WatchEvent::Created(resource.clone()));
        Ok(resource)
    }

    /// Cached read. This store has no separate cache tier, so this is
    /// identical to [`Self::get_uncached`]; the distinction is kept at the
    /// API surface for fidelity with spec §4.1's controller-cache model.
    pub fn get(&self, id: &ResourceId) -> CoreResult<Resource<S>> {
        self.entries
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    /// Bypasses the per-controller cache (spec §4.1) so race-free admission
    /// decisions can be made. See [`Self::get`].
    pub fn get_uncached(&self, id: &ResourceId) -> CoreResult<Resource<S>> {
        self.get(id)
    }

    /// Read-modify-write with optimistic concurrency: fails with `Conflict`
    /// if `expected_version` no longer matches.
    pub fn update(
        &self,
        id: &ResourceId,
        expected_version: u64,
        mutate: impl FnOnce(&mut Resource<S>),
    ) -> CoreResult<Resource<S>> {
        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        if entry.metadata.version != expected_version {
            return Err(CoreError::Conflict(id.to_string()));
        }
        mutate(&mut entry);
        entry.metadata.version += 1;
        let updated = entry.clone();
        drop(entry);
        self.emit(WatchEvent::Updated(updated.clone()));
        Ok(updated)
    }

    /// Sets phase to tearing-down. Returns `true` ("ready?") when
    /// finalizers are already empty.
    pub fn teardown(&self, id: &ResourceId) -> CoreResult<bool> {
        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        entry.metadata.phase = crate::model::Phase::TearingDown;
        entry.metadata.version += 1;
        let ready = entry.metadata.finalizers_empty();
        let updated = entry.clone();
        drop(entry);
        self.emit(WatchEvent::Updated(updated));
        Ok(ready)
    }

    /// Destroys a resource. Fails unless it is tearing-down with no
    /// finalizers left.
    pub fn destroy(&self, id: &ResourceId) -> CoreResult<()> {
        {
            let entry = self
                .entries
                .get(id)
                .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
            if entry.metadata.phase != crate::model::Phase::TearingDown {
                return Err(CoreError::FailedPrecondition(format!(
                    "{id} is not tearing down"
                )));
            }
            if !entry.metadata.finalizers_empty() {
                return Err(CoreError::FailedPrecondition(format!(
                    "{id} still has finalizers"
                )));
            }
        }
        self.entries.remove(id);
        self.emit(WatchEvent::Destroyed(id.clone()));
        Ok(())
    }

    pub fn add_finalizer(&self, id: &ResourceId, name: impl Into<String>) -> CoreResult<()> {
        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        entry.metadata.add_finalizer(name);
        entry.metadata.version += 1;
        let updated = entry.clone();
        drop(entry);
        self.emit(WatchEvent::Updated(updated));
        Ok(())
    }

    pub fn remove_finalizer(&self, id: &ResourceId, name: &str) -> CoreResult<()> {
        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        entry.metadata.remove_finalizer(name);
        entry.metadata.version += 1;
        let updated = entry.clone();
        drop(entry);
        self.emit(WatchEvent::Updated(updated));
        Ok(())
    }

    /// Equality-only label query (spec §1, §4.1).
    #[must_use]
    pub fn list(&self, namespace: &str, label_query: &[(&str, &str)]) -> Vec<Resource<S>> {
        self.entries
            .iter()
            .filter(|entry| entry.key().namespace == namespace)
            .filter(|entry| entry.value().matches_labels(label_query))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Subscribe to every `Created`/`Updated`/`Destroyed`/`Bookmark`/`Error`
    /// event for this kind (spec §4.1 `WatchKind`).
    #[must_use]
    pub fn watch_kind(&self) -> KindWatcher<S> {
        KindWatcher::new(self.events.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: &str) -> ResourceId {
        ResourceId::new("default", "Widget", n)
    }

    #[test]
    fn create_then_get_round_trips() {
        let store: MemoryStore<u32> = MemoryStore::new();
        store.create(id("a"), Metadata::new(), 7).unwrap();
        let got = store.get(&id("a")).unwrap();
        assert_eq!(got.spec, 7);
        assert_eq!(got.metadata.version, 1);
    }

    #[test]
    fn create_twice_conflicts() {
        let store: MemoryStore<u32> = MemoryStore::new();
        store.create(id("a"), Metadata::new(), 1).unwrap();
        let err = store.create(id("a"), Metadata::new(), 2).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn stale_version_update_conflicts() {
        let store: MemoryStore<u32> = MemoryStore::new();
        store.create(id("a"), Metadata::new(), 1).unwrap();
        store.update(&id("a"), 1, |r| r.spec = 2).unwrap();
        let err = store.update(&id("a"), 1, |r| r.spec = 3).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(store.get(&id("a")).unwrap().spec, 2);
    }

    #[test]
    fn teardown_then_destroy_requires_no_finalizers() {
        let store: MemoryStore<u32> = MemoryStore::new();
        store.create(id("a"), Metadata::new(), 1).unwrap();
        store.add_finalizer(&id("a"), "controller-x").unwrap();
        let ready = store.teardown(&id("a")).unwrap();
        assert!(!ready, "finalizers still present");
        assert!(store.destroy(&id("a")).is_err());
        store.remove_finalizer(&id("a"), "controller-x").unwrap();
        assert!(store.destroy(&id("a")).is_ok());
        assert!(store.get(&id("a")).is_err());
    }

    #[test]
    fn destroy_without_teardown_fails() {
        let store: MemoryStore<u32> = MemoryStore::new();
        store.create(id("a"), Metadata::new(), 1).unwrap();
        assert!(store.destroy(&id("a")).is_err());
    }

    #[test]
    fn list_filters_by_namespace_and_labels() {
        let store: MemoryStore<u32> = MemoryStore::new();
        store
            .create(
                id("a"),
                Metadata::new().with_label("role", "controlplane"),
                1,
            )
            .unwrap();
        store
            .create(id("b"), Metadata::new().with_label("role", "worker"), 2)
            .unwrap();
        let cp = store.list("default", &[("role", "controlplane")]);
        assert_eq!(cp.len(), 1);
        assert_eq!(cp[0].spec, 1);
    }

    #[tokio::test]
    async fn watch_kind_observes_created_and_updated() {
        let store: MemoryStore<u32> = MemoryStore::new();
        let mut watcher = store.watch_kind();
        store.create(id("a"), Metadata::new(), 1).unwrap();
        store.update(&id("a"), 1, |r| r.spec = 2).unwrap();

        let first = watcher.recv().await.unwrap();
        assert!(matches!(first, WatchEvent::Created(r) if r.spec == 1));
        let second = watcher.recv().await.unwrap();
        assert!(matches!(second, WatchEvent::Updated(r) if r.spec == 2));
    }
}
