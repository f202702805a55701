// SPDX-License-Identifier: MIT OR Apache-2.0

//! The generic resource envelope (spec §3.1): identity, version, owner,
//! labels/annotations, phase, and finalizers, wrapped around a typed spec.

use std::collections::BTreeMap;
use std::fmt;

/// `running` or `tearing-down` (spec §3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Running,
    TearingDown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Running => write!(f, "running"),
            Phase::TearingDown => write!(f, "tearing-down"),
        }
    }
}

/// `(namespace, type, id)` — the identity of a resource (spec §3.1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    pub namespace: String,
    pub resource_type: String,
    pub id: String,
}

impl ResourceId {
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        resource_type: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.resource_type, self.id)
    }
}

/// Everything about a resource except its typed payload.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub version: u64,
    /// Name of the controller allowed to mutate spec/labels/annotations.
    /// Empty means user-owned.
    pub owner: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub phase: Phase,
    pub finalizers: Vec<String>,
}

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    pub fn set_annotation(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.annotations.insert(key.into(), value.into());
    }

    pub fn remove_annotation(&mut self, key: &str) -> Option<String> {
        self.annotations.remove(key)
    }

    /// Whether this resource may be destroyed (spec §3.1: blocked while
    /// finalizers are non-empty).
    #[must_use]
    pub fn finalizers_empty(&self) -> bool {
        self.finalizers.is_empty()
    }

    pub fn add_finalizer(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.finalizers.contains(&name) {
            self.finalizers.push(name);
        }
    }

    /// Returns `true` if the finalizer was present and removed.
    pub fn remove_finalizer(&mut self, name: &str) -> bool {
        let before = self.finalizers.len();
        self.finalizers.retain(|f| f != name);
        self.finalizers.len() != before
    }
}

/// A typed resource: identity + metadata + spec payload (spec §3.1).
#[derive(Debug, Clone)]
pub struct Resource<S> {
    pub id: ResourceId,
    pub metadata: Metadata,
    pub spec: S,
}

impl<S> Resource<S> {
    #[must_use]
    pub fn new(id: ResourceId, spec: S) -> Self {
        Self {
            id,
            metadata: Metadata::new(),
            spec,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Equality-only label query support (spec §1: "lookups are by ...
    /// label equality").
    #[must_use]
    pub fn matches_labels(&self, query: &[(&str, &str)]) -> bool {
        query
            .iter()
            .all(|(k, v)| self.metadata.label(k) == Some(*v))
    }
}
