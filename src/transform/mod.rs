// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transform controllers (spec §4.3, C3): one primary input resource maps
//! to exactly one output resource of another type. Built on top of the
//! generic [`crate::controller`] runtime rather than duplicating its
//! per-id serialization and requeue handling.

use std::sync::Arc;

use async_trait::async_trait;

use crate::controller::{Controller, ReconcileOutcome};
use crate::error::{CoreError, CoreResult};
use crate::model::{Metadata, Resource, ResourceId};
use crate::store::MemoryStore;

/// What a [`Transform`] wants written for an input's output counterpart.
pub enum TransformOutcome<O> {
    /// Upsert the output with this spec.
    Keep(O),
    /// The input no longer warrants an output; remove it if present.
    Delete,
}

/// The per-kind-pair hooks a transform controller needs (spec §4.3).
#[async_trait]
pub trait Transform: Send + Sync {
    type Input: Clone + Send + Sync + 'static;
    type Output: Clone + Send + Sync + 'static;

    fn name(&self) -> &str;

    /// Derives the output id from the input id. Identity (same namespace,
    /// same id, different type) unless overridden.
    fn map_id(&self, input_id: &ResourceId) -> ResourceId;

    /// Copies/derives output metadata (labels, annotations) from the input's
    /// metadata before the output is written (the `MapMetadata` hook).
    fn map_metadata(&self, _input: &Metadata, _output: &mut Metadata) {}

    /// Recovers the input id an output resource was derived from (the
    /// `UnmapMetadata` hook), for mapped-input event routing. Defaults to
    /// assuming `map_id` is its own inverse modulo type name.
    fn unmap_id(&self, output_id: &ResourceId) -> ResourceId {
        output_id.clone()
    }

    /// Computes (or recomputes) the output for a live input.
    async fn transform(
        &self,
        input: &Resource<Self::Input>,
    ) -> CoreResult<TransformOutcome<Self::Output>>;

    /// Runs before the input's finalizer is dropped and the output is torn
    /// down, e.g. to release an external resource (the `FinalizerRemoval`
    /// hook). Default is a no-op.
    async fn finalizer_removal(&self, _input: &Resource<Self::Input>) -> CoreResult<()> {
        Ok(())
    }
}

fn finalizer_name(controller_name: &str) -> String {
    format!("{controller_name}/transform")
}

/// Drives a [`Transform`] as a [`Controller`] over a pair of typed stores.
pub struct TransformController<T: Transform> {
    transform: T,
    input: Arc<MemoryStore<T::Input>>,
    output: Arc<MemoryStore<T::Output>>,
}

impl<T: Transform> TransformController<T> {
    pub fn new(
        transform: T,
        input: Arc<MemoryStore<T::Input>>,
        output: Arc<MemoryStore<T::Output>>,
    ) -> Self {
        Self {
            transform,
            input,
            output,
        }
    }

    #[must_use]
    pub fn output_store(&self) -> &Arc<MemoryStore<T::Output>> {
        &self.output
    }
}

#[async_trait]
impl<T: Transform> Controller for TransformController<T> {
    fn name(&self) -> &str {
        self.transform.name()
    }

    async fn reconcile(&self, id: &ResourceId) -> CoreResult<ReconcileOutcome> {
        let input = match self.input.get(id) {
            Ok(input) => input,
            Err(CoreError::NotFound(_)) => return Ok(ReconcileOutcome::Done),
            Err(err) => return Err(err),
        };

        let output_id = self.transform.map_id(id);

        if input.metadata.phase == crate::model::Phase::TearingDown {
            self.transform.finalizer_removal(&input).await?;
            if let Ok(existing) = self.output.get(&output_id) {
                if existing.metadata.phase != crate::model::Phase::TearingDown {
                    self.output.teardown(&output_id)?;
                }
                match self.output.destroy(&output_id) {
                    Ok(()) | Err(CoreError::NotFound(_)) => {}
                    Err(CoreError::FailedPrecondition(_)) => {
                        return Ok(ReconcileOutcome::RequeueAfter(
                            std::time::Duration::from_secs(1),
                        ));
                    }
                    Err(err) => return Err(err),
                }
            }
            self.input.remove_finalizer(id, &finalizer_name(self.name()))?;
            return Ok(ReconcileOutcome::Done);
        }

        self.input
            .add_finalizer(id, finalizer_name(self.name()))?;

        match self.transform.transform(&input).await? {
            TransformOutcome::Keep(spec) => {
                let mut metadata = Metadata::new().with_owner(self.name());
                self.transform.map_metadata(&input.metadata, &mut metadata);
                match self.output.get(&output_id) {
                    Ok(existing) => {
                        self.output
                            .update(&output_id, existing.metadata.version, |r| {
                                r.spec = spec.clone();
                                r.metadata.labels = metadata.labels.clone();
                                r.metadata.annotations = metadata.annotations.clone();
                            })?;
                    }
                    Err(CoreError::NotFound(_)) => {
                        self.output.create(output_id, metadata, spec)?;
                    }
                    Err(err) => return Err(err),
                }
            }
            TransformOutcome::Delete => {
                if self.output.get(&output_id).is_ok() {
                    self.output.teardown(&output_id)?;
                    match self.output.destroy(&output_id) {
                        Ok(()) | Err(CoreError::NotFound(_)) | Err(CoreError::FailedPrecondition(_)) => {}
                        Err(err) => return Err(err),
                    }
                }
            }
        }

        Ok(ReconcileOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    #[async_trait]
    impl Transform for Doubler {
        type Input = u32;
        type Output = u32;

        fn name(&self) -> &str {
            "doubler"
        }

        fn map_id(&self, input_id: &ResourceId) -> ResourceId {
            ResourceId::new(&input_id.namespace, "Doubled", &input_id.id)
        }

        async fn transform(
            &self,
            input: &Resource<Self::Input>,
        ) -> CoreResult<TransformOutcome<Self::Output>> {
            Ok(TransformOutcome::Keep(input.spec * 2))
        }
    }

    #[tokio::test]
    async fn transform_creates_then_updates_output() {
        let input = Arc::new(MemoryStore::<u32>::new());
        let output = Arc::new(MemoryStore::<u32>::new());
        let id = ResourceId::new("default", "Number", "a");
        input.create(id.clone(), Metadata::new(), 3).unwrap();

        let controller = TransformController::new(Doubler, input.clone(), output.clone());
        controller.reconcile(&id).await.unwrap();
        let out_id = ResourceId::new("default", "Doubled", "a");
        assert_eq!(output.get(&out_id).unwrap().spec, 6);

        input.update(&id, 1, |r| r.spec = 5).unwrap();
        controller.reconcile(&id).await.unwrap();
        assert_eq!(output.get(&out_id).unwrap().spec, 10);
    }

    #[tokio::test]
    async fn teardown_propagates_to_output() {
        let input = Arc::new(MemoryStore::<u32>::new());
        let output = Arc::new(MemoryStore::<u32>::new());
        let id = ResourceId::new("default", "Number", "a");
        input.create(id.clone(), Metadata::new(), 3).unwrap();

        let controller = TransformController::new(Doubler, input.clone(), output.clone());
        controller.reconcile(&id).await.unwrap();

        input.teardown(&id).unwrap();
        controller.reconcile(&id).await.unwrap();
        let out_id = ResourceId::new("default", "Doubled", "a");
        assert!(output.get(&out_id).is_err());
        assert!(input.destroy(&id).is_ok());
    }
}
