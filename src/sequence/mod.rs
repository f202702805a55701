// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequence controllers (spec §4.4, C4): an ordered list of named stages is
//! run one at a time against an `(input, output)` resource pair, with the
//! current stage index persisted as an annotation on the *output* so the
//! sequence survives a restart. Used by the CA-rotation state machine
//! (spec §4.5) among others.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::controller::{Controller, ReconcileOutcome};
use crate::error::CoreResult;
use crate::model::{Metadata, Resource, ResourceId};
use crate::store::MemoryStore;

/// Annotation key the stage index is persisted under (spec §4.4).
pub const STAGE_INDEX_ANNOTATION: &str = "system.sequenced-stage-index";

/// The default requeue delay for a stage that returns [`StageOutcome::Wait`].
const DEFAULT_WAIT_REQUEUE: Duration = Duration::from_secs(5);

/// What a stage tells the sequence runner to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage is done; advance to the next one (wrapping to the first
    /// stage after the last, spec §4.4's cyclic wraparound).
    Advance,
    /// Suspend without advancing the stage index — re-invoke the same
    /// stage later, e.g. while waiting on an external condition.
    Wait,
}

/// One named step of a sequence (spec §4.4). `input` is the resource the
/// sequence is driven by; `output` is where stage progress and any
/// user-visible status text is written.
#[async_trait]
pub trait Stage<I, O>: Send + Sync {
    fn name(&self) -> &str;

    /// Mutates `input` and `output` in place and reports whether to
    /// advance. Any error other than the [`crate::error::CoreError::skip_reconcile`]
    /// carve-out aborts the sequence at the current stage.
    async fn run(&self, input: &mut Resource<I>, output: &mut Resource<O>) -> CoreResult<StageOutcome>;
}

/// Drives an ordered, persisted-index stage list as a [`Controller`] over
/// an `(input, output)` resource pair sharing the same [`ResourceId`] id
/// (spec §4.4).
pub struct SequenceController<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Clone + Default + Send + Sync + 'static,
{
    name: String,
    input_store: Arc<MemoryStore<I>>,
    output_store: Arc<MemoryStore<O>>,
    output_kind: &'static str,
    stages: Vec<Box<dyn Stage<I, O>>>,
}

impl<I, O> SequenceController<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Clone + Default + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        input_store: Arc<MemoryStore<I>>,
        output_store: Arc<MemoryStore<O>>,
        output_kind: &'static str,
        stages: Vec<Box<dyn Stage<I, O>>>,
    ) -> Self {
        assert!(!stages.is_empty(), "a sequence needs at least one stage");
        Self {
            name: name.into(),
            input_store,
            output_store,
            output_kind,
            stages,
        }
    }

    /// The currently-persisted stage index for the output resource,
    /// defaulting to 0.
    #[must_use]
    pub fn stage_index(output: &Resource<O>) -> usize {
        output
            .metadata
            .annotation(STAGE_INDEX_ANNOTATION)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0)
    }

    #[must_use]
    pub fn stage_name(&self, index: usize) -> &str {
        self.stages[index % self.stages.len()].name()
    }

    fn output_id(&self, id: &ResourceId) -> ResourceId {
        ResourceId::new(&id.namespace, self.output_kind, &id.id)
    }

    fn get_or_create_output(&self, id: &ResourceId) -> CoreResult<Resource<O>> {
        let output_id = self.output_id(id);
        match self.output_store.get(&output_id) {
            Ok(existing) => Ok(existing),
            Err(crate::error::CoreError::NotFound(_)) => {
                self.output_store.create(output_id.clone(), Metadata::new(), O::default())?;
                self.output_store.get(&output_id)
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl<I, O> Controller for SequenceController<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Clone + Default + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn reconcile(&self, id: &ResourceId) -> CoreResult<ReconcileOutcome> {
        let current_input = self.input_store.get(id)?;
        let current_output = self.get_or_create_output(id)?;
        let output_id = self.output_id(id);

        let index = Self::stage_index(&current_output) % self.stages.len();

        let mut working_input = current_input.clone();
        let mut working_output = current_output.clone();
        let outcome = self.stages[index].run(&mut working_input, &mut working_output).await?;

        let next_input_spec = working_input.spec;
        let next_input_annotations = working_input.metadata.annotations;
        let next_output_spec = working_output.spec;
        let next_output_annotations = working_output.metadata.annotations;

        self.input_store.update(id, current_input.metadata.version, |r| {
            r.spec = next_input_spec;
            r.metadata.annotations = next_input_annotations;
        })?;

        match outcome {
            StageOutcome::Advance => {
                let next_index = (index + 1) % self.stages.len();
                self.output_store.update(&output_id, current_output.metadata.version, |r| {
                    r.spec = next_output_spec;
                    r.metadata.annotations = next_output_annotations;
                    r.metadata
                        .set_annotation(STAGE_INDEX_ANNOTATION, next_index.to_string());
                })?;
                Ok(ReconcileOutcome::Done)
            }
            StageOutcome::Wait => {
                self.output_store.update(&output_id, current_output.metadata.version, |r| {
                    r.spec = next_output_spec;
                    r.metadata.annotations = next_output_annotations;
                })?;
                Ok(ReconcileOutcome::RequeueAfter(DEFAULT_WAIT_REQUEUE))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metadata;

    struct Inc;
    #[async_trait]
    impl Stage<u32, ()> for Inc {
        fn name(&self) -> &str {
            "inc"
        }
        async fn run(&self, input: &mut Resource<u32>, _output: &mut Resource<()>) -> CoreResult<StageOutcome> {
            input.spec += 1;
            Ok(StageOutcome::Advance)
        }
    }

    struct HoldUntilFive;
    #[async_trait]
    impl Stage<u32, ()> for HoldUntilFive {
        fn name(&self) -> &str {
            "hold-until-five"
        }
        async fn run(&self, input: &mut Resource<u32>, _output: &mut Resource<()>) -> CoreResult<StageOutcome> {
            if input.spec >= 5 {
                Ok(StageOutcome::Advance)
            } else {
                input.spec += 1;
                Ok(StageOutcome::Wait)
            }
        }
    }

    #[tokio::test]
    async fn sequence_cycles_through_stages() {
        let input_store = Arc::new(MemoryStore::<u32>::new());
        let output_store = Arc::new(MemoryStore::<()>::new());
        let id = ResourceId::new("default", "Counter", "a");
        input_store.create(id.clone(), Metadata::new(), 0).unwrap();

        let controller = SequenceController::new(
            "counter",
            input_store.clone(),
            output_store.clone(),
            "CounterStatus",
            vec![Box::new(Inc), Box::new(Inc)],
        );

        controller.reconcile(&id).await.unwrap();
        let after_first = input_store.get(&id).unwrap();
        assert_eq!(after_first.spec, 1);
        let status_id = ResourceId::new("default", "CounterStatus", "a");
        assert_eq!(
            SequenceController::<u32, ()>::stage_index(&output_store.get(&status_id).unwrap()),
            1
        );

        controller.reconcile(&id).await.unwrap();
        let after_second = input_store.get(&id).unwrap();
        assert_eq!(after_second.spec, 2);
        assert_eq!(
            SequenceController::<u32, ()>::stage_index(&output_store.get(&status_id).unwrap()),
            0,
            "wraps back to the first stage"
        );
    }

    #[tokio::test]
    async fn wait_does_not_advance_stage_index() {
        let input_store = Arc::new(MemoryStore::<u32>::new());
        let output_store = Arc::new(MemoryStore::<()>::new());
        let id = ResourceId::new("default", "Counter", "a");
        input_store.create(id.clone(), Metadata::new(), 0).unwrap();

        let controller = SequenceController::new(
            "holder",
            input_store.clone(),
            output_store.clone(),
            "CounterStatus",
            vec![Box::new(HoldUntilFive)],
        );

        for _ in 0..5 {
            controller.reconcile(&id).await.unwrap();
        }
        let waiting = input_store.get(&id).unwrap();
        assert_eq!(waiting.spec, 5);
        let status_id = ResourceId::new("default", "CounterStatus", "a");
        assert_eq!(
            SequenceController::<u32, ()>::stage_index(&output_store.get(&status_id).unwrap()),
            0
        );

        controller.reconcile(&id).await.unwrap();
        let advanced = input_store.get(&id).unwrap();
        let _ = advanced;
        assert_eq!(
            SequenceController::<u32, ()>::stage_index(&output_store.get(&status_id).unwrap()),
            0
        );
    }
}
