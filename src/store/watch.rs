// SPDX-License-Identifier: MIT OR Apache-2.0

//! Watch event shapes for [`crate::store::memory::MemoryStore`] (spec §4.1).

use crate::model::ResourceId;
use crate::model::Resource;

/// What `WatchKind` delivers for a single resource type (spec §4.1).
///
/// Listeners may lag, but they are guaranteed to eventually observe every
/// committed version "short of `Error`" — a lagged broadcast receiver
/// surfaces as an explicit `Error` event rather than silently skipping
/// versions (see [`KindWatcher::recv`]).
#[derive(Debug, Clone)]
pub enum WatchEvent<S> {
    Created(Resource<S>),
    Updated(Resource<S>),
    Destroyed(ResourceId),
    Bookmark,
    Error(String),
}

/// A receiver wrapping `tokio::sync::broadcast`, translating `Lagged` into
/// an explicit [`WatchEvent::Error`] instead of silently resuming.
pub struct KindWatcher<S> {
    inner: tokio::sync::broadcast::Receiver<WatchEvent<S>>,
}

impl<S: Clone> KindWatcher<S> {
    pub(crate) fn new(inner: tokio::sync::broadcast::Receiver<WatchEvent<S>>) -> Self {
        Self { inner }
    }

    /// Receive the next event. Returns `None` only once the store side of
    /// the channel has been dropped (the store itself is gone).
    pub async fn recv(&mut self) -> Option<WatchEvent<S>> {
        loop {
            match self.inner.recv().await {
                Ok(event) => return Some(event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    return Some(WatchEvent::Error(format!(
                        "watch lagged, missed {missed} events"
                    )));
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
