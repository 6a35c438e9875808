//! Events emitted by a pipeline run.
//!
//! The pipeline never touches presentation state directly; it reports what
//! happened to an [`Observer`] and lets the caller decide how to show it.

use serde::Serialize;
use std::sync::mpsc::Sender;

/// Something that happened during a run, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    /// Run accepted, `total` items will be visited
    Started {
        /// Number of items in the batch
        total: usize,
    },
    /// Item is about to be transformed
    ItemStarted {
        /// Position in the batch
        index: usize,
        /// Original file name
        name: String,
    },
    /// Item transformed successfully
    ItemSucceeded {
        /// Position in the batch
        index: usize,
        /// Original file name
        name: String,
        /// Derived output name
        output_name: String,
    },
    /// Item skipped or failed
    ItemFailed {
        /// Position in the batch
        index: usize,
        /// Original file name
        name: String,
        /// Display form of the item error
        reason: String,
    },
    /// Overall progress after an item, 0 to 100
    Progress(u8),
    /// Every item has been visited
    Finished {
        /// Items that produced a result
        succeeded: usize,
        /// Items skipped or failed
        failed: usize,
    },
}

/// Receiver of [`BatchEvent`]s.
pub trait Observer {
    /// Called synchronously for each event
    fn on_event(&mut self, event: &BatchEvent);
}

impl<F> Observer for F
where
    F: FnMut(&BatchEvent),
{
    fn on_event(&mut self, event: &BatchEvent) {
        self(event)
    }
}

/// Observer forwarding events over a channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver(pub Sender<BatchEvent>);

impl Observer for ChannelObserver {
    fn on_event(&mut self, event: &BatchEvent) {
        // A dropped receiver only means nobody is watching any more.
        let _ = self.0.send(event.clone());
    }
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_event(&mut self, _event: &BatchEvent) {}
}

/// Observer that records every event, mostly useful in tests.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    /// Events in arrival order
    pub events: Vec<BatchEvent>,
}

impl EventLog {
    /// Progress values in arrival order
    pub fn progress(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|event| match event {
                BatchEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect()
    }
}

impl Observer for EventLog {
    fn on_event(&mut self, event: &BatchEvent) {
        self.events.push(event.clone());
    }
}
