//! One-shot notifications from a child screen to its parent.
//!
//! Events are delivered through an [`EventSink`] handed to each component at
//! construction, so the signalling graph between screens is explicit.

use crate::{Entry, Place, Routine};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;

/// A change the parent screen should merge into its own copy of the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NestEvent {
    /// Insert-or-update keyed by `entry.id`.
    EntrySaved { entry: Entry },
    EntryDeleted { entry_id: String },
    /// Insert-or-update keyed by `place.id`.
    PlaceSaved { place: Place },
    PlaceDeleted { place_id: String },
    /// Insert-or-update keyed by `routine.id`.
    RoutineSaved { routine: Routine },
    RoutineDeleted { routine_id: String },
    FolderCreated { path: String },
    /// The folder and everything in its scope are gone.
    FolderDeleted { path: String },
    /// A selection was refused or cut short by the entitlement cap.
    SelectionLimitReached { cap: usize },
}

/// Receiver side of the notification channel.
pub trait EventSink {
    fn emit(&self, event: NestEvent);
}

impl EventSink for Sender<NestEvent> {
    fn emit(&self, event: NestEvent) {
        if self.send(event).is_err() {
            log::debug!("event dropped: listener disconnected");
        }
    }
}

/// Sink for components nobody listens to.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: NestEvent) {}
}
