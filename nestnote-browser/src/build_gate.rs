//! At-most-one in-flight section build per screen.
//!
//! A request arriving while a build is outstanding is dropped, not queued; the
//! gate remembers that state changed so the caller re-requests once the
//! outstanding build completes. A ticket dropped without being handed back
//! releases its slot, so an abandoned build never wedges the gate.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug, Default)]
struct Slot {
    next: u64,
    in_flight: Option<u64>,
    dirty: bool,
}

/// Proof that the holder owns the current build slot.
#[derive(Debug)]
pub struct BuildTicket {
    id: u64,
    slot: Weak<RefCell<Slot>>,
}

impl Drop for BuildTicket {
    fn drop(&mut self) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        let mut slot = slot.borrow_mut();
        if slot.in_flight == Some(self.id) {
            log::debug!("build {} dropped before completing; releasing slot", self.id);
            slot.in_flight = None;
            slot.dirty = true;
        }
    }
}

#[derive(Debug, Default)]
pub struct BuildGate {
    slot: Rc<RefCell<Slot>>,
}

impl BuildGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_building(&self) -> bool {
        self.slot.borrow().in_flight.is_some()
    }

    /// Whether `ticket` holds this gate's current slot.
    pub fn owns(&self, ticket: &BuildTicket) -> bool {
        std::ptr::eq(ticket.slot.as_ptr(), Rc::as_ptr(&self.slot))
            && self.slot.borrow().in_flight == Some(ticket.id)
    }

    /// Claims the build slot, or returns `None` and marks the gate dirty when
    /// a build is already running.
    pub fn try_begin(&mut self) -> Option<BuildTicket> {
        let mut slot = self.slot.borrow_mut();
        if slot.in_flight.is_some() {
            log::debug!("section build already in flight; dropping request");
            slot.dirty = true;
            return None;
        }
        slot.next += 1;
        let id = slot.next;
        slot.in_flight = Some(id);
        slot.dirty = false;
        Some(BuildTicket {
            id,
            slot: Rc::downgrade(&self.slot),
        })
    }

    /// Releases the slot. Returns `true` when requests were dropped meanwhile
    /// and another build should be started.
    pub fn finish(&mut self, ticket: BuildTicket) -> bool {
        if !self.owns(&ticket) {
            log::debug!("ignoring stale build ticket {}", ticket.id);
            return false;
        }
        let mut slot = self.slot.borrow_mut();
        slot.in_flight = None;
        std::mem::take(&mut slot.dirty)
    }

    /// Releases the slot without producing a result.
    pub fn abandon(&mut self, ticket: BuildTicket) -> bool {
        self.finish(ticket)
    }
}
