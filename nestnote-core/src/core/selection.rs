//! Multi-select state shared across a folder-browsing flow.
//!
//! A [`SelectionManager`] is cheap to clone into a child folder screen with
//! [`SelectionManager::child`]; parent and child share one [`SelectionState`],
//! so a selection made in a subfolder is visible from the parent immediately.

use crate::{EventSink, FolderNode, NestData, NestEvent};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Three disjoint ID sets, one per selectable record kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub entries: BTreeSet<String>,
    pub places: BTreeSet<String>,
    pub routines: BTreeSet<String>,
}

impl SelectionState {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len() + self.places.len() + self.routines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set_mut(&mut self, kind: SelectionKind) -> &mut BTreeSet<String> {
        match kind {
            SelectionKind::Entry => &mut self.entries,
            SelectionKind::Place => &mut self.places,
            SelectionKind::Routine => &mut self.routines,
        }
    }

    fn set(&self, kind: SelectionKind) -> &BTreeSet<String> {
        match kind {
            SelectionKind::Entry => &self.entries,
            SelectionKind::Place => &self.places,
            SelectionKind::Routine => &self.routines,
        }
    }

    /// Every selected record: entries, then places, then routines.
    #[must_use]
    pub fn targets(&self) -> Vec<RecordRef> {
        self.entries
            .iter()
            .cloned()
            .map(RecordRef::Entry)
            .chain(self.places.iter().cloned().map(RecordRef::Place))
            .chain(self.routines.iter().cloned().map(RecordRef::Routine))
            .collect()
    }

    /// Rebuilds a selection from a list of record references.
    #[must_use]
    pub fn from_targets<I: IntoIterator<Item = RecordRef>>(targets: I) -> Self {
        let mut state = Self::default();
        for target in targets {
            match target {
                RecordRef::Entry(id) => state.entries.insert(id),
                RecordRef::Place(id) => state.places.insert(id),
                RecordRef::Routine(id) => state.routines.insert(id),
            };
        }
        state
    }

    /// Selected records lying anywhere under `scope`.
    #[must_use]
    pub fn count_in_scope(&self, data: &NestData, scope: &str) -> usize {
        scope_targets(data, scope)
            .iter()
            .filter(|(kind, id)| self.set(*kind).contains(id))
            .count()
    }
}

/// A reference to one selectable record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum RecordRef {
    Entry(String),
    Place(String),
    Routine(String),
}

impl RecordRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Entry(id) | Self::Place(id) | Self::Routine(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectionKind {
    Entry,
    Place,
    Routine,
}

/// Result of toggling a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Selected,
    Deselected,
    /// The cap is reached; nothing changed.
    LimitReached,
}

/// Result of [`SelectionManager::select_all_in_scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAllOutcome {
    /// The scope holds no selectable records.
    Nothing,
    Selected { added: usize },
    /// Everything was already selected, so the scope was cleared.
    Deselected { removed: usize },
    /// The cap stopped the operation part-way.
    LimitReached { added: usize },
}

/// Scoped handle on a shared [`SelectionState`].
#[derive(Clone)]
pub struct SelectionManager {
    state: Rc<RefCell<SelectionState>>,
    scope: String,
    cap: Option<usize>,
    sink: Rc<dyn EventSink>,
}

impl SelectionManager {
    /// Starts a fresh, empty selection rooted at `scope`.
    pub fn new(scope: impl Into<String>, cap: Option<usize>, sink: Rc<dyn EventSink>) -> Self {
        Self {
            state: Rc::new(RefCell::new(SelectionState::default())),
            scope: scope.into(),
            cap,
            sink,
        }
    }

    /// A handle for a subfolder that shares this manager's state.
    #[must_use]
    pub fn child(&self, scope: impl Into<String>) -> Self {
        Self {
            state: Rc::clone(&self.state),
            scope: scope.into(),
            cap: self.cap,
            sink: Rc::clone(&self.sink),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn cap(&self) -> Option<usize> {
        self.cap
    }

    /// Copy of the whole-flow selection.
    #[must_use]
    pub fn snapshot(&self) -> SelectionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    pub fn is_entry_selected(&self, id: &str) -> bool {
        self.state.borrow().entries.contains(id)
    }

    pub fn is_place_selected(&self, id: &str) -> bool {
        self.state.borrow().places.contains(id)
    }

    pub fn is_routine_selected(&self, id: &str) -> bool {
        self.state.borrow().routines.contains(id)
    }

    pub fn toggle_entry(&self, id: &str) -> ToggleOutcome {
        self.toggle(SelectionKind::Entry, id)
    }

    pub fn toggle_place(&self, id: &str) -> ToggleOutcome {
        self.toggle(SelectionKind::Place, id)
    }

    pub fn toggle_routine(&self, id: &str) -> ToggleOutcome {
        self.toggle(SelectionKind::Routine, id)
    }

    /// Selects every record under this manager's scope, or clears the scope
    /// when everything in it is already selected.
    ///
    /// Entries go first, then places, then routines. When the cap cuts the
    /// operation short a single limit notification is emitted.
    pub fn select_all_in_scope(&self, data: &NestData) -> SelectAllOutcome {
        let targets = scope_targets(data, &self.scope);
        if targets.is_empty() {
            return SelectAllOutcome::Nothing;
        }

        let outcome = {
            let mut state = self.state.borrow_mut();
            let all_selected = targets
                .iter()
                .all(|(kind, id)| state.set(*kind).contains(id));

            if all_selected {
                for (kind, id) in &targets {
                    state.set_mut(*kind).remove(id);
                }
                SelectAllOutcome::Deselected {
                    removed: targets.len(),
                }
            } else {
                let mut added = 0;
                let mut cut_short = false;
                for (kind, id) in targets {
                    if state.set(kind).contains(&id) {
                        continue;
                    }
                    if self.cap.is_some_and(|cap| state.len() >= cap) {
                        cut_short = true;
                        break;
                    }
                    state.set_mut(kind).insert(id);
                    added += 1;
                }
                if cut_short {
                    SelectAllOutcome::LimitReached { added }
                } else {
                    SelectAllOutcome::Selected { added }
                }
            }
        };

        if matches!(outcome, SelectAllOutcome::LimitReached { .. }) {
            self.notify_limit();
        }
        outcome
    }

    /// Empties the whole-flow selection.
    pub fn clear_all(&self) {
        *self.state.borrow_mut() = SelectionState::default();
    }

    /// Replaces the whole-flow selection with `snapshot`.
    ///
    /// A snapshot larger than the cap is accepted as-is; the cap only guards
    /// new selections.
    pub fn restore(&self, snapshot: SelectionState) {
        *self.state.borrow_mut() = snapshot;
    }

    /// Hands the selection to a bulk action and leaves it empty.
    #[must_use]
    pub fn take(&self) -> SelectionState {
        std::mem::take(&mut *self.state.borrow_mut())
    }

    /// Drops records that `event` deletes from the whole-flow selection.
    ///
    /// Call before merging the event into `data`: a folder deletion is resolved
    /// against the records `data` still holds under that folder. Returns the
    /// number of records deselected.
    pub fn forget_deleted(&self, event: &NestEvent, data: &NestData) -> usize {
        let gone: Vec<(SelectionKind, String)> = match event {
            NestEvent::EntryDeleted { entry_id } => vec![(SelectionKind::Entry, entry_id.clone())],
            NestEvent::PlaceDeleted { place_id } => vec![(SelectionKind::Place, place_id.clone())],
            NestEvent::RoutineDeleted { routine_id } => {
                vec![(SelectionKind::Routine, routine_id.clone())]
            }
            NestEvent::FolderDeleted { path } => scope_targets(data, path),
            _ => return 0,
        };
        let mut state = self.state.borrow_mut();
        let mut removed = 0;
        for (kind, id) in &gone {
            if state.set_mut(*kind).remove(id) {
                removed += 1;
            }
        }
        if removed > 0 {
            log::debug!("deselected {removed} deleted record(s)");
        }
        removed
    }

    /// Fills in `selected_count` on each folder.
    pub fn annotate(&self, folders: &mut [FolderNode], data: &NestData) {
        let state = self.state.borrow();
        for folder in folders {
            folder.selected_count = state.count_in_scope(data, &folder.full_path);
        }
    }

    fn toggle(&self, kind: SelectionKind, id: &str) -> ToggleOutcome {
        let outcome = {
            let mut state = self.state.borrow_mut();
            if state.set_mut(kind).remove(id) {
                ToggleOutcome::Deselected
            } else if self.cap.is_some_and(|cap| state.len() >= cap) {
                ToggleOutcome::LimitReached
            } else {
                state.set_mut(kind).insert(id.to_string());
                ToggleOutcome::Selected
            }
        };
        if outcome == ToggleOutcome::LimitReached {
            self.notify_limit();
        }
        outcome
    }

    fn notify_limit(&self) {
        if let Some(cap) = self.cap {
            log::debug!("selection limit of {cap} reached");
            self.sink.emit(NestEvent::SelectionLimitReached { cap });
        }
    }
}

/// Selectable records under `scope` in priority order: entries, places, routines.
fn scope_targets(data: &NestData, scope: &str) -> Vec<(SelectionKind, String)> {
    let mut entries: Vec<_> = data.entries_in_scope(scope).collect();
    entries.sort_by(|a, b| {
        (a.category.as_str(), a.title.to_lowercase(), a.id.as_str())
            .cmp(&(b.category.as_str(), b.title.to_lowercase(), b.id.as_str()))
    });
    let mut places: Vec<_> = data.places_in_scope(scope).collect();
    places.sort_by(|a, b| (a.sort_key(), a.id.as_str()).cmp(&(b.sort_key(), b.id.as_str())));
    let mut routines: Vec<_> = data.routines_in_scope(scope).collect();
    routines.sort_by(|a, b| {
        (a.title.to_lowercase(), a.id.as_str()).cmp(&(b.title.to_lowercase(), b.id.as_str()))
    });

    entries
        .into_iter()
        .map(|e| (SelectionKind::Entry, e.id.clone()))
        .chain(places.into_iter().map(|p| (SelectionKind::Place, p.id.clone())))
        .chain(routines.into_iter().map(|r| (SelectionKind::Routine, r.id.clone())))
        .collect()
}
