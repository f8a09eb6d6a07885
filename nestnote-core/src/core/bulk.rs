//! Bulk move and delete over a multi-selection.
//!
//! Bulk actions run their sub-operations one at a time against the
//! repository. They are not transactional: the run stops at the first
//! failure, items processed before it stay changed, and the unprocessed tail
//! is returned in [`BulkOutcome::remaining`] so the caller can resume.
//!
//! ## Serialization
//!
//! - `BulkAction` variants serialize in PascalCase (`"Delete"`,
//!   `{"Move":{"destination":"Pets"}}`).
//! - `BulkOutcome` fields serialize in camelCase.
//!
//! ```rust
//! use nestnote_core::BulkAction;
//!
//! let json = serde_json::to_string(&BulkAction::Delete).unwrap();
//! assert_eq!(json, r#""Delete""#);
//! ```

use crate::core::category;
use crate::{EntryRepository, NestData, NestError, NestEvent, RecordRef, Result, Role};
use serde::{Deserialize, Serialize};

/// What to do with every selected record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum BulkAction {
    /// Re-file every record under `destination`.
    Move { destination: String },
    /// Permanently remove every record.
    Delete,
}

/// The first record that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    pub target: RecordRef,
    pub message: String,
}

/// Result of [`run_bulk`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    /// Records changed before the run ended.
    pub processed: Vec<RecordRef>,
    /// The record the run stopped on, if any.
    pub failed: Option<BulkFailure>,
    /// Records never attempted because the run stopped early.
    pub remaining: Vec<RecordRef>,
    /// Notifications describing each processed change, in order.
    pub events: Vec<NestEvent>,
}

impl BulkOutcome {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }

    /// The failed record followed by the untouched ones; feed back into
    /// [`run_bulk`] to resume.
    #[must_use]
    pub fn unprocessed(&self) -> Vec<RecordRef> {
        self.failed
            .iter()
            .map(|f| f.target.clone())
            .chain(self.remaining.iter().cloned())
            .collect()
    }
}

/// Applies `action` to each of `targets` in order.
///
/// `data` supplies the current record values needed to re-file them.
///
/// # Errors
///
/// Fails before touching anything when `role` may not edit or when a move
/// destination is not a valid folder path. Per-record failures do not
/// produce an `Err`; they end the run and are reported in the outcome.
pub fn run_bulk<R: EntryRepository + ?Sized>(
    repo: &R,
    role: Role,
    data: &NestData,
    targets: Vec<RecordRef>,
    action: &BulkAction,
) -> Result<BulkOutcome> {
    role.require_edit("Changing several items")?;
    let destination = match action {
        BulkAction::Move { destination } => Some(category::validate_folder_path(destination)?),
        BulkAction::Delete => None,
    };

    let mut outcome = BulkOutcome::default();
    let mut pending = targets.into_iter();
    while let Some(target) = pending.next() {
        let result = match &destination {
            Some(dest) => move_one(repo, data, &target, dest),
            None => delete_one(repo, &target),
        };
        match result {
            Ok(event) => {
                outcome.events.push(event);
                outcome.processed.push(target);
            }
            Err(e) => {
                log::warn!(
                    "bulk {:?} stopped at {:?} after {} item(s): {e}",
                    action,
                    target,
                    outcome.processed.len()
                );
                outcome.failed = Some(BulkFailure {
                    target,
                    message: e.user_message(),
                });
                outcome.remaining = pending.collect();
                break;
            }
        }
    }
    Ok(outcome)
}

fn delete_one<R: EntryRepository + ?Sized>(repo: &R, target: &RecordRef) -> Result<NestEvent> {
    match target {
        RecordRef::Entry(id) => {
            repo.delete_entry(id)?;
            Ok(NestEvent::EntryDeleted { entry_id: id.clone() })
        }
        RecordRef::Place(id) => {
            repo.delete_place(id)?;
            Ok(NestEvent::PlaceDeleted { place_id: id.clone() })
        }
        RecordRef::Routine(id) => {
            repo.delete_routine(id)?;
            Ok(NestEvent::RoutineDeleted { routine_id: id.clone() })
        }
    }
}

fn move_one<R: EntryRepository + ?Sized>(
    repo: &R,
    data: &NestData,
    target: &RecordRef,
    destination: &str,
) -> Result<NestEvent> {
    match target {
        RecordRef::Entry(id) => {
            let mut entry = data
                .entries
                .iter()
                .find(|e| &e.id == id)
                .cloned()
                .ok_or_else(|| NestError::EntryNotFound(id.clone()))?;
            entry.category = destination.to_string();
            Ok(NestEvent::EntrySaved {
                entry: repo.update_entry(entry)?,
            })
        }
        RecordRef::Place(id) => {
            let mut place = data
                .places
                .iter()
                .find(|p| &p.id == id)
                .cloned()
                .ok_or_else(|| NestError::PlaceNotFound(id.clone()))?;
            place.category = destination.to_string();
            Ok(NestEvent::PlaceSaved {
                place: repo.update_place(place)?,
            })
        }
        RecordRef::Routine(id) => {
            let mut routine = data
                .routines
                .iter()
                .find(|r| &r.id == id)
                .cloned()
                .ok_or_else(|| NestError::RoutineNotFound(id.clone()))?;
            routine.category = destination.to_string();
            Ok(NestEvent::RoutineSaved {
                routine: repo.update_routine(routine)?,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Entitlements, Entry, Place, SqliteNest, Visibility};

    fn seeded() -> (SqliteNest, NestData) {
        let nest = SqliteNest::in_memory(Entitlements::default()).unwrap();
        nest.create_entry(Entry::new("Food", "", "Pets", Visibility::HalfDay)).unwrap();
        nest.create_entry(Entry::new("Walks", "", "Pets", Visibility::HalfDay)).unwrap();
        nest.create_place(Place::new(Some("Park".into()), "Elm St", "Pets")).unwrap();
        let data = nest.fetch_nest().unwrap();
        (nest, data)
    }

    fn all_targets(data: &NestData) -> Vec<RecordRef> {
        data.entries
            .iter()
            .map(|e| RecordRef::Entry(e.id.clone()))
            .chain(data.places.iter().map(|p| RecordRef::Place(p.id.clone())))
            .collect()
    }

    #[test]
    fn test_bulk_delete_all() {
        let (nest, data) = seeded();
        let outcome = run_bulk(&nest, Role::Owner, &data, all_targets(&data), &BulkAction::Delete).unwrap();

        assert!(outcome.is_complete());
        assert_eq!(outcome.processed.len(), 3);
        assert_eq!(outcome.events.len(), 3);
        assert!(nest.fetch_entries().unwrap().is_empty());
        assert!(nest.fetch_places().unwrap().is_empty());
    }

    #[test]
    fn test_bulk_move_rewrites_categories() {
        let (nest, data) = seeded();
        let action = BulkAction::Move {
            destination: "Pets/Donna".to_string(),
        };
        let outcome = run_bulk(&nest, Role::Owner, &data, all_targets(&data), &action).unwrap();

        assert!(outcome.is_complete());
        let groups = nest.fetch_entries().unwrap();
        assert_eq!(groups["Pets/Donna"].len(), 2);
        assert_eq!(nest.fetch_places().unwrap()[0].category, "Pets/Donna");
        assert!(matches!(outcome.events[0], NestEvent::EntrySaved { .. }));
    }

    #[test]
    fn test_partial_failure_stops_and_reports_tail() {
        let (nest, data) = seeded();
        let mut targets = all_targets(&data);
        targets.insert(1, RecordRef::Entry("ghost".to_string()));

        let outcome = run_bulk(&nest, Role::Owner, &data, targets, &BulkAction::Delete).unwrap();

        assert!(!outcome.is_complete());
        assert_eq!(outcome.processed.len(), 1);
        assert_eq!(outcome.failed.as_ref().unwrap().target, RecordRef::Entry("ghost".into()));
        assert_eq!(outcome.remaining.len(), 2);
        assert_eq!(outcome.unprocessed().len(), 3);
        // The first delete is not rolled back.
        assert_eq!(nest.fetch_entries().unwrap()["Pets"].len(), 1);
    }

    #[test]
    fn test_sitter_cannot_run_bulk() {
        let (nest, data) = seeded();
        let sitter = Role::Sitter {
            ceiling: Visibility::Comprehensive,
        };
        let result = run_bulk(&nest, sitter, &data, all_targets(&data), &BulkAction::Delete);
        assert!(matches!(result, Err(NestError::PermissionDenied(_))));
        assert_eq!(nest.fetch_entries().unwrap()["Pets"].len(), 2);
    }

    #[test]
    fn test_too_deep_destination_rejected_up_front() {
        let (nest, data) = seeded();
        let action = BulkAction::Move {
            destination: "a/b/c/d".to_string(),
        };
        let result = run_bulk(&nest, Role::Owner, &data, all_targets(&data), &action);
        assert!(matches!(result, Err(NestError::FolderTooDeep { .. })));
    }

    #[test]
    fn test_move_action_serialization() {
        let json = serde_json::to_string(&BulkAction::Move {
            destination: "Pets".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"Move":{"destination":"Pets"}}"#);
    }
}
