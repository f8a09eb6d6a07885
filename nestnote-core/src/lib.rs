//! Core library for Nest Note — shared household and childcare information.
//!
//! A nest is a flat set of entries, places and routines, each tagged with a
//! slash-delimited category. This crate derives the virtual folder tree from
//! those tags, composes the ordered sections of a folder screen, and tracks
//! multi-selection across a folder-browsing flow. Persistence goes through
//! the [`EntryRepository`] trait; [`SqliteNest`] is the local implementation.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

pub use crate::core::category;
pub use crate::core::settings;

// Re-export commonly used types.
#[doc(inline)]
pub use crate::core::{
    access::{AccessDecision, AccessDenied, ListingMode, Role},
    bulk::{run_bulk, BulkAction, BulkFailure, BulkOutcome},
    error::{NestError, Result},
    event::{EventSink, NestEvent, NullSink},
    folder::{derive_children, direct_members, FolderNode},
    nest::{FolderContents, NestData},
    record::{Categorized, CategoryMetadata, Entry, Place, Routine, Visibility},
    repository::{EntryGroups, EntryRepository},
    section::{
        build_sections, is_compact, Item, ItemKey, Section, SectionFilter, SectionKind,
        SectionToggle,
    },
    selection::{RecordRef, SelectAllOutcome, SelectionManager, SelectionState, ToggleOutcome},
    settings::{Entitlements, Settings},
    sqlite_nest::SqliteNest,
    storage::Storage,
};
