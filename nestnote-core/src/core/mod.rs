//! Internal domain modules for the Nest Note core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod access;
pub mod bulk;
pub mod category;
pub mod error;
pub mod event;
pub mod folder;
pub mod nest;
pub mod record;
pub mod repository;
pub mod section;
pub mod selection;
pub mod settings;
pub mod sqlite_nest;
pub mod storage;

#[doc(inline)]
pub use access::{AccessDecision, AccessDenied, ListingMode, Role};
#[doc(inline)]
pub use bulk::{run_bulk, BulkAction, BulkFailure, BulkOutcome};
#[doc(inline)]
pub use error::{NestError, Result};
#[doc(inline)]
pub use event::{EventSink, NestEvent, NullSink};
#[doc(inline)]
pub use folder::{derive_children, direct_members, FolderNode};
#[doc(inline)]
pub use nest::{FolderContents, NestData};
#[doc(inline)]
pub use record::{Categorized, CategoryMetadata, Entry, Place, Routine, Visibility};
#[doc(inline)]
pub use repository::{EntryGroups, EntryRepository};
#[doc(inline)]
pub use section::{build_sections, is_compact, Item, ItemKey, Section, SectionFilter, SectionKind, SectionToggle};
#[doc(inline)]
pub use selection::{RecordRef, SelectAllOutcome, SelectionManager, SelectionState, ToggleOutcome};
#[doc(inline)]
pub use settings::{Entitlements, Settings};
#[doc(inline)]
pub use sqlite_nest::SqliteNest;
#[doc(inline)]
pub use storage::Storage;
