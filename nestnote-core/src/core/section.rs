//! Ordered section composition for a folder screen.
//!
//! [`build_sections`] is a pure function: the same inputs always yield the same
//! sections in the same order, so the presentation layer can diff two values
//! instead of tracking section order in mutable side state.

use crate::core::folder::sort_folders;
use crate::{Entry, FolderNode, Place, Routine};
use serde::{Deserialize, Serialize};

/// Entries whose title and content are both shorter than this many characters
/// render in the two-column compact layout.
pub const COMPACT_THRESHOLD: usize = 15;

/// Kind of a section. Declaration order is the fixed display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    Folders,
    CompactEntries,
    LongEntries,
    Places,
    Routines,
}

impl SectionKind {
    pub const ORDER: [SectionKind; 5] = [
        Self::Folders,
        Self::CompactEntries,
        Self::LongEntries,
        Self::Places,
        Self::Routines,
    ];

    /// The filter toggle that controls this section.
    #[must_use]
    pub fn toggle(self) -> SectionToggle {
        match self {
            Self::Folders | Self::CompactEntries | Self::LongEntries => SectionToggle::Entries,
            Self::Places => SectionToggle::Places,
            Self::Routines => SectionToggle::Routines,
        }
    }
}

/// User-facing filter switches. Folders and entries share one switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionToggle {
    Entries,
    Places,
    Routines,
}

/// The set of enabled section toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionFilter {
    pub entries: bool,
    pub places: bool,
    pub routines: bool,
}

impl Default for SectionFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl SectionFilter {
    #[must_use]
    pub fn all() -> Self {
        Self {
            entries: true,
            places: true,
            routines: true,
        }
    }

    #[must_use]
    pub fn is_enabled(&self, toggle: SectionToggle) -> bool {
        match toggle {
            SectionToggle::Entries => self.entries,
            SectionToggle::Places => self.places,
            SectionToggle::Routines => self.routines,
        }
    }

    #[must_use]
    pub fn allows(&self, kind: SectionKind) -> bool {
        self.is_enabled(kind.toggle())
    }

    pub fn set(&mut self, toggle: SectionToggle, enabled: bool) {
        match toggle {
            SectionToggle::Entries => self.entries = enabled,
            SectionToggle::Places => self.places = enabled,
            SectionToggle::Routines => self.routines = enabled,
        }
    }
}

/// One row or cell in a folder screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Item {
    Folder(FolderNode),
    Entry(Entry),
    Place(Place),
    Routine(Routine),
}

/// Stable identity of an [`Item`] for diffing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKey {
    Folder(String),
    Entry(String),
    Place(String),
    Routine(String),
}

impl Item {
    #[must_use]
    pub fn key(&self) -> ItemKey {
        match self {
            Self::Folder(f) => ItemKey::Folder(f.full_path.clone()),
            Self::Entry(e) => ItemKey::Entry(e.id.clone()),
            Self::Place(p) => ItemKey::Place(p.id.clone()),
            Self::Routine(r) => ItemKey::Routine(r.id.clone()),
        }
    }
}

/// A non-empty, enabled section and its ordered items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub kind: SectionKind,
    pub items: Vec<Item>,
}

/// Presentation hint: short entries render two per row.
///
/// Computed from the current field values every time; never stored.
pub fn is_compact(entry: &Entry) -> bool {
    entry.title.chars().count() < COMPACT_THRESHOLD
        && entry.content.chars().count() < COMPACT_THRESHOLD
}

/// Composes the ordered sections for one folder screen.
///
/// `entries` must already be the entries sitting directly in the screen's
/// scope. Empty and filtered-out sections are omitted; the remaining ones keep
/// the [`SectionKind::ORDER`] sequence.
pub fn build_sections(
    folders: &[FolderNode],
    entries: &[Entry],
    places: &[Place],
    routines: &[Routine],
    filter: SectionFilter,
) -> Vec<Section> {
    let mut sections = Vec::new();

    for kind in SectionKind::ORDER {
        if !filter.allows(kind) {
            continue;
        }
        let items = match kind {
            SectionKind::Folders => {
                let mut sorted = folders.to_vec();
                sort_folders(&mut sorted);
                sorted.into_iter().map(Item::Folder).collect::<Vec<_>>()
            }
            SectionKind::CompactEntries => sorted_entries(entries, true),
            SectionKind::LongEntries => sorted_entries(entries, false),
            SectionKind::Places => {
                let mut sorted = places.to_vec();
                sorted.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()).then_with(|| a.id.cmp(&b.id)));
                sorted.into_iter().map(Item::Place).collect()
            }
            SectionKind::Routines => {
                let mut sorted = routines.to_vec();
                sorted.sort_by(|a, b| by_title(&a.title, &a.id, &b.title, &b.id));
                sorted.into_iter().map(Item::Routine).collect()
            }
        };
        if !items.is_empty() {
            sections.push(Section { kind, items });
        }
    }

    sections
}

fn sorted_entries(entries: &[Entry], compact: bool) -> Vec<Item> {
    let mut bucket: Vec<Entry> = entries
        .iter()
        .filter(|e| is_compact(e) == compact)
        .cloned()
        .collect();
    bucket.sort_by(|a, b| by_title(&a.title, &a.id, &b.title, &b.id));
    bucket.into_iter().map(Item::Entry).collect()
}

fn by_title(a_title: &str, a_id: &str, b_title: &str, b_id: &str) -> std::cmp::Ordering {
    a_title
        .to_lowercase()
        .cmp(&b_title.to_lowercase())
        .then_with(|| a_id.cmp(b_id))
}
