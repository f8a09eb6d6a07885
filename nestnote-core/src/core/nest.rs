//! A flat, in-memory copy of a nest and the per-folder views derived from it.

use crate::core::category;
use crate::core::folder::{derive_children, direct_members};
use crate::{CategoryMetadata, Categorized, Entry, FolderNode, NestEvent, Place, Routine};
use serde::{Deserialize, Serialize};

/// Everything a folder screen shows for one path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderContents {
    pub path: String,
    pub folders: Vec<FolderNode>,
    /// Entries whose category is exactly `path`.
    pub entries: Vec<Entry>,
    pub places: Vec<Place>,
    pub routines: Vec<Routine>,
    /// Every non-temporary place in the nest, for pickers.
    pub all_places: Vec<Place>,
}

/// Flat record set from which the folder tree is recomputed on every load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestData {
    pub entries: Vec<Entry>,
    pub places: Vec<Place>,
    pub routines: Vec<Routine>,
    pub categories: Vec<CategoryMetadata>,
}

impl NestData {
    /// Category of every record that takes part in the folder tree.
    pub fn record_categories(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .map(|e| e.category.as_str())
            .chain(listed_places(&self.places).map(|p| p.category.as_str()))
            .chain(self.routines.iter().map(|r| r.category.as_str()))
    }

    /// Immediate child folders of `path`.
    pub fn folders(&self, path: &str) -> Vec<FolderNode> {
        derive_children(self.record_categories(), path, &self.categories)
    }

    /// Folders plus records sitting directly in `path`.
    pub fn contents(&self, path: &str) -> FolderContents {
        let visible_places: Vec<Place> = listed_places(&self.places).cloned().collect();
        FolderContents {
            path: path.to_string(),
            folders: self.folders(path),
            entries: direct_members(&self.entries, path).into_iter().cloned().collect(),
            places: direct_members(&visible_places, path).into_iter().cloned().collect(),
            routines: direct_members(&self.routines, path).into_iter().cloned().collect(),
            all_places: visible_places,
        }
    }

    /// Entries anywhere under `scope`, including its descendants.
    pub fn entries_in_scope<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = &'a Entry> + 'a {
        in_scope(&self.entries, scope)
    }

    pub fn places_in_scope<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = &'a Place> + 'a {
        listed_places(&self.places).filter(move |p| category::is_in_scope(&p.category, scope))
    }

    pub fn routines_in_scope<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = &'a Routine> + 'a {
        in_scope(&self.routines, scope)
    }

    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Merges a child screen's notification into this copy.
    pub fn apply(&mut self, event: &NestEvent) {
        match event {
            NestEvent::EntrySaved { entry } => upsert(&mut self.entries, entry),
            NestEvent::EntryDeleted { entry_id } => self.entries.retain(|e| &e.id != entry_id),
            NestEvent::PlaceSaved { place } => upsert(&mut self.places, place),
            NestEvent::PlaceDeleted { place_id } => self.places.retain(|p| &p.id != place_id),
            NestEvent::RoutineSaved { routine } => upsert(&mut self.routines, routine),
            NestEvent::RoutineDeleted { routine_id } => {
                self.routines.retain(|r| &r.id != routine_id)
            }
            NestEvent::FolderCreated { path } => {
                if !self.categories.iter().any(|c| &c.name == path) {
                    self.categories.push(CategoryMetadata {
                        id: path.clone(),
                        name: path.clone(),
                        symbol_name: String::new(),
                        is_default: false,
                    });
                }
            }
            NestEvent::FolderDeleted { path } => {
                self.entries.retain(|e| !category::is_in_scope(&e.category, path));
                self.places.retain(|p| !category::is_in_scope(&p.category, path));
                self.routines.retain(|r| !category::is_in_scope(&r.category, path));
                self.categories.retain(|c| !category::is_in_scope(&c.name, path));
            }
            NestEvent::SelectionLimitReached { .. } => {}
        }
    }
}

fn listed_places(places: &[Place]) -> impl Iterator<Item = &Place> {
    places.iter().filter(|p| !p.is_temporary)
}

fn in_scope<'a, T: Categorized>(records: &'a [T], scope: &'a str) -> impl Iterator<Item = &'a T> + 'a {
    records
        .iter()
        .filter(move |r| category::is_in_scope(r.category(), scope))
}

fn upsert<T: Categorized + Clone>(records: &mut Vec<T>, record: &T) {
    match records.iter_mut().find(|r| r.id() == record.id()) {
        Some(existing) => *existing = record.clone(),
        None => records.push(record.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Visibility;

    fn sample() -> NestData {
        NestData {
            entries: vec![
                Entry::new("Food", "Kibble", "Pets", Visibility::HalfDay),
                Entry::new("Walks", "Twice", "Pets/Donna", Visibility::HalfDay),
                Entry::new("Vet", "Dr. Li", "Pets/Donna/Vet", Visibility::Extended),
                Entry::new("Wifi", "abc123", "Household", Visibility::HalfDay),
            ],
            places: vec![Place::new(Some("Dog park".into()), "Elm St", "Pets/Milo")],
            routines: vec![Routine::new("Feeding", "Pets", vec!["Fill bowl".into()])],
            categories: vec![],
        }
    }

    #[test]
    fn test_contents_splits_folders_and_direct_records() {
        let nest = sample();
        let contents = nest.contents("Pets");
        let paths: Vec<&str> = contents.folders.iter().map(|f| f.full_path.as_str()).collect();
        assert_eq!(paths, vec!["Pets/Donna", "Pets/Milo"]);
        assert_eq!(contents.folders[0].item_count, 2);
        assert_eq!(contents.folders[1].item_count, 1);
        assert_eq!(contents.entries.len(), 1);
        assert_eq!(contents.entries[0].title, "Food");
        assert_eq!(contents.routines.len(), 1);
        assert!(contents.places.is_empty());
        assert_eq!(contents.all_places.len(), 1);
    }

    #[test]
    fn test_temporary_places_are_not_listed() {
        let mut nest = sample();
        nest.places[0].is_temporary = true;
        assert!(nest.folders("Pets").iter().all(|f| f.full_path != "Pets/Milo"));
        assert!(nest.contents("").all_places.is_empty());
    }

    #[test]
    fn test_scope_iterators() {
        let nest = sample();
        assert_eq!(nest.entries_in_scope("Pets").count(), 3);
        assert_eq!(nest.places_in_scope("Pets").count(), 1);
        assert_eq!(nest.routines_in_scope("Household").count(), 0);
    }

    #[test]
    fn test_apply_entry_saved_is_insert_or_update() {
        let mut nest = sample();
        let mut edited = nest.entries[0].clone();
        edited.title = "Dinner".to_string();
        nest.apply(&NestEvent::EntrySaved { entry: edited.clone() });
        assert_eq!(nest.entries.len(), 4);
        assert_eq!(nest.entry(&edited.id).unwrap().title, "Dinner");

        let fresh = Entry::new("Alarm", "1234", "Household", Visibility::Extended);
        nest.apply(&NestEvent::EntrySaved { entry: fresh.clone() });
        assert_eq!(nest.entries.len(), 5);
        assert!(nest.entry(&fresh.id).is_some());
    }

    #[test]
    fn test_apply_folder_deleted_removes_scope() {
        let mut nest = sample();
        nest.apply(&NestEvent::FolderDeleted { path: "Pets/Donna".into() });
        assert_eq!(nest.entries.len(), 2);
        assert!(nest.entries.iter().all(|e| !e.category.starts_with("Pets/Donna")));
    }

    #[test]
    fn test_apply_folder_created_surfaces_empty_folder() {
        let mut nest = sample();
        nest.apply(&NestEvent::FolderCreated { path: "Pets/Goldfish".into() });
        nest.apply(&NestEvent::FolderCreated { path: "Pets/Goldfish".into() });
        let folders = nest.folders("Pets");
        assert_eq!(folders.len(), 3);
        assert_eq!(nest.categories.len(), 1);
    }
}
