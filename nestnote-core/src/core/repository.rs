//! The backend contract consumed by folder screens.

use crate::{CategoryMetadata, Entry, FolderContents, NestData, Place, Result, Routine};
use std::collections::BTreeMap;

/// Entries grouped by their exact category path.
pub type EntryGroups = BTreeMap<String, Vec<Entry>>;

/// Storage for a single nest.
///
/// Implementations may cache reads; the `refresh_*` methods bypass any cache.
/// Methods take `&self` so one repository can be shared by every screen of a
/// flow through an `Rc`.
pub trait EntryRepository {
    fn fetch_entries(&self) -> Result<EntryGroups>;
    fn fetch_categories(&self) -> Result<Vec<CategoryMetadata>>;
    fn fetch_places(&self) -> Result<Vec<Place>>;
    fn fetch_routines(&self) -> Result<Vec<Routine>>;

    fn refresh_entries(&self) -> Result<EntryGroups>;
    fn refresh_categories(&self) -> Result<Vec<CategoryMetadata>>;

    fn create_entry(&self, entry: Entry) -> Result<Entry>;
    /// Persists `entry` and returns it with `updated_at` bumped.
    fn update_entry(&self, entry: Entry) -> Result<Entry>;
    fn delete_entry(&self, entry_id: &str) -> Result<()>;

    fn create_place(&self, place: Place) -> Result<Place>;
    fn update_place(&self, place: Place) -> Result<Place>;
    fn delete_place(&self, place_id: &str) -> Result<()>;

    fn create_routine(&self, routine: Routine) -> Result<Routine>;
    fn update_routine(&self, routine: Routine) -> Result<Routine>;
    fn delete_routine(&self, routine_id: &str) -> Result<()>;

    /// Creates a folder. `path` must already be validated.
    fn create_category(&self, path: &str) -> Result<CategoryMetadata>;
    /// Deletes a folder and every record in its scope.
    fn delete_category(&self, path: &str) -> Result<()>;

    /// Loads the whole nest as one flat record set.
    fn fetch_nest(&self) -> Result<NestData> {
        Ok(NestData {
            entries: self.fetch_entries()?.into_values().flatten().collect(),
            places: self.fetch_places()?,
            routines: self.fetch_routines()?,
            categories: self.fetch_categories()?,
        })
    }

    /// Like [`fetch_nest`](Self::fetch_nest) but bypassing caches.
    fn refresh_nest(&self) -> Result<NestData> {
        Ok(NestData {
            entries: self.refresh_entries()?.into_values().flatten().collect(),
            places: self.fetch_places()?,
            routines: self.fetch_routines()?,
            categories: self.refresh_categories()?,
        })
    }

    /// Folders and directly-contained records for one path.
    fn fetch_folder_contents(&self, path: &str) -> Result<FolderContents> {
        Ok(self.fetch_nest()?.contents(path))
    }
}
