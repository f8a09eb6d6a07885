//! SQLite-backed [`EntryRepository`] for a single nest.

use crate::core::category;
use crate::core::folder::DEFAULT_FOLDER_SYMBOL;
use crate::core::repository::EntryGroups;
use crate::{
    CategoryMetadata, Entitlements, Entry, EntryRepository, NestError, Place, Result, Routine,
    Storage, Visibility,
};
use rusqlite::params;
use std::cell::RefCell;
use std::path::Path;
use uuid::Uuid;

/// SQL fragment matching `category` (parameter 1) and every path beneath it.
const IN_SCOPE: &str = "(category = ?1 OR substr(category, 1, length(?1) + 1) = ?1 || '/')";

/// A nest stored in a local SQLite file.
///
/// Entries and categories are cached after the first fetch; every mutation
/// invalidates the caches, and `refresh_*` reloads them unconditionally.
pub struct SqliteNest {
    storage: Storage,
    entitlements: Entitlements,
    entry_cache: RefCell<Option<Vec<Entry>>>,
    category_cache: RefCell<Option<Vec<CategoryMetadata>>>,
}

impl SqliteNest {
    /// Creates a new nest database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`NestError::Database`] for any SQLite failure.
    pub fn create<P: AsRef<Path>>(path: P, entitlements: Entitlements) -> Result<Self> {
        let storage = Storage::create(path)?;
        storage.connection().execute(
            "INSERT INTO nest_meta (key, value) VALUES ('created_at', ?)",
            [chrono::Utc::now().timestamp().to_string()],
        )?;
        Ok(Self::with_storage(storage, entitlements))
    }

    /// Opens an existing nest database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`NestError::InvalidNest`] if the file is not a nest database.
    pub fn open<P: AsRef<Path>>(path: P, entitlements: Entitlements) -> Result<Self> {
        Ok(Self::with_storage(Storage::open(path)?, entitlements))
    }

    pub fn in_memory(entitlements: Entitlements) -> Result<Self> {
        Ok(Self::with_storage(Storage::in_memory()?, entitlements))
    }

    fn with_storage(storage: Storage, entitlements: Entitlements) -> Self {
        Self {
            storage,
            entitlements,
            entry_cache: RefCell::new(None),
            category_cache: RefCell::new(None),
        }
    }

    pub fn entitlements(&self) -> Entitlements {
        self.entitlements
    }

    /// Applies new entitlement limits, e.g. after a subscription change.
    pub fn set_entitlements(&mut self, entitlements: Entitlements) {
        self.entitlements = entitlements;
    }

    pub fn get_entry(&self, entry_id: &str) -> Result<Entry> {
        let row = self
            .storage
            .connection()
            .query_row(
                "SELECT id, title, content, category, visibility, created_at, updated_at
                 FROM entries WHERE id = ?",
                [entry_id],
                map_entry_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => NestError::EntryNotFound(entry_id.to_string()),
                other => NestError::Database(other),
            })?;
        entry_from_row_tuple(row)
    }

    fn invalidate(&self) {
        self.entry_cache.replace(None);
        self.category_cache.replace(None);
    }

    fn load_entries(&self) -> Result<Vec<Entry>> {
        let mut stmt = self.storage.connection().prepare(
            "SELECT id, title, content, category, visibility, created_at, updated_at
             FROM entries ORDER BY category, title COLLATE NOCASE, id",
        )?;
        let rows = stmt
            .query_map([], map_entry_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(entry_from_row_tuple).collect()
    }

    fn load_categories(&self) -> Result<Vec<CategoryMetadata>> {
        let mut stmt = self.storage.connection().prepare(
            "SELECT id, name, symbol_name, is_default FROM categories ORDER BY name COLLATE NOCASE",
        )?;
        let categories = stmt
            .query_map([], |row| {
                Ok(CategoryMetadata {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    symbol_name: row.get(2)?,
                    is_default: row.get::<_, i64>(3)? != 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }
}

impl EntryRepository for SqliteNest {
    fn fetch_entries(&self) -> Result<EntryGroups> {
        if let Some(cached) = self.entry_cache.borrow().as_ref() {
            return Ok(group_by_category(cached.clone()));
        }
        self.refresh_entries()
    }

    fn refresh_entries(&self) -> Result<EntryGroups> {
        let entries = self.load_entries()?;
        self.entry_cache.replace(Some(entries.clone()));
        Ok(group_by_category(entries))
    }

    fn fetch_categories(&self) -> Result<Vec<CategoryMetadata>> {
        if let Some(cached) = self.category_cache.borrow().as_ref() {
            return Ok(cached.clone());
        }
        self.refresh_categories()
    }

    fn refresh_categories(&self) -> Result<Vec<CategoryMetadata>> {
        let categories = self.load_categories()?;
        self.category_cache.replace(Some(categories.clone()));
        Ok(categories)
    }

    fn fetch_places(&self) -> Result<Vec<Place>> {
        let mut stmt = self.storage.connection().prepare(
            "SELECT id, alias, address, category, notes, is_temporary, created_at, updated_at
             FROM places ORDER BY alias COLLATE NOCASE, id",
        )?;
        let places = stmt
            .query_map([], |row| {
                Ok(Place {
                    id: row.get(0)?,
                    alias: row.get(1)?,
                    address: row.get(2)?,
                    category: row.get(3)?,
                    notes: row.get(4)?,
                    is_temporary: row.get::<_, i64>(5)? != 0,
                    created_at: row.get(6)?,
                    updated_at: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(places)
    }

    fn fetch_routines(&self) -> Result<Vec<Routine>> {
        let mut stmt = self.storage.connection().prepare(
            "SELECT id, title, category, actions_json, created_at, updated_at
             FROM routines ORDER BY title COLLATE NOCASE, id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(id, title, category, actions_json, created_at, updated_at)| {
                Ok(Routine {
                    id,
                    title,
                    category,
                    actions: serde_json::from_str(&actions_json)?,
                    created_at,
                    updated_at,
                })
            })
            .collect()
    }

    fn create_entry(&self, entry: Entry) -> Result<Entry> {
        self.storage.connection().execute(
            "INSERT INTO entries (id, title, content, category, visibility, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                entry.id,
                entry.title,
                entry.content,
                category::normalize(&entry.category),
                entry.visibility.as_key(),
                entry.created_at,
                entry.updated_at,
            ],
        )?;
        self.invalidate();
        log::debug!("created entry {}", entry.id);
        self.get_entry(&entry.id)
    }

    fn update_entry(&self, mut entry: Entry) -> Result<Entry> {
        entry.category = category::normalize(&entry.category);
        entry.updated_at = chrono::Utc::now().timestamp();
        let changed = self.storage.connection().execute(
            "UPDATE entries SET title = ?, content = ?, category = ?, visibility = ?, updated_at = ?
             WHERE id = ?",
            params![
                entry.title,
                entry.content,
                entry.category,
                entry.visibility.as_key(),
                entry.updated_at,
                entry.id,
            ],
        )?;
        if changed == 0 {
            return Err(NestError::EntryNotFound(entry.id));
        }
        self.invalidate();
        Ok(entry)
    }

    fn delete_entry(&self, entry_id: &str) -> Result<()> {
        let changed = self
            .storage
            .connection()
            .execute("DELETE FROM entries WHERE id = ?", [entry_id])?;
        if changed == 0 {
            return Err(NestError::EntryNotFound(entry_id.to_string()));
        }
        self.invalidate();
        Ok(())
    }

    fn create_place(&self, mut place: Place) -> Result<Place> {
        place.category = category::normalize(&place.category);
        self.storage.connection().execute(
            "INSERT INTO places (id, alias, address, category, notes, is_temporary, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                place.id,
                place.alias,
                place.address,
                place.category,
                place.notes,
                place.is_temporary,
                place.created_at,
                place.updated_at,
            ],
        )?;
        self.invalidate();
        Ok(place)
    }

    fn update_place(&self, mut place: Place) -> Result<Place> {
        place.category = category::normalize(&place.category);
        place.updated_at = chrono::Utc::now().timestamp();
        let changed = self.storage.connection().execute(
            "UPDATE places SET alias = ?, address = ?, category = ?, notes = ?, is_temporary = ?, updated_at = ?
             WHERE id = ?",
            params![
                place.alias,
                place.address,
                place.category,
                place.notes,
                place.is_temporary,
                place.updated_at,
                place.id,
            ],
        )?;
        if changed == 0 {
            return Err(NestError::PlaceNotFound(place.id));
        }
        self.invalidate();
        Ok(place)
    }

    fn delete_place(&self, place_id: &str) -> Result<()> {
        let changed = self
            .storage
            .connection()
            .execute("DELETE FROM places WHERE id = ?", [place_id])?;
        if changed == 0 {
            return Err(NestError::PlaceNotFound(place_id.to_string()));
        }
        self.invalidate();
        Ok(())
    }

    fn create_routine(&self, mut routine: Routine) -> Result<Routine> {
        routine.category = category::normalize(&routine.category);
        self.storage.connection().execute(
            "INSERT INTO routines (id, title, category, actions_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                routine.id,
                routine.title,
                routine.category,
                serde_json::to_string(&routine.actions)?,
                routine.created_at,
                routine.updated_at,
            ],
        )?;
        self.invalidate();
        Ok(routine)
    }

    fn update_routine(&self, mut routine: Routine) -> Result<Routine> {
        routine.category = category::normalize(&routine.category);
        routine.updated_at = chrono::Utc::now().timestamp();
        let changed = self.storage.connection().execute(
            "UPDATE routines SET title = ?, category = ?, actions_json = ?, updated_at = ? WHERE id = ?",
            params![
                routine.title,
                routine.category,
                serde_json::to_string(&routine.actions)?,
                routine.updated_at,
                routine.id,
            ],
        )?;
        if changed == 0 {
            return Err(NestError::RoutineNotFound(routine.id));
        }
        self.invalidate();
        Ok(routine)
    }

    fn delete_routine(&self, routine_id: &str) -> Result<()> {
        let changed = self
            .storage
            .connection()
            .execute("DELETE FROM routines WHERE id = ?", [routine_id])?;
        if changed == 0 {
            return Err(NestError::RoutineNotFound(routine_id.to_string()));
        }
        self.invalidate();
        Ok(())
    }

    fn create_category(&self, path: &str) -> Result<CategoryMetadata> {
        let path = category::validate_folder_path(path)?;
        let conn = self.storage.connection();

        let existing = conn.query_row(
            "SELECT id, symbol_name, is_default FROM categories WHERE name = ?",
            [&path],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        );
        match existing {
            Ok((id, symbol_name, is_default)) => {
                return Ok(CategoryMetadata {
                    id,
                    name: path,
                    symbol_name,
                    is_default: is_default != 0,
                })
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(cap) = self.entitlements.category_cap {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
            if count as usize >= cap {
                return Err(NestError::CategoryLimitReached { cap });
            }
        }

        let meta = CategoryMetadata {
            id: Uuid::new_v4().to_string(),
            name: path,
            symbol_name: DEFAULT_FOLDER_SYMBOL.to_string(),
            is_default: false,
        };
        conn.execute(
            "INSERT INTO categories (id, name, symbol_name, is_default) VALUES (?, ?, ?, 0)",
            params![meta.id, meta.name, meta.symbol_name],
        )?;
        self.invalidate();
        log::info!("created folder {}", meta.name);
        Ok(meta)
    }

    fn delete_category(&self, path: &str) -> Result<()> {
        let path = category::normalize(path);
        if path.is_empty() {
            return Err(NestError::InvalidCategory(
                "The nest root cannot be deleted".to_string(),
            ));
        }
        let tx = self.storage.connection().unchecked_transaction()?;
        for table in ["entries", "places", "routines"] {
            tx.execute(&format!("DELETE FROM {table} WHERE {IN_SCOPE}"), [&path])?;
        }
        tx.execute(
            "DELETE FROM categories
             WHERE name = ?1 OR substr(name, 1, length(?1) + 1) = ?1 || '/'",
            [&path],
        )?;
        tx.commit()?;
        self.invalidate();
        log::info!("deleted folder {path} and its contents");
        Ok(())
    }
}

/// Raw 7-column tuple extracted from an `entries` row.
type EntryRow = (String, String, String, String, String, i64, i64);

fn map_entry_row(row: &rusqlite::Row) -> rusqlite::Result<EntryRow> {
    Ok((
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
        row.get::<_, String>(3)?,
        row.get::<_, String>(4)?,
        row.get::<_, i64>(5)?,
        row.get::<_, i64>(6)?,
    ))
}

fn entry_from_row_tuple(
    (id, title, content, category, visibility, created_at, updated_at): EntryRow,
) -> Result<Entry> {
    let visibility = Visibility::from_key(&visibility).ok_or_else(|| {
        NestError::InvalidNest(format!("Unknown visibility '{visibility}' on entry {id}"))
    })?;
    Ok(Entry {
        id,
        title,
        content,
        category,
        visibility,
        created_at,
        updated_at,
    })
}

fn group_by_category(entries: Vec<Entry>) -> EntryGroups {
    let mut groups = EntryGroups::new();
    for entry in entries {
        groups.entry(entry.category.clone()).or_default().push(entry);
    }
    groups
}
