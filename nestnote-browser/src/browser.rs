//! Controller behind a single folder screen.
//!
//! A [`FolderBrowser`] owns the flat data for its flow, the screen's path and
//! section filter, and a scoped handle on the flow's shared selection. Child
//! screens are created with [`FolderBrowser::enter_folder`] and share the
//! repository, role, event sink and selection with their parent.

use crate::build_gate::{BuildGate, BuildTicket};
use crate::liveness::{AliveToken, Liveness};
use nestnote_core::{
    build_sections, category, run_bulk, AccessDecision, AccessDenied, BulkAction, BulkOutcome,
    Entitlements, Entry, EntryRepository, EventSink, FolderNode, ListingMode, NestData, NestError,
    NestEvent, Place, Result, Role, Routine, Section, SectionFilter, SectionToggle,
    SelectAllOutcome, SelectionManager, SelectionState, ToggleOutcome,
};
use std::rc::Rc;

/// Where the screen's data stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    /// The last fetch failed; carries the user-facing message. Not retried
    /// until the user refreshes or navigates again.
    Failed(String),
}

/// Result of trying to open an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOpen<'a> {
    Open(&'a Entry),
    Denied(AccessDenied),
}

/// Inputs captured for one section build; plain data, so it may be run away
/// from the screen.
#[derive(Debug)]
pub struct PendingBuild {
    ticket: BuildTicket,
    folders: Vec<FolderNode>,
    entries: Vec<Entry>,
    places: Vec<Place>,
    routines: Vec<Routine>,
    filter: SectionFilter,
}

impl PendingBuild {
    pub fn run(self) -> CompletedBuild {
        let sections = build_sections(
            &self.folders,
            &self.entries,
            &self.places,
            &self.routines,
            self.filter,
        );
        CompletedBuild {
            ticket: self.ticket,
            sections,
        }
    }
}

#[derive(Debug)]
pub struct CompletedBuild {
    ticket: BuildTicket,
    sections: Vec<Section>,
}

pub struct FolderBrowser<R: EntryRepository> {
    repo: Rc<R>,
    role: Role,
    listing_mode: ListingMode,
    path: String,
    filter: SectionFilter,
    selection: SelectionManager,
    selecting: bool,
    data: NestData,
    state: LoadState,
    sections: Vec<Section>,
    gate: BuildGate,
    liveness: Liveness,
    sink: Rc<dyn EventSink>,
}

impl<R: EntryRepository> FolderBrowser<R> {
    /// Creates the root screen of a browsing flow. Call [`load`](Self::load) next.
    pub fn new(
        repo: Rc<R>,
        role: Role,
        entitlements: Entitlements,
        filter: SectionFilter,
        listing_mode: ListingMode,
        sink: Rc<dyn EventSink>,
    ) -> Self {
        let selection = SelectionManager::new("", entitlements.selection_cap, Rc::clone(&sink));
        Self {
            repo,
            role,
            listing_mode,
            path: String::new(),
            filter,
            selection,
            selecting: false,
            data: NestData::default(),
            state: LoadState::Idle,
            sections: Vec::new(),
            gate: BuildGate::new(),
            liveness: Liveness::new(),
            sink,
        }
    }

    /// Creates the screen for `folder`, sharing this flow's selection.
    ///
    /// The child starts from the parent's copy of the data so it renders
    /// immediately.
    pub fn enter_folder(&self, folder: &FolderNode) -> Self {
        let mut child = Self {
            repo: Rc::clone(&self.repo),
            role: self.role,
            listing_mode: self.listing_mode,
            path: folder.full_path.clone(),
            filter: self.filter,
            selection: self.selection.child(folder.full_path.clone()),
            selecting: self.selecting,
            data: self.data.clone(),
            state: self.state.clone(),
            sections: Vec::new(),
            gate: BuildGate::new(),
            liveness: Liveness::new(),
            sink: Rc::clone(&self.sink),
        };
        child.rebuild();
        child
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Screen title: the folder's last path component, or `None` at the root.
    pub fn title(&self) -> Option<&str> {
        if self.path.is_empty() {
            None
        } else {
            Some(category::last_component(&self.path))
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn data(&self) -> &NestData {
        &self.data
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn filter(&self) -> SectionFilter {
        self.filter
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn is_selecting(&self) -> bool {
        self.selecting
    }

    // ── loading ──────────────────────────────────────────────────

    /// Marks the screen as loading and returns the token the fetch must carry.
    pub fn begin_load(&mut self) -> AliveToken {
        self.state = LoadState::Loading;
        self.liveness.token()
    }

    /// Applies a fetch result. Returns `false` when the result was discarded
    /// because the screen has been torn down.
    pub fn apply_load(&mut self, token: &AliveToken, result: Result<NestData>) -> bool {
        if !token.is_alive() {
            log::debug!("discarding fetch for torn-down screen {:?}", self.path);
            return false;
        }
        match result {
            Ok(data) => {
                let data = self.role.visible_nest(sanitize(data), self.listing_mode);
                self.data = data;
                self.state = LoadState::Loaded;
            }
            Err(e) => {
                log::error!("failed to load nest for {:?}: {e}", self.path);
                self.state = LoadState::Failed(e.user_message());
            }
        }
        self.rebuild();
        true
    }

    /// Fetches through the repository's cache.
    pub fn load(&mut self) {
        let token = self.begin_load();
        let result = self.repo.fetch_nest();
        self.apply_load(&token, result);
    }

    /// Pull-to-refresh: fetches bypassing the repository's cache.
    pub fn refresh(&mut self) {
        let token = self.begin_load();
        let result = self.repo.refresh_nest();
        self.apply_load(&token, result);
    }

    /// The screen is going away; late fetch results are ignored from now on.
    pub fn teardown(&mut self) {
        self.liveness.teardown();
    }

    // ── section builds ───────────────────────────────────────────

    /// Claims the build slot and captures the current inputs, or returns
    /// `None` when a build is already outstanding.
    pub fn request_build(&mut self) -> Option<PendingBuild> {
        let ticket = self.gate.try_begin()?;
        let contents = self.data.contents(&self.path);
        let mut folders = contents.folders;
        if self.selecting {
            self.selection.annotate(&mut folders, &self.data);
        }
        Some(PendingBuild {
            ticket,
            folders,
            entries: contents.entries,
            places: contents.places,
            routines: contents.routines,
            filter: self.filter,
        })
    }

    /// Installs a finished build. Returns `true` when state changed while it
    /// was running and another build should be requested.
    ///
    /// A build that does not hold this screen's slot is discarded.
    pub fn complete_build(&mut self, build: CompletedBuild) -> bool {
        let CompletedBuild { ticket, sections } = build;
        if !self.gate.owns(&ticket) {
            log::debug!("discarding build not issued for screen {:?}", self.path);
            return false;
        }
        self.sections = sections;
        self.gate.finish(ticket)
    }

    /// Gives up a requested build without installing anything. Returns `true`
    /// when another build should be requested.
    ///
    /// Dropping a [`PendingBuild`] or [`CompletedBuild`] also releases the slot.
    pub fn abandon_build(&mut self, build: PendingBuild) -> bool {
        self.gate.abandon(build.ticket)
    }

    /// Builds synchronously until the sections reflect the latest state.
    /// Returns `false` if a build was already outstanding.
    pub fn rebuild(&mut self) -> bool {
        let Some(mut pending) = self.request_build() else {
            return false;
        };
        loop {
            if !self.complete_build(pending.run()) {
                return true;
            }
            match self.request_build() {
                Some(next) => pending = next,
                None => return true,
            }
        }
    }

    pub fn set_filter(&mut self, toggle: SectionToggle, enabled: bool) {
        self.filter.set(toggle, enabled);
        self.rebuild();
    }

    // ── opening and editing ──────────────────────────────────────

    /// Opens an entry, refusing entries above a sitter's ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`NestError::EntryNotFound`] if the entry is not in this flow's data.
    pub fn open_entry(&self, entry_id: &str) -> Result<EntryOpen<'_>> {
        let entry = self
            .data
            .entry(entry_id)
            .ok_or_else(|| NestError::EntryNotFound(entry_id.to_string()))?;
        Ok(match self.role.check(entry) {
            AccessDecision::Granted => EntryOpen::Open(entry),
            AccessDecision::Denied(denied) => EntryOpen::Denied(denied),
        })
    }

    /// Merges a notification from a child screen into this screen's data.
    pub fn apply_event(&mut self, event: &NestEvent) {
        self.merge(event);
        self.rebuild();
    }

    /// Creates or updates `entry`, filing new entries in this folder when
    /// their category is empty.
    pub fn save_entry(&mut self, mut entry: Entry) -> Result<Entry> {
        self.role.require_edit("Saving an entry")?;
        let saved = if self.data.entry(&entry.id).is_some() {
            self.repo.update_entry(entry)?
        } else {
            if category::normalize(&entry.category).is_empty() {
                entry.category = self.path.clone();
            }
            self.repo.create_entry(entry)?
        };
        self.publish(NestEvent::EntrySaved { entry: saved.clone() });
        Ok(saved)
    }

    pub fn delete_entry(&mut self, entry_id: &str) -> Result<()> {
        self.role.require_edit("Deleting an entry")?;
        self.repo.delete_entry(entry_id)?;
        self.publish(NestEvent::EntryDeleted {
            entry_id: entry_id.to_string(),
        });
        Ok(())
    }

    pub fn save_place(&mut self, place: Place) -> Result<Place> {
        self.role.require_edit("Saving a place")?;
        let exists = self.data.places.iter().any(|p| p.id == place.id);
        let saved = if exists {
            self.repo.update_place(place)?
        } else {
            self.repo.create_place(place)?
        };
        self.publish(NestEvent::PlaceSaved { place: saved.clone() });
        Ok(saved)
    }

    pub fn delete_place(&mut self, place_id: &str) -> Result<()> {
        self.role.require_edit("Deleting a place")?;
        self.repo.delete_place(place_id)?;
        self.publish(NestEvent::PlaceDeleted {
            place_id: place_id.to_string(),
        });
        Ok(())
    }

    /// Creates or updates `routine`, filing new routines in this folder when
    /// their category is empty.
    pub fn save_routine(&mut self, mut routine: Routine) -> Result<Routine> {
        self.role.require_edit("Saving a routine")?;
        let exists = self.data.routines.iter().any(|r| r.id == routine.id);
        let saved = if exists {
            self.repo.update_routine(routine)?
        } else {
            if category::normalize(&routine.category).is_empty() {
                routine.category = self.path.clone();
            }
            self.repo.create_routine(routine)?
        };
        self.publish(NestEvent::RoutineSaved {
            routine: saved.clone(),
        });
        Ok(saved)
    }

    pub fn delete_routine(&mut self, routine_id: &str) -> Result<()> {
        self.role.require_edit("Deleting a routine")?;
        self.repo.delete_routine(routine_id)?;
        self.publish(NestEvent::RoutineDeleted {
            routine_id: routine_id.to_string(),
        });
        Ok(())
    }

    /// Creates a subfolder of this screen's folder.
    ///
    /// # Errors
    ///
    /// [`NestError::FolderTooDeep`] past the nesting limit and
    /// [`NestError::CategoryLimitReached`] past the entitlement cap.
    pub fn create_folder(&mut self, name: &str) -> Result<FolderNode> {
        self.role.require_edit("Creating a folder")?;
        let path = category::validate_folder_path(&category::join(&self.path, name))?;
        let meta = self.repo.create_category(&path)?;
        self.publish(NestEvent::FolderCreated {
            path: meta.name.clone(),
        });
        self.data
            .folders(&self.path)
            .into_iter()
            .find(|f| category::is_in_scope(&meta.name, &f.full_path))
            .ok_or_else(|| {
                NestError::InvalidCategory(format!("Folder {} is not below {:?}", meta.name, self.path))
            })
    }

    /// Deletes `folder` and everything in its scope.
    pub fn delete_folder(&mut self, folder: &FolderNode) -> Result<()> {
        self.role.require_edit("Deleting a folder")?;
        self.repo.delete_category(&folder.full_path)?;
        self.publish(NestEvent::FolderDeleted {
            path: folder.full_path.clone(),
        });
        Ok(())
    }

    // ── selection ────────────────────────────────────────────────

    /// Enters or leaves select mode. Leaving clears the whole-flow selection.
    pub fn set_selecting(&mut self, selecting: bool) {
        self.selecting = selecting;
        if !selecting {
            self.selection.clear_all();
        }
        self.rebuild();
    }

    pub fn toggle_entry(&mut self, entry_id: &str) -> ToggleOutcome {
        let outcome = self.selection.toggle_entry(entry_id);
        self.rebuild();
        outcome
    }

    pub fn toggle_place(&mut self, place_id: &str) -> ToggleOutcome {
        let outcome = self.selection.toggle_place(place_id);
        self.rebuild();
        outcome
    }

    pub fn toggle_routine(&mut self, routine_id: &str) -> ToggleOutcome {
        let outcome = self.selection.toggle_routine(routine_id);
        self.rebuild();
        outcome
    }

    pub fn select_all(&mut self) -> SelectAllOutcome {
        let outcome = self.selection.select_all_in_scope(&self.data);
        self.rebuild();
        outcome
    }

    /// Restores a selection captured elsewhere, e.g. after a screen rebuild.
    pub fn restore_selection(&mut self, snapshot: SelectionState) {
        self.selection.restore(snapshot);
        self.rebuild();
    }

    /// Applies `action` to the whole-flow selection.
    ///
    /// A complete run consumes the selection. When the run stops early the
    /// failed and untouched records stay selected so the user can retry.
    pub fn run_bulk(&mut self, action: &BulkAction) -> Result<BulkOutcome> {
        let taken = self.selection.take();
        let outcome = match run_bulk(&*self.repo, self.role, &self.data, taken.targets(), action) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.selection.restore(taken);
                return Err(e);
            }
        };
        for event in &outcome.events {
            self.merge(event);
            self.sink.emit(event.clone());
        }
        if !outcome.is_complete() {
            self.selection
                .restore(SelectionState::from_targets(outcome.unprocessed()));
        }
        self.rebuild();
        Ok(outcome)
    }

    fn publish(&mut self, event: NestEvent) {
        self.merge(&event);
        self.sink.emit(event);
        self.rebuild();
    }

    /// Deleted records leave the selection before the data forgets them.
    fn merge(&mut self, event: &NestEvent) {
        self.selection.forget_deleted(event, &self.data);
        self.data.apply(event);
    }
}

/// Normalizes record categories from the backend.
///
/// A category that is not in canonical form would surface as a phantom folder
/// or a record in the wrong bucket; it is logged and repaired for display.
fn sanitize(mut data: NestData) -> NestData {
    let repair = |id: &str, cat: &mut String| {
        let normalized = category::normalize(cat);
        if normalized != *cat {
            log::error!("record {id} has malformed category {cat:?}; showing it under {normalized:?}");
            *cat = normalized;
        }
    };
    for e in &mut data.entries {
        repair(&e.id, &mut e.category);
    }
    for p in &mut data.places {
        repair(&p.id, &mut p.category);
    }
    for r in &mut data.routines {
        repair(&r.id, &mut r.category);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestnote_core::{
        CategoryMetadata, EntryGroups, Item, SectionKind, SqliteNest, Visibility,
    };
    use std::cell::RefCell;
    use std::sync::mpsc::{channel, Receiver};

    #[derive(Default)]
    struct RecordingSink(RefCell<Vec<NestEvent>>);

    impl EventSink for RecordingSink {
        fn emit(&self, event: NestEvent) {
            self.0.borrow_mut().push(event);
        }
    }

    fn seeded_nest(entitlements: Entitlements) -> Rc<SqliteNest> {
        let nest = SqliteNest::in_memory(entitlements).unwrap();
        for (title, content, cat, vis) in [
            ("Wifi", "abc123", "Household", Visibility::HalfDay),
            ("Emergency Contact", "Grandma 555-0100", "Household", Visibility::HalfDay),
            ("Alarm", "4412", "Household", Visibility::Comprehensive),
            ("Food", "Kibble", "Pets", Visibility::HalfDay),
            ("Walks", "Twice a day", "Pets/Donna", Visibility::HalfDay),
            ("Vet", "Dr. Li", "Pets/Donna/Vet", Visibility::Extended),
            ("Toys", "Ball", "Pets/Milo", Visibility::HalfDay),
        ] {
            nest.create_entry(Entry::new(title, content, cat, vis)).unwrap();
        }
        nest.create_place(Place::new(Some("Dog park".into()), "Elm St", "Pets")).unwrap();
        nest.create_routine(Routine::new("Feeding", "Pets", vec!["Fill bowl".into()]))
            .unwrap();
        Rc::new(nest)
    }

    fn owner_browser(nest: Rc<SqliteNest>, cap: Option<usize>) -> (FolderBrowser<SqliteNest>, Receiver<NestEvent>) {
        let (tx, rx) = channel();
        let sink: Rc<dyn EventSink> = Rc::new(tx);
        let entitlements = Entitlements {
            selection_cap: cap,
            category_cap: None,
        };
        let mut browser = FolderBrowser::new(
            nest,
            Role::Owner,
            entitlements,
            SectionFilter::all(),
            ListingMode::Hide,
            sink,
        );
        browser.load();
        (browser, rx)
    }

    fn folder(browser: &FolderBrowser<SqliteNest>, title: &str) -> FolderNode {
        browser
            .sections()
            .iter()
            .filter(|s| s.kind == SectionKind::Folders)
            .flat_map(|s| s.items.iter())
            .find_map(|item| match item {
                Item::Folder(f) if f.title == title => Some(f.clone()),
                _ => None,
            })
            .unwrap()
    }

    fn kinds(browser: &FolderBrowser<SqliteNest>) -> Vec<SectionKind> {
        browser.sections().iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_root_lists_top_level_folders_only() {
        let (browser, _rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        assert_eq!(browser.state(), &LoadState::Loaded);
        assert_eq!(kinds(&browser), vec![SectionKind::Folders]);
        assert_eq!(folder(&browser, "Pets").item_count, 6);
        assert_eq!(folder(&browser, "Household").item_count, 3);
        assert_eq!(browser.title(), None);
    }

    #[test]
    fn test_entering_folder_composes_sections() {
        let (root, _rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        let pets = root.enter_folder(&folder(&root, "Pets"));

        assert_eq!(pets.title(), Some("Pets"));
        assert_eq!(
            kinds(&pets),
            vec![
                SectionKind::Folders,
                SectionKind::CompactEntries,
                SectionKind::Places,
                SectionKind::Routines
            ]
        );
        let donna = folder(&pets, "Donna");
        assert_eq!(donna.item_count, 2);
        assert_eq!(folder(&pets, "Milo").item_count, 1);

        let household = root.enter_folder(&folder(&root, "Household"));
        assert_eq!(
            kinds(&household),
            vec![SectionKind::CompactEntries, SectionKind::LongEntries]
        );
    }

    #[test]
    fn test_filter_hides_sections() {
        let (root, _rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        let mut pets = root.enter_folder(&folder(&root, "Pets"));
        pets.set_filter(SectionToggle::Entries, false);
        assert_eq!(kinds(&pets), vec![SectionKind::Places, SectionKind::Routines]);
        pets.set_filter(SectionToggle::Entries, true);
        assert_eq!(kinds(&pets)[0], SectionKind::Folders);
    }

    #[test]
    fn test_child_selection_propagates_to_parent() {
        let (mut root, _rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        root.set_selecting(true);
        let mut pets = root.enter_folder(&folder(&root, "Pets"));
        let mut donna = pets.enter_folder(&folder(&pets, "Donna"));

        assert_eq!(donna.select_all(), SelectAllOutcome::Selected { added: 2 });
        assert_eq!(root.selection().len(), 2);

        pets.rebuild();
        assert_eq!(folder(&pets, "Donna").selected_count, 2);
        root.rebuild();
        assert_eq!(folder(&root, "Pets").selected_count, 2);

        root.set_selecting(false);
        assert!(pets.selection().is_empty());
    }

    #[test]
    fn test_select_all_respects_cap() {
        let (root, rx) = owner_browser(seeded_nest(Entitlements::default()), Some(3));
        let mut pets = root.enter_folder(&folder(&root, "Pets"));
        pets.set_selecting(true);

        assert_eq!(pets.select_all(), SelectAllOutcome::LimitReached { added: 3 });
        let limit_events = rx
            .try_iter()
            .filter(|e| matches!(e, NestEvent::SelectionLimitReached { cap: 3 }))
            .count();
        assert_eq!(limit_events, 1);

        let snapshot = pets.selection().snapshot();
        assert_eq!(snapshot.entries.len(), 3);
        assert!(snapshot.places.is_empty());
    }

    #[test]
    fn test_toggle_past_cap_is_rejected() {
        let (root, _rx) = owner_browser(seeded_nest(Entitlements::default()), Some(1));
        let mut household = root.enter_folder(&folder(&root, "Household"));
        let ids: Vec<String> = household.data().entries_in_scope("Household").map(|e| e.id.clone()).collect();

        assert_eq!(household.toggle_entry(&ids[0]), ToggleOutcome::Selected);
        assert_eq!(household.toggle_entry(&ids[1]), ToggleOutcome::LimitReached);
        assert_eq!(household.toggle_entry(&ids[0]), ToggleOutcome::Deselected);
    }

    #[test]
    fn test_second_build_request_is_dropped() {
        let (mut root, _rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        let first = root.request_build().unwrap();
        assert!(root.request_build().is_none());

        root.set_filter(SectionToggle::Entries, false);

        let mut completions = 0;
        let rerun = root.complete_build(first.run());
        completions += 1;
        assert!(rerun);
        assert!(!kinds(&root).is_empty(), "stale build still shows folders");

        let latest = root.request_build().unwrap();
        assert!(!root.complete_build(latest.run()));
        completions += 1;
        assert_eq!(completions, 2);
        assert!(root.sections().is_empty(), "latest build reflects the filter");
    }

    #[test]
    fn test_dropped_build_does_not_block_rebuilds() {
        let (mut root, _rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        drop(root.request_build());

        root.set_filter(SectionToggle::Entries, false);
        assert!(root.sections().is_empty());
        assert!(root.request_build().is_some());
        assert!(root.rebuild());
    }

    #[test]
    fn test_abandoned_build_asks_for_rerun() {
        let (mut root, _rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        let first = root.request_build().unwrap();
        assert!(root.request_build().is_none());

        assert!(root.abandon_build(first));
        assert!(root.rebuild());
        assert_eq!(kinds(&root), vec![SectionKind::Folders]);
    }

    #[test]
    fn test_build_from_another_screen_is_not_installed() {
        let (mut root, _rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        let mut pets = root.enter_folder(&folder(&root, "Pets"));
        let before = kinds(&root);

        let foreign = pets.request_build().unwrap().run();
        assert!(!root.complete_build(foreign));
        assert_eq!(kinds(&root), before);
        assert!(pets.rebuild());
    }

    #[test]
    fn test_late_fetch_after_teardown_is_ignored() {
        let (mut root, _rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        let token = root.begin_load();
        root.teardown();
        assert!(!root.apply_load(&token, Ok(NestData::default())));
        assert!(!root.data().entries.is_empty());
    }

    #[test]
    fn test_deleting_selected_entry_frees_cap() {
        let (root, _rx) = owner_browser(seeded_nest(Entitlements::default()), Some(1));
        let mut household = root.enter_folder(&folder(&root, "Household"));
        let ids: Vec<String> = household.data().entries_in_scope("Household").map(|e| e.id.clone()).collect();

        assert_eq!(household.toggle_entry(&ids[0]), ToggleOutcome::Selected);
        household.delete_entry(&ids[0]).unwrap();
        assert!(household.selection().is_empty());
        assert_eq!(household.toggle_entry(&ids[1]), ToggleOutcome::Selected);
    }

    #[test]
    fn test_bulk_after_deleting_a_selected_entry() {
        let (root, _rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        let mut household = root.enter_folder(&folder(&root, "Household"));
        household.set_selecting(true);
        assert_eq!(household.select_all(), SelectAllOutcome::Selected { added: 3 });

        let doomed = household.data().entries_in_scope("Household").next().unwrap().id.clone();
        household.delete_entry(&doomed).unwrap();
        assert_eq!(household.selection().len(), 2);

        let outcome = household.run_bulk(&BulkAction::Delete).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.processed.len(), 2);
        assert!(household.selection().is_empty());
    }

    #[test]
    fn test_deleting_folder_deselects_its_records() {
        let (mut root, _rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        root.set_selecting(true);
        let mut pets = root.enter_folder(&folder(&root, "Pets"));
        let mut donna = pets.enter_folder(&folder(&pets, "Donna"));
        assert_eq!(donna.select_all(), SelectAllOutcome::Selected { added: 2 });

        let food = pets.data().entries_in_scope("Pets").find(|e| e.title == "Food").unwrap().id.clone();
        pets.toggle_entry(&food);
        assert_eq!(root.selection().len(), 3);

        pets.delete_folder(&folder(&pets, "Donna")).unwrap();
        assert_eq!(root.selection().len(), 1);
        assert!(root.selection().is_entry_selected(&food));
    }

    #[test]
    fn test_save_and_delete_routine() {
        let (root, rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        let mut pets = root.enter_folder(&folder(&root, "Pets"));
        let routine_count = |browser: &FolderBrowser<SqliteNest>| {
            browser
                .sections()
                .iter()
                .find(|s| s.kind == SectionKind::Routines)
                .map_or(0, |s| s.items.len())
        };

        let saved = pets
            .save_routine(Routine::new("Brushing", "", vec!["Brush coat".into()]))
            .unwrap();
        assert_eq!(saved.category, "Pets");
        assert_eq!(routine_count(&pets), 2);

        let mut edited = saved.clone();
        edited.title = "Grooming".to_string();
        pets.save_routine(edited).unwrap();
        assert_eq!(routine_count(&pets), 2);

        pets.toggle_routine(&saved.id);
        pets.delete_routine(&saved.id).unwrap();
        assert_eq!(routine_count(&pets), 1);
        assert!(!pets.selection().is_routine_selected(&saved.id));

        let events: Vec<NestEvent> = rx.try_iter().collect();
        assert!(matches!(events.first(), Some(NestEvent::RoutineSaved { .. })));
        assert!(matches!(events.last(), Some(NestEvent::RoutineDeleted { .. })));
    }

    #[test]
    fn test_sitter_listing_and_access() {
        let nest = seeded_nest(Entitlements::default());
        let sitter = Role::Sitter {
            ceiling: Visibility::HalfDay,
        };
        let alarm_id = nest.fetch_entries().unwrap()["Household"]
            .iter()
            .find(|e| e.title == "Alarm")
            .unwrap()
            .id
            .clone();

        let mut hidden = FolderBrowser::new(
            Rc::clone(&nest),
            sitter,
            Entitlements::default(),
            SectionFilter::all(),
            ListingMode::Hide,
            Rc::new(RecordingSink::default()),
        );
        hidden.load();
        assert_eq!(folder(&hidden, "Household").item_count, 2);
        assert!(matches!(hidden.open_entry(&alarm_id), Err(NestError::EntryNotFound(_))));

        let mut locked = FolderBrowser::new(
            Rc::clone(&nest),
            sitter,
            Entitlements::default(),
            SectionFilter::all(),
            ListingMode::ShowLocked,
            Rc::new(RecordingSink::default()),
        );
        locked.load();
        assert_eq!(folder(&locked, "Household").item_count, 3);
        match locked.open_entry(&alarm_id).unwrap() {
            EntryOpen::Denied(denied) => {
                assert_eq!(denied.required, Visibility::Comprehensive);
                assert_eq!(denied.current, Visibility::HalfDay);
            }
            EntryOpen::Open(_) => panic!("sitter opened an entry above the ceiling"),
        }
        assert!(matches!(
            locked.create_folder("Secrets"),
            Err(NestError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_save_entry_notifies_parent() {
        let (root, rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        let mut parent = root.enter_folder(&folder(&root, "Pets"));
        let mut child = parent.enter_folder(&folder(&parent, "Milo"));

        let saved = child
            .save_entry(Entry::new("Leash", "Red", "", Visibility::HalfDay))
            .unwrap();
        assert_eq!(saved.category, "Pets/Milo");

        let events: Vec<NestEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 1);
        parent.apply_event(&events[0]);
        assert_eq!(folder(&parent, "Milo").item_count, 2);

        let mut edited = saved.clone();
        edited.title = "Blue leash".to_string();
        child.save_entry(edited).unwrap();
        for event in rx.try_iter() {
            parent.apply_event(&event);
        }
        assert_eq!(folder(&parent, "Milo").item_count, 2);
        assert_eq!(parent.data().entry(&saved.id).unwrap().title, "Blue leash");
    }

    #[test]
    fn test_create_folder_limits() {
        let nest = seeded_nest(Entitlements {
            selection_cap: None,
            category_cap: Some(1),
        });
        let (root, _rx) = owner_browser(nest, None);
        let mut pets = root.enter_folder(&folder(&root, "Pets"));

        let created = pets.create_folder("Goldfish").unwrap();
        assert_eq!(created.full_path, "Pets/Goldfish");
        assert_eq!(created.item_count, 0);
        assert!(matches!(
            pets.create_folder("Hamster"),
            Err(NestError::CategoryLimitReached { cap: 1 })
        ));

        let donna = pets.enter_folder(&folder(&pets, "Donna"));
        let mut vet = donna.enter_folder(&folder(&donna, "Vet"));
        assert!(matches!(
            vet.create_folder("Records"),
            Err(NestError::FolderTooDeep { .. })
        ));
    }

    #[test]
    fn test_delete_folder_removes_scope() {
        let (root, rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        let mut pets = root.enter_folder(&folder(&root, "Pets"));
        pets.delete_folder(&folder(&pets, "Donna")).unwrap();

        assert!(matches!(rx.try_recv(), Ok(NestEvent::FolderDeleted { .. })));
        let titles: Vec<String> = pets.data().folders("Pets").into_iter().map(|f| f.title).collect();
        assert_eq!(titles, vec!["Milo"]);
        assert!(pets.sections().iter().flat_map(|s| s.items.iter()).all(|item| match item {
            Item::Folder(f) => f.title != "Donna",
            _ => true,
        }));
    }

    #[test]
    fn test_bulk_delete_consumes_selection() {
        let (root, _rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        let mut household = root.enter_folder(&folder(&root, "Household"));
        household.set_selecting(true);
        household.select_all();

        let outcome = household.run_bulk(&BulkAction::Delete).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.processed.len(), 3);
        assert!(household.selection().is_empty());
        assert!(household.sections().is_empty());
    }

    #[test]
    fn test_bulk_partial_failure_keeps_unprocessed_selected() {
        let (root, _rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        let mut household = root.enter_folder(&folder(&root, "Household"));
        let mut snapshot = SelectionState::default();
        snapshot.entries.insert("0-ghost".to_string());
        let real: Vec<String> = household.data().entries_in_scope("Household").map(|e| e.id.clone()).collect();
        snapshot.entries.extend(real.iter().cloned());
        household.restore_selection(snapshot);

        let outcome = household.run_bulk(&BulkAction::Delete).unwrap();
        assert!(!outcome.is_complete());
        assert_eq!(household.selection().len(), 1 + outcome.remaining.len());
        assert!(household.selection().is_entry_selected("0-ghost"));
    }

    #[test]
    fn test_malformed_categories_are_repaired() {
        let (mut root, _rx) = owner_browser(seeded_nest(Entitlements::default()), None);
        let mut bad = Entry::new("Crib", "", "Kids//Nursery/", Visibility::HalfDay);
        bad.id = "bad".to_string();
        let data = NestData {
            entries: vec![bad],
            ..NestData::default()
        };
        let token = root.begin_load();
        assert!(root.apply_load(&token, Ok(data)));
        assert_eq!(root.data().entry("bad").unwrap().category, "Kids/Nursery");
        assert_eq!(folder(&root, "Kids").item_count, 1);
    }

    struct OfflineRepo;

    fn offline<T>() -> Result<T> {
        Err(NestError::Fetch("offline".to_string()))
    }

    impl EntryRepository for OfflineRepo {
        fn fetch_entries(&self) -> Result<EntryGroups> { offline() }
        fn fetch_categories(&self) -> Result<Vec<CategoryMetadata>> { offline() }
        fn fetch_places(&self) -> Result<Vec<Place>> { offline() }
        fn fetch_routines(&self) -> Result<Vec<Routine>> { offline() }
        fn refresh_entries(&self) -> Result<EntryGroups> { offline() }
        fn refresh_categories(&self) -> Result<Vec<CategoryMetadata>> { offline() }
        fn create_entry(&self, _: Entry) -> Result<Entry> { offline() }
        fn update_entry(&self, _: Entry) -> Result<Entry> { offline() }
        fn delete_entry(&self, _: &str) -> Result<()> { offline() }
        fn create_place(&self, _: Place) -> Result<Place> { offline() }
        fn update_place(&self, _: Place) -> Result<Place> { offline() }
        fn delete_place(&self, _: &str) -> Result<()> { offline() }
        fn create_routine(&self, _: Routine) -> Result<Routine> { offline() }
        fn update_routine(&self, _: Routine) -> Result<Routine> { offline() }
        fn delete_routine(&self, _: &str) -> Result<()> { offline() }
        fn create_category(&self, _: &str) -> Result<CategoryMetadata> { offline() }
        fn delete_category(&self, _: &str) -> Result<()> { offline() }
    }

    #[test]
    fn test_fetch_failure_surfaces_generic_error() {
        let mut browser = FolderBrowser::new(
            Rc::new(OfflineRepo),
            Role::Owner,
            Entitlements::default(),
            SectionFilter::all(),
            ListingMode::Hide,
            Rc::new(RecordingSink::default()),
        );
        browser.load();
        match browser.state() {
            LoadState::Failed(msg) => assert!(!msg.contains("offline")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(browser.sections().is_empty());

        browser.refresh();
        assert!(matches!(browser.state(), LoadState::Failed(_)));
    }
}
