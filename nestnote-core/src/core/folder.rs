//! Virtual folder derivation.
//!
//! Folders are discovered one level at a time: for a given scope only the
//! immediate children are produced, each counting every record beneath it.

use crate::core::category;
use crate::{CategoryMetadata, Categorized};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Symbol used when no category metadata matches a folder's root segment.
pub const DEFAULT_FOLDER_SYMBOL: &str = "folder";

/// A derived, never-persisted folder in the virtual tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    pub title: String,
    pub full_path: String,
    pub item_count: usize,
    pub selected_count: usize,
    pub symbol_name: String,
}

/// Computes the immediate child folders of `current_path`.
///
/// `categories` is the category string of every record in the nest; records
/// sitting directly in `current_path` are skipped. `known` lists stored
/// category metadata: in-scope names also surface as (possibly empty)
/// folders, and root segments resolve folder symbols.
///
/// The result is sorted case-insensitively by title.
pub fn derive_children<'a, I>(categories: I, current_path: &str, known: &[CategoryMetadata]) -> Vec<FolderNode>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    for cat in categories {
        if let Some(child) = immediate_child(cat, current_path) {
            *counts.entry(child).or_insert(0) += 1;
        }
    }
    for meta in known {
        if let Some(child) = immediate_child(&meta.name, current_path) {
            counts.entry(child).or_insert(0);
        }
    }

    let mut folders: Vec<FolderNode> = counts
        .into_iter()
        .map(|(full_path, item_count)| FolderNode {
            title: category::last_component(&full_path).to_string(),
            symbol_name: symbol_for(&full_path, known),
            full_path,
            item_count,
            selected_count: 0,
        })
        .collect();
    sort_folders(&mut folders);
    folders
}

/// Records whose category is exactly `current_path`.
pub fn direct_members<'r, T: Categorized>(records: &'r [T], current_path: &str) -> Vec<&'r T> {
    records
        .iter()
        .filter(|r| category::remainder(r.category(), current_path) == Some(""))
        .collect()
}

/// Sorts folders case-insensitively by title, falling back to the full path.
pub fn sort_folders(folders: &mut [FolderNode]) {
    folders.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.full_path.cmp(&b.full_path))
    });
}

/// Full path of the child of `scope` that contains `cat`, if any.
fn immediate_child(cat: &str, scope: &str) -> Option<String> {
    let rest = category::remainder(cat, scope)?;
    let first = rest.split(category::SEPARATOR).next().filter(|c| !c.is_empty())?;
    Some(category::join(scope, first))
}

/// Resolves the symbol for a folder from its root segment. Never fails.
fn symbol_for(path: &str, known: &[CategoryMetadata]) -> String {
    let root = category::root_component(path);
    known
        .iter()
        .find(|meta| meta.name == root)
        .map(|meta| meta.symbol_name.clone())
        .unwrap_or_else(|| DEFAULT_FOLDER_SYMBOL.to_string())
}
