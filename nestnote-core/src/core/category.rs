//! Slash-delimited category paths.
//!
//! Every record carries a `category` such as `"Pets/Donna"`. The folder tree is
//! never stored; it is recomputed from these strings on every load. The empty
//! string denotes the nest root, which has every category in scope.

use crate::{NestError, Result};

/// Separator between path components.
pub const SEPARATOR: char = '/';

/// Deepest folder the UI allows users to create.
pub const MAX_FOLDER_DEPTH: usize = 3;

/// Trims every component, drops empty ones, and re-joins with [`SEPARATOR`].
///
/// ```rust
/// use nestnote_core::category;
///
/// assert_eq!(category::normalize(" Pets / Donna/ "), "Pets/Donna");
/// assert_eq!(category::normalize("//"), "");
/// ```
pub fn normalize(raw: &str) -> String {
    components(raw).collect::<Vec<_>>().join("/")
}

/// Iterates over the non-empty, trimmed components of `path`.
pub fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR)
        .map(str::trim)
        .filter(|c| !c.is_empty())
}

/// Number of components in `path`; the root has depth 0.
pub fn depth(path: &str) -> usize {
    components(path).count()
}

/// Returns `true` when `category` equals `scope` or lies beneath it.
///
/// `"Pets"` covers `"Pets"` and `"Pets/Donna"` but not `"PetsSupplies"`.
pub fn is_in_scope(category: &str, scope: &str) -> bool {
    remainder(category, scope).is_some()
}

/// Strips `scope` from `category`.
///
/// Returns `None` when `category` is outside the scope, `Some("")` when it sits
/// directly in the scope, and the rest of the path otherwise.
pub fn remainder<'a>(category: &'a str, scope: &str) -> Option<&'a str> {
    if scope.is_empty() {
        return Some(category);
    }
    let rest = category.strip_prefix(scope)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix(SEPARATOR)
    }
}

/// Joins a child name onto a parent path.
pub fn join(parent: &str, name: &str) -> String {
    let name = name.trim();
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}{SEPARATOR}{name}")
    }
}

/// Display name of a folder: its final component.
pub fn last_component(path: &str) -> &str {
    path.rsplit(SEPARATOR).next().unwrap_or(path)
}

/// First component of a path; used to resolve folder icons.
pub fn root_component(path: &str) -> &str {
    path.split(SEPARATOR).next().unwrap_or(path)
}

/// Parent path, or `None` for top-level and root paths.
pub fn parent(path: &str) -> Option<&str> {
    path.rsplit_once(SEPARATOR).map(|(parent, _)| parent)
}

/// Normalizes `raw` and checks it is usable as a new folder path.
///
/// # Errors
///
/// Returns [`NestError::InvalidCategory`] for an empty path and
/// [`NestError::FolderTooDeep`] past [`MAX_FOLDER_DEPTH`].
pub fn validate_folder_path(raw: &str) -> Result<String> {
    let path = normalize(raw);
    if path.is_empty() {
        return Err(NestError::InvalidCategory(
            "Folder name cannot be empty".to_string(),
        ));
    }
    if depth(&path) > MAX_FOLDER_DEPTH {
        return Err(NestError::FolderTooDeep {
            path,
            max: MAX_FOLDER_DEPTH,
        });
    }
    Ok(path)
}
