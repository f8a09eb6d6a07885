//! Domain records: entries, places, routines and category metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How much of the nest a sitter session may open.
///
/// Ordered: a session with ceiling `Extended` may open `HalfDay` and
/// `Extended` entries but not `Comprehensive` ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    #[default]
    HalfDay,
    Extended,
    Comprehensive,
}

impl Visibility {
    pub const ALL: [Visibility; 3] = [Self::HalfDay, Self::Extended, Self::Comprehensive];

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::HalfDay => "Half Day",
            Self::Extended => "Extended",
            Self::Comprehensive => "Comprehensive",
        }
    }

    /// Storage key; matches the serde representation.
    #[must_use]
    pub fn as_key(self) -> &'static str {
        match self {
            Self::HalfDay => "halfDay",
            Self::Extended => "extended",
            Self::Comprehensive => "comprehensive",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_key() == key)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Anything that lives at a position in the virtual folder tree.
pub trait Categorized {
    fn id(&self) -> &str;
    fn category(&self) -> &str;
}

/// An informational entry such as "Wifi" or "Emergency Contact".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub visibility: Visibility,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Entry {
    /// Builds an unsaved entry with a fresh ID and the current time.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            category: category.into(),
            visibility,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Categorized for Entry {
    fn id(&self) -> &str {
        &self.id
    }
    fn category(&self) -> &str {
        &self.category
    }
}

/// A saved location (school, vet, grandma's house).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub alias: Option<String>,
    pub address: String,
    pub category: String,
    pub notes: Option<String>,
    /// Temporary places belong to a single session and are hidden from folder listings.
    pub is_temporary: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Place {
    pub fn new(alias: Option<String>, address: impl Into<String>, category: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            alias,
            address: address.into(),
            category: category.into(),
            notes: None,
            is_temporary: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Key used for ordering places; a missing alias sorts as the empty string.
    pub fn sort_key(&self) -> String {
        self.alias.as_deref().unwrap_or("").to_lowercase()
    }
}

impl Categorized for Place {
    fn id(&self) -> &str {
        &self.id
    }
    fn category(&self) -> &str {
        &self.category
    }
}

/// A named checklist such as "Bedtime".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub title: String,
    pub category: String,
    pub actions: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Routine {
    pub fn new(title: impl Into<String>, category: impl Into<String>, actions: Vec<String>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            category: category.into(),
            actions,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Categorized for Routine {
    fn id(&self) -> &str {
        &self.id
    }
    fn category(&self) -> &str {
        &self.category
    }
}

/// Display metadata for a top-level category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMetadata {
    pub id: String,
    /// Full path of the category (`"Pets"` or `"Pets/Donna"`).
    pub name: String,
    pub symbol_name: String,
    pub is_default: bool,
}
