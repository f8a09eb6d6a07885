//! Error types for the Nest Note core library.

use thiserror::Error;

/// All errors that can occur within the Nest Note core library.
///
/// Selection-cap hits and visibility-ceiling denials are expected states, not
/// errors; they are reported through return values instead.
#[derive(Debug, Error)]
pub enum NestError {
    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored data could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend could not be reached or returned garbage.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// The opened file is not a valid nest database.
    #[error("Invalid nest: {0}")]
    InvalidNest(String),

    /// An entry ID was requested that does not exist.
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// A place ID was requested that does not exist.
    #[error("Place not found: {0}")]
    PlaceNotFound(String),

    /// A routine ID was requested that does not exist.
    #[error("Routine not found: {0}")]
    RoutineNotFound(String),

    /// A category path was empty or malformed.
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    /// A folder would be created deeper than the allowed nesting.
    #[error("Folder too deep: {path} (max depth {max})")]
    FolderTooDeep { path: String, max: usize },

    /// Creating another category would exceed the entitlement cap.
    #[error("Category limit reached ({cap})")]
    CategoryLimitReached { cap: usize },

    /// A constrained viewer attempted a mutation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Convenience alias that pins the error type to [`NestError`].
pub type Result<T> = std::result::Result<T, NestError>;

impl NestError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => format!("Failed to save: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
            Self::Io(e) => format!("File error: {e}"),
            Self::Fetch(_) => "Couldn't load your nest. Pull to refresh and try again.".to_string(),
            Self::InvalidNest(_) => "Could not open nest data".to_string(),
            Self::EntryNotFound(_) => "Entry no longer exists".to_string(),
            Self::PlaceNotFound(_) => "Place no longer exists".to_string(),
            Self::RoutineNotFound(_) => "Routine no longer exists".to_string(),
            Self::InvalidCategory(msg) => msg.clone(),
            Self::FolderTooDeep { max, .. } => {
                format!("Folders can only be nested {max} levels deep")
            }
            Self::CategoryLimitReached { cap } => {
                format!("You've reached the limit of {cap} folders. Upgrade to add more.")
            }
            Self::PermissionDenied(_) => "Only the nest owner can make changes".to_string(),
        }
    }
}
