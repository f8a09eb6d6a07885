//! Viewer roles and visibility-ceiling checks.
//!
//! The role is decided once when a session starts and passed alongside the
//! repository; nothing inspects the repository type to infer permissions.

use crate::{Entry, NestData, NestError, Result, Visibility};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who is looking at the nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "camelCase")]
pub enum Role {
    /// Full read/write access; visibility ceilings do not apply.
    Owner,
    /// Read-only access up to `ceiling`.
    Sitter { ceiling: Visibility },
}

/// How a sitter's listings treat entries above the ceiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListingMode {
    /// Leave them out entirely.
    #[default]
    Hide,
    /// List them; opening one is refused with an explanation.
    ShowLocked,
}

/// Explanation shown when a sitter opens an entry above their ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("This entry requires {required} access. Your current access level is {current}.")]
pub struct AccessDenied {
    pub required: Visibility,
    pub current: Visibility,
}

/// Outcome of [`Role::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    Denied(AccessDenied),
}

impl AccessDecision {
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl Role {
    #[must_use]
    pub fn can_edit(&self) -> bool {
        matches!(self, Self::Owner)
    }

    /// Fails with [`NestError::PermissionDenied`] unless this role may mutate the nest.
    pub fn require_edit(&self, action: &str) -> Result<()> {
        if self.can_edit() {
            Ok(())
        } else {
            Err(NestError::PermissionDenied(format!("{action} requires owner access")))
        }
    }

    /// Decides whether `entry` may be opened.
    #[must_use]
    pub fn check(&self, entry: &Entry) -> AccessDecision {
        match self {
            Self::Owner => AccessDecision::Granted,
            Self::Sitter { ceiling } if entry.visibility <= *ceiling => AccessDecision::Granted,
            Self::Sitter { ceiling } => AccessDecision::Denied(AccessDenied {
                required: entry.visibility,
                current: *ceiling,
            }),
        }
    }

    /// Returns the part of `data` this role sees in listings.
    ///
    /// Owners and [`ListingMode::ShowLocked`] sessions see everything.
    #[must_use]
    pub fn visible_nest(&self, data: NestData, mode: ListingMode) -> NestData {
        match (self, mode) {
            (Self::Sitter { ceiling }, ListingMode::Hide) => {
                let ceiling = *ceiling;
                NestData {
                    entries: data
                        .entries
                        .into_iter()
                        .filter(|e| e.visibility <= ceiling)
                        .collect(),
                    ..data
                }
            }
            _ => data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: Visibility) -> Entry {
        Entry::new("Alarm code", "1234", "Household", level)
    }

    #[test]
    fn test_owner_bypasses_ceiling() {
        let decision = Role::Owner.check(&entry(Visibility::Comprehensive));
        assert!(decision.is_granted());
        assert!(Role::Owner.require_edit("Delete").is_ok());
    }

    #[test]
    fn test_sitter_denied_above_ceiling() {
        let sitter = Role::Sitter {
            ceiling: Visibility::Extended,
        };
        assert!(sitter.check(&entry(Visibility::HalfDay)).is_granted());
        assert!(sitter.check(&entry(Visibility::Extended)).is_granted());

        match sitter.check(&entry(Visibility::Comprehensive)) {
            AccessDecision::Denied(denied) => {
                assert_eq!(denied.required, Visibility::Comprehensive);
                assert_eq!(denied.current, Visibility::Extended);
                let msg = denied.to_string();
                assert!(msg.contains("Comprehensive"));
                assert!(msg.contains("Extended"));
            }
            AccessDecision::Granted => panic!("expected denial"),
        }
    }

    #[test]
    fn test_sitter_cannot_edit() {
        let sitter = Role::Sitter {
            ceiling: Visibility::Comprehensive,
        };
        assert!(!sitter.can_edit());
        assert!(matches!(
            sitter.require_edit("Create folder"),
            Err(NestError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_visible_nest_by_mode() {
        let data = NestData {
            entries: vec![entry(Visibility::HalfDay), entry(Visibility::Comprehensive)],
            ..NestData::default()
        };
        let sitter = Role::Sitter {
            ceiling: Visibility::HalfDay,
        };
        assert_eq!(sitter.visible_nest(data.clone(), ListingMode::Hide).entries.len(), 1);
        assert_eq!(sitter.visible_nest(data.clone(), ListingMode::ShowLocked).entries.len(), 2);
        assert_eq!(Role::Owner.visible_nest(data, ListingMode::Hide).entries.len(), 2);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Sitter {
            ceiling: Visibility::Extended,
        })
        .unwrap();
        assert_eq!(json, r#"{"role":"sitter","ceiling":"extended"}"#);
    }
}
