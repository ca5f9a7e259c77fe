//! Request validation: path containment and capability policy.
//!
//! "Validate once, use everywhere": the only way to obtain a
//! [`ValidatedAction`] is through [`validate_action`], and everything past
//! this module operates exclusively on validated paths.

pub mod action;
pub mod path;

pub use action::{authorize_kind, authorize_target};
pub use path::{validate as validate_path, ValidatedPath};

use schema::{Action, ActionPolicyError, EngineError};

use crate::policy::SessionPolicy;

/// An action whose path fields have all been canonicalized and contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedAction {
    /// Move a file or directory.
    Move {
        /// Canonical source.
        src: ValidatedPath,
        /// Canonical requested destination.
        dst: ValidatedPath,
    },
    /// Rename a file or directory.
    Rename {
        /// Canonical path of the entry to rename.
        target: ValidatedPath,
        /// Canonical requested new path.
        new_name: ValidatedPath,
    },
    /// Create a directory.
    CreateDir {
        /// Canonical directory path.
        path: ValidatedPath,
    },
    /// Remove an empty directory.
    RemoveEmptyDir {
        /// Canonical directory path.
        path: ValidatedPath,
    },
    /// List a directory.
    List {
        /// Canonical directory path.
        path: ValidatedPath,
    },
    /// Report metadata for a path.
    GetInfo {
        /// Canonical path.
        path: ValidatedPath,
    },
}

impl ValidatedAction {
    /// The candidate destination that may collide, for conflicting kinds.
    pub fn destination(&self) -> Option<&ValidatedPath> {
        match self {
            Self::Move { dst, .. } => Some(dst),
            Self::Rename { new_name, .. } => Some(new_name),
            _ => None,
        }
    }
}

/// Validate every path field of an action against the session policy.
///
/// `RawCommand` carries no paths and is rejected here as forbidden; callers
/// normally reject it earlier via [`authorize_kind`].
pub fn validate_action(
    action: &Action,
    policy: &SessionPolicy,
) -> Result<ValidatedAction, EngineError> {
    let validated = match action {
        Action::Move { src, dst } => ValidatedAction::Move {
            src: path::validate(src, policy)?,
            dst: path::validate(dst, policy)?,
        },
        Action::Rename { target, new_name } => ValidatedAction::Rename {
            target: path::validate(target, policy)?,
            new_name: path::validate(new_name, policy)?,
        },
        Action::CreateDir { path } => ValidatedAction::CreateDir {
            path: path::validate(path, policy)?,
        },
        Action::RemoveEmptyDir { path } => ValidatedAction::RemoveEmptyDir {
            path: path::validate(path, policy)?,
        },
        Action::List { path } => ValidatedAction::List {
            path: path::validate(path, policy)?,
        },
        Action::GetInfo { path } => ValidatedAction::GetInfo {
            path: path::validate(path, policy)?,
        },
        Action::RawCommand { .. } => {
            return Err(ActionPolicyError::Forbidden {
                kind: action.kind().to_string(),
            }
            .into())
        }
    };
    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{PathSecurityError, SessionMode};
    use tempfile::TempDir;

    use crate::config::Config;

    #[test]
    fn test_validate_action_validates_every_field() {
        let temp_dir = TempDir::new().unwrap();
        let policy =
            SessionPolicy::new(temp_dir.path(), SessionMode::Default, &Config::default()).unwrap();

        // Destination escapes even though the source is fine
        let action = Action::Move {
            src: "inside.txt".to_string(),
            dst: "../outside.txt".to_string(),
        };
        let result = validate_action(&action, &policy);
        assert!(matches!(
            result,
            Err(EngineError::Security(PathSecurityError::Escape { .. }))
        ));
    }

    #[test]
    fn test_validated_destination_accessor() {
        let temp_dir = TempDir::new().unwrap();
        let policy =
            SessionPolicy::new(temp_dir.path(), SessionMode::Default, &Config::default()).unwrap();

        let action = Action::Move {
            src: "a.txt".to_string(),
            dst: "b.txt".to_string(),
        };
        let validated = validate_action(&action, &policy).unwrap();
        assert_eq!(
            validated.destination().unwrap().as_path(),
            policy.root().join("b.txt")
        );

        let action = Action::List {
            path: "".to_string(),
        };
        let validated = validate_action(&action, &policy).unwrap();
        assert!(validated.destination().is_none());
    }

    #[test]
    fn test_raw_command_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let policy =
            SessionPolicy::new(temp_dir.path(), SessionMode::Default, &Config::default()).unwrap();

        let action = Action::RawCommand {
            command: "echo hi".to_string(),
        };
        let result = validate_action(&action, &policy);
        assert!(matches!(result, Err(EngineError::Policy(_))));
    }
}
