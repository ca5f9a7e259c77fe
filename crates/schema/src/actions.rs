//! Action request definitions.
//!
//! This module defines the fixed action schema the engine accepts from the
//! intent-producing collaborator. Path fields are untrusted strings until the
//! engine's path validation has canonicalized and contained them.

use serde::{Deserialize, Serialize};

/// Session-wide conflict and routing mode.
///
/// Set once at session start by the CLI layer and immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Destination conflicts are resolved by auto-renaming.
    #[default]
    Default,
    /// Any destination conflict aborts the action instead of renaming.
    Strict,
    /// Every action is routed through the preview engine; nothing mutates.
    #[serde(rename = "preview")]
    PreviewOnly,
}

impl SessionMode {
    /// Whether this mode ever allows filesystem mutation.
    pub fn mutates(&self) -> bool {
        !matches!(self, Self::PreviewOnly)
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::Strict => "strict",
            Self::PreviewOnly => "preview",
        };
        write!(f, "{name}")
    }
}

/// A single filesystem action request.
///
/// All path fields are sandbox-relative or absolute strings supplied by the
/// caller; they are never trusted until validated. `RawCommand` exists so an
/// intent layer can report anything it could not map onto the capability set;
/// the engine rejects it unconditionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Move a file or directory to a new location.
    Move {
        /// Source path.
        src: String,
        /// Requested destination path.
        dst: String,
    },
    /// Rename a file or directory in place.
    Rename {
        /// Path of the entry to rename.
        target: String,
        /// Requested new path.
        new_name: String,
    },
    /// Create a directory (and missing parents).
    CreateDir {
        /// Directory path to create.
        path: String,
    },
    /// Remove a directory, only if it is empty.
    RemoveEmptyDir {
        /// Directory path to remove.
        path: String,
    },
    /// List the immediate children of a directory.
    List {
        /// Directory path to list.
        path: String,
    },
    /// Report metadata for a single file or directory.
    GetInfo {
        /// Path to inspect.
        path: String,
    },
    /// An operation outside the capability set. Always rejected.
    RawCommand {
        /// The unrecognized operation, verbatim.
        command: String,
    },
}

impl Action {
    /// Stable kind name used in results and audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Rename { .. } => "rename",
            Self::CreateDir { .. } => "create_dir",
            Self::RemoveEmptyDir { .. } => "remove_empty_dir",
            Self::List { .. } => "list",
            Self::GetInfo { .. } => "get_info",
            Self::RawCommand { .. } => "raw_command",
        }
    }

    /// The raw path fields of this action, in request order.
    pub fn input_paths(&self) -> Vec<String> {
        match self {
            Self::Move { src, dst } => vec![src.clone(), dst.clone()],
            Self::Rename { target, new_name } => vec![target.clone(), new_name.clone()],
            Self::CreateDir { path }
            | Self::RemoveEmptyDir { path }
            | Self::List { path }
            | Self::GetInfo { path } => vec![path.clone()],
            Self::RawCommand { .. } => Vec::new(),
        }
    }

    /// Whether this action would mutate the filesystem when executed.
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Self::Move { .. }
                | Self::Rename { .. }
                | Self::CreateDir { .. }
                | Self::RemoveEmptyDir { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_names() {
        let action = Action::Move {
            src: "a".to_string(),
            dst: "b".to_string(),
        };
        assert_eq!(action.kind(), "move");

        let action = Action::RemoveEmptyDir {
            path: "old".to_string(),
        };
        assert_eq!(action.kind(), "remove_empty_dir");
    }

    #[test]
    fn test_input_paths_order() {
        let action = Action::Rename {
            target: "old.txt".to_string(),
            new_name: "new.txt".to_string(),
        };
        assert_eq!(action.input_paths(), vec!["old.txt", "new.txt"]);
    }

    #[test]
    fn test_raw_command_has_no_paths() {
        let action = Action::RawCommand {
            command: "rm -rf /".to_string(),
        };
        assert!(action.input_paths().is_empty());
        assert!(!action.mutates());
    }

    #[test]
    fn test_mutating_kinds() {
        assert!(Action::CreateDir {
            path: "x".to_string()
        }
        .mutates());
        assert!(!Action::List {
            path: ".".to_string()
        }
        .mutates());
        assert!(!Action::GetInfo {
            path: "x".to_string()
        }
        .mutates());
    }

    #[test]
    fn test_action_json_shape() {
        let action = Action::Move {
            src: "src/report.pdf".to_string(),
            dst: "dst/report.pdf".to_string(),
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"kind\":\"move\""));

        let restored: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, action);
    }

    #[test]
    fn test_action_from_wire_json() {
        let json = r#"{"kind":"create_dir","path":"photos/2024"}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert_eq!(
            action,
            Action::CreateDir {
                path: "photos/2024".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_kind_rejected_at_parse() {
        let json = r#"{"kind":"delete_file","path":"x"}"#;
        assert!(serde_json::from_str::<Action>(json).is_err());
    }

    #[test]
    fn test_session_mode_serialization() {
        assert_eq!(
            serde_json::to_string(&SessionMode::PreviewOnly).unwrap(),
            "\"preview\""
        );
        let mode: SessionMode = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(mode, SessionMode::Strict);
    }

    #[test]
    fn test_session_mode_mutates() {
        assert!(SessionMode::Default.mutates());
        assert!(SessionMode::Strict.mutates());
        assert!(!SessionMode::PreviewOnly.mutates());
    }
}
