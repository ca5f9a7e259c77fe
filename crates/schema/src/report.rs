//! Result and report definitions.
//!
//! These are the records the engine produces for the logging collaborator:
//! one `ExecutionResult` per submitted action, plus `SecurityEvent`s for the
//! separate security audit stream. All records are line-delimited JSON on the
//! wire.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::error::EngineError;

/// Outcome of a destination collision check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConflictResolution {
    /// The requested destination is free.
    NoConflict,
    /// The destination was occupied and a free alternative was found.
    Resolved {
        /// The non-colliding destination that will be used.
        final_path: PathBuf,
        /// Number of existence probes performed to find it.
        attempts: u32,
    },
    /// No alternative may be used (strict mode) or none could be found.
    Unresolvable,
}

impl ConflictResolution {
    /// Whether a conflict existed and was worked around.
    pub fn resolved_conflict(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// Number of rename probes performed, zero when no conflict existed.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Resolved { attempts, .. } => *attempts,
            _ => 0,
        }
    }

    /// The alternative destination, if one was computed.
    pub fn final_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Resolved { final_path, .. } => Some(final_path),
            _ => None,
        }
    }
}

/// Type of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link (not followed).
    Symlink,
    /// Anything else (socket, device, ...).
    Other,
}

/// Metadata for one filesystem entry, reported by List and GetInfo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    /// Entry name (not full path).
    pub name: String,
    /// Path relative to the sandbox root.
    pub path: PathBuf,
    /// Entry type.
    pub kind: EntryKind,
    /// Size in bytes for files, absent for directories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Last modification time as Unix seconds, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<u64>,
    /// Number of immediate children, reported by GetInfo for directories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,
}

/// The structured outcome of one action attempt.
///
/// Exactly one of these is produced per submitted action, success or failure,
/// in submission order. The logging collaborator persists them as JSON Lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Action kind name.
    pub kind: String,
    /// The raw path fields as submitted.
    pub input_paths: Vec<String>,
    /// The canonical paths the action actually touched (or would touch).
    pub final_paths: Vec<PathBuf>,
    /// Whether a destination conflict was resolved by renaming.
    pub conflict_resolved: bool,
    /// Number of rename probes performed during conflict resolution.
    pub attempts: u32,
    /// Whether the action completed successfully.
    pub success: bool,
    /// Stable error kind when the action failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Human-readable detail: error message, or summary of what was done.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Directory entries, present for List and GetInfo results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<EntryInfo>>,
    /// True when the session ran in preview mode and nothing was mutated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub preview: bool,
    /// Completion time, UTC.
    pub timestamp_utc: DateTime<Utc>,
}

impl ExecutionResult {
    /// Build a failure result capturing the given engine error.
    pub fn failure(action: &Action, error: &EngineError) -> Self {
        Self {
            kind: action.kind().to_string(),
            input_paths: action.input_paths(),
            final_paths: Vec::new(),
            conflict_resolved: false,
            attempts: 0,
            success: false,
            error_kind: Some(error.kind().to_string()),
            detail: Some(error.to_string()),
            entries: None,
            preview: false,
            timestamp_utc: Utc::now(),
        }
    }

    /// Whether this result records a security-relevant rejection.
    pub fn is_security_rejection(&self) -> bool {
        matches!(
            self.error_kind.as_deref(),
            Some("escape")
                | Some("system_directory")
                | Some("dangerous_pattern")
                | Some("forbidden")
                | Some("root_removal")
        )
    }
}

/// What an action would do, computed without mutating anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPreview {
    /// Action kind name.
    pub kind: String,
    /// The raw path fields as submitted.
    pub input_paths: Vec<String>,
    /// The canonical paths the action would touch.
    pub final_paths: Vec<PathBuf>,
    /// Whether the requested destination is already occupied.
    pub conflict: bool,
    /// Whether the action could proceed (false for strict-mode conflicts).
    pub resolvable: bool,
    /// The auto-renamed destination that would be used, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_rename_to: Option<PathBuf>,
    /// Number of rename probes the resolution took.
    pub attempts: u32,
    /// Missing destination parent that would be created, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub will_create_dirs: Option<PathBuf>,
}

/// One entry in the security audit stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// Stable error kind ("escape", "forbidden", ...).
    pub event_type: String,
    /// Severity label for downstream filtering.
    pub severity: String,
    /// Action kind that triggered the rejection.
    pub action_kind: String,
    /// The raw path fields of the rejected action.
    pub input_paths: Vec<String>,
    /// Human-readable detail.
    pub detail: String,
    /// Event time, UTC.
    pub timestamp_utc: DateTime<Utc>,
}

impl SecurityEvent {
    /// Build a security event from a rejected action's result.
    ///
    /// Returns `None` when the result is not a security rejection.
    pub fn from_result(result: &ExecutionResult) -> Option<Self> {
        if !result.is_security_rejection() {
            return None;
        }
        Some(Self {
            event_type: result.error_kind.clone().unwrap_or_default(),
            severity: "warning".to_string(),
            action_kind: result.kind.clone(),
            input_paths: result.input_paths.clone(),
            detail: result.detail.clone().unwrap_or_default(),
            timestamp_utc: result.timestamp_utc,
        })
    }
}

/// Aggregate counts for one session's action stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionSummary {
    /// Total actions processed.
    pub actions: usize,
    /// Actions that completed successfully.
    pub succeeded: usize,
    /// Actions that failed.
    pub failed: usize,
}
