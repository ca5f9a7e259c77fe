//! Dry-run previews.
//!
//! A preview answers "what would happen?" without mutating anything. It runs
//! the same validation and conflict-resolution pipeline as a real execution,
//! so the final path a preview reports is exactly the path the execution
//! would use, assuming no external filesystem change in between.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use schema::{
    Action, ActionExecutionError, ActionPreview, ConflictError, ConflictResolution, EngineError,
    ExecutionResult,
};

use crate::policy::SessionPolicy;
use crate::validate::{ValidatedAction, ValidatedPath};

/// Describe what executing the action would do.
pub fn preview(
    action: &Action,
    validated: &ValidatedAction,
    resolution: &ConflictResolution,
    policy: &SessionPolicy,
) -> ActionPreview {
    let (final_paths, will_create_dirs) = predicted_effects(validated, resolution, policy);

    ActionPreview {
        kind: action.kind().to_string(),
        input_paths: action.input_paths(),
        final_paths,
        conflict: !matches!(resolution, ConflictResolution::NoConflict),
        resolvable: !matches!(resolution, ConflictResolution::Unresolvable),
        auto_rename_to: resolution.final_path().cloned(),
        attempts: resolution.attempts(),
        will_create_dirs,
    }
}

/// A preview rendered as an execution result, for preview-only sessions.
///
/// The outcome mirrors what a real execution would report: an unresolvable
/// conflict or a missing source is a failure even in a dry run.
pub fn preview_result(
    action: &Action,
    validated: &ValidatedAction,
    resolution: &ConflictResolution,
    policy: &SessionPolicy,
) -> ExecutionResult {
    if let Some(error) = predicted_failure(validated, resolution) {
        let mut result = ExecutionResult::failure(action, &error);
        result.preview = true;
        return result;
    }

    let (final_paths, _) = predicted_effects(validated, resolution, policy);
    let detail = describe(action, resolution);
    tracing::info!("{detail}");

    ExecutionResult {
        kind: action.kind().to_string(),
        input_paths: action.input_paths(),
        final_paths,
        conflict_resolved: resolution.resolved_conflict(),
        attempts: resolution.attempts(),
        success: true,
        error_kind: None,
        detail: Some(detail),
        entries: None,
        preview: true,
        timestamp_utc: Utc::now(),
    }
}

/// Read-only checks that would make the real execution fail.
fn predicted_failure(
    validated: &ValidatedAction,
    resolution: &ConflictResolution,
) -> Option<EngineError> {
    if let ConflictResolution::Unresolvable = resolution {
        if let Some(dst) = validated.destination() {
            return Some(
                ConflictError::Unresolvable {
                    path: dst.as_path().to_path_buf(),
                }
                .into(),
            );
        }
    }

    let source = match validated {
        ValidatedAction::Move { src, .. } => Some(src),
        ValidatedAction::Rename { target, .. } => Some(target),
        ValidatedAction::RemoveEmptyDir { path }
        | ValidatedAction::List { path }
        | ValidatedAction::GetInfo { path } => Some(path),
        ValidatedAction::CreateDir { .. } => None,
    };
    if let Some(path) = source {
        if fs::symlink_metadata(path.as_path()).is_err() {
            return Some(
                ActionExecutionError::NotFound {
                    path: path.as_path().to_path_buf(),
                }
                .into(),
            );
        }
    }

    None
}

/// The paths the action would end up touching, and the deepest destination
/// parent that would have to be created first (moves only).
fn predicted_effects(
    validated: &ValidatedAction,
    resolution: &ConflictResolution,
    policy: &SessionPolicy,
) -> (Vec<PathBuf>, Option<PathBuf>) {
    match validated {
        ValidatedAction::Move { dst, .. } => {
            let final_dst = predicted_destination(dst, resolution);
            let missing_parent = final_dst
                .parent()
                .filter(|p| !p.exists() && p.starts_with(policy.root()))
                .map(Path::to_path_buf);
            (vec![final_dst], missing_parent)
        }
        ValidatedAction::Rename { new_name, .. } => {
            (vec![predicted_destination(new_name, resolution)], None)
        }
        ValidatedAction::CreateDir { path }
        | ValidatedAction::RemoveEmptyDir { path }
        | ValidatedAction::List { path }
        | ValidatedAction::GetInfo { path } => (vec![path.as_path().to_path_buf()], None),
    }
}

fn predicted_destination(dst: &ValidatedPath, resolution: &ConflictResolution) -> PathBuf {
    match resolution.final_path() {
        Some(resolved) => resolved.clone(),
        None => dst.as_path().to_path_buf(),
    }
}

fn describe(action: &Action, resolution: &ConflictResolution) -> String {
    let suffix = if resolution.resolved_conflict() {
        " (renamed to avoid overwrite)"
    } else {
        ""
    };
    match action {
        Action::Move { src, dst } => format!("preview: would move {src} to {dst}{suffix}"),
        Action::Rename { target, new_name } => {
            format!("preview: would rename {target} to {new_name}{suffix}")
        }
        Action::CreateDir { path } => format!("preview: would create directory {path}"),
        Action::RemoveEmptyDir { path } => format!("preview: would remove empty directory {path}"),
        Action::List { path } => format!("preview: would list {path}"),
        Action::GetInfo { path } => format!("preview: would report metadata for {path}"),
        Action::RawCommand { .. } => "preview: forbidden action".to_string(),
    }
}
