//! Action execution.
//!
//! The executor performs the actual filesystem mutation for a validated,
//! authorized, conflict-resolved action. Every attempt, success or failure,
//! produces exactly one [`ExecutionResult`]; failures are captured, never
//! thrown past the caller.
//!
//! Moves and renames go through `fs::rename`, which is atomic with respect
//! to the destination slot: the entry either lands fully at the new path or
//! the operation fails with the source untouched. The destination is
//! re-checked immediately before the rename so that an external actor racing
//! the filesystem produces a reported failure, never a silent overwrite.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use chrono::Utc;
use schema::{
    Action, ActionExecutionError, ConflictError, ConflictResolution, EngineError, EntryInfo,
    EntryKind, ExecutionResult,
};

use crate::policy::SessionPolicy;
use crate::validate::{ValidatedAction, ValidatedPath};

/// Execute one action and report the structured outcome.
pub fn execute(
    action: &Action,
    validated: &ValidatedAction,
    resolution: &ConflictResolution,
    policy: &SessionPolicy,
) -> ExecutionResult {
    match attempt(validated, resolution, policy) {
        Ok(outcome) => {
            tracing::info!("{}", outcome.detail);
            ExecutionResult {
                kind: action.kind().to_string(),
                input_paths: action.input_paths(),
                final_paths: outcome.final_paths,
                conflict_resolved: resolution.resolved_conflict(),
                attempts: resolution.attempts(),
                success: true,
                error_kind: None,
                detail: Some(outcome.detail),
                entries: outcome.entries,
                preview: false,
                timestamp_utc: Utc::now(),
            }
        }
        Err(error) => {
            tracing::error!("Action {} failed: {}", action.kind(), error);
            ExecutionResult::failure(action, &error)
        }
    }
}

/// Successful outcome pieces the result is assembled from.
struct Outcome {
    final_paths: Vec<PathBuf>,
    detail: String,
    entries: Option<Vec<EntryInfo>>,
}

fn attempt(
    validated: &ValidatedAction,
    resolution: &ConflictResolution,
    policy: &SessionPolicy,
) -> Result<Outcome, EngineError> {
    match validated {
        ValidatedAction::Move { src, dst } => move_entry(src, dst, resolution, policy, true),
        ValidatedAction::Rename { target, new_name } => {
            move_entry(target, new_name, resolution, policy, false)
        }
        ValidatedAction::CreateDir { path } => create_dir(path, policy).map_err(Into::into),
        ValidatedAction::RemoveEmptyDir { path } => remove_empty_dir(path, policy).map_err(Into::into),
        ValidatedAction::List { path } => list_dir(path, policy).map_err(Into::into),
        ValidatedAction::GetInfo { path } => get_info(path, policy).map_err(Into::into),
    }
}

/// Shared implementation of Move and Rename.
///
/// Only Move creates missing destination parent directories; a rename is
/// expected to stay within an existing location.
fn move_entry(
    src: &ValidatedPath,
    dst: &ValidatedPath,
    resolution: &ConflictResolution,
    policy: &SessionPolicy,
    create_parents: bool,
) -> Result<Outcome, EngineError> {
    if fs::symlink_metadata(src.as_path()).is_err() {
        return Err(ActionExecutionError::NotFound {
            path: src.as_path().to_path_buf(),
        }
        .into());
    }

    let final_dst: PathBuf = match resolution {
        ConflictResolution::NoConflict => dst.as_path().to_path_buf(),
        ConflictResolution::Resolved { final_path, .. } => final_path.clone(),
        ConflictResolution::Unresolvable => {
            return Err(ConflictError::Unresolvable {
                path: dst.as_path().to_path_buf(),
            }
            .into())
        }
    };

    if create_parents {
        if let Some(parent) = final_dst.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(ActionExecutionError::from)?;
            }
        }
    }

    // Race-safe re-check: the slot was free at resolution time, but a second
    // actor may have filled it since. fs::rename would replace it silently.
    if fs::symlink_metadata(&final_dst).is_ok() {
        return Err(ActionExecutionError::IoFailure(format!(
            "destination occupied at execution time: {}",
            final_dst.display()
        ))
        .into());
    }

    fs::rename(src.as_path(), &final_dst).map_err(ActionExecutionError::from)?;

    let root = policy.root();
    let verb = if create_parents { "moved" } else { "renamed" };
    let src_rel = src.relative_to(root).display().to_string();
    let dst_rel = relative(&final_dst, root).display().to_string();
    let detail = if resolution.resolved_conflict() {
        format!("{verb} {src_rel} to {dst_rel} (renamed to avoid overwrite)")
    } else {
        format!("{verb} {src_rel} to {dst_rel}")
    };

    Ok(Outcome {
        final_paths: vec![final_dst],
        detail,
        entries: None,
    })
}

fn create_dir(path: &ValidatedPath, policy: &SessionPolicy) -> Result<Outcome, ActionExecutionError> {
    let rel = path.relative_to(policy.root()).display().to_string();

    match fs::symlink_metadata(path.as_path()) {
        Ok(meta) if meta.is_dir() => {
            // Idempotent: creating an existing directory is a success.
            return Ok(Outcome {
                final_paths: vec![path.as_path().to_path_buf()],
                detail: format!("directory already exists: {rel}"),
                entries: None,
            });
        }
        Ok(_) => {
            return Err(ActionExecutionError::NotADirectory {
                path: path.as_path().to_path_buf(),
            })
        }
        Err(_) => {}
    }

    fs::create_dir_all(path.as_path())?;
    Ok(Outcome {
        final_paths: vec![path.as_path().to_path_buf()],
        detail: format!("created directory {rel}"),
        entries: None,
    })
}

fn remove_empty_dir(
    path: &ValidatedPath,
    policy: &SessionPolicy,
) -> Result<Outcome, ActionExecutionError> {
    let meta = fs::symlink_metadata(path.as_path()).map_err(|_| ActionExecutionError::NotFound {
        path: path.as_path().to_path_buf(),
    })?;
    if !meta.is_dir() {
        return Err(ActionExecutionError::NotADirectory {
            path: path.as_path().to_path_buf(),
        });
    }

    // Race-safe re-check of emptiness at execution time.
    let mut entries = fs::read_dir(path.as_path())?;
    if entries.next().is_some() {
        return Err(ActionExecutionError::NotEmpty {
            path: path.as_path().to_path_buf(),
        });
    }

    // remove_dir itself refuses non-empty directories, closing the remaining
    // window between the check and the removal.
    fs::remove_dir(path.as_path()).map_err(|e| {
        if e.kind() == std::io::ErrorKind::DirectoryNotEmpty {
            ActionExecutionError::NotEmpty {
                path: path.as_path().to_path_buf(),
            }
        } else {
            ActionExecutionError::from(e)
        }
    })?;

    let rel = path.relative_to(policy.root()).display().to_string();
    Ok(Outcome {
        final_paths: vec![path.as_path().to_path_buf()],
        detail: format!("removed empty directory {rel}"),
        entries: None,
    })
}

fn list_dir(path: &ValidatedPath, policy: &SessionPolicy) -> Result<Outcome, ActionExecutionError> {
    let meta = fs::metadata(path.as_path()).map_err(|_| ActionExecutionError::NotFound {
        path: path.as_path().to_path_buf(),
    })?;
    if !meta.is_dir() {
        return Err(ActionExecutionError::NotADirectory {
            path: path.as_path().to_path_buf(),
        });
    }

    let mut results = Vec::new();
    for entry in fs::read_dir(path.as_path())? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue, // Skip entries we can't read
        };
        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        results.push(entry_info(&entry.path(), &meta, policy.root(), false));
    }

    // Directories first, then files, both in case-insensitive name order.
    results.sort_by(|a, b| {
        let a_is_dir = a.kind == EntryKind::Directory;
        let b_is_dir = b.kind == EntryKind::Directory;
        match (a_is_dir, b_is_dir) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        }
    });

    let rel = path.relative_to(policy.root()).display().to_string();
    let detail = format!("listed {} entries in {}", results.len(), rel);
    Ok(Outcome {
        final_paths: vec![path.as_path().to_path_buf()],
        detail,
        entries: Some(results),
    })
}

fn get_info(path: &ValidatedPath, policy: &SessionPolicy) -> Result<Outcome, ActionExecutionError> {
    let meta = fs::symlink_metadata(path.as_path()).map_err(|_| ActionExecutionError::NotFound {
        path: path.as_path().to_path_buf(),
    })?;

    let info = entry_info(path.as_path(), &meta, policy.root(), true);
    let rel = path.relative_to(policy.root()).display().to_string();
    Ok(Outcome {
        final_paths: vec![path.as_path().to_path_buf()],
        detail: format!("collected metadata for {rel}"),
        entries: Some(vec![info]),
    })
}

fn entry_info(path: &Path, meta: &fs::Metadata, root: &Path, with_entry_count: bool) -> EntryInfo {
    let kind = if meta.file_type().is_symlink() {
        EntryKind::Symlink
    } else if meta.is_dir() {
        EntryKind::Directory
    } else if meta.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    };

    let modified = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs());

    let entry_count = if with_entry_count && kind == EntryKind::Directory {
        fs::read_dir(path).ok().map(|rd| rd.count())
    } else {
        None
    };

    EntryInfo {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string()),
        path: relative(path, root).to_path_buf(),
        kind,
        size: meta.is_file().then(|| meta.len()),
        modified,
        entry_count,
    }
}

fn relative<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}
