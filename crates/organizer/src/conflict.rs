//! Destination conflict resolution.
//!
//! When a requested destination is already occupied, this module computes a
//! non-colliding alternative by inserting a counter before the file
//! extension: `report (1).pdf`, `report (2).pdf`, and so on. Directories use
//! the same scheme without an extension split. When the counter budget is
//! exhausted, a timestamp-suffixed name is tried as a last resort; if even
//! that is occupied, the conflict is unresolvable.
//!
//! This is the only component permitted to consult the filesystem purely for
//! existence checks.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use schema::{ConflictResolution, SessionMode};

/// Decide whether `candidate` collides and, if so, compute an alternative.
///
/// Strict mode never mutates a name: an occupied destination is immediately
/// unresolvable. Preview mode resolves exactly like the default mode, so a
/// preview reports the same final path a real execution would use.
pub fn resolve(candidate: &Path, mode: SessionMode, max_attempts: u32) -> ConflictResolution {
    if !occupied(candidate) {
        return ConflictResolution::NoConflict;
    }

    if mode == SessionMode::Strict {
        tracing::debug!("Destination occupied in strict mode: {:?}", candidate);
        return ConflictResolution::Unresolvable;
    }

    let parts = NameParts::of(candidate);

    for attempt in 1..=max_attempts {
        let alternative = parts.numbered(attempt);
        if !occupied(&alternative) {
            tracing::debug!(
                "Resolved conflict for {:?} after {} probe(s): {:?}",
                candidate,
                attempt,
                alternative
            );
            return ConflictResolution::Resolved {
                final_path: alternative,
                attempts: attempt,
            };
        }
    }

    // Counter budget exhausted; fall back to a timestamp suffix.
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let fallback = parts.timestamped(seconds);
    if occupied(&fallback) {
        tracing::warn!(
            "Timestamp fallback also occupied for {:?}: {:?}",
            candidate,
            fallback
        );
        return ConflictResolution::Unresolvable;
    }

    ConflictResolution::Resolved {
        final_path: fallback,
        attempts: max_attempts + 1,
    }
}

/// Existence check that does not follow symlinks: a dangling link still
/// occupies the destination slot.
fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// A destination split into the pieces the naming scheme recombines.
struct NameParts {
    parent: PathBuf,
    stem: String,
    /// Extension including the dot, or empty.
    ext: String,
}

impl NameParts {
    fn of(candidate: &Path) -> Self {
        let parent = candidate.parent().unwrap_or(Path::new("")).to_path_buf();

        let is_dir = fs::symlink_metadata(candidate)
            .map(|m| m.is_dir())
            .unwrap_or(false);

        if is_dir {
            // Directories are renamed whole; "photos.old" stays one unit.
            let stem = candidate
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Self {
                parent,
                stem,
                ext: String::new(),
            };
        }

        let stem = candidate
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = candidate
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        Self { parent, stem, ext }
    }

    fn numbered(&self, n: u32) -> PathBuf {
        self.parent
            .join(format!("{} ({}){}", self.stem, n, self.ext))
    }

    fn timestamped(&self, seconds: u64) -> PathBuf {
        self.parent
            .join(format!("{}_{}{}", self.stem, seconds, self.ext))
    }
}
