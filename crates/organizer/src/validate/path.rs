//! Path validation against the sandbox boundary.
//!
//! This module is the only producer of [`ValidatedPath`]. Downstream
//! components accept nothing else, so a raw caller-supplied string is
//! validated exactly once and can never sneak past the boundary checks.
//!
//! Validation happens in two layers:
//!
//! 1. a textual screen of the raw input for dangerous substrings, before any
//!    resolution;
//! 2. canonicalization (symlinks, `.`, `..`) followed by structural
//!    containment and deny-list checks on the resolved path.
//!
//! The structural check always runs on the canonical form, never the raw
//! string, so traversal through symlinks or encoded separators cannot help.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use schema::PathSecurityError;

use crate::policy::SessionPolicy;

/// A canonical, absolute path proven to live inside the sandbox root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath(PathBuf);

impl ValidatedPath {
    /// The canonical path.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Consume into the underlying path.
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    /// The path relative to the sandbox root, for reporting.
    pub fn relative_to<'a>(&'a self, root: &Path) -> &'a Path {
        self.0.strip_prefix(root).unwrap_or(&self.0)
    }
}

impl AsRef<Path> for ValidatedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Validate a raw caller-supplied path against the session policy.
///
/// Relative inputs are resolved against the sandbox root; the empty string
/// names the root itself. The target does not have to exist: non-existent
/// leaves are resolved through their deepest existing ancestor, which is
/// enough to prove (or disprove) containment.
pub fn validate(raw: &str, policy: &SessionPolicy) -> Result<ValidatedPath, PathSecurityError> {
    // Textual defense-in-depth screen, before any resolution.
    if policy.is_dangerous(raw) {
        return Err(PathSecurityError::DangerousPattern {
            input: raw.to_string(),
        });
    }

    let requested = Path::new(raw);
    let joined = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        policy.root().join(requested)
    };

    // If the path cannot be resolved, containment cannot be proven.
    let canonical = canonicalize_allowing_missing_leaf(&joined).map_err(|_| {
        PathSecurityError::Escape {
            path: raw.to_string(),
        }
    })?;

    if canonical != policy.root() && !canonical.starts_with(policy.root()) {
        return Err(PathSecurityError::Escape {
            path: raw.to_string(),
        });
    }

    if policy.is_denied(&canonical) {
        return Err(PathSecurityError::SystemDirectory { path: canonical });
    }

    Ok(ValidatedPath(canonical))
}

/// Canonicalize a path whose leaf components may not exist yet.
///
/// Walks up to the deepest existing ancestor, canonicalizes it (resolving
/// symlinks and `..`), and reattaches the missing components. A missing
/// component that is itself `..` cannot be resolved safely and is rejected.
fn canonicalize_allowing_missing_leaf(path: &Path) -> io::Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(canonical) => Ok(canonical),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let parent = path
                .parent()
                .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))?;
            // file_name() is None when the path ends in "..": refuse to
            // guess what a traversal through a non-existent entry means.
            let name = path
                .file_name()
                .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))?;
            let resolved_parent = canonicalize_allowing_missing_leaf(parent)?;
            Ok(resolved_parent.join(name))
        }
        Err(e) => Err(e),
    }
}
