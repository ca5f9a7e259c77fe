//! Session policy: sandbox root, mode, and safety tables.
//!
//! A `SessionPolicy` is built once at session start and never mutated. Every
//! component receives it by reference instead of consulting global state.

use std::fs;
use std::path::{Path, PathBuf};

use regex::RegexSet;
use schema::SessionMode;
use thiserror::Error;

use crate::config::Config;

/// Textual patterns rejected before any path resolution happens.
///
/// Shell metacharacters, command separators, and privilege-escalation command
/// names. Traversal sequences are deliberately not screened here: they are
/// caught structurally after canonicalization, so a legitimate `a/../b` inside
/// the sandbox still works. Parentheses are also not screened, because the
/// conflict resolver's own `name (1).ext` scheme must survive resubmission.
const DANGEROUS_PATTERNS: &[&str] = &[
    r"[;|&`$]",
    r"(?i)rm\s+-rf",
    r"(?i)del\s+/[sq]",
    r"(?i)format\s+[a-z]:",
    r"(?i)\bsudo\b",
    r"(?i)chmod\s+777",
];

/// Errors establishing the session policy at startup.
///
/// This is the only fatal failure mode of the engine; everything after
/// startup is captured per action.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The sandbox root does not exist.
    #[error("sandbox root does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    /// The sandbox root is not a directory.
    #[error("sandbox root is not a directory: {}", .0.display())]
    RootNotADirectory(PathBuf),

    /// The sandbox root resolves into the system-directory deny-list.
    #[error("sandbox root is inside a protected system directory: {}", .0.display())]
    RootDenied(PathBuf),

    /// The sandbox root path contains a dangerous pattern.
    #[error("sandbox root contains a dangerous pattern: {0}")]
    RootDangerous(String),

    /// A dangerous-pattern expression failed to compile.
    #[error("invalid dangerous-pattern expression: {0}")]
    Pattern(#[from] regex::Error),

    /// The root could not be canonicalized.
    #[error("cannot resolve sandbox root: {0}")]
    Io(#[from] std::io::Error),
}

/// Immutable per-session policy.
///
/// Holds the canonical sandbox root, the session mode, the platform
/// deny-list, and the compiled dangerous-pattern set.
#[derive(Debug)]
pub struct SessionPolicy {
    root: PathBuf,
    mode: SessionMode,
    deny_list: Vec<PathBuf>,
    dangerous: RegexSet,
    max_rename_attempts: u32,
}

impl SessionPolicy {
    /// Establish the policy for a session.
    ///
    /// Canonicalizes and vets the sandbox root: it must exist, be a
    /// directory, not sit inside the deny-list, and not contain dangerous
    /// patterns.
    pub fn new(root: &Path, mode: SessionMode, config: &Config) -> Result<Self, PolicyError> {
        let dangerous = RegexSet::new(DANGEROUS_PATTERNS)?;

        let raw = root.display().to_string();
        if dangerous.is_match(&raw) {
            return Err(PolicyError::RootDangerous(raw));
        }

        let canonical = fs::canonicalize(root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PolicyError::RootNotFound(root.to_path_buf())
            } else {
                PolicyError::Io(e)
            }
        })?;

        if !canonical.is_dir() {
            return Err(PolicyError::RootNotADirectory(canonical));
        }

        let deny_list: Vec<PathBuf> = config.safety.platform_deny_list().to_vec();
        if is_denied_by(&canonical, &deny_list) {
            return Err(PolicyError::RootDenied(canonical));
        }

        tracing::info!(
            "Session policy established: root={:?} mode={}",
            canonical,
            mode
        );

        Ok(Self {
            root: canonical,
            mode,
            deny_list,
            dangerous,
            max_rename_attempts: config.session.max_rename_attempts,
        })
    }

    /// The canonical sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The session mode.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Counter bound for conflict resolution probes.
    pub fn max_rename_attempts(&self) -> u32 {
        self.max_rename_attempts
    }

    /// Whether raw text trips the dangerous-pattern screen.
    pub fn is_dangerous(&self, text: &str) -> bool {
        self.dangerous.is_match(text)
    }

    /// Whether a canonical path matches or nests under the deny-list.
    pub fn is_denied(&self, canonical: &Path) -> bool {
        is_denied_by(canonical, &self.deny_list)
    }
}

fn is_denied_by(canonical: &Path, deny_list: &[PathBuf]) -> bool {
    for entry in deny_list {
        if canonical.starts_with(entry) {
            return true;
        }
        // A deny entry may itself be a symlink (e.g. /etc on macOS).
        if let Ok(resolved) = fs::canonicalize(entry) {
            if canonical.starts_with(&resolved) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn policy_for(root: &Path) -> SessionPolicy {
        SessionPolicy::new(root, SessionMode::Default, &Config::default()).unwrap()
    }

    #[test]
    fn test_policy_canonicalizes_root() {
        let temp_dir = TempDir::new().unwrap();
        let policy = policy_for(temp_dir.path());
        assert_eq!(policy.root(), fs::canonicalize(temp_dir.path()).unwrap());
        assert_eq!(policy.mode(), SessionMode::Default);
    }

    #[test]
    fn test_policy_root_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        let result = SessionPolicy::new(&missing, SessionMode::Default, &Config::default());
        assert!(matches!(result, Err(PolicyError::RootNotFound(_))));
    }

    #[test]
    fn test_policy_root_not_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let result = SessionPolicy::new(&file, SessionMode::Default, &Config::default());
        assert!(matches!(result, Err(PolicyError::RootNotADirectory(_))));
    }

    #[test]
    fn test_policy_root_denied() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config
            .safety
            .unix_system_dirs
            .push(temp_dir.path().to_path_buf());

        let result = SessionPolicy::new(temp_dir.path(), SessionMode::Default, &config);
        assert!(matches!(result, Err(PolicyError::RootDenied(_))));
    }

    #[test]
    fn test_dangerous_pattern_screen() {
        let temp_dir = TempDir::new().unwrap();
        let policy = policy_for(temp_dir.path());

        assert!(policy.is_dangerous("docs; rm -rf /"));
        assert!(policy.is_dangerous("a|b"));
        assert!(policy.is_dangerous("`whoami`"));
        assert!(policy.is_dangerous("sudo mv a b"));
        assert!(policy.is_dangerous("CHMOD 777 x"));

        assert!(!policy.is_dangerous("reports/2024/summary.pdf"));
        assert!(!policy.is_dangerous("report (1).pdf"));
        assert!(!policy.is_dangerous("a/../b"));
    }

    #[test]
    fn test_sudo_requires_word_boundary() {
        let temp_dir = TempDir::new().unwrap();
        let policy = policy_for(temp_dir.path());
        // A file merely containing the letters is fine
        assert!(!policy.is_dangerous("pseudoscience.txt"));
        assert!(policy.is_dangerous("sudo rm"));
    }

    #[test]
    fn test_is_denied() {
        let temp_dir = TempDir::new().unwrap();
        let policy = policy_for(temp_dir.path());

        assert!(policy.is_denied(Path::new("/etc/passwd")));
        assert!(policy.is_denied(Path::new("/etc")));
        assert!(!policy.is_denied(temp_dir.path()));
    }

    #[test]
    fn test_policy_mode_is_immutable_value() {
        let temp_dir = TempDir::new().unwrap();
        let policy =
            SessionPolicy::new(temp_dir.path(), SessionMode::Strict, &Config::default()).unwrap();
        assert_eq!(policy.mode(), SessionMode::Strict);
    }
}
