//! Error taxonomy for the action engine.
//!
//! Every error here is fatal to the individual action and never fatal to the
//! session. Security-relevant rejections (`PathSecurityError`,
//! `ActionPolicyError`) are additionally written to the security audit stream
//! by the logging collaborator.

use std::path::PathBuf;

use thiserror::Error;

/// Path validation failures. Always security-relevant.
#[derive(Debug, Error)]
pub enum PathSecurityError {
    /// The canonical path resolves outside the sandbox root.
    #[error("path escapes the sandbox root: {path}")]
    Escape {
        /// The offending raw input.
        path: String,
    },

    /// The canonical path matches or nests under a deny-listed system directory.
    #[error("path is inside a protected system directory: {}", path.display())]
    SystemDirectory {
        /// The resolved path that hit the deny-list.
        path: PathBuf,
    },

    /// The raw input contains a known dangerous substring.
    #[error("dangerous pattern in input: {input}")]
    DangerousPattern {
        /// The offending raw input.
        input: String,
    },
}

/// Capability policy failures. Always security-relevant.
#[derive(Debug, Error)]
pub enum ActionPolicyError {
    /// The requested operation is outside the fixed capability set.
    #[error("operation is not authorized: {kind}")]
    Forbidden {
        /// Name of the rejected operation.
        kind: String,
    },

    /// The sandbox root itself may never be removed.
    #[error("refusing to remove the sandbox root")]
    RootRemoval,
}

/// Conflict resolution failures.
#[derive(Debug, Error)]
pub enum ConflictError {
    /// No non-colliding destination name could be produced.
    #[error("destination conflict could not be resolved: {}", path.display())]
    Unresolvable {
        /// The contested destination.
        path: PathBuf,
    },
}

/// Failures while performing the filesystem mutation itself.
#[derive(Debug, Error)]
pub enum ActionExecutionError {
    /// The directory still contains entries.
    #[error("directory is not empty: {}", path.display())]
    NotEmpty {
        /// The non-empty directory.
        path: PathBuf,
    },

    /// The source or target does not exist.
    #[error("path does not exist: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The path exists but is not a directory.
    #[error("path is not a directory: {}", path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// An underlying I/O operation failed.
    #[error("I/O failure: {0}")]
    IoFailure(String),
}

impl From<std::io::Error> for ActionExecutionError {
    fn from(err: std::io::Error) -> Self {
        ActionExecutionError::IoFailure(err.to_string())
    }
}

/// Umbrella error covering every per-action failure mode.
///
/// The engine captures these into the `ExecutionResult` for the action; they
/// are never propagated past the session boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Path validation rejected the request.
    #[error(transparent)]
    Security(#[from] PathSecurityError),

    /// The capability policy rejected the request.
    #[error(transparent)]
    Policy(#[from] ActionPolicyError),

    /// Conflict resolution failed.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// Execution of the mutation failed.
    #[error(transparent)]
    Execution(#[from] ActionExecutionError),
}

impl EngineError {
    /// Stable error kind string recorded in results and audit streams.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Security(PathSecurityError::Escape { .. }) => "escape",
            Self::Security(PathSecurityError::SystemDirectory { .. }) => "system_directory",
            Self::Security(PathSecurityError::DangerousPattern { .. }) => "dangerous_pattern",
            Self::Policy(ActionPolicyError::Forbidden { .. }) => "forbidden",
            Self::Policy(ActionPolicyError::RootRemoval) => "root_removal",
            Self::Conflict(ConflictError::Unresolvable { .. }) => "unresolvable",
            Self::Execution(ActionExecutionError::NotEmpty { .. }) => "not_empty",
            Self::Execution(ActionExecutionError::NotFound { .. }) => "not_found",
            Self::Execution(ActionExecutionError::NotADirectory { .. }) => "not_a_directory",
            Self::Execution(ActionExecutionError::IoFailure(_)) => "io_failure",
        }
    }

    /// Whether this rejection belongs in the security audit stream.
    pub fn is_security_event(&self) -> bool {
        matches!(self, Self::Security(_) | Self::Policy(_))
    }
}
