//! # Organizer Action Schema
//!
//! This crate defines the fixed schema shared by the three parties of the
//! organizer system:
//!
//! - the **intent layer** (an external producer, typically LLM-driven) emits
//!   [`Action`] requests;
//! - the **engine** validates and executes them inside the sandbox;
//! - the **logging collaborator** persists the resulting [`ExecutionResult`]
//!   and [`SecurityEvent`] records as JSON Lines.
//!
//! The schema is the capability boundary: only the operations representable
//! here can ever be requested, and anything an intent layer cannot map onto
//! them is submitted as [`Action::RawCommand`], which the engine rejects
//! unconditionally.
//!
//! ## Modules
//!
//! - [`actions`]: action requests and the session mode
//! - [`report`]: results, previews, and audit records
//! - [`error`]: the per-action error taxonomy

pub mod actions;
pub mod error;
pub mod report;

pub use actions::{Action, SessionMode};
pub use error::{
    ActionExecutionError, ActionPolicyError, ConflictError, EngineError, PathSecurityError,
};
pub use report::{
    ActionPreview, ConflictResolution, EntryInfo, EntryKind, ExecutionResult, SecurityEvent,
    SessionSummary,
};
