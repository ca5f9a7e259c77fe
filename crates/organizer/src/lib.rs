//! # Organizer Engine Library
//!
//! This crate provides the sandboxed filesystem action engine for Organizer:
//! a validating executor for structured file-management requests produced by
//! an untrusted planner.
//!
//! ## Overview
//!
//! The engine accepts a stream of structured actions (move, rename, create
//! directory, remove empty directory, list, get info) and runs each through
//! a fixed pipeline:
//!
//! - **Capability check**: only the fixed action set is allowed; raw command
//!   execution is rejected outright
//! - **Path validation**: every path is canonicalized and proven to live
//!   inside the sandbox root, away from deny-listed system directories
//! - **Conflict resolution**: occupied destinations are renamed
//!   (`report (1).pdf`) instead of overwritten
//! - **Execution or preview**: the mutation is performed, or described,
//!   depending on the session mode
//!
//! Every submitted action yields exactly one [`ExecutionResult`], and every
//! security rejection is mirrored into a JSON Lines audit stream.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use organizer::{Config, Engine};
//! use schema::{Action, SessionMode};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     let mut engine = Engine::new("/home/me/Downloads".as_ref(), SessionMode::Default, &config)?;
//!
//!     let result = engine.submit(&Action::Move {
//!         src: "report.pdf".to_string(),
//!         dst: "documents/report.pdf".to_string(),
//!     });
//!     println!("{}", serde_json::to_string(&result)?);
//!
//!     engine.finish()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`policy`]: Per-session policy (root, mode, deny list, pattern screen)
//! - [`validate`]: Path containment and capability checks
//! - [`conflict`]: Destination conflict resolution
//! - [`executor`]: Filesystem mutation
//! - [`preview`]: Dry-run predictions
//! - [`audit`]: JSON Lines action and security streams
//! - [`intent`]: Action stream parsing
//! - [`engine`]: The session pipeline coordinator

pub mod audit;
pub mod config;
pub mod conflict;
pub mod engine;
pub mod executor;
pub mod intent;
pub mod policy;
pub mod preview;
pub mod validate;

// Re-export schema for convenience
pub use schema;
pub use schema::ExecutionResult;

// Re-export config types for convenience
pub use config::{Config, ConfigError};

// Re-export engine and policy types for convenience
pub use engine::Engine;
pub use policy::{PolicyError, SessionPolicy};

// Re-export audit and intent types for convenience
pub use audit::AuditLog;
pub use intent::{ActionSource, IntentError, JsonLinesSource};

// Re-export validation types for convenience
pub use validate::{ValidatedAction, ValidatedPath};
