//! The action engine.
//!
//! One engine instance owns one session: a sandbox root, a mode, and an
//! audit trail. Every submitted action runs the full pipeline —
//! capability check, path validation, target authorization, conflict
//! resolution, then execution or preview — and yields exactly one
//! [`ExecutionResult`], in submission order. Rejections at any stage are
//! captured as failed results, never surfaced as errors to the caller.

use std::path::Path;

use anyhow::{Context, Result};
use schema::{
    Action, ActionPreview, ConflictResolution, EngineError, ExecutionResult, SessionMode,
    SessionSummary,
};

use crate::audit::AuditLog;
use crate::config::Config;
use crate::conflict;
use crate::executor;
use crate::policy::SessionPolicy;
use crate::preview;
use crate::validate::{self, ValidatedAction};

/// A single-session action engine.
pub struct Engine {
    policy: SessionPolicy,
    audit: AuditLog,
    summary: SessionSummary,
}

impl Engine {
    /// Start a session over `root` in the given mode.
    ///
    /// Fails when the root itself does not pass vetting (missing, not a
    /// directory, deny-listed) or when the audit streams cannot be opened.
    pub fn new(root: &Path, mode: SessionMode, config: &Config) -> Result<Self> {
        let policy = SessionPolicy::new(root, mode, config)
            .with_context(|| format!("Cannot start session over {root:?}"))?;
        let audit = AuditLog::open(&config.logging.log_dir)?;

        tracing::info!(
            "Session {} started: root {:?}, mode {}",
            audit.session_id(),
            policy.root(),
            policy.mode()
        );
        Ok(Self {
            policy,
            audit,
            summary: SessionSummary::default(),
        })
    }

    /// The vetted session policy.
    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// The audit session identifier.
    pub fn session_id(&self) -> &str {
        self.audit.session_id()
    }

    /// Running counts for this session.
    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Submit one action and get its structured outcome.
    ///
    /// In preview-only sessions nothing is mutated and the result carries
    /// the `preview` flag; otherwise the action is executed for real.
    pub fn submit(&mut self, action: &Action) -> ExecutionResult {
        let mut result = match self.run_pipeline(action) {
            Ok(result) => result,
            Err(error) => ExecutionResult::failure(action, &error),
        };
        if self.policy.mode() == SessionMode::PreviewOnly {
            result.preview = true;
        }

        self.summary.actions += 1;
        if result.success {
            self.summary.succeeded += 1;
        } else {
            self.summary.failed += 1;
        }

        // A failing audit write must not corrupt the result stream.
        if let Err(e) = self.audit.record(&result) {
            tracing::error!("Failed to write audit record: {e:#}");
        }
        result
    }

    /// Submit a batch, returning one result per action in submission order.
    pub fn submit_all(&mut self, actions: &[Action]) -> Vec<ExecutionResult> {
        actions.iter().map(|action| self.submit(action)).collect()
    }

    /// Describe what executing the action would do, without mutating.
    ///
    /// Unlike [`submit`](Self::submit), validation failures propagate as
    /// errors here: there is nothing sensible to predict for a rejected
    /// action.
    pub fn preview(&self, action: &Action) -> Result<ActionPreview, EngineError> {
        let (validated, resolution) = self.validate_and_resolve(action)?;
        Ok(preview::preview(action, &validated, &resolution, &self.policy))
    }

    /// Close the session, appending the summary line to the audit trail.
    pub fn finish(mut self) -> Result<SessionSummary> {
        self.audit.record_summary(&self.summary)?;
        tracing::info!(
            "Session {} finished: {} action(s), {} succeeded, {} failed",
            self.audit.session_id(),
            self.summary.actions,
            self.summary.succeeded,
            self.summary.failed
        );
        Ok(self.summary)
    }

    fn run_pipeline(&self, action: &Action) -> Result<ExecutionResult, EngineError> {
        let (validated, resolution) = self.validate_and_resolve(action)?;

        let result = if self.policy.mode() == SessionMode::PreviewOnly {
            preview::preview_result(action, &validated, &resolution, &self.policy)
        } else {
            executor::execute(action, &validated, &resolution, &self.policy)
        };
        Ok(result)
    }

    fn validate_and_resolve(
        &self,
        action: &Action,
    ) -> Result<(ValidatedAction, ConflictResolution), EngineError> {
        validate::authorize_kind(action)?;
        let validated = validate::validate_action(action, &self.policy)?;
        validate::authorize_target(&validated, &self.policy)?;

        let resolution = match validated.destination() {
            Some(dst) => conflict::resolve(
                dst.as_path(),
                self.policy.mode(),
                self.policy.max_rename_attempts(),
            ),
            None => ConflictResolution::NoConflict,
        };
        Ok((validated, resolution))
    }
}
