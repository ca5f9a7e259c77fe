//! Session audit trail.
//!
//! Two JSON Lines streams per session, both under the configured log
//! directory: `actions_<session>.jsonl` records one line per execution
//! result, and `security_<session>.jsonl` records one line per security
//! rejection (escape attempts, forbidden operations, protected targets).
//! The security stream exists so rejections can be reviewed without wading
//! through routine action traffic.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use schema::{ExecutionResult, SecurityEvent, SessionSummary};

/// JSON Lines writer for one session's action and security streams.
pub struct AuditLog {
    session_id: String,
    actions_path: PathBuf,
    security_path: PathBuf,
    actions: BufWriter<File>,
    security: BufWriter<File>,
}

impl AuditLog {
    /// Open the audit streams for a new session under `log_dir`.
    ///
    /// The directory is created if missing. The session id is the UTC clock
    /// formatted as `YYYYMMDD_HHMMSS`, which keeps log files sortable by
    /// name.
    pub fn open(log_dir: &Path) -> Result<Self> {
        let session_id = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        Self::open_with_session(log_dir, session_id)
    }

    fn open_with_session(log_dir: &Path, session_id: String) -> Result<Self> {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory {log_dir:?}"))?;

        let actions_path = log_dir.join(format!("actions_{session_id}.jsonl"));
        let security_path = log_dir.join(format!("security_{session_id}.jsonl"));

        let actions = open_append(&actions_path)?;
        let security = open_append(&security_path)?;

        tracing::debug!("Audit session {} started in {:?}", session_id, log_dir);
        Ok(Self {
            session_id,
            actions_path,
            security_path,
            actions,
            security,
        })
    }

    /// The session identifier embedded in the stream file names.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Path of the action stream file.
    pub fn actions_path(&self) -> &Path {
        &self.actions_path
    }

    /// Path of the security stream file.
    pub fn security_path(&self) -> &Path {
        &self.security_path
    }

    /// Record one execution result; security rejections are mirrored into
    /// the security stream.
    pub fn record(&mut self, result: &ExecutionResult) -> Result<()> {
        write_line(&mut self.actions, &self.actions_path, result)?;

        if let Some(event) = SecurityEvent::from_result(result) {
            tracing::warn!(
                "Security rejection ({}) for {} action",
                event.event_type,
                event.action_kind
            );
            write_line(&mut self.security, &self.security_path, &event)?;
        }
        Ok(())
    }

    /// Append the session summary as the final line of the action stream.
    pub fn record_summary(&mut self, summary: &SessionSummary) -> Result<()> {
        write_line(&mut self.actions, &self.actions_path, summary)
    }
}

fn open_append(path: &Path) -> Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open audit log {path:?}"))?;
    Ok(BufWriter::new(file))
}

/// Serialize one record as a single JSON line and flush it immediately, so
/// the trail survives a crash mid-session.
fn write_line<T: serde::Serialize>(
    writer: &mut BufWriter<File>,
    path: &Path,
    record: &T,
) -> Result<()> {
    let line = serde_json::to_string(record)
        .with_context(|| format!("Failed to serialize audit record for {path:?}"))?;
    writer
        .write_all(line.as_bytes())
        .and_then(|_| writer.write_all(b"\n"))
        .and_then(|_| writer.flush())
        .with_context(|| format!("Failed to write audit log {path:?}"))?;
    Ok(())
}
