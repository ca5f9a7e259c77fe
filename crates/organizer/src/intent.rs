//! Action intent streams.
//!
//! Callers hand the engine a stream of structured action requests. The
//! canonical interchange format is JSON Lines: one action object per line,
//! tagged by `kind`. This module parses such streams; it never interprets
//! free-form text.

use std::io::{self, BufRead};

use schema::Action;
use thiserror::Error;

/// Failure while reading an action stream.
#[derive(Debug, Error)]
pub enum IntentError {
    /// A line was not a valid action object.
    #[error("invalid action on line {line}: {source}")]
    Parse {
        /// 1-based line number in the stream.
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    /// The underlying reader failed.
    #[error("failed to read action stream: {0}")]
    Io(#[from] io::Error),
}

/// A pull source of actions.
pub trait ActionSource {
    /// The next action, or `None` at end of stream.
    fn next_action(&mut self) -> Result<Option<Action>, IntentError>;
}

/// Reads one JSON action object per line; blank lines are ignored.
pub struct JsonLinesSource<R> {
    reader: R,
    line: usize,
}

impl<R: BufRead> JsonLinesSource<R> {
    /// Wrap a buffered reader producing JSON Lines.
    pub fn new(reader: R) -> Self {
        Self { reader, line: 0 }
    }

    /// Drain the stream into a vector, stopping at the first invalid line.
    pub fn collect_actions(mut self) -> Result<Vec<Action>, IntentError> {
        let mut actions = Vec::new();
        while let Some(action) = self.next_action()? {
            actions.push(action);
        }
        Ok(actions)
    }
}

impl<R: BufRead> ActionSource for JsonLinesSource<R> {
    fn next_action(&mut self) -> Result<Option<Action>, IntentError> {
        let mut buf = String::new();
        loop {
            buf.clear();
            self.line += 1;
            if self.reader.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            let trimmed = buf.trim();
            if trimmed.is_empty() {
                continue;
            }
            let action = serde_json::from_str(trimmed).map_err(|source| IntentError::Parse {
                line: self.line,
                source,
            })?;
            return Ok(Some(action));
        }
    }
}
