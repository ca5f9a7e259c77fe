//! Capability policy checks.
//!
//! Authorization happens in two halves. [`authorize_kind`] enforces the fixed
//! capability set and needs nothing but the request itself, so it runs before
//! path validation. [`authorize_target`] enforces target-specific rules that
//! only make sense on validated paths, such as the irremovability of the
//! sandbox root.

use schema::{Action, ActionPolicyError};

use super::ValidatedAction;
use crate::policy::SessionPolicy;

/// Reject any operation outside the fixed capability set.
///
/// Independent of path validity: a forbidden kind is rejected even when its
/// parameters would not validate either.
pub fn authorize_kind(action: &Action) -> Result<(), ActionPolicyError> {
    match action {
        Action::Move { .. }
        | Action::Rename { .. }
        | Action::CreateDir { .. }
        | Action::RemoveEmptyDir { .. }
        | Action::List { .. }
        | Action::GetInfo { .. } => Ok(()),
        Action::RawCommand { .. } => Err(ActionPolicyError::Forbidden {
            kind: action.kind().to_string(),
        }),
    }
}

/// Reject authorized kinds aimed at protected targets.
///
/// The sandbox root may never be removed, regardless of emptiness. The
/// "is it actually empty" check is deferred to the executor, which has to
/// re-check at execution time anyway.
pub fn authorize_target(
    action: &ValidatedAction,
    policy: &SessionPolicy,
) -> Result<(), ActionPolicyError> {
    if let ValidatedAction::RemoveEmptyDir { path } = action {
        if path.as_path() == policy.root() {
            return Err(ActionPolicyError::RootRemoval);
        }
    }
    Ok(())
}
