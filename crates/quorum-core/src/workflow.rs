//! Approval-collection workflow.
//!
//! `create` turns a permission Decision into an Action; `approve` and
//! `unapprove` mutate a pending Action's approval set; every approval is
//! followed by a quorum check that may execute the command and finalize
//! the Action to Granted.

use crate::action::Action;
use crate::error::Result;
use crate::evaluator::{evaluate, Decision};
use crate::executor::Executor;
use crate::groups;
use crate::policy::Policy;
use crate::types::{ActionStatus, ExecutionOutput};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

// ---------------------------------------------------------------------------
// ApprovalOutcome
// ---------------------------------------------------------------------------

/// Result of an `approve` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// The approver may not run the command; nothing was recorded.
    Denied,
    /// The approval was recorded; `granted` reports whether this call
    /// completed the quorum and executed the command.
    Approved { granted: bool },
    /// The Action was already terminal; nothing was recorded.
    AlreadyFinalized(ActionStatus),
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Create an Action for `(command, unum)`.
///
/// Denied requests come back as a transient Rejected Action; fully
/// permitted commands execute immediately and come back Granted with
/// their captured output; conditional permissions persist a Pending
/// Action carrying the policy snapshot and the requester's
/// self-approval.
pub fn create(
    root: &Path,
    executor: &dyn Executor,
    unum: &str,
    command: &str,
) -> Result<Action> {
    match evaluate(root, unum, command) {
        Decision::Denied => Ok(Action::transient(
            command,
            unum,
            ActionStatus::Rejected,
            Policy::DenyAll,
            None,
        )),
        Decision::Full => {
            let execution = run_captured(executor, command);
            info!(unum, command, exit_ok = execution.exit_ok, "executed fully permitted command");
            Ok(Action::transient(
                command,
                unum,
                ActionStatus::Granted,
                Policy::AllowAll,
                Some(execution),
            ))
        }
        Decision::Conditional(policy) => {
            let action = Action::create_pending(root, command, unum, policy)?;
            info!(unum, command, id = %action.id, "created pending action");
            Ok(action)
        }
    }
}

/// Record an approval for a pending Action.
///
/// Eligibility is re-evaluated against the live policy, not the snapshot
/// taken at creation. If the recorded approval completes the quorum, the
/// command is executed (first claimant only) and the Action finalized to
/// Granted.
pub fn approve(
    root: &Path,
    executor: &dyn Executor,
    id: &str,
    unum: &str,
) -> Result<ApprovalOutcome> {
    let action = Action::load(root, id)?;
    if action.status.is_terminal() {
        return Ok(ApprovalOutcome::AlreadyFinalized(action.status));
    }

    if evaluate(root, unum, &action.command) == Decision::Denied {
        info!(unum, id, "approval refused: approver not permitted");
        return Ok(ApprovalOutcome::Denied);
    }

    Action::record_approval(root, id, unum)?;
    info!(unum, id, "recorded approval");

    let action = Action::load(root, id)?;
    if !satisfies_quorum(root, &action) {
        return Ok(ApprovalOutcome::Approved { granted: false });
    }
    if !Action::claim_execution(root, id)? {
        // another process won the claim; it executes and finalizes
        return Ok(ApprovalOutcome::Approved { granted: false });
    }

    let execution = run_captured(executor, &action.command);
    info!(id, exit_ok = execution.exit_ok, "quorum met; executed command");
    Action::finalize(root, id, ActionStatus::Granted, Some(execution))?;
    Ok(ApprovalOutcome::Approved { granted: true })
}

/// Rescind a previously recorded approval. Any actor may rescind; there
/// is no permission re-check and no quorum re-run (a Granted Action is
/// not reversible). Returns `true` iff the approval was present.
pub fn unapprove(root: &Path, id: &str, unum: &str) -> Result<bool> {
    let removed = Action::remove_approval(root, id, unum)?;
    if removed {
        info!(unum, id, "removed approval");
    }
    Ok(removed)
}

/// Whether the Action's approvers, under their *current* group
/// memberships, fully cover any allow clause: every token of the clause
/// must be covered by at least one approver, distinct approvers may cover
/// distinct tokens.
pub fn satisfies_quorum(root: &Path, action: &Action) -> bool {
    let rules = match &action.policy {
        Policy::AllowAll => return true,
        Policy::DenyAll => return false,
        Policy::Groups(rules) => rules,
    };

    // a failed membership lookup contributes nothing (fail closed)
    let memberships: Vec<BTreeSet<String>> = action
        .approvals
        .iter()
        .map(|unum| groups::groups_of(root, unum).unwrap_or_default())
        .collect();

    rules.allow.iter().any(|clause| {
        clause
            .groups()
            .all(|g| memberships.iter().any(|m| m.contains(g)))
    })
}

fn run_captured(executor: &dyn Executor, command: &str) -> ExecutionOutput {
    // a spawn failure is recorded as output, never propagated
    match executor.run(command) {
        Ok(output) => output,
        Err(e) => ExecutionOutput {
            exit_ok: false,
            text: e.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
