use crate::error::{QuorumError, Result};
use crate::policy::Policy;
use crate::types::{ActionStatus, ExecutionOutput};
use crate::{io, paths};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// The serialized portion of an Action. The policy snapshot and the
/// approval set live next to it as plain files (`policy`, `approvals/`),
/// so concurrent approvers never rewrite the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    id: String,
    command: String,
    requester: String,
    status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    execution: Option<ExecutionOutput>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A command held for (or already past) multi-party approval.
///
/// The policy is an immutable snapshot taken at creation; approving
/// eligibility is always re-evaluated against the live rules instead.
#[derive(Debug, Clone)]
pub struct Action {
    pub id: String,
    pub command: String,
    pub requester: String,
    pub status: ActionStatus,
    pub policy: Policy,
    pub approvals: BTreeSet<String>,
    pub execution: Option<ExecutionOutput>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Action {
    /// Build an Action that is never persisted — the denied and
    /// fully-permitted paths still hand one back to the caller.
    pub fn transient(
        command: impl Into<String>,
        requester: impl Into<String>,
        status: ActionStatus,
        policy: Policy,
        execution: Option<ExecutionOutput>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            command: command.into(),
            requester: requester.into(),
            status,
            policy,
            approvals: BTreeSet::new(),
            execution,
            created_at: now,
            updated_at: now,
        }
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    /// Persist a new pending Action: manifest, policy snapshot, and the
    /// requester's self-approval marker.
    pub fn create_pending(
        root: &Path,
        command: impl Into<String>,
        requester: impl Into<String>,
        policy: Policy,
    ) -> Result<Self> {
        let mut action = Self::transient(command, requester, ActionStatus::Pending, policy, None);
        paths::validate_name(&action.requester)?;

        io::ensure_dir(&paths::approvals_dir(root, &action.id))?;
        io::atomic_write(
            &paths::action_policy(root, &action.id),
            action.policy.render().as_bytes(),
        )?;
        action.save_manifest(root)?;

        Self::record_approval(root, &action.id, &action.requester)?;
        let requester = action.requester.clone();
        action.approvals.insert(requester);
        Ok(action)
    }

    pub fn load(root: &Path, id: &str) -> Result<Self> {
        paths::validate_name(id)?;
        let manifest_path = paths::action_manifest(root, id);
        if !manifest_path.exists() {
            return Err(QuorumError::ActionNotFound(id.to_string()));
        }
        let manifest: Manifest = serde_yaml::from_str(&std::fs::read_to_string(&manifest_path)?)?;
        let policy = Policy::parse(&std::fs::read_to_string(paths::action_policy(root, id))?)?;

        let mut approvals = BTreeSet::new();
        let approvals_dir = paths::approvals_dir(root, id);
        if approvals_dir.is_dir() {
            for entry in std::fs::read_dir(&approvals_dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    if let Ok(unum) = entry.file_name().into_string() {
                        approvals.insert(unum);
                    }
                }
            }
        }

        Ok(Self {
            id: manifest.id,
            command: manifest.command,
            requester: manifest.requester,
            status: manifest.status,
            policy,
            approvals,
            execution: manifest.execution,
            created_at: manifest.created_at,
            updated_at: manifest.updated_at,
        })
    }

    pub fn list(root: &Path) -> Result<Vec<Self>> {
        let dir = paths::actions_dir(root);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut actions = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                let id = entry.file_name().to_string_lossy().into_owned();
                match Self::load(root, &id) {
                    Ok(a) => actions.push(a),
                    Err(QuorumError::ActionNotFound(_)) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        actions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(actions)
    }

    fn save_manifest(&self, root: &Path) -> Result<()> {
        let manifest = Manifest {
            id: self.id.clone(),
            command: self.command.clone(),
            requester: self.requester.clone(),
            status: self.status,
            execution: self.execution.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        let data = serde_yaml::to_string(&manifest)?;
        io::atomic_write(&paths::action_manifest(root, &self.id), data.as_bytes())
    }

    // ---------------------------------------------------------------------------
    // Approval markers
    // ---------------------------------------------------------------------------

    fn require_exists(root: &Path, id: &str) -> Result<()> {
        paths::validate_name(id)?;
        if !paths::action_manifest(root, id).exists() {
            return Err(QuorumError::ActionNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Record an approval marker, idempotent.
    pub fn record_approval(root: &Path, id: &str, unum: &str) -> Result<()> {
        paths::validate_name(unum)?;
        Self::require_exists(root, id)?;
        io::ensure_dir(&paths::approvals_dir(root, id))?;
        io::create_marker(&paths::approval_marker(root, id, unum))?;
        Ok(())
    }

    /// Remove an approval marker. Returns `true` iff it was present;
    /// a marker that was never recorded is a normal `false`, not a fault.
    pub fn remove_approval(root: &Path, id: &str, unum: &str) -> Result<bool> {
        paths::validate_name(unum)?;
        Self::require_exists(root, id)?;
        io::remove_marker(&paths::approval_marker(root, id, unum))
    }

    // ---------------------------------------------------------------------------
    // Finalization
    // ---------------------------------------------------------------------------

    /// Claim the right to execute this Action. Exactly one concurrent
    /// caller observes `true`; everyone else must not execute.
    pub fn claim_execution(root: &Path, id: &str) -> Result<bool> {
        Self::require_exists(root, id)?;
        io::create_marker(&paths::exec_claim(root, id))
    }

    /// Move a persisted Action to a terminal status with its captured
    /// output. A no-op if the Action is already terminal.
    pub fn finalize(
        root: &Path,
        id: &str,
        status: ActionStatus,
        execution: Option<ExecutionOutput>,
    ) -> Result<()> {
        let mut action = Self::load(root, id)?;
        if action.status.is_terminal() {
            return Ok(());
        }
        action.status = status;
        action.execution = execution;
        action.updated_at = Utc::now();
        action.save_manifest(root)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_policy() -> Policy {
        Policy::parse("ops,owner\n---\nintern\n").unwrap()
    }

    #[test]
    fn create_pending_persists_layout_and_self_approval() {
        let dir = TempDir::new().unwrap();
        let action =
            Action::create_pending(dir.path(), "build deploy", "u1", sample_policy()).unwrap();

        assert_eq!(action.status, ActionStatus::Pending);
        assert!(action.approvals.contains("u1"));
        assert!(paths::action_manifest(dir.path(), &action.id).exists());
        assert!(paths::action_policy(dir.path(), &action.id).exists());
        assert!(paths::approval_marker(dir.path(), &action.id, "u1").exists());
    }

    #[test]
    fn load_roundtrips_manifest_policy_and_approvals() {
        let dir = TempDir::new().unwrap();
        let created =
            Action::create_pending(dir.path(), "build deploy", "u1", sample_policy()).unwrap();
        Action::record_approval(dir.path(), &created.id, "u2").unwrap();

        let loaded = Action::load(dir.path(), &created.id).unwrap();
        assert_eq!(loaded.id, created.id);
        assert_eq!(loaded.command, "build deploy");
        assert_eq!(loaded.requester, "u1");
        assert_eq!(loaded.status, ActionStatus::Pending);
        assert_eq!(loaded.policy, sample_policy());
        assert_eq!(
            loaded.approvals.iter().collect::<Vec<_>>(),
            vec!["u1", "u2"]
        );
    }

    #[test]
    fn load_missing_action_fails_with_not_found() {
        let dir = TempDir::new().unwrap();
        let err = Action::load(dir.path(), "0000").unwrap_err();
        assert!(matches!(err, QuorumError::ActionNotFound(_)));
    }

    #[test]
    fn record_approval_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let action = Action::create_pending(dir.path(), "build", "u1", sample_policy()).unwrap();

        Action::record_approval(dir.path(), &action.id, "u2").unwrap();
        Action::record_approval(dir.path(), &action.id, "u2").unwrap();

        let loaded = Action::load(dir.path(), &action.id).unwrap();
        assert_eq!(loaded.approvals.len(), 2);
    }

    #[test]
    fn remove_approval_distinguishes_absent_from_fault() {
        let dir = TempDir::new().unwrap();
        let action = Action::create_pending(dir.path(), "build", "u1", sample_policy()).unwrap();

        Action::record_approval(dir.path(), &action.id, "u2").unwrap();
        assert!(Action::remove_approval(dir.path(), &action.id, "u2").unwrap());
        assert!(!Action::remove_approval(dir.path(), &action.id, "u2").unwrap());

        // nonexistent action is a WrongId-class error, not a quiet false
        let err = Action::remove_approval(dir.path(), "0000", "u2").unwrap_err();
        assert!(matches!(err, QuorumError::ActionNotFound(_)));
    }

    #[test]
    fn claim_execution_is_first_writer_wins() {
        let dir = TempDir::new().unwrap();
        let action = Action::create_pending(dir.path(), "build", "u1", sample_policy()).unwrap();

        assert!(Action::claim_execution(dir.path(), &action.id).unwrap());
        assert!(!Action::claim_execution(dir.path(), &action.id).unwrap());
    }

    #[test]
    fn finalize_sets_terminal_status_and_output() {
        let dir = TempDir::new().unwrap();
        let action = Action::create_pending(dir.path(), "build", "u1", sample_policy()).unwrap();

        let output = ExecutionOutput {
            exit_ok: true,
            text: "done\n".to_string(),
        };
        Action::finalize(
            dir.path(),
            &action.id,
            ActionStatus::Granted,
            Some(output.clone()),
        )
        .unwrap();

        let loaded = Action::load(dir.path(), &action.id).unwrap();
        assert_eq!(loaded.status, ActionStatus::Granted);
        assert_eq!(loaded.execution, Some(output));
    }

    #[test]
    fn finalize_is_a_noop_on_terminal_actions() {
        let dir = TempDir::new().unwrap();
        let action = Action::create_pending(dir.path(), "build", "u1", sample_policy()).unwrap();

        Action::finalize(dir.path(), &action.id, ActionStatus::Granted, None).unwrap();
        Action::finalize(
            dir.path(),
            &action.id,
            ActionStatus::Rejected,
            Some(ExecutionOutput {
                exit_ok: false,
                text: String::new(),
            }),
        )
        .unwrap();

        let loaded = Action::load(dir.path(), &action.id).unwrap();
        assert_eq!(loaded.status, ActionStatus::Granted);
        assert_eq!(loaded.execution, None);
    }

    #[test]
    fn list_returns_creation_order() {
        let dir = TempDir::new().unwrap();
        let first = Action::create_pending(dir.path(), "build", "u1", sample_policy()).unwrap();
        let second = Action::create_pending(dir.path(), "deploy", "u2", sample_policy()).unwrap();

        let listed = Action::list(dir.path()).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[1].id, second.id);
    }

    #[test]
    fn list_without_store_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(Action::list(dir.path()).unwrap().is_empty());
    }
}
