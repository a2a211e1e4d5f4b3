use crate::error::{QuorumError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const QUORUM_DIR: &str = ".quorum";
pub const PERMISSIONS_DIR: &str = ".quorum/permissions";
pub const GROUPS_DIR: &str = ".quorum/groups/by-user";
pub const ACTIONS_DIR: &str = ".quorum/actions";

pub const MANIFEST_FILE: &str = "manifest.yaml";
pub const POLICY_FILE: &str = "policy";
pub const APPROVALS_DIR: &str = "approvals";
pub const EXEC_CLAIM_FILE: &str = "exec.claim";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn quorum_dir(root: &Path) -> PathBuf {
    root.join(QUORUM_DIR)
}

pub fn permissions_dir(root: &Path) -> PathBuf {
    root.join(PERMISSIONS_DIR)
}

pub fn rule_path(root: &Path, key: &str) -> PathBuf {
    permissions_dir(root).join(key)
}

pub fn groups_dir(root: &Path) -> PathBuf {
    root.join(GROUPS_DIR)
}

pub fn actor_groups_dir(root: &Path, unum: &str) -> PathBuf {
    groups_dir(root).join(unum)
}

pub fn group_marker(root: &Path, unum: &str, group: &str) -> PathBuf {
    actor_groups_dir(root, unum).join(group)
}

pub fn actions_dir(root: &Path) -> PathBuf {
    root.join(ACTIONS_DIR)
}

pub fn action_dir(root: &Path, id: &str) -> PathBuf {
    actions_dir(root).join(id)
}

pub fn action_manifest(root: &Path, id: &str) -> PathBuf {
    action_dir(root, id).join(MANIFEST_FILE)
}

pub fn action_policy(root: &Path, id: &str) -> PathBuf {
    action_dir(root, id).join(POLICY_FILE)
}

pub fn approvals_dir(root: &Path, id: &str) -> PathBuf {
    action_dir(root, id).join(APPROVALS_DIR)
}

pub fn approval_marker(root: &Path, id: &str, unum: &str) -> PathBuf {
    approvals_dir(root, id).join(unum)
}

pub fn exec_claim(root: &Path, id: &str) -> PathBuf {
    action_dir(root, id).join(EXEC_CLAIM_FILE)
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\-]*$").unwrap())
}

/// Validate a value used as a single store path component (unum, group
/// name, action id, command word). Rejects anything that could escape the
/// store directory.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 128 || name.contains("..") || !name_re().is_match(name) {
        return Err(QuorumError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in ["u1", "ops", "alice.smith", "team-a_2", "8f3e-b0"] {
            validate_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_names() {
        for name in [
            "",
            "has space",
            "a/b",
            "a\\b",
            "..",
            "a..b",
            ".hidden",
            "-leading",
            "nul\0byte",
        ] {
            assert!(validate_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/site");
        assert_eq!(
            rule_path(root, "build__deploy"),
            PathBuf::from("/tmp/site/.quorum/permissions/build__deploy")
        );
        assert_eq!(
            approval_marker(root, "a1", "u1"),
            PathBuf::from("/tmp/site/.quorum/actions/a1/approvals/u1")
        );
        assert_eq!(
            group_marker(root, "u1", "ops"),
            PathBuf::from("/tmp/site/.quorum/groups/by-user/u1/ops")
        );
    }
}
