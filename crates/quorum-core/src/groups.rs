use crate::error::{QuorumError, Result};
use crate::{io, paths};
use std::collections::BTreeSet;
use std::path::Path;

/// Resolve the groups an actor belongs to.
///
/// Fails with `UnknownActor` when the actor has no membership record at
/// all; an actor with a record but no groups yields an empty set.
pub fn groups_of(root: &Path, unum: &str) -> Result<BTreeSet<String>> {
    paths::validate_name(unum)?;
    let dir = paths::actor_groups_dir(root, unum);
    if !dir.is_dir() {
        return Err(QuorumError::UnknownActor(unum.to_string()));
    }

    let mut groups = BTreeSet::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            if let Ok(group) = entry.file_name().into_string() {
                groups.insert(group);
            }
        }
    }
    Ok(groups)
}

/// Record an actor's membership in a group, idempotent.
pub fn grant(root: &Path, unum: &str, group: &str) -> Result<()> {
    paths::validate_name(unum)?;
    paths::validate_name(group)?;
    io::ensure_dir(&paths::actor_groups_dir(root, unum))?;
    io::create_marker(&paths::group_marker(root, unum, group))?;
    Ok(())
}

/// Remove an actor's membership in a group. Returns `true` if the
/// membership existed.
pub fn revoke(root: &Path, unum: &str, group: &str) -> Result<bool> {
    paths::validate_name(unum)?;
    paths::validate_name(group)?;
    io::remove_marker(&paths::group_marker(root, unum, group))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
