use crate::error::{QuorumError, Result};
use crate::paths;
use std::path::Path;

/// Separator substituted for spaces when a command is encoded as a rule
/// filename.
pub const WORD_SEPARATOR: &str = "__";

/// Encode a command string into its word-safe rule-key form.
pub fn encode_command(command: &str) -> String {
    command.replace(' ', WORD_SEPARATOR)
}

/// Find the rule key governing `command`.
///
/// Every stored key that is a prefix of the encoded command survives; the
/// lexicographically greatest survivor wins. This is a specificity
/// heuristic, not longest-prefix matching: rule authors must name
/// finer-grained rules so they sort after their coarser prefixes
/// (`build__deploy` after `build`).
pub fn resolve(root: &Path, command: &str) -> Result<String> {
    let dir = paths::permissions_dir(root);
    if !dir.is_dir() {
        return Err(QuorumError::NoMatchingRule(command.to_string()));
    }

    let encoded = encode_command(command);
    let mut best: Option<String> = None;
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(key) = entry.file_name().into_string() else {
            continue;
        };
        if encoded.starts_with(&key) && best.as_deref().map_or(true, |b| key.as_str() > b) {
            best = Some(key);
        }
    }

    best.ok_or_else(|| QuorumError::NoMatchingRule(command.to_string()))
}

/// Read the raw text of a stored rule.
pub fn read_rule(root: &Path, key: &str) -> Result<String> {
    paths::validate_name(key)?;
    Ok(std::fs::read_to_string(paths::rule_path(root, key))?)
}

/// List all stored rule keys, sorted.
pub fn list_rules(root: &Path) -> Result<Vec<String>> {
    let dir = paths::permissions_dir(root);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut keys = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            if let Ok(key) = entry.file_name().into_string() {
                keys.push(key);
            }
        }
    }
    keys.sort();
    Ok(keys)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
