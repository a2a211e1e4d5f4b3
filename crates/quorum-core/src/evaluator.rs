use crate::error::{QuorumError, Result};
use crate::policy::{GroupRules, Policy};
use crate::{groups, resolver};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use tracing::{error, info, warn};

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Outcome of a permission check for an (actor, command) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The actor may not run the command.
    Denied,
    /// The actor may run the command unconditionally.
    Full,
    /// The actor may run the command once the policy's approvals are
    /// collected.
    Conditional(Policy),
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Denied => "denied",
            Decision::Full => "full",
            Decision::Conditional(_) => "conditional",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Decide whether `unum` may run `command`.
///
/// Never escalates on failure: a missing rule, malformed rule text, an
/// unknown actor, or a store fault all resolve to [`Decision::Denied`].
pub fn evaluate(root: &Path, unum: &str, command: &str) -> Decision {
    let decision = match try_evaluate(root, unum, command) {
        Ok(d) => d,
        Err(QuorumError::NoMatchingRule(_)) => {
            warn!(command, "no rule covers command; denying");
            Decision::Denied
        }
        Err(QuorumError::MalformedRule(reason)) => {
            error!(command, %reason, "malformed rule file; denying");
            Decision::Denied
        }
        Err(QuorumError::UnknownActor(_)) => {
            warn!(unum, "actor has no group record; denying");
            Decision::Denied
        }
        Err(e) => {
            error!(unum, command, error = %e, "permission check failed; denying");
            Decision::Denied
        }
    };
    info!(unum, command, decision = %decision, "checked permission");
    decision
}

fn try_evaluate(root: &Path, unum: &str, command: &str) -> Result<Decision> {
    let key = resolver::resolve(root, command)?;
    let raw = resolver::read_rule(root, &key)?;
    let policy = Policy::parse(&raw)
        .map_err(|e| QuorumError::MalformedRule(format!("{key}: {e}")))?;

    match policy {
        Policy::AllowAll => Ok(Decision::Full),
        Policy::DenyAll => Ok(Decision::Denied),
        Policy::Groups(rules) => {
            let actor_groups = groups::groups_of(root, unum)?;
            if actor_groups.is_empty() {
                return Ok(Decision::Denied);
            }
            Ok(combine(rules, &actor_groups))
        }
    }
}

/// Combine group rules with an actor's memberships.
///
/// The result is the best outcome across all clause/group pairs, so it
/// cannot depend on the store's listing order: a block match beats
/// everything, any single-group clause match yields Full, any other
/// clause intersection yields Conditional.
fn combine(rules: GroupRules, actor_groups: &BTreeSet<String>) -> Decision {
    if rules.block.iter().any(|b| actor_groups.contains(b)) {
        return Decision::Denied;
    }

    let mut intersects = false;
    for clause in &rules.allow {
        if clause.is_single_group()
            && clause.groups().all(|g| actor_groups.contains(g))
        {
            return Decision::Full;
        }
        if clause.groups().any(|g| actor_groups.contains(g)) {
            intersects = true;
        }
    }

    if intersects {
        Decision::Conditional(Policy::Groups(rules))
    } else {
        Decision::Denied
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
