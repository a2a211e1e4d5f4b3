use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use quorum_core::groups;
use std::path::Path;

#[derive(Subcommand)]
pub enum GroupSubcommand {
    /// Add an actor to a group
    Grant { unum: String, group: String },
    /// Remove an actor from a group
    Revoke { unum: String, group: String },
    /// List the groups an actor belongs to
    List { unum: String },
}

pub fn run(root: &Path, subcmd: GroupSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        GroupSubcommand::Grant { unum, group } => {
            groups::grant(root, &unum, &group)
                .with_context(|| format!("failed to grant '{group}' to '{unum}'"))?;
            if json {
                print_json(&serde_json::json!({
                    "unum": unum, "group": group, "granted": true,
                }))?;
            } else {
                println!("Granted: {unum} is in {group}");
            }
            Ok(())
        }
        GroupSubcommand::Revoke { unum, group } => {
            let removed = groups::revoke(root, &unum, &group)
                .with_context(|| format!("failed to revoke '{group}' from '{unum}'"))?;
            if json {
                print_json(&serde_json::json!({
                    "unum": unum, "group": group, "removed": removed,
                }))?;
            } else if removed {
                println!("Revoked: {unum} is no longer in {group}");
            } else {
                println!("No membership of {unum} in {group} was recorded");
            }
            Ok(())
        }
        GroupSubcommand::List { unum } => {
            let memberships = groups::groups_of(root, &unum)
                .with_context(|| format!("failed to list groups for '{unum}'"))?;
            if json {
                print_json(&serde_json::json!({
                    "unum": unum,
                    "groups": memberships.iter().collect::<Vec<_>>(),
                }))?;
            } else {
                for group in &memberships {
                    println!("{group}");
                }
            }
            Ok(())
        }
    }
}
