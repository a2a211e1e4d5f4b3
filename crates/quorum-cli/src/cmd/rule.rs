use crate::output::print_json;
use anyhow::{bail, Context};
use clap::Subcommand;
use quorum_core::policy::{Clause, GroupRules, GroupToken, Policy};
use quorum_core::{io, paths, resolver};
use std::path::Path;

#[derive(Subcommand)]
pub enum RuleSubcommand {
    /// Write the rule governing a command
    Set {
        command: String,
        /// Allow clause: comma-separated groups that must all approve
        /// (repeat for alternative clauses)
        #[arg(long = "allow", value_name = "CLAUSE")]
        allow: Vec<String>,
        /// Group whose members are always denied (repeatable)
        #[arg(long = "block", value_name = "GROUP")]
        block: Vec<String>,
        /// Permit every actor unconditionally
        #[arg(long, conflicts_with_all = ["allow", "block"])]
        all: bool,
    },
    /// Show the rule that would govern a command
    Show { command: String },
    /// List stored rule keys
    List,
}

pub fn run(root: &Path, subcmd: RuleSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        RuleSubcommand::Set {
            command,
            allow,
            block,
            all,
        } => set(root, &command, allow, block, all, json),
        RuleSubcommand::Show { command } => show(root, &command, json),
        RuleSubcommand::List => list(root, json),
    }
}

fn set(
    root: &Path,
    command: &str,
    allow: Vec<String>,
    block: Vec<String>,
    all: bool,
    json: bool,
) -> anyhow::Result<()> {
    let key = resolver::encode_command(command);
    for word in command.split(' ') {
        paths::validate_name(word).with_context(|| format!("invalid command word: '{word}'"))?;
    }

    let policy = if all {
        Policy::AllowAll
    } else {
        let clauses: Vec<Clause> = allow
            .iter()
            .map(|line| {
                let tokens: Vec<GroupToken> = line
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(GroupToken::new)
                    .collect();
                if tokens.is_empty() {
                    bail!("empty allow clause: '{line}'");
                }
                Ok(Clause::new(tokens))
            })
            .collect::<anyhow::Result<_>>()?;
        if clauses.is_empty() && block.is_empty() {
            bail!("a rule needs --allow, --block, or --all");
        }
        Policy::Groups(GroupRules {
            allow: clauses,
            block: block.into_iter().collect(),
        })
    };

    io::atomic_write(&paths::rule_path(root, &key), policy.render().as_bytes())
        .with_context(|| format!("failed to write rule '{key}'"))?;

    if json {
        print_json(&serde_json::json!({
            "key": key,
            "rule": policy.render(),
        }))?;
    } else {
        println!("Wrote rule: {key}");
    }
    Ok(())
}

fn show(root: &Path, command: &str, json: bool) -> anyhow::Result<()> {
    let key = resolver::resolve(root, command)
        .with_context(|| format!("no rule governs '{command}'"))?;
    let raw = resolver::read_rule(root, &key)?;

    if json {
        print_json(&serde_json::json!({
            "command": command,
            "key": key,
            "rule": raw,
        }))?;
    } else {
        println!("# {key}");
        print!("{raw}");
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let keys = resolver::list_rules(root)?;

    if json {
        print_json(&keys)?;
    } else {
        for key in &keys {
            println!("{key}");
        }
    }
    Ok(())
}
