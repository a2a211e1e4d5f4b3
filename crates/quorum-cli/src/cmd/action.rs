use crate::output::{print_json, print_table};
use clap::Subcommand;
use quorum_core::action::Action;
use quorum_core::executor::ShellExecutor;
use quorum_core::types::ActionStatus;
use quorum_core::workflow::{self, ApprovalOutcome};
use std::path::Path;

#[derive(Subcommand)]
pub enum ActionSubcommand {
    /// Create an action for a command requested by an actor
    Create { unum: String, command: String },
    /// Record an approval on a pending action
    Approve { id: String, unum: String },
    /// Rescind a previously recorded approval
    Unapprove { id: String, unum: String },
    /// Show one action
    Show { id: String },
    /// List stored actions
    List,
}

pub fn run(root: &Path, subcmd: ActionSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ActionSubcommand::Create { unum, command } => create(root, &unum, &command, json),
        ActionSubcommand::Approve { id, unum } => approve(root, &id, &unum, json),
        ActionSubcommand::Unapprove { id, unum } => unapprove(root, &id, &unum, json),
        ActionSubcommand::Show { id } => show(root, &id, json),
        ActionSubcommand::List => list(root, json),
    }
}

fn create(root: &Path, unum: &str, command: &str, json: bool) -> anyhow::Result<()> {
    let action = workflow::create(root, &ShellExecutor, unum, command)?;

    if json {
        print_json(&action_json(&action))?;
        return Ok(());
    }

    match action.status {
        ActionStatus::Rejected => println!("Denied: \"{command}\" for {unum}"),
        ActionStatus::Granted => {
            println!("Executed: \"{command}\" for {unum}");
            print_execution(&action);
        }
        ActionStatus::Pending => {
            println!("Pending approval: {}", action.id);
        }
    }
    Ok(())
}

fn approve(root: &Path, id: &str, unum: &str, json: bool) -> anyhow::Result<()> {
    let outcome = workflow::approve(root, &ShellExecutor, id, unum)?;

    if json {
        let val = match &outcome {
            ApprovalOutcome::Denied => serde_json::json!({
                "id": id, "unum": unum, "outcome": "denied",
            }),
            ApprovalOutcome::Approved { granted } => serde_json::json!({
                "id": id, "unum": unum, "outcome": "approved", "granted": granted,
            }),
            ApprovalOutcome::AlreadyFinalized(status) => serde_json::json!({
                "id": id, "unum": unum, "outcome": "already_finalized",
                "status": status.as_str(),
            }),
        };
        print_json(&val)?;
        return Ok(());
    }

    match outcome {
        ApprovalOutcome::Denied => println!("Denied: {unum} may not approve {id}"),
        ApprovalOutcome::Approved { granted: true } => {
            println!("Approved by {unum}; quorum met, command executed");
        }
        ApprovalOutcome::Approved { granted: false } => {
            println!("Approved by {unum}; awaiting further approvals");
        }
        ApprovalOutcome::AlreadyFinalized(status) => {
            println!("No change: action is already {status}");
        }
    }
    Ok(())
}

fn unapprove(root: &Path, id: &str, unum: &str, json: bool) -> anyhow::Result<()> {
    let removed = workflow::unapprove(root, id, unum)?;

    if json {
        print_json(&serde_json::json!({
            "id": id, "unum": unum, "removed": removed,
        }))?;
    } else if removed {
        println!("Removed approval by {unum}");
    } else {
        println!("No approval by {unum} was recorded");
    }
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let action = Action::load(root, id)?;

    if json {
        print_json(&action_json(&action))?;
        return Ok(());
    }

    println!("id:        {}", action.id);
    println!("command:   {}", action.command);
    println!("requester: {}", action.requester);
    println!("status:    {}", action.status);
    println!(
        "approvals: {}",
        action.approvals.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    print!("policy:\n{}", action.policy.render());
    print_execution(&action);
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let actions = Action::list(root)?;

    if json {
        let vals: Vec<serde_json::Value> = actions.iter().map(action_json).collect();
        print_json(&vals)?;
        return Ok(());
    }

    let rows: Vec<Vec<String>> = actions
        .iter()
        .map(|a| {
            vec![
                a.id.clone(),
                a.status.to_string(),
                a.requester.clone(),
                a.approvals.len().to_string(),
                a.command.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "STATUS", "REQUESTER", "APPROVALS", "COMMAND"], rows);
    Ok(())
}

fn action_json(action: &Action) -> serde_json::Value {
    let mut val = serde_json::json!({
        "id": action.id,
        "command": action.command,
        "requester": action.requester,
        "status": action.status.as_str(),
        "approvals": action.approvals.iter().collect::<Vec<_>>(),
        "policy": action.policy.render(),
        "created_at": action.created_at.to_rfc3339(),
    });
    if let Some(execution) = &action.execution {
        val["execution"] = serde_json::json!({
            "exit_ok": execution.exit_ok,
            "text": execution.text,
        });
    }
    val
}

fn print_execution(action: &Action) {
    if let Some(execution) = &action.execution {
        let status = if execution.exit_ok { "ok" } else { "failed" };
        println!("exit:      {status}");
        if !execution.text.is_empty() {
            print!("{}", execution.text);
        }
    }
}
