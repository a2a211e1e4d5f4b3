use crate::output::print_json;
use quorum_core::evaluator::{evaluate, Decision};
use std::path::Path;

pub fn run(root: &Path, unum: &str, command: &str, json: bool) -> anyhow::Result<()> {
    let decision = evaluate(root, unum, command);

    if json {
        let mut val = serde_json::json!({
            "unum": unum,
            "command": command,
            "decision": decision.as_str(),
        });
        if let Decision::Conditional(policy) = &decision {
            val["policy"] = serde_json::Value::String(policy.render());
        }
        print_json(&val)?;
    } else {
        println!("{unum} + \"{command}\": {decision}");
        if let Decision::Conditional(policy) = &decision {
            print!("{}", policy.render());
        }
    }
    Ok(())
}
