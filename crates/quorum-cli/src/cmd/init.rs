use anyhow::Context;
use quorum_core::{io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing quorum store in: {}", root.display());

    let dirs = [
        paths::QUORUM_DIR,
        paths::PERMISSIONS_DIR,
        paths::GROUPS_DIR,
        paths::ACTIONS_DIR,
    ];
    for dir in dirs {
        let p = root.join(dir);
        let existed = p.is_dir();
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
        if existed {
            println!("  exists:  {dir}");
        } else {
            println!("  created: {dir}");
        }
    }

    Ok(())
}
