//! `rhodium secret` command.

use anyhow::{Context, Result};
use clap::Args;
use rhodium_host::SecretManager;
use serde_json::json;

use crate::opts::GlobalOpts;
use crate::output::print_success;

#[derive(Args, Debug)]
pub struct SecretArgs {
    /// Replace the existing secret with a new one
    #[arg(long)]
    pub regenerate: bool,
}

pub fn cmd_secret(opts: &GlobalOpts, args: &SecretArgs) -> Result<()> {
    let manager = SecretManager::new(opts.config()?.secret_path());
    let existed = manager.path().exists();
    manager
        .get_secret(args.regenerate)
        .with_context(|| format!("load secret from {}", manager.path().display()))?;

    let status = match (existed, args.regenerate) {
        (_, true) => "regenerated",
        (true, false) => "valid",
        (false, false) => "created",
    };
    let data = json!({ "path": manager.path(), "status": status });
    let human = format!("secret {status}: {}", manager.path().display());
    print_success(opts, data, Some(human), vec![])
}
