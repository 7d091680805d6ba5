//! `rhodium init` command.

use anyhow::{Context, Result};
use clap::Args;
use rhodium_host::{RhodiumHost, StartMode};
use serde_json::json;

use crate::opts::GlobalOpts;
use crate::output::print_success;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Drop all parameters, counters, and items and bootstrap a new installation
    #[arg(long)]
    pub no_preserve_db: bool,
}

pub fn cmd_init(opts: &GlobalOpts, args: &InitArgs) -> Result<()> {
    let mode = if args.no_preserve_db {
        StartMode::Reinitialize
    } else {
        StartMode::Preserve
    };
    let host = RhodiumHost::start(opts.config()?, mode).context("bootstrap installation")?;
    let secrets = host.secrets();
    secrets.get_secret(false).context("provision secret")?;

    let inst = host.installation();
    let database = host.config().database_path();
    let data = json!({
        "node_id": inst.node_id.to_hex(),
        "first_boot": inst.first_boot,
        "counter": inst.counter,
        "database": database,
        "secret_file": secrets.path(),
        "reinitialized": args.no_preserve_db,
    });
    let human = format!(
        "Installation ready at {}\n  node_id:    {}\n  first_boot: {}\n  counter:    {}\n  secret:     {}",
        database.display(),
        inst.node_id,
        inst.first_boot.to_rfc3339(),
        inst.counter,
        secrets.path().display(),
    );
    print_success(opts, data, Some(human), vec![])
}
