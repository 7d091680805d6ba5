//! `rhodium health` command.

use anyhow::{Context, Result};
use rhodium_store::{Database, is_initialized};
use serde_json::json;

use crate::opts::GlobalOpts;
use crate::output::print_success;

pub fn cmd_health(opts: &GlobalOpts) -> Result<()> {
    let config = opts.config()?;
    let db = Database::open(config.database_path(), &config.database_options())
        .context("open database")?;
    db.health().context("database health check")?;
    let session = db.session()?;
    let initialized = is_initialized(&session)?;

    let mut warnings = vec![];
    if !initialized {
        warnings.push("installation not bootstrapped; run `rhodium init`".to_string());
    }
    let data = json!({ "status": "ok", "database": db.path(), "initialized": initialized });
    print_success(opts, data, Some("ok".into()), warnings)
}
