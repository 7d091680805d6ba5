//! CLI command handlers.

pub mod health;
pub mod id;
pub mod init;
pub mod items;
pub mod params;
pub mod secret;

use anyhow::{Context, Result};
use rhodium_host::RhodiumHost;
use rhodium_tz::{ZoneSelection, ZoneStatus, resolve_zone};

use crate::opts::GlobalOpts;

/// Attach to an installation that `rhodium init` has already bootstrapped.
pub fn attach(opts: &GlobalOpts) -> Result<RhodiumHost> {
    let config = opts.config()?;
    let path = config.database_path();
    RhodiumHost::attach(config)
        .with_context(|| format!("open installation at {} (run `rhodium init`?)", path.display()))
}

/// Resolve an optional `--tz`, collecting a notice when it fell back to UTC.
pub fn zone_with_notice(requested: Option<&str>, warnings: &mut Vec<String>) -> ZoneSelection {
    let zone = resolve_zone(requested);
    match zone.status {
        ZoneStatus::Applied => {}
        ZoneStatus::Missing => warnings.push("no --tz given; times shown in UTC".into()),
        ZoneStatus::Invalid => warnings.push(format!(
            "unknown time zone '{}'; times shown in UTC",
            zone.requested.as_deref().unwrap_or_default()
        )),
    }
    zone
}
