//! `rhodium new-id` command.

use anyhow::Result;
use serde_json::json;

use crate::opts::GlobalOpts;
use crate::output::print_success;

use super::attach;

pub fn cmd_new_id(opts: &GlobalOpts) -> Result<()> {
    let host = attach(opts)?;
    let mut session = host.session()?;
    let id = host.generator().generate(&mut session)?;
    let data = json!({
        "id": id.to_hex(),
        "timestamp_ms": id.timestamp_ms(),
        "node_id": id.node().to_hex(),
        "counter": id.counter(),
    });
    print_success(opts, data, Some(id.to_hex()), vec![])
}
