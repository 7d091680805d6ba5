//! `rhodium params` command.

use std::fmt::Write;

use anyhow::Result;
use rhodium_store::{list_counters, list_parameters};
use serde_json::json;

use crate::opts::GlobalOpts;
use crate::output::print_success;

use super::attach;

pub fn cmd_params(opts: &GlobalOpts) -> Result<()> {
    let host = attach(opts)?;
    let session = host.session()?;
    let parameters = list_parameters(&session)?;
    let counters = list_counters(&session)?;

    let mut human = String::new();
    for p in &parameters {
        writeln!(human, "{:<16} {:<26} {}", p.key, p.value, p.last_change.to_rfc3339())?;
    }
    for c in &counters {
        writeln!(human, "{:<16} {:<26} {}", c.key, c.value, c.last_change.to_rfc3339())?;
    }
    let data = json!({ "parameters": parameters, "counters": counters });
    print_success(opts, data, Some(human.trim_end().to_string()), vec![])
}
