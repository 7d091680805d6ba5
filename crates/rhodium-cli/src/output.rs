//! Shared output helpers for human and JSON modes.
//!
//! Human mode prints primary data to stdout and notices to stderr.
//! JSON mode wraps responses in `{ data, warnings? }`.

use std::io::Write;

use anyhow::Result;
use serde_json::{Value, json};

use crate::opts::GlobalOpts;

/// Print a command result. `human` replaces the data in human mode when given.
pub fn print_success(
    opts: &GlobalOpts,
    data: Value,
    human: Option<String>,
    warnings: Vec<String>,
) -> Result<()> {
    if opts.wants_json() {
        print_json(opts, data, warnings)
    } else {
        print_human(data, human, warnings)
    }
}

fn print_json(opts: &GlobalOpts, data: Value, warnings: Vec<String>) -> Result<()> {
    let mut root = json!({ "data": data });
    if !warnings.is_empty() {
        root["warnings"] = warnings.into_iter().map(Value::String).collect();
    }
    if opts.pretty {
        println!("{}", serde_json::to_string_pretty(&root)?);
    } else {
        println!("{}", serde_json::to_string(&root)?);
    }
    Ok(())
}

fn print_human(data: Value, human: Option<String>, warnings: Vec<String>) -> Result<()> {
    let mut stderr = std::io::stderr();
    for w in warnings {
        writeln!(stderr, "notice: {w}")?;
    }
    match (human, data) {
        (Some(text), _) => println!("{text}"),
        (None, Value::String(s)) => println!("{s}"),
        (None, other) => println!("{}", serde_json::to_string_pretty(&other)?),
    }
    Ok(())
}
