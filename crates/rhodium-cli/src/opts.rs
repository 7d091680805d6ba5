//! Global CLI options and configuration resolution.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rhodium_host::{RhodiumConfig, config::ENV_PATH};

/// Global options for CLI commands.
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Data directory holding the database and secret (env: RHODIUM_PATH)
    #[arg(short = 'p', long, global = true, env = ENV_PATH)]
    pub path: Option<PathBuf>,

    /// JSON output envelope
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output (implies --json)
    #[arg(long, global = true)]
    pub pretty: bool,
}

impl GlobalOpts {
    /// Environment configuration with `--path` applied on top.
    pub fn config(&self) -> Result<RhodiumConfig> {
        let config = RhodiumConfig::from_env().context("load configuration")?;
        Ok(match &self.path {
            Some(path) => config.with_data_dir(path),
            None => config,
        })
    }

    pub fn wants_json(&self) -> bool {
        self.json || self.pretty
    }
}
