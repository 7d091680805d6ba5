mod commands;
mod opts;
mod output;

use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rhodium_host::{ConfigError, HostError, SecretError};
use rhodium_store::StoreError;
use tracing_subscriber::EnvFilter;

use commands::init::InitArgs;
use commands::items::{AddArgs, ItemArgs, ListArgs, TodayArgs};
use commands::secret::SecretArgs;
use opts::GlobalOpts;

#[derive(Parser, Debug)]
#[command(name = "rhodium", version, about = "Rhodium installation and task CLI")]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bootstrap the installation (idempotent unless --no-preserve-db)
    Init(InitArgs),

    /// Show stored parameters and counters
    Params,

    /// Provision or validate the session secret
    Secret(SecretArgs),

    /// Issue a new identifier
    NewId,

    /// Create an item
    Add(AddArgs),

    /// List all items
    List(ListArgs),

    /// Show one item
    Show(ItemArgs),

    /// Mark an item done
    Done(ItemArgs),

    /// Open items due by the end of today in --tz
    Today(TodayArgs),

    /// Check that the database is reachable
    Health,
}

/// Exit status for errors the process cannot continue past (secret, filesystem, counter
/// exhaustion, configuration).
const EXIT_FATAL: i32 = 2;

fn main() {
    setup_logging();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        if is_fatal(&err) {
            eprintln!("FATAL: {err:#}");
            process::exit(EXIT_FATAL);
        }
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let opts = &cli.opts;

    match &cli.command {
        Command::Init(args) => commands::init::cmd_init(opts, args),
        Command::Params => commands::params::cmd_params(opts),
        Command::Secret(args) => commands::secret::cmd_secret(opts, args),
        Command::NewId => commands::id::cmd_new_id(opts),
        Command::Add(args) => commands::items::cmd_add(opts, args),
        Command::List(args) => commands::items::cmd_list(opts, args),
        Command::Show(args) => commands::items::cmd_show(opts, args),
        Command::Done(args) => commands::items::cmd_done(opts, args),
        Command::Today(args) => commands::items::cmd_today(opts, args),
        Command::Health => commands::health::cmd_health(opts),
    }
}

/// Walk the context chain for the first typed error that decides fatality.
fn is_fatal(err: &anyhow::Error) -> bool {
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<HostError>() {
            return err.is_fatal();
        }
        if let Some(err) = cause.downcast_ref::<StoreError>() {
            return err.is_fatal();
        }
        if cause.is::<SecretError>() || cause.is::<ConfigError>() {
            return true;
        }
    }
    false
}

/// Logs go to stderr so stdout stays machine-readable.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();
}
