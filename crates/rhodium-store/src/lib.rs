//! SQLite-backed installation state: write-once parameters, the primary counter,
//! identifier issuance, and the item records keyed by those identifiers.
//!
//! Every operation takes its session (`&Connection`, or `&mut Connection` when it opens
//! its own transaction) as an explicit argument. Sessions come from [`Database::session`].

mod bootstrap;
mod counters;
mod db;
mod idgen;
mod items;
mod params;
mod schema;

pub use bootstrap::{
    Installation, bootstrap, bootstrap_with, is_initialized, load_installation, reinitialize,
    reinitialize_with,
};
pub use counters::{
    CounterRow, PRIMARY_COUNTER, ensure_counter, get_counter, increment_counter, list_counters,
};
pub use db::{Database, DatabaseOptions, Session};
pub use idgen::{IdGenerator, generate_id};
pub use items::{
    DueReport, Item, ItemUpdate, ItemView, NewItem, STATUS_DONE, STATUS_PENDING, create_item,
    due_today, get_item, list_items, set_item_status, update_item,
};
pub use params::{
    FIRST_BOOT, NODE_ID, ParameterRow, TRNG_SEED, ensure_parameter, get_parameter,
    list_parameters,
};

use rhodium_ident::{IdError, ItemId};
use std::{io, path::PathBuf};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("storage invariant violated: parameter '{0}' is missing (store not initialized?)")]
    MissingParameter(String),
    #[error("storage invariant violated: counter '{0}' is missing (store not initialized?)")]
    MissingCounter(String),
    #[error("parameter '{key}' holds malformed value '{value}': {source}")]
    CorruptParameter {
        key: String,
        value: String,
        #[source]
        source: IdError,
    },
    #[error("parameter '{key}' holds malformed timestamp '{value}': {source}")]
    CorruptTimestamp {
        key: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("counter '{key}' is exhausted at {value}; identifiers cannot grow past 56 bits")]
    CounterExhausted { key: String, value: u64 },
    #[error("counter '{key}' seed {value} does not fit in 56 bits")]
    CounterSeedOutOfRange { key: String, value: u64 },
    #[error("identifier error: {0}")]
    Id(#[from] IdError),
    #[error("item {0} not found")]
    ItemNotFound(ItemId),
    #[error("item title must not be empty")]
    EmptyTitle,
    #[error("recurrence rule is {0} characters; at most 64 are allowed")]
    RecurringTooLong(usize),
    #[error("stored timestamp {0}us is out of range")]
    TimestampOutOfRange(i64),
    #[error("a time zone is required for this query (got {requested:?})")]
    ZoneRequired { requested: Option<String> },
}

impl StoreError {
    /// Conditions the process must not continue past.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::CounterExhausted { .. } | StoreError::Io { .. })
    }

    /// A required bootstrap value is absent or unreadable.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            StoreError::MissingParameter(_)
                | StoreError::MissingCounter(_)
                | StoreError::CorruptParameter { .. }
                | StoreError::CorruptTimestamp { .. }
        )
    }
}

pub(crate) fn io_error(path: impl Into<PathBuf>, err: io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source: err,
    }
}
