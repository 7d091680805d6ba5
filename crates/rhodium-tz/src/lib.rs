//! Zone-aware conversion between UTC storage and caller-local wall-clock time.
//!
//! Everything stored or compared is UTC. A caller's IANA zone is applied only when
//! interpreting offset-less input and when rendering for display.

mod convert;
mod zone;

pub use chrono_tz::Tz;
pub use convert::{
    LocalClock, end_of_day_boundary_utc, format_for_input, local_clock, parse_local_input,
    to_utc, to_zone, zone_label,
};
pub use zone::{ZoneSelection, ZoneStatus, parse_zone, resolve_zone};

pub type TzResult<T> = Result<T, TzError>;

#[derive(Debug, thiserror::Error)]
pub enum TzError {
    #[error("unknown time zone '{0}'")]
    InvalidZone(String),
    #[error("invalid timestamp '{input}': expected YYYY-MM-DDTHH:MM[:SS[.ffffff]] or RFC 3339")]
    InvalidTimestamp { input: String },
}
