use crate::{TzError, TzResult};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::warn;

/// Outcome of resolving a caller-supplied zone parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    /// The requested zone was recognized and is in effect (this includes an explicit "UTC").
    Applied,
    /// No zone was supplied; UTC is in effect.
    Missing,
    /// A zone was supplied but not recognized; UTC is in effect.
    Invalid,
}

/// The zone to use for a request, plus whether it is the one the caller asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneSelection {
    pub tz: Tz,
    pub status: ZoneStatus,
    /// The raw value the caller supplied, if any.
    pub requested: Option<String>,
}

impl ZoneSelection {
    pub fn applied(tz: Tz) -> Self {
        Self {
            tz,
            status: ZoneStatus::Applied,
            requested: Some(tz.name().to_string()),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.status == ZoneStatus::Applied
    }

    /// Canonical name of the zone in effect.
    pub fn name(&self) -> &'static str {
        self.tz.name()
    }
}

/// Look up an IANA zone by name.
pub fn parse_zone(name: &str) -> TzResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| TzError::InvalidZone(name.to_string()))
}

/// Resolve an optional zone parameter, degrading to UTC when it is absent or unknown.
pub fn resolve_zone(requested: Option<&str>) -> ZoneSelection {
    let Some(raw) = requested.filter(|s| !s.trim().is_empty()) else {
        return ZoneSelection {
            tz: Tz::UTC,
            status: ZoneStatus::Missing,
            requested: None,
        };
    };
    match parse_zone(raw) {
        Ok(tz) => ZoneSelection {
            tz,
            status: ZoneStatus::Applied,
            requested: Some(raw.to_string()),
        },
        Err(err) => {
            warn!("{err}; falling back to UTC");
            ZoneSelection {
                tz: Tz::UTC,
                status: ZoneStatus::Invalid,
                requested: Some(raw.to_string()),
            }
        }
    }
}
