use crate::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

/// Fingerprint of the node that owns this installation (4 hex chars).
pub const NODE_ID: &str = "node_id";
/// The 56-bit seed the primary counter started from (14 hex chars).
pub const TRNG_SEED: &str = "trng_seed";
/// When the installation was first bootstrapped (RFC 3339, UTC).
pub const FIRST_BOOT: &str = "first_boot";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterRow {
    pub key: String,
    pub value: String,
    pub last_change: DateTime<Utc>,
}

pub fn get_parameter(conn: &Connection, key: &str) -> StoreResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM parameters WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

/// Return the stored value for `key`, persisting `supplier()`'s value first if absent.
///
/// An existing value is never replaced. The insert is a no-overwrite upsert, so if another
/// writer stores the key between the lookup and the insert, its value wins and is returned.
pub fn ensure_parameter<F>(conn: &Connection, key: &str, supplier: F) -> StoreResult<String>
where
    F: FnOnce() -> StoreResult<String>,
{
    if let Some(existing) = get_parameter(conn, key)? {
        return Ok(existing);
    }
    let value = supplier()?;
    conn.execute(
        "INSERT INTO parameters (key, value, last_change) VALUES (?1, ?2, ?3)
         ON CONFLICT (key) DO NOTHING",
        params![key, value, Utc::now()],
    )?;
    get_parameter(conn, key)?.ok_or_else(|| StoreError::MissingParameter(key.to_string()))
}

pub fn list_parameters(conn: &Connection) -> StoreResult<Vec<ParameterRow>> {
    let mut stmt = conn.prepare("SELECT key, value, last_change FROM parameters ORDER BY key")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ParameterRow {
                key: row.get(0)?,
                value: row.get(1)?,
                last_change: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
