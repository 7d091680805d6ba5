use crate::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rhodium_ident::MAX_COUNTER;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

/// Counter consumed by identifier issuance.
pub const PRIMARY_COUNTER: &str = "primary_counter";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterRow {
    pub key: String,
    pub value: u64,
    pub last_change: DateTime<Utc>,
}

pub fn get_counter(conn: &Connection, key: &str) -> StoreResult<Option<u64>> {
    let value = conn
        .query_row("SELECT value FROM counters WHERE key = ?1", [key], |row| {
            counter_value(row, 0)
        })
        .optional()?;
    Ok(value)
}

/// Return the counter's current value, seeding it with `supplier()` first if absent.
pub fn ensure_counter<F>(conn: &Connection, key: &str, supplier: F) -> StoreResult<u64>
where
    F: FnOnce() -> StoreResult<u64>,
{
    if let Some(existing) = get_counter(conn, key)? {
        return Ok(existing);
    }
    let seed = supplier()?;
    if seed > MAX_COUNTER {
        return Err(StoreError::CounterSeedOutOfRange {
            key: key.to_string(),
            value: seed,
        });
    }
    conn.execute(
        "INSERT INTO counters (key, value, last_change) VALUES (?1, ?2, ?3)
         ON CONFLICT (key) DO NOTHING",
        params![key, seed as i64, Utc::now()],
    )?;
    get_counter(conn, key)?.ok_or_else(|| StoreError::MissingCounter(key.to_string()))
}

/// Add one to the counter and return the new value, as a single statement.
///
/// The read, the increment, and the write happen inside one `UPDATE ... RETURNING`, which
/// SQLite runs under its database write lock; two sessions can never be handed the same
/// value. Run it in autocommit mode or inside a write (`IMMEDIATE`) transaction: a deferred
/// transaction that has already read may be refused the lock with `SQLITE_BUSY`.
///
/// A counter already at the 56-bit ceiling is left untouched and reported as exhausted.
pub fn increment_counter(conn: &Connection, key: &str) -> StoreResult<u64> {
    let next: Option<u64> = conn
        .query_row(
            "UPDATE counters SET value = value + 1, last_change = ?2
             WHERE key = ?1 AND value < ?3
             RETURNING value",
            params![key, Utc::now(), MAX_COUNTER as i64],
            |row| counter_value(row, 0),
        )
        .optional()?;
    match next {
        Some(value) => Ok(value),
        None => match get_counter(conn, key)? {
            None => Err(StoreError::MissingCounter(key.to_string())),
            Some(value) => Err(StoreError::CounterExhausted {
                key: key.to_string(),
                value,
            }),
        },
    }
}

pub fn list_counters(conn: &Connection) -> StoreResult<Vec<CounterRow>> {
    let mut stmt = conn.prepare("SELECT key, value, last_change FROM counters ORDER BY key")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CounterRow {
                key: row.get(0)?,
                value: counter_value(row, 1)?,
                last_change: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn counter_value(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let raw: i64 = row.get(idx)?;
    u64::try_from(raw).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, raw))
}
