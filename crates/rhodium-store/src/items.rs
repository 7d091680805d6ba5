use crate::{IdGenerator, StoreError, StoreResult};
use chrono::{DateTime, FixedOffset, NaiveDate, SubsecRound, Utc};
use rhodium_ident::ItemId;
use rhodium_tz::{Tz, ZoneSelection, end_of_day_boundary_utc, local_clock, to_zone, zone_label};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use serde::Serialize;
use tracing::{debug, info};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_DONE: &str = "done";

const MAX_RECURRING_LEN: usize = 64;

const ITEM_COLUMNS: &str =
    "id, title, description, status, due_at, created_at, completed_at, recurring, priority";

/// A stored task. All timestamps are UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub recurring: Option<String>,
    pub priority: i64,
}

#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub title: String,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub recurring: Option<String>,
    pub priority: i64,
}

/// Replacement values for an existing item. A `None` status keeps the current one.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub recurring: Option<String>,
    pub priority: i64,
}

/// An item as presented to a caller in a particular zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub due_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub recurring: Option<String>,
    pub priority: i64,
}

impl ItemView {
    pub fn new(item: &Item, tz: Tz) -> Self {
        let local = |utc: DateTime<Utc>| to_zone(utc, tz).fixed_offset();
        Self {
            id: item.id.to_hex(),
            title: item.title.clone(),
            description: item.description.clone(),
            status: item.status.clone(),
            due_at: item.due_at.map(local),
            created_at: local(item.created_at),
            completed_at: item.completed_at.map(local),
            recurring: item.recurring.clone(),
            priority: item.priority,
        }
    }
}

/// Result of the "due today" query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueReport {
    pub zone: String,
    pub zone_label: String,
    pub current_time: DateTime<FixedOffset>,
    /// 1 = Monday .. 7 = Sunday.
    pub iso_weekday: u32,
    pub date: NaiveDate,
    pub boundary_utc: DateTime<Utc>,
    pub items: Vec<ItemView>,
}

/// Issue an identifier and insert the item, in one `IMMEDIATE` transaction.
pub fn create_item(
    conn: &mut Connection,
    generator: &IdGenerator,
    new: NewItem,
) -> StoreResult<Item> {
    let title = validate_title(&new.title)?;
    let recurring = validate_recurring(new.recurring)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let id = generator.generate_in(&tx)?;
    let item = Item {
        id,
        title,
        description: non_blank(new.description),
        status: STATUS_PENDING.to_string(),
        due_at: new.due_at.map(|d| d.trunc_subsecs(6)),
        created_at: Utc::now().trunc_subsecs(6),
        completed_at: None,
        recurring,
        priority: new.priority,
    };
    tx.execute(
        &format!("INSERT INTO items ({ITEM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
        params![
            item.id.as_bytes().as_slice(),
            item.title,
            item.description,
            item.status,
            item.due_at.map(|d| d.timestamp_micros()),
            item.created_at.timestamp_micros(),
            item.completed_at.map(|d| d.timestamp_micros()),
            item.recurring,
            item.priority,
        ],
    )?;
    tx.commit()?;
    info!(id = %item.id, title = %item.title, "item created");
    Ok(item)
}

pub fn get_item(conn: &Connection, id: &ItemId) -> StoreResult<Option<Item>> {
    let raw = conn
        .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
            [id.as_bytes().as_slice()],
            RawItem::from_row,
        )
        .optional()?;
    raw.map(RawItem::into_item).transpose()
}

/// Replace an item's fields.
///
/// `completed_at` is stamped the first time the status becomes `done` and is kept as-is
/// on every later update, including one that reopens the item.
pub fn update_item(conn: &mut Connection, id: &ItemId, update: ItemUpdate) -> StoreResult<Item> {
    let title = validate_title(&update.title)?;
    let recurring = validate_recurring(update.recurring)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let current = get_item(&tx, id)?.ok_or(StoreError::ItemNotFound(*id))?;
    let status = next_status(update.status.as_deref(), current.status);
    let completed_at = completion_stamp(current.completed_at, &status);
    let item = Item {
        id: *id,
        title,
        description: non_blank(update.description),
        status,
        due_at: update.due_at.map(|d| d.trunc_subsecs(6)),
        created_at: current.created_at,
        completed_at,
        recurring,
        priority: update.priority,
    };
    tx.execute(
        "UPDATE items SET title = ?2, description = ?3, status = ?4, due_at = ?5,
                completed_at = ?6, recurring = ?7, priority = ?8
         WHERE id = ?1",
        params![
            id.as_bytes().as_slice(),
            item.title,
            item.description,
            item.status,
            item.due_at.map(|d| d.timestamp_micros()),
            item.completed_at.map(|d| d.timestamp_micros()),
            item.recurring,
            item.priority,
        ],
    )?;
    tx.commit()?;
    debug!(id = %id, status = %item.status, "item updated");
    Ok(item)
}

/// Change only the status (and the completion stamp), leaving every other field as stored.
pub fn set_item_status(conn: &mut Connection, id: &ItemId, status: &str) -> StoreResult<Item> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut item = get_item(&tx, id)?.ok_or(StoreError::ItemNotFound(*id))?;
    item.status = next_status(Some(status), item.status);
    item.completed_at = completion_stamp(item.completed_at, &item.status);
    tx.execute(
        "UPDATE items SET status = ?2, completed_at = ?3 WHERE id = ?1",
        params![
            id.as_bytes().as_slice(),
            item.status,
            item.completed_at.map(|d| d.timestamp_micros()),
        ],
    )?;
    tx.commit()?;
    debug!(id = %id, status = %item.status, "item status set");
    Ok(item)
}

/// A blank requested status keeps the current one.
fn next_status(requested: Option<&str>, current: String) -> String {
    requested
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or(current)
}

fn completion_stamp(current: Option<DateTime<Utc>>, status: &str) -> Option<DateTime<Utc>> {
    match current {
        Some(stamped) => Some(stamped),
        None if status == STATUS_DONE => Some(Utc::now().trunc_subsecs(6)),
        None => None,
    }
}

/// All items, highest priority first, then soonest due, undated last.
pub fn list_items(conn: &Connection) -> StoreResult<Vec<Item>> {
    query_items(
        conn,
        &format!(
            "SELECT {ITEM_COLUMNS} FROM items
             ORDER BY priority DESC, due_at ASC NULLS LAST, id ASC"
        ),
        params![],
    )
}

/// Open items that are undated or due by the end of the caller's local day.
///
/// The zone must have been applied; a missing or unrecognized zone is rejected rather than
/// silently answered in UTC.
pub fn due_today(
    conn: &Connection,
    zone: &ZoneSelection,
    now: DateTime<Utc>,
) -> StoreResult<DueReport> {
    if !zone.is_applied() {
        return Err(StoreError::ZoneRequired {
            requested: zone.requested.clone(),
        });
    }
    let tz = zone.tz;
    let boundary = end_of_day_boundary_utc(tz, now);
    let items = query_items(
        conn,
        &format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE status != ?1 AND (due_at IS NULL OR due_at <= ?2)
             ORDER BY priority DESC, due_at ASC NULLS LAST, id ASC"
        ),
        params![STATUS_DONE, boundary.timestamp_micros()],
    )?;
    debug!(zone = zone.name(), %boundary, count = items.len(), "due today");

    let clock = local_clock(tz, now);
    Ok(DueReport {
        zone: zone.name().to_string(),
        zone_label: zone_label(tz, now),
        current_time: clock.now.fixed_offset(),
        iso_weekday: clock.iso_weekday,
        date: clock.date,
        boundary_utc: boundary,
        items: items.iter().map(|item| ItemView::new(item, tz)).collect(),
    })
}

fn query_items(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> StoreResult<Vec<Item>> {
    let mut stmt = conn.prepare(sql)?;
    let raw = stmt
        .query_map(params, RawItem::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    raw.into_iter().map(RawItem::into_item).collect()
}

/// Column values as stored, before identifier and timestamp decoding.
struct RawItem {
    id: Vec<u8>,
    title: String,
    description: Option<String>,
    status: String,
    due_at: Option<i64>,
    created_at: i64,
    completed_at: Option<i64>,
    recurring: Option<String>,
    priority: i64,
}

impl RawItem {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            status: row.get(3)?,
            due_at: row.get(4)?,
            created_at: row.get(5)?,
            completed_at: row.get(6)?,
            recurring: row.get(7)?,
            priority: row.get(8)?,
        })
    }

    fn into_item(self) -> StoreResult<Item> {
        Ok(Item {
            id: ItemId::from_bytes(&self.id)?,
            title: self.title,
            description: self.description,
            status: self.status,
            due_at: self.due_at.map(from_micros).transpose()?,
            created_at: from_micros(self.created_at)?,
            completed_at: self.completed_at.map(from_micros).transpose()?,
            recurring: self.recurring,
            priority: self.priority,
        })
    }
}

fn from_micros(micros: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or(StoreError::TimestampOutOfRange(micros))
}

fn validate_title(title: &str) -> StoreResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StoreError::EmptyTitle);
    }
    Ok(title.to_string())
}

fn validate_recurring(recurring: Option<String>) -> StoreResult<Option<String>> {
    match non_blank(recurring) {
        Some(rule) if rule.chars().count() > MAX_RECURRING_LEN => {
            Err(StoreError::RecurringTooLong(rule.chars().count()))
        }
        other => Ok(other),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
