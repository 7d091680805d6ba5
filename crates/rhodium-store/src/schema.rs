use rusqlite::Connection;

const CREATE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS parameters (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    last_change TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS counters (
    key         TEXT PRIMARY KEY,
    value       INTEGER NOT NULL CHECK (value >= 0),
    last_change TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
    id           BLOB PRIMARY KEY CHECK (length(id) = 16),
    title        TEXT NOT NULL,
    description  TEXT,
    status       TEXT NOT NULL DEFAULT 'pending',
    due_at       INTEGER,
    created_at   INTEGER NOT NULL,
    completed_at INTEGER,
    recurring    TEXT,
    priority     INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS items_open_due ON items (status, due_at);
";

const DROP_SCHEMA: &str = "
DROP INDEX IF EXISTS items_open_due;
DROP TABLE IF EXISTS items;
DROP TABLE IF EXISTS counters;
DROP TABLE IF EXISTS parameters;
";

pub(crate) fn create(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_SCHEMA)
}

pub(crate) fn drop_all(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(DROP_SCHEMA)
}
