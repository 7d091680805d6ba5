use crate::{
    Installation, NODE_ID, PRIMARY_COUNTER, StoreError, StoreResult, get_parameter,
    increment_counter,
};
use chrono::Utc;
use rhodium_ident::{IdError, ItemId, NodeFingerprint};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::debug;

/// Issues identifiers for one installation.
///
/// The generator only holds the node fingerprint. Uniqueness comes from the persisted
/// primary counter, so any number of generators over the same database may issue
/// concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdGenerator {
    node: NodeFingerprint,
}

impl IdGenerator {
    pub fn new(node: NodeFingerprint) -> Self {
        Self { node }
    }

    /// Build a generator from the stored `node_id` parameter.
    pub fn load(conn: &Connection) -> StoreResult<Self> {
        let raw = get_parameter(conn, NODE_ID)?
            .ok_or_else(|| StoreError::MissingParameter(NODE_ID.to_string()))?;
        let node = NodeFingerprint::from_hex_str(&raw).map_err(|source| {
            StoreError::CorruptParameter {
                key: NODE_ID.to_string(),
                value: raw.clone(),
                source,
            }
        })?;
        Ok(Self::new(node))
    }

    pub fn from_installation(installation: &Installation) -> Self {
        Self::new(installation.node_id)
    }

    pub fn node(&self) -> NodeFingerprint {
        self.node
    }

    /// Consume one counter value and compose a new identifier stamped with the current time.
    ///
    /// Runs in its own `IMMEDIATE` transaction so the clock is read while the write lock is
    /// held: ordering by counter then agrees with ordering by bytes.
    pub fn generate(&self, conn: &mut Connection) -> StoreResult<ItemId> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = self.generate_in(&tx)?;
        tx.commit()?;
        Ok(id)
    }

    /// Like [`IdGenerator::generate`], inside a write transaction the caller already holds.
    pub fn generate_in(&self, tx: &Transaction<'_>) -> StoreResult<ItemId> {
        let now = Utc::now().timestamp_millis();
        let timestamp_ms =
            u64::try_from(now).map_err(|_| IdError::TimestampOutOfRange(now.unsigned_abs()))?;
        self.generate_at(tx, timestamp_ms)
    }

    pub fn generate_at(&self, conn: &Connection, timestamp_ms: u64) -> StoreResult<ItemId> {
        let counter = increment_counter(conn, PRIMARY_COUNTER)?;
        let id = ItemId::compose(timestamp_ms, self.node, counter)?;
        debug!(%id, counter, "issued identifier");
        Ok(id)
    }
}

/// Load the generator from storage and issue one identifier.
pub fn generate_id(conn: &mut Connection) -> StoreResult<ItemId> {
    IdGenerator::load(conn)?.generate(conn)
}
