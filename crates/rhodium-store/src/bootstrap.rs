use crate::{
    FIRST_BOOT, NODE_ID, PRIMARY_COUNTER, StoreError, StoreResult, TRNG_SEED, ensure_counter,
    ensure_parameter, get_counter, get_parameter, schema,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rhodium_ident::{IdResult, NodeFingerprint, TrngSeed};
use rusqlite::{Connection, TransactionBehavior};
use tracing::{info, warn};

/// The write-once facts of an installation, as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub node_id: NodeFingerprint,
    pub trng_seed: TrngSeed,
    pub first_boot: DateTime<Utc>,
    /// Value of the primary counter when this snapshot was taken.
    pub counter: u64,
}

/// Seed a fresh installation, or load the existing one unchanged.
///
/// Reads this host's fingerprint and draws a new random seed; both are only persisted for
/// keys that do not exist yet.
pub fn bootstrap(conn: &mut Connection) -> StoreResult<Installation> {
    let seed = TrngSeed::generate()?;
    bootstrap_with(conn, rhodium_ident::fingerprint, seed, Utc::now())
}

/// [`bootstrap`] with explicit sources for the fingerprint, seed, and boot time.
///
/// All writes happen in one `IMMEDIATE` transaction, committed once. The fingerprint
/// source is only invoked when `node_id` is absent.
pub fn bootstrap_with<F>(
    conn: &mut Connection,
    fingerprint: F,
    seed: TrngSeed,
    now: DateTime<Utc>,
) -> StoreResult<Installation>
where
    F: FnOnce() -> IdResult<NodeFingerprint>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let installation = seed_installation(&tx, fingerprint, seed, now)?;
    tx.commit()?;
    info!(
        node_id = %installation.node_id,
        first_boot = %installation.first_boot,
        counter = installation.counter,
        "installation ready"
    );
    Ok(installation)
}

/// Destroy all stored state and bootstrap from scratch.
///
/// This is the only path that replaces an existing `node_id`. Items, parameters, and
/// counters are all dropped.
pub fn reinitialize(conn: &mut Connection) -> StoreResult<Installation> {
    let seed = TrngSeed::generate()?;
    reinitialize_with(conn, rhodium_ident::fingerprint, seed, Utc::now())
}

pub fn reinitialize_with<F>(
    conn: &mut Connection,
    fingerprint: F,
    seed: TrngSeed,
    now: DateTime<Utc>,
) -> StoreResult<Installation>
where
    F: FnOnce() -> IdResult<NodeFingerprint>,
{
    warn!("dropping all parameters, counters, and items");
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    schema::drop_all(&tx)?;
    schema::create(&tx)?;
    let installation = seed_installation(&tx, fingerprint, seed, now)?;
    tx.commit()?;
    info!(node_id = %installation.node_id, "installation reinitialized");
    Ok(installation)
}

/// Whether the installation has been bootstrapped.
pub fn is_initialized(conn: &Connection) -> StoreResult<bool> {
    Ok(get_parameter(conn, NODE_ID)?.is_some())
}

/// Read the stored installation facts without writing anything.
pub fn load_installation(conn: &Connection) -> StoreResult<Installation> {
    let node_id = required_parameter(conn, NODE_ID)?;
    let trng_seed = required_parameter(conn, TRNG_SEED)?;
    let first_boot = required_parameter(conn, FIRST_BOOT)?;
    let counter = get_counter(conn, PRIMARY_COUNTER)?
        .ok_or_else(|| StoreError::MissingCounter(PRIMARY_COUNTER.to_string()))?;
    decode_installation(&node_id, &trng_seed, &first_boot, counter)
}

fn seed_installation<F>(
    conn: &Connection,
    fingerprint: F,
    seed: TrngSeed,
    now: DateTime<Utc>,
) -> StoreResult<Installation>
where
    F: FnOnce() -> IdResult<NodeFingerprint>,
{
    let node_id = ensure_parameter(conn, NODE_ID, || Ok(fingerprint()?.to_hex()))?;
    let trng_seed = ensure_parameter(conn, TRNG_SEED, || Ok(seed.to_hex()))?;
    let first_boot = ensure_parameter(conn, FIRST_BOOT, || {
        Ok(now.to_rfc3339_opts(SecondsFormat::Micros, true))
    })?;
    // Seed from the stored value so a partially bootstrapped store stays consistent.
    let stored_seed = decode(TRNG_SEED, &trng_seed, TrngSeed::from_hex_str)?;
    let counter = ensure_counter(conn, PRIMARY_COUNTER, || Ok(stored_seed.value()))?;
    decode_installation(&node_id, &trng_seed, &first_boot, counter)
}

fn required_parameter(conn: &Connection, key: &str) -> StoreResult<String> {
    get_parameter(conn, key)?.ok_or_else(|| StoreError::MissingParameter(key.to_string()))
}

fn decode_installation(
    node_id: &str,
    trng_seed: &str,
    first_boot: &str,
    counter: u64,
) -> StoreResult<Installation> {
    Ok(Installation {
        node_id: decode(NODE_ID, node_id, NodeFingerprint::from_hex_str)?,
        trng_seed: decode(TRNG_SEED, trng_seed, TrngSeed::from_hex_str)?,
        first_boot: DateTime::parse_from_rfc3339(first_boot)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|source| StoreError::CorruptTimestamp {
                key: FIRST_BOOT.to_string(),
                value: first_boot.to_string(),
                source,
            })?,
        counter,
    })
}

fn decode<T>(key: &str, value: &str, parse: impl FnOnce(&str) -> IdResult<T>) -> StoreResult<T> {
    parse(value).map_err(|source| StoreError::CorruptParameter {
        key: key.to_string(),
        value: value.to_string(),
        source,
    })
}
