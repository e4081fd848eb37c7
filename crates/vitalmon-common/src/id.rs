//! Snowflake ids for readings, alerts, delivery records and outgoing
//! Message-IDs.
//!
//! Each server instance must be started with its own `(machine_id,
//! node_id)` pair, otherwise two instances sharing one database can mint
//! the same alert id.

use snowflake::SnowflakeIdBucket;
use std::sync::{Mutex, MutexGuard};

/// Exclusive upper bound for both halves of an instance identity.
pub const MAX_INSTANCE_PART: i32 = 32;

static ID_GENERATOR: Mutex<Option<SnowflakeIdBucket>> = Mutex::new(None);

#[derive(Debug, thiserror::Error)]
#[error("{part} must be in 0..{MAX_INSTANCE_PART}, got {value}")]
pub struct InstanceIdError {
    pub part: &'static str,
    pub value: i32,
}

fn check_part(part: &'static str, value: i32) -> Result<i32, InstanceIdError> {
    if (0..MAX_INSTANCE_PART).contains(&value) {
        Ok(value)
    } else {
        Err(InstanceIdError { part, value })
    }
}

fn generator() -> MutexGuard<'static, Option<SnowflakeIdBucket>> {
    ID_GENERATOR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sets the instance identity used for every id minted afterwards.
pub fn init(machine_id: i32, node_id: i32) -> Result<(), InstanceIdError> {
    let machine_id = check_part("machine_id", machine_id)?;
    let node_id = check_part("node_id", node_id)?;
    *generator() = Some(SnowflakeIdBucket::new(machine_id, node_id));
    Ok(())
}

/// Returns a new id rendered as a decimal string. Before [`init`] the
/// generator runs as instance `(1, 1)`.
pub fn next_id() -> String {
    let mut gen = generator();
    let bucket = gen.get_or_insert_with(|| SnowflakeIdBucket::new(1, 1));
    bucket.get_id().to_string()
}

/// A fresh RFC 5322 Message-ID, e.g. `<7193...@clinic.example>`.
pub fn message_id(domain: &str) -> String {
    format!("<{}@{domain}>", next_id())
}
