//! Snowflake <-> timestamp conversion

use chrono::{DateTime, TimeZone, Utc};

/// First millisecond of 2015, the origin of Discord snowflakes
pub const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

/// Smallest snowflake minted at `at`, suitable as an exclusive `after` bound.
pub fn from_timestamp(at: DateTime<Utc>) -> u64 {
    let millis = (at.timestamp_millis() - DISCORD_EPOCH_MS).max(0) as u64;
    millis << 22
}

/// Creation instant encoded in a snowflake id, `None` if the id isn't numeric.
pub fn timestamp_of(id: &str) -> Option<DateTime<Utc>> {
    let raw = id.parse::<u64>().ok()?;
    let millis = (raw >> 22) as i64 + DISCORD_EPOCH_MS;
    Utc.timestamp_millis_opt(millis).single()
}
