//! Serde helper: durations written as integer milliseconds.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Deserializes a `u64` millisecond count into a [`Duration`].
pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
