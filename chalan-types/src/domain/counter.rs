//! Named sequence counter record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, monotonically non-decreasing integer counter.
///
/// Counters are owned exclusively by the storage adapter's atomic
/// increment primitive; no other component writes to them. A counter
/// is created lazily at 0 on first use, so the first value handed out
/// for a scope is 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    /// The scope this counter serializes (e.g. org + period).
    pub scope_key: String,
    /// Last sequence value handed out.
    pub sequence: i64,
    /// When the counter was last incremented.
    pub updated_at: DateTime<Utc>,
}
