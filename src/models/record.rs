//! Death record data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label used when a row carries no recency cell.
pub const DEFAULT_TIME_LABEL: &str = "Recently";

/// One death observed in the latest deaths table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeathRecord {
    /// Character name
    pub player: String,

    /// Character level at death (0 when the cell was not numeric)
    pub level: u32,

    /// Killer description, possibly empty
    pub killer: String,

    /// Free-text recency label from the table
    pub time: String,

    /// Capture instant in epoch milliseconds
    pub timestamp: i64,

    /// Composite key `player-level-killer-time`
    pub id: String,
}

impl DeathRecord {
    /// Build a record, deriving its `id` and stamping the capture instant.
    pub fn new(
        player: impl Into<String>,
        level: u32,
        killer: impl Into<String>,
        time: impl Into<String>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        let player = player.into();
        let killer = killer.into();
        let time = time.into();
        let id = record_id(&player, level, &killer, &time);

        Self {
            player,
            level,
            killer,
            time,
            timestamp: captured_at.timestamp_millis(),
            id,
        }
    }
}

/// Join the identifying fields with `-`.
///
/// Not unique: two deaths of the same character at the same level to the
/// same killer within the same label collide.
pub fn record_id(player: &str, level: u32, killer: &str, time: &str) -> String {
    format!("{player}-{level}-{killer}-{time}")
}
