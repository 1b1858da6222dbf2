use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Dollars};

/// Number of completed transfers kept for display.
pub const HISTORY_LIMIT: usize = 10;

/// A completed transfer, with the account names as they were at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Always positive
    pub amount: Dollars,
    pub source_id: String,
    pub target_id: String,
    pub source_name: String,
    pub target_name: String,
}

impl TransferRecord {
    pub fn new(
        source: AccountId,
        target: AccountId,
        amount: Dollars,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: recorded_at.timestamp_millis(),
            amount,
            source_id: source.to_string(),
            target_id: target.to_string(),
            source_name: source.to_string(),
            target_name: target.to_string(),
        }
    }

    pub fn with_names(mut self, source_name: impl Into<String>, target_name: impl Into<String>) -> Self {
        self.source_name = source_name.into();
        self.target_name = target_name.into();
        self
    }

    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Most-recent-first log of completed transfers, bounded at [`HISTORY_LIMIT`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    records: VecDeque<TransferRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from records already ordered newest first; extras are dropped.
    pub fn from_records(records: impl IntoIterator<Item = TransferRecord>) -> Self {
        Self {
            records: records.into_iter().take(HISTORY_LIMIT).collect(),
        }
    }

    pub fn push(&mut self, record: TransferRecord) {
        self.records.push_front(record);
        self.records.truncate(HISTORY_LIMIT);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn latest(&self) -> Option<&TransferRecord> {
        self.records.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransferRecord> {
        self.records.iter()
    }
}
