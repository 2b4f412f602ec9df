pub mod dynamo_store;
pub mod memory_store;
pub mod secrets;
pub mod sqlite_store;

use chrono::{DateTime, Utc};

use crate::domain::repository::{StoreError, StoreResult};

pub(crate) fn parse_timestamp(s: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Malformed(format!("bad timestamp {s:?}: {e}")))
}
