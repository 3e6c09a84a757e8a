#![forbid(unsafe_code)]

use cl_core::model::Entry;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const ORDER_UPDATED: &str = "order-updated";

/// Transport shape of one entry. `id` stays the external mutation handle;
/// `next` is omitted from the wire when the entry is the tail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPayload {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl From<&Entry> for EntryPayload {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            next: entry.next.clone(),
        }
    }
}

/// Event envelope the transport fans out to subscribers after a mutation.
pub fn order_updated(entries: &[Entry]) -> serde_json::Value {
    serde_json::json!({
        "event": ORDER_UPDATED,
        "at": ts_ms_to_rfc3339(now_ms()),
        "entries": entries.iter().map(EntryPayload::from).collect::<Vec<_>>(),
    })
}

pub(crate) fn ts_ms_to_rfc3339(ts_ms: i64) -> String {
    let nanos = i128::from(ts_ms) * 1_000_000;
    match OffsetDateTime::from_unix_timestamp_nanos(nanos) {
        Ok(dt) => dt.format(&Rfc3339).unwrap_or_default(),
        Err(_) => String::new(),
    }
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
