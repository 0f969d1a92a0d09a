//! Persistent state lives in one flat key-value namespace:
//!  - `isProductive`/`inactiveTime` let the coordinator pick up where a
//!    previous session left off.
//!  - `productiveSites`/`unproductiveSites` are the user-editable lists.
//!  - `siteDurations` maps a domain to accumulated seconds.
//!  - `aiSummary` holds the last generated summary text.
//!
//! The coordinator never treats its own copies of the lists or the ledger as
//! authoritative, it reads them back through [kv::KeyValueStore] every time.

pub mod kv;

use serde_json::{Map, Value};

use crate::daemon::coordinator::classify::SiteList;

pub const KEY_IS_PRODUCTIVE: &str = "isProductive";
pub const KEY_INACTIVE_TIME: &str = "inactiveTime";
pub const KEY_PRODUCTIVE_SITES: &str = "productiveSites";
pub const KEY_UNPRODUCTIVE_SITES: &str = "unproductiveSites";
pub const KEY_SITE_DURATIONS: &str = "siteDurations";
pub const KEY_AI_SUMMARY: &str = "aiSummary";

pub fn read_bool(values: &Map<String, Value>, key: &str) -> Option<bool> {
    values.get(key).and_then(Value::as_bool)
}

pub fn read_u32(values: &Map<String, Value>, key: &str) -> Option<u32> {
    values.get(key).and_then(Value::as_u64).map(|v| v as u32)
}

pub fn read_site_list(values: &Map<String, Value>, key: &str) -> Option<SiteList> {
    let entries = values
        .get(key)?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str().map(str::to_owned))
        .collect::<Vec<_>>();
    Some(SiteList::from_entries(entries))
}

/// Extracts the duration ledger. Non-numeric values are skipped the same way
/// corrupted record lines are skipped by the file store.
pub fn read_durations(values: &Map<String, Value>, key: &str) -> Vec<(String, f64)> {
    values
        .get(key)
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(domain, seconds)| seconds.as_f64().map(|s| (domain.clone(), s)))
                .collect()
        })
        .unwrap_or_default()
}
