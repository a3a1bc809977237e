// src/store.rs
// Rule persistence for the CDN Warden enforcement gate.
// One JSON rule per asset in the Spin key-value store, behind a seam that
// tests replace with an in-memory map.

use spin_sdk::key_value::Store;

use crate::rules::EnforcementRule;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ()>;
    fn set(&self, key: &str, value: &[u8]) -> Result<(), ()>;
    fn delete(&self, key: &str) -> Result<(), ()>;
}

impl KeyValueStore for Store {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ()> {
        Store::get(self, key).map_err(|_| ())
    }
    fn set(&self, key: &str, value: &[u8]) -> Result<(), ()> {
        Store::set(self, key, value).map_err(|_| ())
    }
    fn delete(&self, key: &str) -> Result<(), ()> {
        Store::delete(self, key).map_err(|_| ())
    }
}

const ASSET_KEY_PREFIX: &str = "asset:";

pub fn asset_key(id: &str) -> String {
    format!("{}{}", ASSET_KEY_PREFIX, id)
}

/// Loads the rule stored for an asset. A missing key and a value that no
/// longer parses as a rule both come back as `None`; unreadable values are
/// left in place rather than swept. `Err` means the store itself failed.
pub fn load_rule<S: KeyValueStore>(store: &S, id: &str) -> Result<Option<EnforcementRule>, ()> {
    match store.get(&asset_key(id))? {
        Some(raw) => match serde_json::from_slice::<EnforcementRule>(&raw) {
            Ok(rule) => Ok(Some(rule)),
            Err(e) => {
                eprintln!("[store] unreadable rule for {}: {}", id, e);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

pub fn save_rule<S: KeyValueStore>(store: &S, rule: &EnforcementRule) -> Result<(), ()> {
    let payload = serde_json::to_vec(rule).map_err(|_| ())?;
    store.set(&asset_key(&rule.id), &payload)
}

pub fn delete_rule<S: KeyValueStore>(store: &S, id: &str) -> Result<(), ()> {
    store.delete(&asset_key(id))
}
