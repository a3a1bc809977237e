// src/audit.rs
// Append-only audit trail for admin mutations. Records go through a sink
// trait so deployments can redirect them; the default sink persists each
// record under a distinct immutable KV key and echoes it to stdout.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::rules::EnforcementRule;
use crate::store::KeyValueStore;

const AUDIT_KEY_PREFIX: &str = "audit";

/// One admin mutation as recorded. Optional fields are serialized only
/// for the action that produces them.
#[derive(Serialize, Debug, Clone)]
pub struct AuditRecord {
    pub action: &'static str,
    pub asset_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<String>>,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_rule: Option<EnforcementRule>,
}

/// Where mutation records go. Called synchronously once per applied
/// mutation; implementations must not fail the mutation itself.
pub trait AuditSink {
    fn record(&self, entry: &AuditRecord);
}

/// Default sink: one immutable key per record to avoid read-modify-write
/// races between concurrent mutations, plus an `AUDIT` line on stdout.
pub struct KvAuditSink<'a, S: KeyValueStore> {
    store: &'a S,
}

impl<'a, S: KeyValueStore> KvAuditSink<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
}

impl<S: KeyValueStore> AuditSink for KvAuditSink<'_, S> {
    fn record(&self, entry: &AuditRecord) {
        let json = match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("[audit] serialization error, dropping record: {}", e);
                return;
            }
        };
        println!("AUDIT {}", json);
        let key = make_audit_key(entry.timestamp);
        if self.store.set(&key, json.as_bytes()).is_err() {
            eprintln!("[audit] KV error writing {}", key);
        }
    }
}

fn make_audit_key(ts: u64) -> String {
    let hour = ts / 3600;
    format!(
        "{}:{}:{}-{:016x}",
        AUDIT_KEY_PREFIX,
        hour,
        ts,
        rand::random::<u64>()
    )
}

pub(crate) fn now_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
