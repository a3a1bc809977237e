use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use spin_sdk::http::{Method, Request, Response};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::dispatch::EnforcementTransport;

#[derive(Default)]
pub(crate) struct InMemoryStore {
    map: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    pub(crate) fn keys(&self) -> Vec<String> {
        let map = self
            .map
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl crate::store::KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ()> {
        let map = self
            .map
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), ()> {
        let mut map = self
            .map
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), ()> {
        let mut map = self
            .map
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.remove(key);
        Ok(())
    }
}

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub(crate) fn lock_env() -> MutexGuard<'static, ()> {
    ENV_MUTEX
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn request_with_headers(path: &str, headers: &[(&str, &str)]) -> Request {
    request_with_body(Method::Get, path, headers, &[])
}

pub(crate) fn request_with_body(
    method: Method,
    path: &str,
    headers: &[(&str, &str)],
    body: &[u8],
) -> Request {
    let mut builder = Request::builder();
    builder.method(method).uri(path).body(body.to_vec());
    for (key, value) in headers {
        builder.header(*key, *value);
    }
    builder.build()
}

pub(crate) fn has_header(resp: &Response, name: &str, expected: &str) -> bool {
    resp.headers()
        .any(|(key, value)| key.eq_ignore_ascii_case(name) && value.as_str() == Some(expected))
}

// Transport double for the dispatcher: records every callout and fails
// exactly the asset ids it was told to fail.
#[derive(Default)]
pub(crate) struct MockTransport {
    calls: Mutex<Vec<(String, Value)>>,
    fail_ids: Vec<String>,
}

impl MockTransport {
    pub(crate) fn failing_for(ids: &[&str]) -> Self {
        MockTransport {
            calls: Mutex::new(Vec::new()),
            fail_ids: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, Value)> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait(?Send)]
impl EnforcementTransport for MockTransport {
    async fn submit(&self, path: &str, body: Value) -> Result<Value, String> {
        let id = body["id"].as_str().unwrap_or("").to_string();
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((path.to_string(), body));
        if self.fail_ids.contains(&id) {
            Err("HTTP 400".to_string())
        } else {
            Ok(json!({ "ok": true }))
        }
    }
}
