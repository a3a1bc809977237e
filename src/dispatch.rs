// src/dispatch.rs
// Turns a classified enforcement action plus resolved asset ids into
// admin-surface callouts, applied per asset with bounded concurrency.
// One asset's failure never aborts the rest.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Serialize;
use serde_json::{json, Value};
use spin_sdk::http::{Method, Request, Response};

use crate::labels::{ActionKind, EnforcementAction};
use crate::validation::EnforcementTables;

const MAX_CONCURRENT_CALLOUTS: usize = 4;

/// Seam to the admin surface. Production sends HTTP; tests record.
/// `?Send` because Spin's outbound futures are single-threaded.
#[async_trait(?Send)]
pub trait EnforcementTransport {
    /// Submits one admin mutation. `Ok` carries the parsed response body.
    async fn submit(&self, path: &str, body: Value) -> Result<Value, String>;
}

/// Outbound HTTP transport against the configured admin base URL, using
/// the same bearer secret the admin surface expects.
pub struct HttpEnforcementTransport {
    base_url: String,
}

impl HttpEnforcementTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait(?Send)]
impl EnforcementTransport for HttpEnforcementTransport {
    async fn submit(&self, path: &str, body: Value) -> Result<Value, String> {
        if self.base_url.is_empty() {
            return Err("admin base url not configured".to_string());
        }
        let Some(token) = crate::auth::admin_api_key() else {
            return Err("admin credential not configured".to_string());
        };
        let payload = serde_json::to_vec(&body).map_err(|e| e.to_string())?;
        let mut builder = Request::builder();
        builder
            .method(Method::Post)
            .uri(format!("{}{}", self.base_url, path))
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(payload);
        let response: Response = spin_sdk::http::send(builder.build())
            .await
            .map_err(|e| format!("{:?}", e))?;
        let status = *response.status();
        if !(200..300).contains(&status) {
            return Err(format!("HTTP {}", status));
        }
        Ok(serde_json::from_slice(response.body()).unwrap_or_else(|_| json!({})))
    }
}

/// Per-asset result of applying one action.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub action: ActionKind,
    pub asset_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Applies one action to every resolved asset. Callouts run concurrently
/// up to the fan-out limit; every asset gets its own outcome so callers
/// can retry just the failed subset.
pub async fn apply<T: EnforcementTransport>(
    action: &EnforcementAction,
    asset_ids: &[String],
    tables: &EnforcementTables,
    transport: &T,
) -> Vec<DispatchOutcome> {
    futures::stream::iter(asset_ids)
        .map(|asset_id| async move {
            let result = transport
                .submit(endpoint(action), callout_body(action, asset_id, tables))
                .await;
            match result {
                Ok(detail) => DispatchOutcome {
                    action: action.kind,
                    asset_id: asset_id.clone(),
                    success: true,
                    detail: Some(detail),
                    error: None,
                },
                Err(error) => {
                    eprintln!(
                        "[dispatch] {} failed for {}: {}",
                        endpoint(action),
                        asset_id,
                        error
                    );
                    DispatchOutcome {
                        action: action.kind,
                        asset_id: asset_id.clone(),
                        success: false,
                        detail: None,
                        error: Some(error),
                    }
                }
            }
        })
        .buffer_unordered(MAX_CONCURRENT_CALLOUTS)
        .collect()
        .await
}

fn endpoint(action: &EnforcementAction) -> &'static str {
    match action.kind {
        ActionKind::Takedown => "/admin/takedown",
        ActionKind::Geoblock => "/admin/block",
    }
}

/// Callout body for one asset: the id, both path buckets, countries for
/// geoblocks, and a reason only when the admin validator will accept one.
fn callout_body(action: &EnforcementAction, asset_id: &str, tables: &EnforcementTables) -> Value {
    let mut body = json!({
        "id": asset_id,
        "paths": [format!("/v/{}", asset_id), format!("/t/{}", asset_id)],
    });
    if let Some(reason) = callout_reason(action, tables) {
        body["reason"] = json!(reason);
    }
    if let Some(countries) = &action.countries {
        body["countries"] = json!(countries);
    }
    body
}

/// The classifier's display reasons ("copyright restriction") are not in
/// the admin vocabulary; fall back to the bare category when that is, and
/// otherwise omit the field so the admin-side default applies.
fn callout_reason<'a>(action: &'a EnforcementAction, tables: &EnforcementTables) -> Option<&'a str> {
    if tables.supports_reason(&action.reason) {
        return Some(&action.reason);
    }
    if tables.supports_reason(&action.category) {
        return Some(&action.category);
    }
    None
}
