// src/lib.rs
// Entry point for the CDN Warden enforcement Spin app

use spin_sdk::http::{Method, Request, Response};
#[cfg(target_arch = "wasm32")]
use spin_sdk::http_component;
use spin_sdk::key_value::Store;

pub mod admin;       // Admin rule mutations and label ingestion
pub mod audit;       // Audit records for every mutation
pub mod auth;        // Bearer credential check for the admin surface
pub mod config;      // WARDEN_* environment configuration
pub mod dispatch;    // Enforcement callouts toward the admin surface
pub mod error_pages; // HTML bodies for block responses
pub mod labels;      // Label-event classification pipeline
pub mod media;       // Media gate and origin passthrough
pub mod media_refs;  // Media URL extraction and asset-id resolution
pub mod metrics;     // Prometheus metrics
pub mod rules;       // Enforcement rules and evaluation
pub mod store;       // Key-value seam and rule persistence
pub mod validation;  // Admin payload validation and lookup tables
#[cfg(test)]
mod test_support;

use config::Config;
use store::KeyValueStore;

/// Requester country for rule evaluation. The platform sets
/// `x-geo-country` at the edge; the `x-test-country` fallback lets
/// non-production callers exercise region rules directly.
pub(crate) fn client_country(req: &Request) -> String {
    for name in ["x-geo-country", "x-test-country"] {
        if let Some(h) = req.header(name) {
            let val = h.as_str().unwrap_or("").trim();
            if !val.is_empty() {
                return val.to_string();
            }
        }
    }
    String::new()
}

/// Full router, testable as a plain Rust function with any store.
/// Anything that is not an admin mutation, a media path, or the metrics
/// endpoint answers a bare 200 so health checks stay cheap.
pub async fn route_request<S: KeyValueStore>(
    req: &Request,
    store: Option<&S>,
    cfg: &Config,
) -> Response {
    if let Some(store) = store {
        metrics::increment(store, metrics::MetricName::RequestsTotal, None);
    }

    let path = req.path();
    if *req.method() == Method::Post && path.starts_with("/admin/") {
        return admin::handle_admin(req, store, cfg).await;
    }
    if *req.method() == Method::Get && (path.starts_with("/v/") || path.starts_with("/t/")) {
        return media::handle_media(req, store, cfg).await;
    }
    if path == "/metrics" {
        return metrics::handle_metrics(store);
    }
    Response::new(200, "ok")
}

/// Entry-point logic: open the default store, load config, route. A store
/// that fails to open is passed down as `None`; the handlers that need it
/// fail closed rather than serving blocked content.
pub async fn handle_enforcement_impl(req: &Request) -> Response {
    let store = Store::open_default().ok();
    route_request(req, store.as_ref(), &Config::from_env()).await
}

#[cfg(target_arch = "wasm32")]
#[http_component]
pub async fn spin_entrypoint(req: Request) -> Response {
    handle_enforcement_impl(&req).await
}
