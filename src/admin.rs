// src/admin.rs
// Admin rule manager: bearer-authenticated mutation endpoints plus the
// label-event ingestion gate. Every mutation validates its payload first,
// writes the rule, and emits an audit record; nothing is partially applied.

use serde_json::json;
use spin_sdk::http::{Request, Response};

use crate::audit::{self, AuditRecord, AuditSink, KvAuditSink};
use crate::auth;
use crate::config::Config;
use crate::dispatch::HttpEnforcementTransport;
use crate::labels::{self, LabelEvent};
use crate::metrics::{self, MetricName};
use crate::rules::{EnforcementRule, RuleStatus};
use crate::store::{self, KeyValueStore};
use crate::validation::{
    self, BlockRequest, EnforcementTables, TakedownRequest, UnblockRequest, DEFAULT_TABLES,
};

#[derive(Debug, PartialEq)]
pub enum AdminError {
    Validation(Vec<String>),
    Store,
}

/// Routes one authenticated admin request. Callers have already matched
/// the `/admin/` prefix; anything but the four known actions is rejected.
pub async fn handle_admin<S: KeyValueStore>(
    req: &Request,
    store: Option<&S>,
    cfg: &Config,
) -> Response {
    if !auth::is_authorized_admin(req) {
        return Response::new(401, "Unauthorized: Invalid or missing API key");
    }
    let Some(store) = store else {
        return Response::new(500, "Key-value store error");
    };
    if let Err(msg) = validation::enforce_body_size(req.body()) {
        return Response::new(400, msg);
    }

    match req.path() {
        "/admin/block" => {
            let payload: BlockRequest = validation::parse_admin_body(req.body());
            let sink = KvAuditSink::new(store);
            match apply_block(store, &sink, &payload, &DEFAULT_TABLES, audit::now_ts()) {
                Ok((rule, entry)) => {
                    metrics::increment(store, MetricName::AdminMutationsTotal, Some("block"));
                    json_response(200, json!({ "ok": true, "rule": rule, "audit": entry }))
                }
                Err(err) => admin_error_response(err),
            }
        }
        "/admin/unblock" => {
            let payload: UnblockRequest = validation::parse_admin_body(req.body());
            let sink = KvAuditSink::new(store);
            match apply_unblock(store, &sink, &payload, audit::now_ts()) {
                Ok((removed, entry)) => {
                    metrics::increment(store, MetricName::AdminMutationsTotal, Some("unblock"));
                    json_response(200, json!({ "ok": true, "removed": removed, "audit": entry }))
                }
                Err(err) => admin_error_response(err),
            }
        }
        "/admin/takedown" => {
            let payload: TakedownRequest = validation::parse_admin_body(req.body());
            let sink = KvAuditSink::new(store);
            match apply_takedown(store, &sink, &payload, &DEFAULT_TABLES, audit::now_ts()) {
                Ok((rule, entry)) => {
                    metrics::increment(store, MetricName::AdminMutationsTotal, Some("takedown"));
                    json_response(200, json!({ "ok": true, "rule": rule, "audit": entry }))
                }
                Err(err) => admin_error_response(err),
            }
        }
        "/admin/label" => handle_label(req, store, cfg).await,
        _ => Response::new(400, "unknown action"),
    }
}

/// Validates and stores a region rule. Countries are uppercased on the
/// way in so evaluation never has to case-fold stored data.
pub fn apply_block<S: KeyValueStore, A: AuditSink>(
    store: &S,
    sink: &A,
    payload: &BlockRequest,
    tables: &EnforcementTables,
    now: u64,
) -> Result<(EnforcementRule, AuditRecord), AdminError> {
    let errors = validation::validate_block_request(payload, tables);
    if !errors.is_empty() {
        return Err(AdminError::Validation(errors));
    }

    let rule = EnforcementRule {
        id: payload.id.clone(),
        paths: payload.paths.clone(),
        status: RuleStatus::Region,
        countries_blocked: payload
            .countries
            .iter()
            .map(|c| c.to_uppercase())
            .collect(),
        reason: effective_reason(payload.reason.as_deref(), "legal"),
        created_at: now,
        exp: payload.ttl.filter(|ttl| *ttl > 0.0).map(|ttl| now + ttl as u64),
    };
    store::save_rule(store, &rule).map_err(|()| AdminError::Store)?;

    let entry = AuditRecord {
        action: "block",
        asset_id: rule.id.clone(),
        countries: Some(rule.countries_blocked.clone()),
        reason: Some(rule.reason.clone()),
        paths: None,
        timestamp: rule.created_at,
        expires: rule.exp,
        previous_rule: None,
    };
    sink.record(&entry);
    Ok((rule, entry))
}

/// Deletes any rule for the id, reporting whether one existed and
/// snapshotting it into the audit record.
pub fn apply_unblock<S: KeyValueStore, A: AuditSink>(
    store: &S,
    sink: &A,
    payload: &UnblockRequest,
    now: u64,
) -> Result<(bool, AuditRecord), AdminError> {
    let errors = validation::validate_unblock_request(payload);
    if !errors.is_empty() {
        return Err(AdminError::Validation(errors));
    }

    let existing = store::load_rule(store, &payload.id).map_err(|()| AdminError::Store)?;
    store::delete_rule(store, &payload.id).map_err(|()| AdminError::Store)?;

    let removed = existing.is_some();
    let entry = AuditRecord {
        action: "unblock",
        asset_id: payload.id.clone(),
        countries: None,
        reason: None,
        paths: None,
        timestamp: now,
        expires: None,
        previous_rule: existing,
    };
    sink.record(&entry);
    Ok((removed, entry))
}

/// Validates and stores a global-block rule.
pub fn apply_takedown<S: KeyValueStore, A: AuditSink>(
    store: &S,
    sink: &A,
    payload: &TakedownRequest,
    tables: &EnforcementTables,
    now: u64,
) -> Result<(EnforcementRule, AuditRecord), AdminError> {
    let errors = validation::validate_takedown_request(payload, tables);
    if !errors.is_empty() {
        return Err(AdminError::Validation(errors));
    }

    let rule = EnforcementRule {
        id: payload.id.clone(),
        paths: payload.paths.clone(),
        status: RuleStatus::GlobalBlock,
        countries_blocked: Vec::new(),
        reason: effective_reason(payload.reason.as_deref(), "removed"),
        created_at: now,
        exp: None,
    };
    store::save_rule(store, &rule).map_err(|()| AdminError::Store)?;

    let entry = AuditRecord {
        action: "takedown",
        asset_id: rule.id.clone(),
        countries: None,
        reason: Some(rule.reason.clone()),
        paths: Some(rule.paths.clone()),
        timestamp: rule.created_at,
        expires: None,
        previous_rule: None,
    };
    sink.record(&entry);
    Ok((rule, entry))
}

// Label ingestion: classify, resolve media references, dispatch callouts.
// Classification failure is a structured per-event error, not an HTTP
// failure, so batch submitters keep going.
async fn handle_label<S: KeyValueStore>(req: &Request, store: &S, cfg: &Config) -> Response {
    let event: LabelEvent = validation::parse_admin_body(req.body());
    metrics::increment(store, MetricName::LabelEventsTotal, None);

    let transport = HttpEnforcementTransport::new(&cfg.admin_base_url);
    match labels::run_label_pipeline(&event, &DEFAULT_TABLES, &cfg.media_host, &transport).await {
        Ok(outcome) => {
            for action in &outcome.actions {
                metrics::increment(store, MetricName::LabelActionsTotal, Some(action.kind.as_str()));
            }
            for result in &outcome.results {
                if !result.success {
                    metrics::increment(store, MetricName::DispatchFailuresTotal, None);
                }
            }
            json_response(
                200,
                json!({
                    "ok": true,
                    "actions": outcome.actions,
                    "assets": outcome.assets,
                    "results": outcome.results,
                }),
            )
        }
        Err(error) => {
            eprintln!("[label] classification failed: {}", error);
            json_response(200, json!({ "ok": false, "error": error }))
        }
    }
}

fn effective_reason(reason: Option<&str>, fallback: &str) -> String {
    match reason {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => fallback.to_string(),
    }
}

fn admin_error_response(err: AdminError) -> Response {
    match err {
        AdminError::Validation(errors) => {
            Response::new(400, format!("Validation errors: {}", errors.join("; ")))
        }
        AdminError::Store => Response::new(500, "Key-value store error"),
    }
}

fn json_response(status: u16, body: serde_json::Value) -> Response {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Cache-Control", "no-store")
        .body(serde_json::to_string(&body).unwrap())
        .build()
}
