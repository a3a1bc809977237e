// src/metrics.rs
// Prometheus-compatible counters backed by the key-value store, exported
// in text exposition format at /metrics.

use crate::store::KeyValueStore;
use spin_sdk::http::Response;

const METRICS_PREFIX: &str = "metrics:";

/// Counters we track.
#[derive(Debug, Clone, Copy)]
pub enum MetricName {
    RequestsTotal,
    MediaRequestsTotal,
    MediaBlockedTotal,
    AdminMutationsTotal,
    LabelEventsTotal,
    LabelActionsTotal,
    DispatchFailuresTotal,
}

impl MetricName {
    fn as_str(&self) -> &'static str {
        match self {
            MetricName::RequestsTotal => "requests_total",
            MetricName::MediaRequestsTotal => "media_requests_total",
            MetricName::MediaBlockedTotal => "media_blocked_total",
            MetricName::AdminMutationsTotal => "admin_mutations_total",
            MetricName::LabelEventsTotal => "label_events_total",
            MetricName::LabelActionsTotal => "label_actions_total",
            MetricName::DispatchFailuresTotal => "dispatch_failures_total",
        }
    }
}

/// Increment a counter metric, optionally with a label. The component is
/// instantiated per request, so increments go straight to KV rather than
/// through an in-process buffer; a lost write costs one count, not an
/// enforcement decision, so failures are logged and dropped.
pub fn increment<S: KeyValueStore>(store: &S, metric: MetricName, label: Option<&str>) {
    let key = match label {
        Some(l) => format!("{}{}:{}", METRICS_PREFIX, metric.as_str(), l),
        None => format!("{}{}", METRICS_PREFIX, metric.as_str()),
    };
    let next = get_counter(store, &key).saturating_add(1);
    if store.set(&key, next.to_string().as_bytes()).is_err() {
        eprintln!("[metrics] failed to write metric {} -> {}", key, next);
    }
}

/// Get current value of a counter.
fn get_counter<S: KeyValueStore>(store: &S, key: &str) -> u64 {
    store
        .get(key)
        .ok()
        .flatten()
        .and_then(|v| String::from_utf8(v).ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

/// Generate Prometheus-format metrics output.
pub fn render_metrics<S: KeyValueStore>(store: &S) -> String {
    let mut output = String::new();

    output.push_str("# CDN Warden Metrics\n");
    output.push_str("# TYPE warden_requests_total counter\n");
    let requests = get_counter(store, &format!("{}requests_total", METRICS_PREFIX));
    output.push_str(&format!("warden_requests_total {}\n", requests));

    output.push_str("\n# TYPE warden_media_requests_total counter\n");
    let media_requests = get_counter(store, &format!("{}media_requests_total", METRICS_PREFIX));
    output.push_str(&format!("warden_media_requests_total {}\n", media_requests));

    // Blocked media by status code
    output.push_str("\n# TYPE warden_media_blocked_total counter\n");
    output.push_str("# HELP warden_media_blocked_total Media requests answered with a block page, by status code\n");
    for code in &["451", "410"] {
        let key = format!("{}media_blocked_total:{}", METRICS_PREFIX, code);
        let count = get_counter(store, &key);
        output.push_str(&format!(
            "warden_media_blocked_total{{code=\"{}\"}} {}\n",
            code, count
        ));
    }

    // Admin mutations by action
    output.push_str("\n# TYPE warden_admin_mutations_total counter\n");
    output.push_str("# HELP warden_admin_mutations_total Successful admin mutations by action\n");
    for action in &["block", "unblock", "takedown"] {
        let key = format!("{}admin_mutations_total:{}", METRICS_PREFIX, action);
        let count = get_counter(store, &key);
        output.push_str(&format!(
            "warden_admin_mutations_total{{action=\"{}\"}} {}\n",
            action, count
        ));
    }

    output.push_str("\n# TYPE warden_label_events_total counter\n");
    let label_events = get_counter(store, &format!("{}label_events_total", METRICS_PREFIX));
    output.push_str(&format!("warden_label_events_total {}\n", label_events));

    // Classified label actions by type
    output.push_str("\n# TYPE warden_label_actions_total counter\n");
    for kind in &["takedown", "geoblock"] {
        let key = format!("{}label_actions_total:{}", METRICS_PREFIX, kind);
        let count = get_counter(store, &key);
        output.push_str(&format!(
            "warden_label_actions_total{{type=\"{}\"}} {}\n",
            kind, count
        ));
    }

    output.push_str("\n# TYPE warden_dispatch_failures_total counter\n");
    let dispatch_failures =
        get_counter(store, &format!("{}dispatch_failures_total", METRICS_PREFIX));
    output.push_str(&format!(
        "warden_dispatch_failures_total {}\n",
        dispatch_failures
    ));

    output
}

/// Handle the /metrics endpoint.
pub fn handle_metrics<S: KeyValueStore>(store: Option<&S>) -> Response {
    let Some(store) = store else {
        return Response::new(500, "Key-value store error");
    };
    let body = render_metrics(store);
    Response::builder()
        .status(200)
        .header("Content-Type", "text/plain; version=0.0.4; charset=utf-8")
        .body(body)
        .build()
}
