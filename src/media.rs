// src/media.rs
// Media gate for /v/ and /t/ paths: looks up the enforcement rule for
// the addressed asset and either serves a block page or forwards the
// request to the configured origin.

use spin_sdk::http::{Request, Response};

use crate::audit;
use crate::config::Config;
use crate::error_pages;
use crate::metrics::{self, MetricName};
use crate::rules;
use crate::store::{self, KeyValueStore};

/// Serves one media request. `store` is `None` when the key-value store
/// could not be opened; rule lookups are impossible then, so the request
/// fails rather than silently passing blocked content through.
pub async fn handle_media<S: KeyValueStore>(
    req: &Request,
    store: Option<&S>,
    cfg: &Config,
) -> Response {
    let path = req.path();
    let Some(asset_id) = rules::asset_id_from_path(path) else {
        return Response::new(404, "not found");
    };
    let Some(store) = store else {
        return Response::new(500, "Key-value store error");
    };
    metrics::increment(store, MetricName::MediaRequestsTotal, None);

    let rule = match store::load_rule(store, &asset_id) {
        Ok(rule) => rule,
        Err(()) => return Response::new(500, "Key-value store error"),
    };
    let country = crate::client_country(req);
    let verdict = rules::evaluate(rule.as_ref(), &country, audit::now_ts());

    if let Some(code) = verdict.code {
        let reason = verdict.reason.unwrap_or_default();
        let body = match code {
            451 => error_pages::render_legal_block_page(&reason, &country),
            410 => error_pages::render_removed_page(&reason),
            other => error_pages::render_fallback_page(other, &reason),
        };
        metrics::increment(store, MetricName::MediaBlockedTotal, Some(&code.to_string()));
        let mut builder = Response::builder();
        builder
            .status(code)
            .header("Content-Type", "text/html; charset=utf-8")
            .header("Cache-Control", "no-store");
        if verdict.vary_by_country {
            builder.header("Vary", "x-geo-country");
        }
        return builder.body(body).build();
    }

    forward_to_origin(req, cfg, &country, verdict.vary_by_country).await
}

// Proxies the request to origin. `country_variant` is true when a region
// rule exists for the asset, in which case caches must partition by
// country even though this particular country passed.
async fn forward_to_origin(
    req: &Request,
    cfg: &Config,
    country: &str,
    country_variant: bool,
) -> Response {
    if cfg.origin_url.is_empty() {
        return Response::builder()
            .status(503)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(format!("Media passthrough not configured for {}", req.path()))
            .build();
    }

    let mut uri = format!("{}{}", cfg.origin_url.trim_end_matches('/'), req.path());
    if !req.query().is_empty() {
        uri.push('?');
        uri.push_str(req.query());
    }

    let mut builder = Request::builder();
    builder.method(req.method().clone()).uri(uri);
    for (name, value) in req.headers() {
        if name.eq_ignore_ascii_case("host") {
            continue;
        }
        if let Some(value) = value.as_str() {
            builder.header(name, value);
        }
    }
    if country_variant && !country.is_empty() {
        builder.header("x-cache-country", country);
    }
    builder.body(req.body().to_vec());

    let upstream: Response = match spin_sdk::http::send(builder.build()).await {
        Ok(resp) => resp,
        Err(e) => {
            eprintln!("[media] origin fetch failed for {}: {:?}", req.path(), e);
            return Response::new(502, "Bad gateway");
        }
    };

    let mut out = Response::builder();
    out.status(*upstream.status());
    for (name, value) in upstream.headers() {
        if country_variant && name.eq_ignore_ascii_case("vary") {
            continue;
        }
        if let Some(value) = value.as_str() {
            out.header(name, value);
        }
    }
    if country_variant {
        out.header("Vary", "x-geo-country");
    }
    out.body(upstream.body().to_vec()).build()
}
