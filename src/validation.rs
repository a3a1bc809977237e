// src/validation.rs
// Typed admin payloads, the shared enforcement vocabulary tables, and the
// validators that gate every rule mutation. Validators return the full
// ordered list of violations, not just the first.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::labels::Severity;

/// Hard cap for admin request bodies, enforced before JSON parsing.
pub const MAX_ADMIN_JSON_BYTES: usize = 64 * 1024;

/// One year, the longest accepted rule TTL.
pub const MAX_RULE_TTL_SECS: f64 = 31_536_000.0;

/// Vocabulary the validators and the label classifier work against:
/// supported countries, supported rule reasons, and the category severity
/// map. Built once at startup; tests construct their own.
pub struct EnforcementTables {
    pub countries: Vec<&'static str>,
    pub reasons: Vec<&'static str>,
    pub severities: HashMap<&'static str, Severity>,
}

impl EnforcementTables {
    pub fn supports_country(&self, code: &str) -> bool {
        let cc = code.to_ascii_uppercase();
        self.countries.iter().any(|c| *c == cc)
    }

    pub fn supports_reason(&self, reason: &str) -> bool {
        self.reasons.iter().any(|r| *r == reason)
    }

    pub fn severity_for(&self, category: &str) -> Severity {
        self.severities
            .get(category)
            .copied()
            .unwrap_or(Severity::P3)
    }
}

pub static DEFAULT_TABLES: Lazy<EnforcementTables> = Lazy::new(|| EnforcementTables {
    countries: vec![
        "US", "CA", "MX", "BR", "AR", "GB", "FR", "DE", "IT", "ES", "NL", "BE", "CH", "AT",
        "SE", "NO", "DK", "FI", "PL", "RU", "UA", "JP", "CN", "KR", "IN", "AU", "NZ", "ZA",
        "EG", "IL",
    ],
    reasons: vec![
        "legal",
        "copyright",
        "trademark",
        "privacy",
        "defamation",
        "hate_speech",
        "violence",
        "sexual_content",
        "minor_safety",
        "terrorism",
        "self_harm",
        "misinformation",
        "spam",
        "malware",
    ],
    severities: default_category_severity(),
});

fn default_category_severity() -> HashMap<&'static str, Severity> {
    use Severity::{P0, P1, P2, P3};
    let entries = [
        ("sexual_minors", P0),
        ("nonconsensual_sexual_content", P0),
        ("credible_threats", P0),
        ("doxxing_pii", P0),
        ("terrorism_extremism", P0),
        ("malware_scam", P0),
        ("illegal_goods", P1),
        ("hate_harassment", P1),
        ("self_harm_suicide", P1),
        ("graphic_violence_gore", P1),
        ("bullying_abuse", P2),
        ("adult_nudity", P2),
        ("explicit_sex", P2),
        ("pornography", P2),
        ("fetish", P2),
        ("sexual_wellness", P2),
        ("spam", P3),
        ("platform_abuse", P3),
        ("impersonation", P3),
        ("copyright", P3),
        ("trademark", P3),
        ("medical_misinformation", P3),
        ("election_political_misinfo", P3),
    ];
    entries.into_iter().collect()
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct BlockRequest {
    pub id: String,
    pub paths: Vec<String>,
    pub countries: Vec<String>,
    pub reason: Option<String>,
    pub ttl: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct UnblockRequest {
    pub id: String,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct TakedownRequest {
    pub id: String,
    pub paths: Vec<String>,
    pub reason: Option<String>,
}

/// Admin bodies that fail typed deserialization behave as an empty
/// payload; the validator then reports every violated constraint.
pub fn parse_admin_body<T: Default + DeserializeOwned>(body: &[u8]) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

pub fn enforce_body_size(body: &[u8]) -> Result<(), &'static str> {
    if body.len() > MAX_ADMIN_JSON_BYTES {
        return Err("Payload too large");
    }
    Ok(())
}

pub fn validate_block_request(req: &BlockRequest, tables: &EnforcementTables) -> Vec<String> {
    let mut errors = Vec::new();
    push_id_error(&req.id, &mut errors);
    push_path_errors(&req.paths, &mut errors);

    if req.countries.is_empty() {
        errors.push("countries must be a non-empty array".to_string());
    } else {
        let invalid: Vec<&str> = req
            .countries
            .iter()
            .filter(|c| !tables.supports_country(c))
            .map(String::as_str)
            .collect();
        if !invalid.is_empty() {
            errors.push(format!("invalid countries: {}", invalid.join(", ")));
        }
    }

    push_reason_error(req.reason.as_deref(), tables, &mut errors);

    if let Some(ttl) = req.ttl {
        if !ttl.is_finite() || ttl <= 0.0 || ttl > MAX_RULE_TTL_SECS {
            errors.push("ttl must be a positive number (seconds, max 1 year)".to_string());
        }
    }

    errors
}

pub fn validate_unblock_request(req: &UnblockRequest) -> Vec<String> {
    let mut errors = Vec::new();
    push_id_error(&req.id, &mut errors);
    errors
}

pub fn validate_takedown_request(req: &TakedownRequest, tables: &EnforcementTables) -> Vec<String> {
    let mut errors = Vec::new();
    push_id_error(&req.id, &mut errors);
    push_path_errors(&req.paths, &mut errors);
    push_reason_error(req.reason.as_deref(), tables, &mut errors);
    errors
}

fn push_id_error(id: &str, errors: &mut Vec<String>) {
    if id.is_empty() {
        errors.push("id must be a non-empty string".to_string());
    }
}

fn push_path_errors(paths: &[String], errors: &mut Vec<String>) {
    if paths.is_empty() {
        errors.push("paths must be a non-empty array".to_string());
    } else if !paths.iter().all(|p| p.starts_with('/')) {
        errors.push("all paths must be strings starting with /".to_string());
    }
}

fn push_reason_error(reason: Option<&str>, tables: &EnforcementTables, errors: &mut Vec<String>) {
    if let Some(reason) = reason {
        if !reason.is_empty() && !tables.supports_reason(reason) {
            errors.push(format!("reason must be one of: {}", tables.reasons.join(", ")));
        }
    }
}
