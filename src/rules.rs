// src/rules.rs
// Enforcement rule model and point-in-time evaluation.
// One rule per asset; region rules restrict by requester country, global
// blocks deny everywhere. Expiry is lazy: expired rules stay stored but
// evaluate as absent.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Region,
    GlobalBlock,
}

/// Moderation decision stored per asset, JSON under `asset:<id>`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnforcementRule {
    pub id: String,
    #[serde(default)]
    pub paths: Vec<String>,
    pub status: RuleStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub countries_blocked: Vec<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// Outcome of evaluating one asset's rule against a requester country.
/// `vary_by_country` marks the response as cache-variant even when the
/// requester is not blocked, so edge caches never reuse a pass across
/// borders.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub code: Option<u16>,
    pub reason: Option<String>,
    pub vary_by_country: bool,
}

impl Verdict {
    fn pass(vary_by_country: bool) -> Self {
        Verdict {
            code: None,
            reason: None,
            vary_by_country,
        }
    }
}

pub fn is_expired(rule: &EnforcementRule, now: u64) -> bool {
    match rule.exp {
        Some(exp) if exp > 0 => exp <= now,
        _ => false,
    }
}

pub fn evaluate(rule: Option<&EnforcementRule>, country: &str, now: u64) -> Verdict {
    let rule = match rule {
        Some(r) if !is_expired(r, now) => r,
        _ => return Verdict::pass(false),
    };
    match rule.status {
        RuleStatus::GlobalBlock => Verdict {
            code: Some(410),
            reason: Some(reason_or(&rule.reason, "removed")),
            vary_by_country: false,
        },
        RuleStatus::Region => {
            let cc = country.to_ascii_uppercase();
            if !cc.is_empty() && rule.countries_blocked.iter().any(|c| *c == cc) {
                Verdict {
                    code: Some(451),
                    reason: Some(reason_or(&rule.reason, "unavailable_for_legal_reasons")),
                    vary_by_country: true,
                }
            } else {
                Verdict::pass(true)
            }
        }
    }
}

fn reason_or(reason: &str, fallback: &str) -> String {
    if reason.is_empty() {
        fallback.to_string()
    } else {
        reason.to_string()
    }
}

/// Maps a media path to the canonical asset id. Supported shapes are
/// `/v/<id>` and `/t/<id>[.ext]`; segments after the bucket are kept as
/// part of the id, a single trailing extension is stripped.
pub fn asset_id_from_path(path: &str) -> Option<String> {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    if parts.len() < 2 {
        return None;
    }
    if parts[0] != "v" && parts[0] != "t" {
        return None;
    }
    let id = strip_extension(&parts[1..].join("/"));
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Removes one trailing `.<alphanumeric>` extension, if present.
pub(crate) fn strip_extension(id: &str) -> String {
    if let Some(dot) = id.rfind('.') {
        let ext = &id[dot + 1..];
        if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return id[..dot].to_string();
        }
    }
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn region_rule(countries: &[&str]) -> EnforcementRule {
        EnforcementRule {
            id: "a1".to_string(),
            paths: vec!["/v/a1".to_string()],
            status: RuleStatus::Region,
            countries_blocked: countries.iter().map(|c| c.to_string()).collect(),
            reason: "copyright".to_string(),
            created_at: NOW,
            exp: None,
        }
    }

    fn takedown_rule() -> EnforcementRule {
        EnforcementRule {
            id: "a2".to_string(),
            paths: vec!["/v/a2".to_string()],
            status: RuleStatus::GlobalBlock,
            countries_blocked: Vec::new(),
            reason: "hate_speech".to_string(),
            created_at: NOW,
            exp: None,
        }
    }

    #[test]
    fn absent_rule_passes_without_variance() {
        let verdict = evaluate(None, "US", NOW);
        assert_eq!(verdict, Verdict::pass(false));
    }

    #[test]
    fn global_block_applies_to_every_country() {
        let rule = takedown_rule();
        for country in ["US", "GB", "jp", ""] {
            let verdict = evaluate(Some(&rule), country, NOW);
            assert_eq!(verdict.code, Some(410));
            assert_eq!(verdict.reason.as_deref(), Some("hate_speech"));
            assert!(!verdict.vary_by_country);
        }
    }

    #[test]
    fn global_block_ignores_country_list() {
        let mut rule = takedown_rule();
        rule.countries_blocked = vec!["US".to_string()];
        let verdict = evaluate(Some(&rule), "GB", NOW);
        assert_eq!(verdict.code, Some(410));
    }

    #[test]
    fn region_rule_blocks_listed_countries_case_insensitively() {
        let rule = region_rule(&["US", "CA"]);
        assert_eq!(evaluate(Some(&rule), "US", NOW).code, Some(451));
        assert_eq!(evaluate(Some(&rule), "us", NOW).code, Some(451));
        assert_eq!(evaluate(Some(&rule), "ca", NOW).code, Some(451));
    }

    #[test]
    fn region_rule_passes_unlisted_country_but_stays_variant() {
        let rule = region_rule(&["US", "CA"]);
        let verdict = evaluate(Some(&rule), "GB", NOW);
        assert_eq!(verdict.code, None);
        assert!(verdict.vary_by_country);
    }

    #[test]
    fn region_rule_with_unknown_country_passes_but_stays_variant() {
        let rule = region_rule(&["US"]);
        let verdict = evaluate(Some(&rule), "", NOW);
        assert_eq!(verdict.code, None);
        assert!(verdict.vary_by_country);
    }

    #[test]
    fn degenerate_region_rule_blocks_nowhere_but_stays_variant() {
        let rule = region_rule(&[]);
        let verdict = evaluate(Some(&rule), "US", NOW);
        assert_eq!(verdict.code, None);
        assert!(verdict.vary_by_country);
    }

    #[test]
    fn expired_rule_evaluates_as_absent() {
        let mut rule = region_rule(&["US"]);
        rule.exp = Some(NOW - 1);
        assert_eq!(evaluate(Some(&rule), "US", NOW), Verdict::pass(false));
        rule.exp = Some(NOW);
        assert_eq!(evaluate(Some(&rule), "US", NOW), Verdict::pass(false));
    }

    #[test]
    fn future_expiry_still_blocks() {
        let mut rule = region_rule(&["US"]);
        rule.exp = Some(NOW + 60);
        assert_eq!(evaluate(Some(&rule), "US", NOW).code, Some(451));
    }

    #[test]
    fn zero_expiry_means_no_expiry() {
        let mut rule = takedown_rule();
        rule.exp = Some(0);
        assert!(!is_expired(&rule, NOW));
        assert_eq!(evaluate(Some(&rule), "US", NOW).code, Some(410));
    }

    #[test]
    fn empty_reason_falls_back_per_status() {
        let mut region = region_rule(&["US"]);
        region.reason = String::new();
        assert_eq!(
            evaluate(Some(&region), "US", NOW).reason.as_deref(),
            Some("unavailable_for_legal_reasons")
        );
        let mut global = takedown_rule();
        global.reason = String::new();
        assert_eq!(
            evaluate(Some(&global), "US", NOW).reason.as_deref(),
            Some("removed")
        );
    }

    #[test]
    fn resolves_video_and_thumbnail_paths() {
        assert_eq!(asset_id_from_path("/v/abc123").as_deref(), Some("abc123"));
        assert_eq!(asset_id_from_path("/t/xyz789.jpg").as_deref(), Some("xyz789"));
        assert_eq!(asset_id_from_path("/t/clip.webp").as_deref(), Some("clip"));
    }

    #[test]
    fn keeps_nested_segments_in_the_id() {
        assert_eq!(
            asset_id_from_path("/v/folder/file").as_deref(),
            Some("folder/file")
        );
        assert_eq!(
            asset_id_from_path("/t/dir/xyz.png").as_deref(),
            Some("dir/xyz")
        );
    }

    #[test]
    fn rejects_unknown_buckets_and_short_paths() {
        assert_eq!(asset_id_from_path("/other/path"), None);
        assert_eq!(asset_id_from_path("/"), None);
        assert_eq!(asset_id_from_path("/v"), None);
        assert_eq!(asset_id_from_path("/V/abc"), None);
    }

    #[test]
    fn extension_free_id_must_remain_non_empty() {
        assert_eq!(asset_id_from_path("/t/.jpg"), None);
    }

    #[test]
    fn strips_only_one_alphanumeric_extension() {
        assert_eq!(strip_extension("file.tar.gz"), "file.tar");
        assert_eq!(strip_extension("file.b-c"), "file.b-c");
        assert_eq!(strip_extension("file."), "file.");
        assert_eq!(strip_extension("file"), "file");
    }

    #[test]
    fn stored_shape_omits_empty_optionals() {
        let rule = takedown_rule();
        let json = serde_json::to_value(&rule).unwrap();
        assert!(json.get("countries_blocked").is_none());
        assert!(json.get("exp").is_none());
        assert_eq!(json["status"], "global_block");
    }

    #[test]
    fn stored_shape_round_trips_region_rules() {
        let mut rule = region_rule(&["US", "CA"]);
        rule.exp = Some(NOW + 3600);
        let json = serde_json::to_vec(&rule).unwrap();
        let back: EnforcementRule = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn unknown_status_fails_to_parse() {
        let raw = br#"{"id":"x","paths":["/v/x"],"status":"shadow_ban"}"#;
        assert!(serde_json::from_slice::<EnforcementRule>(raw).is_err());
    }
}
