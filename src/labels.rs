// src/labels.rs
// Moderation label ingestion. Classifies a label event (category, action,
// location, severity, target tags) into enforcement actions and runs the
// label-gate pipeline: classify, resolve media references, dispatch.

use serde::{Deserialize, Serialize};

use crate::dispatch::{self, DispatchOutcome, EnforcementTransport};
use crate::media_refs;
use crate::validation::EnforcementTables;

/// Label event as submitted to the ingestion endpoint. The tag set is
/// treated as already authenticated upstream; unknown tags are ignored.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct LabelEvent {
    pub tags: Vec<Vec<String>>,
    pub content: String,
}

/// Ordered severity tiers. `P0` is the only tier that forces a takedown
/// on its own.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    P0,
    P1,
    P2,
    P3,
}

impl Severity {
    pub fn parse(value: &str) -> Option<Severity> {
        match value {
            "p0" => Some(Severity::P0),
            "p1" => Some(Severity::P1),
            "p2" => Some(Severity::P2),
            "p3" => Some(Severity::P3),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::P0 => "p0",
            Severity::P1 => "p1",
            Severity::P2 => "p2",
            Severity::P3 => "p3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetKind {
    Event,
    Address,
    Pubkey,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Takedown,
    Geoblock,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Takedown => "takedown",
            ActionKind::Geoblock => "geoblock",
        }
    }
}

/// A decided enforcement step, consumed immediately by the dispatcher and
/// never persisted. `reason` is the human-readable display form; the
/// dispatcher maps it to the admin vocabulary separately.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EnforcementAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
    pub category: String,
    pub reason: String,
    pub severity: String,
}

/// Classifies one label event into zero, one, or two enforcement actions.
///
/// Tag parsing uses last-assignment semantics: a later `l`/`action`/`loc`/
/// `sev` tag overwrites an earlier one, and the three target tag kinds
/// share a single slot. Empty tag values behave as absent. A missing
/// category is the one hard error; anything else degrades to "no action".
pub fn classify(
    event: &LabelEvent,
    tables: &EnforcementTables,
) -> Result<Vec<EnforcementAction>, &'static str> {
    let mut category = None;
    let mut action = None;
    let mut loc = None;
    let mut sev = None;
    let mut target: Option<(TargetKind, &str)> = None;

    for tag in &event.tags {
        let name = tag.first().map(String::as_str).unwrap_or("");
        let value = tag.get(1).map(String::as_str).unwrap_or("");
        match name {
            "l" => category = Some(value),
            "action" => action = Some(value),
            "loc" => loc = Some(value),
            "sev" => sev = Some(value),
            "e" => target = Some((TargetKind::Event, value)),
            "a" => target = Some((TargetKind::Address, value)),
            "p" => target = Some((TargetKind::Pubkey, value)),
            _ => {}
        }
    }

    let category = category.filter(|v| !v.is_empty());
    let action = action.filter(|v| !v.is_empty());
    let loc = loc.filter(|v| !v.is_empty());
    let sev = sev.filter(|v| !v.is_empty());

    let Some(category) = category else {
        return Err("No category found in label");
    };

    // An explicit sev tag wins verbatim, and an unrecognized value never
    // reads as p0. Without the tag the category's default tier applies.
    let effective = match sev {
        Some(raw) => Severity::parse(raw),
        None => Some(tables.severity_for(category)),
    };
    let severity_label = match sev {
        Some(raw) => raw.to_string(),
        None => tables.severity_for(category).as_str().to_string(),
    };

    // Only event-scoped labels carry resolvable media; pubkey and address
    // targets are left to upstream resolution.
    let event_target = match target {
        Some((TargetKind::Event, value)) if !value.is_empty() => Some(value),
        _ => None,
    };

    let mut actions = Vec::new();

    if effective == Some(Severity::P0) || action == Some("block") {
        if let Some(target) = event_target {
            actions.push(EnforcementAction {
                kind: ActionKind::Takedown,
                target: target.to_string(),
                countries: None,
                category: category.to_string(),
                reason: category.replace('_', " "),
                severity: severity_label.clone(),
            });
        }
    }

    if category == "copyright" || category == "trademark" {
        if let (Some(loc), Some(target)) = (loc, event_target) {
            let countries: Vec<String> = loc
                .split(',')
                .map(|c| c.trim().to_ascii_uppercase())
                .filter(|c| tables.supports_country(c))
                .collect();
            if !countries.is_empty() {
                actions.push(EnforcementAction {
                    kind: ActionKind::Geoblock,
                    target: target.to_string(),
                    countries: Some(countries),
                    category: category.to_string(),
                    reason: format!("{} restriction", category),
                    severity: severity_label,
                });
            }
        }
    }

    Ok(actions)
}

/// Aggregate result of one label-gate pass.
#[derive(Serialize, Debug)]
pub struct LabelOutcome {
    pub actions: Vec<EnforcementAction>,
    pub assets: Vec<String>,
    pub results: Vec<DispatchOutcome>,
}

/// Full label-gate pass: classify the event, resolve its media references
/// to asset ids, and apply every action to every resolved asset.
pub async fn run_label_pipeline<T: EnforcementTransport>(
    event: &LabelEvent,
    tables: &EnforcementTables,
    media_host: &str,
    transport: &T,
) -> Result<LabelOutcome, &'static str> {
    let actions = classify(event, tables)?;
    let assets = media_refs::resolve_assets(event, media_host);
    let mut results = Vec::new();
    for action in &actions {
        results.extend(dispatch::apply(action, &assets, tables, transport).await);
    }
    Ok(LabelOutcome {
        actions,
        assets,
        results,
    })
}
