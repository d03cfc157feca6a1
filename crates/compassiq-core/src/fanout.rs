//! Publication fan-out.
//!
//! Expands a template body into the concrete alert and cadence-item
//! rows a publication creates. Pure and deterministic: `published_at`
//! is a parameter, so the expansion owns no clock, and re-running it
//! for the same inputs produces the same rows. It carries no dedup
//! logic of its own — the one-way draft→published transition is what
//! prevents double fan-out.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::alert::{AlertState, NewAlert};
use crate::models::cadence_item::NewCadenceItem;
use crate::models::template::TemplateBody;

/// The rows produced by expanding one template body for one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct FanoutRows {
    pub alerts: Vec<NewAlert>,
    pub cadence_items: Vec<NewCadenceItem>,
}

/// Expand `body` into the rows to insert for `instance_id`.
///
/// One alert per alert rule, created `open` with no owner; `due_at` is
/// offset from `published_at` when the rule carries one. One cadence
/// item per cadence rule, with the rule entry copied verbatim.
pub fn expand(
    body: &TemplateBody,
    org_id: Uuid,
    instance_id: Uuid,
    published_at: DateTime<Utc>,
) -> FanoutRows {
    let alerts = body
        .alert_rules
        .iter()
        .map(|rule| NewAlert {
            org_id,
            instance_id: Some(instance_id),
            severity: rule.severity,
            alert_type: rule.alert_type.clone(),
            title: rule.title.clone(),
            description: rule.description.clone(),
            state: AlertState::Open,
            owner: None,
            due_at: rule
                .due_in_days
                .map(|days| published_at + Duration::days(i64::from(days))),
        })
        .collect();

    let cadence_items = body
        .cadence_rules
        .iter()
        .map(|rule| NewCadenceItem {
            org_id,
            instance_id,
            cadence: rule.cadence.clone(),
            title: rule.title.clone(),
            rules: serde_json::to_value(rule).unwrap_or_default(),
        })
        .collect();

    FanoutRows {
        alerts,
        cadence_items,
    }
}
