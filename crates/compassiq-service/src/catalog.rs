//! Template catalog.
//!
//! Read-only registry of named templates. Bodies are parsed into the
//! typed [`TemplateBody`] at load, so malformed rows fail fast with
//! `Validation` instead of propagating into fan-out.

use compassiq_core::error::{CompassError, CompassResult};
use compassiq_core::models::alert::AlertSeverity;
use compassiq_core::models::template::{
    AlertRule, CadenceRule, CreateTemplate, KpiDef, Template, TemplateBody,
};
use compassiq_core::repository::TemplateRepository;
use serde_json::json;
use tracing::info;

/// A template together with its parsed, validated body.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub template: Template,
    pub body: TemplateBody,
}

pub struct TemplateCatalog<T: TemplateRepository> {
    templates: T,
}

impl<T: TemplateRepository> TemplateCatalog<T> {
    pub fn new(templates: T) -> Self {
        Self { templates }
    }

    /// The full catalog, ordered by key.
    pub async fn list(&self) -> CompassResult<Vec<CatalogEntry>> {
        let templates = self.templates.list().await?;
        templates
            .into_iter()
            .map(|template| {
                let body = TemplateBody::parse(&template.body)?;
                Ok(CatalogEntry { template, body })
            })
            .collect()
    }

    pub async fn get(&self, key: &str) -> CompassResult<CatalogEntry> {
        let template = self.templates.get_by_key(key).await?;
        let body = TemplateBody::parse(&template.body)?;
        Ok(CatalogEntry { template, body })
    }

    /// Insert any built-in templates that are not already present.
    /// Keyed by template key, so re-running is safe.
    pub async fn seed_builtins(&self) -> CompassResult<usize> {
        let mut inserted = 0;
        for input in builtin_templates() {
            match self.templates.get_by_key(&input.key).await {
                Ok(_) => continue,
                Err(CompassError::NotFound { .. }) => {
                    info!(key = %input.key, "seeding built-in template");
                    self.templates.create(input).await?;
                    inserted += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(inserted)
    }
}

/// The built-in catalog shipped with every deployment.
pub fn builtin_templates() -> Vec<CreateTemplate> {
    vec![
        construction_ops(),
        revenue_ops(),
    ]
}

fn construction_ops() -> CreateTemplate {
    let body = TemplateBody {
        kpis: vec![
            KpiDef {
                key: "backlog_coverage".into(),
                label: "Backlog Coverage".into(),
                unit: Some("months".into()),
                target: Some(6.0),
            },
            KpiDef {
                key: "gross_margin".into(),
                label: "Gross Margin".into(),
                unit: Some("%".into()),
                target: Some(22.0),
            },
            KpiDef {
                key: "wip_overbilling".into(),
                label: "WIP Over/Under Billing".into(),
                unit: Some("$".into()),
                target: None,
            },
        ],
        alert_rules: vec![
            AlertRule {
                alert_type: "budget_overrun".into(),
                severity: AlertSeverity::High,
                title: "Job cost exceeding budget".into(),
                description: "Committed plus actual cost is tracking over the \
                              approved budget on at least one active job."
                    .into(),
                due_in_days: Some(7),
            },
            AlertRule {
                alert_type: "schedule_slip".into(),
                severity: AlertSeverity::Medium,
                title: "Milestone slippage on active projects".into(),
                description: "One or more contract milestones have moved past \
                              their baseline dates."
                    .into(),
                due_in_days: Some(14),
            },
            AlertRule {
                alert_type: "unapproved_change_orders".into(),
                severity: AlertSeverity::Critical,
                title: "Unapproved change orders aging".into(),
                description: "Change-order work is underway without a signed \
                              approval, creating unbilled exposure."
                    .into(),
                due_in_days: Some(3),
            },
        ],
        cadence_rules: vec![
            CadenceRule {
                cadence: "weekly".into(),
                title: "Project ops review".into(),
                agenda: json!([
                    "open alerts by severity",
                    "jobs over budget",
                    "milestones at risk"
                ]),
            },
            CadenceRule {
                cadence: "monthly".into(),
                title: "Financial close review".into(),
                agenda: json!([
                    "WIP schedule",
                    "margin by job",
                    "change-order exposure"
                ]),
            },
        ],
    };

    CreateTemplate {
        key: "construction_ops".into(),
        name: "Construction Ops".into(),
        description: "Operational command center for construction \
                      contractors: job costs, milestones, and change-order \
                      discipline."
            .into(),
        version: 1,
        body: serde_json::to_value(&body).unwrap_or_default(),
    }
}

fn revenue_ops() -> CreateTemplate {
    let body = TemplateBody {
        kpis: vec![
            KpiDef {
                key: "pipeline_coverage".into(),
                label: "Pipeline Coverage".into(),
                unit: Some("x".into()),
                target: Some(3.0),
            },
            KpiDef {
                key: "win_rate".into(),
                label: "Win Rate".into(),
                unit: Some("%".into()),
                target: Some(25.0),
            },
        ],
        alert_rules: vec![
            AlertRule {
                alert_type: "stale_pipeline".into(),
                severity: AlertSeverity::Low,
                title: "Opportunities going stale".into(),
                description: "Open opportunities with no activity in the last \
                              30 days."
                    .into(),
                due_in_days: None,
            },
            AlertRule {
                alert_type: "forecast_gap".into(),
                severity: AlertSeverity::High,
                title: "Forecast below target".into(),
                description: "Weighted pipeline does not cover the current \
                              quarter's target."
                    .into(),
                due_in_days: Some(7),
            },
        ],
        cadence_rules: vec![CadenceRule {
            cadence: "weekly".into(),
            title: "Pipeline review".into(),
            agenda: json!(["stale opportunities", "forecast vs target"]),
        }],
    };

    CreateTemplate {
        key: "revenue_ops".into(),
        name: "Revenue Ops".into(),
        description: "Sales pipeline hygiene and forecast discipline for \
                      revenue teams."
            .into(),
        version: 1,
        body: serde_json::to_value(&body).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_bodies_validate() {
        for input in builtin_templates() {
            let body = TemplateBody::parse(&input.body)
                .unwrap_or_else(|e| panic!("builtin '{}' invalid: {e}", input.key));
            assert!(!body.alert_rules.is_empty());
            assert!(!body.cadence_rules.is_empty());
        }
    }

    #[test]
    fn construction_ops_shape() {
        let input = construction_ops();
        let body = TemplateBody::parse(&input.body).unwrap();
        assert_eq!(body.alert_rules.len(), 3);
        assert_eq!(body.cadence_rules.len(), 2);
    }

    #[test]
    fn builtin_keys_are_unique() {
        let mut keys: Vec<String> = builtin_templates().into_iter().map(|t| t.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), builtin_templates().len());
    }
}
