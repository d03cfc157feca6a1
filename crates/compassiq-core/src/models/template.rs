//! Template domain model.
//!
//! Templates are shared catalog data, not tenant-owned. Each carries a
//! structured body of KPI, alert-rule, and cadence-rule definitions
//! that publication fans out into per-tenant rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CompassError, CompassResult};
use crate::models::alert::AlertSeverity;

/// A catalog template, immutable per version.
///
/// The `body` is stored opaquely and parsed into a [`TemplateBody`]
/// when loaded through the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    /// Human-readable catalog key (e.g., `construction_ops`).
    pub key: String,
    pub name: String,
    pub description: String,
    pub version: u32,
    pub body: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplate {
    pub key: String,
    pub name: String,
    pub description: String,
    pub version: u32,
    pub body: serde_json::Value,
}

/// The typed shape of a template body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateBody {
    #[serde(default)]
    pub kpis: Vec<KpiDef>,
    #[serde(default)]
    pub alert_rules: Vec<AlertRule>,
    #[serde(default)]
    pub cadence_rules: Vec<CadenceRule>,
}

/// A KPI definition. Consumed by the excluded dashboard layer; carried
/// here so bodies round-trip intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiDef {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub target: Option<f64>,
}

/// One alert to be created per publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    /// Type tag carried onto the created alert (e.g., `budget_overrun`).
    pub alert_type: String,
    pub severity: AlertSeverity,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Relative due offset, in days after publication.
    #[serde(default)]
    pub due_in_days: Option<u32>,
}

/// One cadence item to be created per publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceRule {
    /// Cadence label (e.g., `weekly`, `monthly`).
    pub cadence: String,
    pub title: String,
    /// Free-form agenda/rules payload, copied verbatim onto the item.
    #[serde(default)]
    pub agenda: serde_json::Value,
}

impl TemplateBody {
    /// Parse and validate a stored body document.
    ///
    /// Malformed bodies fail fast here instead of propagating into
    /// fan-out. Cross-field consistency (alert rules referencing
    /// declared KPI keys) is intentionally not checked.
    pub fn parse(value: &serde_json::Value) -> CompassResult<Self> {
        let body: TemplateBody =
            serde_json::from_value(value.clone()).map_err(|e| CompassError::Validation {
                message: format!("malformed template body: {e}"),
            })?;
        body.validate()?;
        Ok(body)
    }

    fn validate(&self) -> CompassResult<()> {
        for rule in &self.alert_rules {
            if rule.title.trim().is_empty() {
                return Err(CompassError::Validation {
                    message: "alert rule with empty title".into(),
                });
            }
        }
        for rule in &self.cadence_rules {
            if rule.title.trim().is_empty() {
                return Err(CompassError::Validation {
                    message: "cadence rule with empty title".into(),
                });
            }
            if rule.cadence.trim().is_empty() {
                return Err(CompassError::Validation {
                    message: format!("cadence rule '{}' with empty cadence label", rule.title),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_well_formed_body() {
        let body = TemplateBody::parse(&json!({
            "kpis": [{"key": "margin", "label": "Gross Margin", "unit": "%"}],
            "alert_rules": [{
                "alert_type": "budget_overrun",
                "severity": "high",
                "title": "Budget overrun detected",
                "due_in_days": 7
            }],
            "cadence_rules": [{"cadence": "weekly", "title": "Ops review"}]
        }))
        .unwrap();
        assert_eq!(body.alert_rules.len(), 1);
        assert_eq!(body.alert_rules[0].due_in_days, Some(7));
        assert_eq!(body.cadence_rules[0].cadence, "weekly");
    }

    #[test]
    fn rejects_unknown_severity() {
        let err = TemplateBody::parse(&json!({
            "alert_rules": [{
                "alert_type": "x",
                "severity": "apocalyptic",
                "title": "t"
            }]
        }))
        .unwrap_err();
        assert!(matches!(err, CompassError::Validation { .. }));
    }

    #[test]
    fn rejects_empty_titles() {
        let err = TemplateBody::parse(&json!({
            "cadence_rules": [{"cadence": "weekly", "title": "  "}]
        }))
        .unwrap_err();
        assert!(matches!(err, CompassError::Validation { .. }));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let body = TemplateBody::parse(&json!({})).unwrap();
        assert!(body.kpis.is_empty());
        assert!(body.alert_rules.is_empty());
        assert!(body.cadence_rules.is_empty());
    }
}
