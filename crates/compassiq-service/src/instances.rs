//! Instance lifecycle — create, list, publish, archive.
//!
//! Publishing is the only state change with side effects: it expands
//! the pinned template's rules into alert and cadence-item rows. The
//! status flip and the fan-out are one unit of work in the store.

use std::collections::HashMap;

use chrono::Utc;
use compassiq_core::context::TenantContext;
use compassiq_core::error::{CompassError, CompassResult};
use compassiq_core::fanout;
use compassiq_core::gate;
use compassiq_core::models::instance::{CreateInstance, Instance, InstanceWithTemplate};
use compassiq_core::models::template::TemplateBody;
use compassiq_core::repository::{AuditLogRepository, InstanceRepository, TemplateRepository};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::audit;

/// Result of a successful publication.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub instance: Instance,
    pub alerts_created: usize,
    pub cadence_items_created: usize,
}

pub struct InstanceService<T, I, L>
where
    T: TemplateRepository,
    I: InstanceRepository,
    L: AuditLogRepository,
{
    templates: T,
    instances: I,
    audit: L,
}

impl<T, I, L> InstanceService<T, I, L>
where
    T: TemplateRepository,
    I: InstanceRepository,
    L: AuditLogRepository,
{
    pub fn new(templates: T, instances: I, audit: L) -> Self {
        Self {
            templates,
            instances,
            audit,
        }
    }

    /// Create a draft instance bound to one template.
    ///
    /// The template reference is pinned here; later template edits do
    /// not affect the instance. Name defaults to
    /// `"{template.name} - {date}"`.
    pub async fn create(
        &self,
        ctx: &TenantContext,
        template_key: &str,
        name: Option<String>,
    ) -> CompassResult<Instance> {
        // 1. Gate — re-checked server-side regardless of the UI state.
        if let Err(err) = gate::ensure_can_mutate(ctx) {
            audit::denied(&self.audit, ctx, "instance.create").await;
            return Err(err);
        }

        // 2. Resolve the template; unknown keys are NotFound.
        let template = self.templates.get_by_key(template_key).await?;
        TemplateBody::parse(&template.body)?;

        // 3. Insert the draft.
        let name = name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| {
            format!("{} - {}", template.name, Utc::now().format("%Y-%m-%d"))
        });
        let instance = self
            .instances
            .create(CreateInstance {
                org_id: ctx.org_id,
                template_id: template.id,
                name,
            })
            .await?;

        info!(org_id = %ctx.org_id, instance_id = %instance.id, template_key, "created draft instance");
        audit::success(
            &self.audit,
            ctx,
            "instance.create",
            Some(instance.id),
            json!({ "template_key": template_key }),
        )
        .await;

        Ok(instance)
    }

    /// All of the organization's instances joined with their template's
    /// display fields, newest first. Any member may read.
    pub async fn list(&self, ctx: &TenantContext) -> CompassResult<Vec<InstanceWithTemplate>> {
        let instances = self.instances.list(ctx.org_id).await?;
        let templates = self.templates.list().await?;
        let by_id: HashMap<Uuid, _> = templates.into_iter().map(|t| (t.id, t)).collect();

        instances
            .into_iter()
            .map(|instance| {
                let template =
                    by_id
                        .get(&instance.template_id)
                        .ok_or_else(|| CompassError::NotFound {
                            entity: "template".into(),
                            id: instance.template_id.to_string(),
                        })?;
                Ok(InstanceWithTemplate {
                    template_key: template.key.clone(),
                    template_name: template.name.clone(),
                    template_description: template.description.clone(),
                    instance,
                })
            })
            .collect()
    }

    /// The one-way draft→published transition, fanning the template's
    /// rules out into alert and cadence-item rows.
    ///
    /// Re-publish attempts fail `Conflict` without inserting anything;
    /// a fan-out failure aborts the status flip. Both guarantees live
    /// in the store transaction, not here.
    pub async fn publish(
        &self,
        ctx: &TenantContext,
        instance_id: Uuid,
    ) -> CompassResult<PublishOutcome> {
        // 1. Gate.
        if let Err(err) = gate::ensure_can_mutate(ctx) {
            audit::denied(&self.audit, ctx, "instance.publish").await;
            return Err(err);
        }

        // 2. Load the instance (org-scoped) and its pinned template.
        let instance = self.instances.get_by_id(ctx.org_id, instance_id).await?;
        let template = self.templates.get_by_id(instance.template_id).await?;
        let body = TemplateBody::parse(&template.body)?;

        // 3. Expand the rules. `published_at` is fixed up front so the
        //    due offsets and the stored timestamp agree.
        let published_at = Utc::now();
        let rows = fanout::expand(&body, ctx.org_id, instance_id, published_at);
        let alerts_created = rows.alerts.len();
        let cadence_items_created = rows.cadence_items.len();

        // 4. One atomic unit of work: draft check, status flip, fan-out.
        let instance = self
            .instances
            .publish(ctx.org_id, instance_id, published_at, rows)
            .await?;

        info!(
            org_id = %ctx.org_id,
            instance_id = %instance.id,
            alerts_created,
            cadence_items_created,
            "published instance"
        );
        audit::success(
            &self.audit,
            ctx,
            "instance.publish",
            Some(instance.id),
            json!({
                "alerts_created": alerts_created,
                "cadence_items_created": cadence_items_created,
            }),
        )
        .await;

        Ok(PublishOutcome {
            instance,
            alerts_created,
            cadence_items_created,
        })
    }

    /// The published→archived transition.
    pub async fn archive(&self, ctx: &TenantContext, instance_id: Uuid) -> CompassResult<Instance> {
        if let Err(err) = gate::ensure_can_mutate(ctx) {
            audit::denied(&self.audit, ctx, "instance.archive").await;
            return Err(err);
        }

        let instance = self.instances.archive(ctx.org_id, instance_id).await?;

        audit::success(&self.audit, ctx, "instance.archive", Some(instance.id), json!({})).await;

        Ok(instance)
    }
}
