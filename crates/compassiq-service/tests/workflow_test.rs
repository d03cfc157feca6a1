//! End-to-end tests for the template→instance→publish→alerts workflow,
//! running the services over real repositories on in-memory SurrealDB.

use compassiq_core::context::TenantContext;
use compassiq_core::error::CompassError;
use compassiq_core::models::alert::{AlertFilter, AlertState, UpdateAlert};
use compassiq_core::models::audit::AuditOutcome;
use compassiq_core::models::instance::InstanceStatus;
use compassiq_core::models::membership::CreateMembership;
use compassiq_core::models::organization::CreateOrganization;
use compassiq_core::models::template::CreateTemplate;
use compassiq_core::rbac::Role;
use compassiq_core::repository::{
    AlertRepository, AuditLogRepository, CadenceItemRepository, InstanceRepository,
    MembershipRepository, OrganizationRepository, Pagination, TemplateRepository,
};
use compassiq_db::repository::{
    SurrealAlertRepository, SurrealAuditLogRepository, SurrealCadenceItemRepository,
    SurrealInstanceRepository, SurrealMembershipRepository, SurrealOrganizationRepository,
    SurrealTemplateRepository,
};
use compassiq_service::{
    AlertService, InstanceService, OrgContextService, ServiceConfig, TemplateCatalog,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

/// In-memory DB with migrations, seeded built-in catalog, a live org
/// and a demo org, with an admin and a viewer in each.
async fn setup() -> (Surreal<Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    compassiq_db::run_migrations(&db).await.unwrap();

    TemplateCatalog::new(SurrealTemplateRepository::new(db.clone()))
        .seed_builtins()
        .await
        .unwrap();

    let org_repo = SurrealOrganizationRepository::new(db.clone());
    let live = org_repo
        .create(CreateOrganization {
            name: "Meridian Construction".into(),
            slug: "meridian".into(),
            is_demo: false,
            metadata: None,
        })
        .await
        .unwrap();
    let demo = org_repo
        .create(CreateOrganization {
            name: "Showroom".into(),
            slug: "showroom".into(),
            is_demo: true,
            metadata: None,
        })
        .await
        .unwrap();

    let member_repo = SurrealMembershipRepository::new(db.clone());
    for (org_id, principal, role) in [
        (live.id, "admin@example.com", Role::Admin),
        (live.id, "viewer@example.com", Role::Viewer),
        (demo.id, "admin@example.com", Role::Admin),
    ] {
        member_repo
            .create(CreateMembership {
                org_id,
                principal: principal.into(),
                role,
            })
            .await
            .unwrap();
    }

    (db, live.id, demo.id)
}

fn instance_service(db: &Surreal<Db>) -> InstanceService<
    SurrealTemplateRepository<Db>,
    SurrealInstanceRepository<Db>,
    SurrealAuditLogRepository<Db>,
> {
    InstanceService::new(
        SurrealTemplateRepository::new(db.clone()),
        SurrealInstanceRepository::new(db.clone()),
        SurrealAuditLogRepository::new(db.clone()),
    )
}

fn alert_service(db: &Surreal<Db>) -> AlertService<
    SurrealAlertRepository<Db>,
    SurrealAuditLogRepository<Db>,
> {
    AlertService::new(
        SurrealAlertRepository::new(db.clone()),
        SurrealAuditLogRepository::new(db.clone()),
    )
}

fn admin_ctx(org_id: Uuid, is_demo: bool) -> TenantContext {
    TenantContext::new(org_id, "admin@example.com", Role::Admin, is_demo)
}

fn viewer_ctx(org_id: Uuid) -> TenantContext {
    TenantContext::new(org_id, "viewer@example.com", Role::Viewer, false)
}

#[tokio::test]
async fn admin_publishes_construction_ops_end_to_end() {
    let (db, live, _demo) = setup().await;
    let instances = instance_service(&db);
    let alerts = alert_service(&db);
    let ctx = admin_ctx(live, false);

    let draft = instances
        .create(&ctx, "construction_ops", Some("Q1 Rollout".into()))
        .await
        .unwrap();
    assert_eq!(draft.status, InstanceStatus::Draft);
    assert_eq!(draft.name, "Q1 Rollout");

    let outcome = instances.publish(&ctx, draft.id).await.unwrap();
    assert_eq!(outcome.instance.status, InstanceStatus::Published);
    assert!(outcome.instance.published_at.is_some());
    assert_eq!(outcome.alerts_created, 3);
    assert_eq!(outcome.cadence_items_created, 2);

    let created = SurrealAlertRepository::new(db.clone())
        .list_by_instance(live, draft.id)
        .await
        .unwrap();
    assert_eq!(created.len(), 3);
    for alert in &created {
        assert_eq!(alert.state, AlertState::Open);
        assert_eq!(alert.owner, None);
    }

    let items = SurrealCadenceItemRepository::new(db.clone())
        .list_by_instance(live, draft.id)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);

    // Resolve exactly one alert; the others stay open.
    let target = created[0].id;
    let resolved = alerts
        .update(
            &ctx,
            target,
            UpdateAlert {
                state: Some(AlertState::Resolved),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(resolved.state, AlertState::Resolved);

    let still_open = alerts
        .list(
            &ctx,
            AlertFilter {
                state: Some(AlertState::Open),
                severity: None,
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(still_open.total, 2);
}

#[tokio::test]
async fn viewer_cannot_publish() {
    let (db, live, _demo) = setup().await;
    let instances = instance_service(&db);

    let draft = instances
        .create(&admin_ctx(live, false), "construction_ops", None)
        .await
        .unwrap();

    let result = instances.publish(&viewer_ctx(live), draft.id).await;
    assert!(matches!(result, Err(CompassError::Forbidden)));

    let current = SurrealInstanceRepository::new(db.clone())
        .get_by_id(live, draft.id)
        .await
        .unwrap();
    assert_eq!(current.status, InstanceStatus::Draft, "status unchanged");
}

#[tokio::test]
async fn demo_org_create_is_read_only_even_for_admin() {
    let (db, _live, demo) = setup().await;
    let instances = instance_service(&db);

    let err = instances
        .create(&admin_ctx(demo, true), "construction_ops", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CompassError::DemoReadOnly));
    assert_eq!(err.code(), Some("DEMO_READ_ONLY"));

    let rows = SurrealInstanceRepository::new(db.clone())
        .list(demo)
        .await
        .unwrap();
    assert!(rows.is_empty(), "no row may be created");
}

#[tokio::test]
async fn publish_is_one_way() {
    let (db, live, _demo) = setup().await;
    let instances = instance_service(&db);
    let ctx = admin_ctx(live, false);

    let draft = instances
        .create(&ctx, "construction_ops", None)
        .await
        .unwrap();
    instances.publish(&ctx, draft.id).await.unwrap();

    let second = instances.publish(&ctx, draft.id).await;
    assert!(matches!(second, Err(CompassError::Conflict { .. })));

    let alert_count = SurrealAlertRepository::new(db.clone())
        .list_by_instance(live, draft.id)
        .await
        .unwrap()
        .len();
    assert_eq!(alert_count, 3, "repeat publish must not duplicate alerts");
}

#[tokio::test]
async fn instance_name_defaults_to_template_and_date() {
    let (db, live, _demo) = setup().await;
    let instances = instance_service(&db);

    let draft = instances
        .create(&admin_ctx(live, false), "construction_ops", None)
        .await
        .unwrap();

    assert!(
        draft.name.starts_with("Construction Ops - "),
        "got: {}",
        draft.name
    );
}

#[tokio::test]
async fn unknown_template_key_is_not_found() {
    let (db, live, _demo) = setup().await;
    let instances = instance_service(&db);

    let result = instances
        .create(&admin_ctx(live, false), "no_such_template", None)
        .await;
    assert!(matches!(result, Err(CompassError::NotFound { .. })));
}

#[tokio::test]
async fn any_member_can_list_instances_with_template_fields() {
    let (db, live, _demo) = setup().await;
    let instances = instance_service(&db);

    instances
        .create(&admin_ctx(live, false), "construction_ops", Some("A".into()))
        .await
        .unwrap();
    instances
        .create(&admin_ctx(live, false), "revenue_ops", Some("B".into()))
        .await
        .unwrap();

    // Viewers read without any gate.
    let listed = instances.list(&viewer_ctx(live)).await.unwrap();
    assert_eq!(listed.len(), 2);
    // Newest first.
    assert_eq!(listed[0].instance.name, "B");
    assert_eq!(listed[0].template_key, "revenue_ops");
    assert_eq!(listed[1].template_name, "Construction Ops");
}

#[tokio::test]
async fn viewer_and_demo_cannot_update_alerts() {
    let (db, live, demo) = setup().await;
    let instances = instance_service(&db);
    let alerts = alert_service(&db);
    let ctx = admin_ctx(live, false);

    let draft = instances
        .create(&ctx, "construction_ops", None)
        .await
        .unwrap();
    instances.publish(&ctx, draft.id).await.unwrap();
    let target = SurrealAlertRepository::new(db.clone())
        .list_by_instance(live, draft.id)
        .await
        .unwrap()[0]
        .id;

    let patch = UpdateAlert {
        state: Some(AlertState::Dismissed),
        ..Default::default()
    };

    let as_viewer = alerts.update(&viewer_ctx(live), target, patch.clone()).await;
    assert!(matches!(as_viewer, Err(CompassError::Forbidden)));

    let as_demo_admin = alerts
        .update(&admin_ctx(demo, true), target, patch)
        .await;
    assert!(matches!(as_demo_admin, Err(CompassError::DemoReadOnly)));

    let current = alerts.get(&ctx, target).await.unwrap();
    assert_eq!(current.state, AlertState::Open, "row must be unchanged");
}

#[tokio::test]
async fn org_context_resolution() {
    let (db, live, demo) = setup().await;
    let resolver = OrgContextService::new(
        SurrealOrganizationRepository::new(db.clone()),
        SurrealMembershipRepository::new(db.clone()),
        ServiceConfig::default(),
    );

    // Full resolution for a member.
    let ctx = resolver
        .resolve(Some("admin@example.com"), Some(live))
        .await
        .unwrap()
        .expect("admin must resolve");
    assert_eq!(ctx.role, Role::Admin);
    assert!(ctx.is_admin());
    assert!(!ctx.is_demo);

    // Demo flag flows from the organization.
    let demo_ctx = resolver
        .resolve(Some("admin@example.com"), Some(demo))
        .await
        .unwrap()
        .expect("demo admin must resolve");
    assert!(demo_ctx.is_demo);

    // Absent context is None, never an error.
    assert!(resolver.resolve(None, Some(live)).await.unwrap().is_none());
    assert!(
        resolver
            .resolve(Some("admin@example.com"), None)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        resolver
            .resolve(Some("stranger@example.com"), Some(live))
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        resolver
            .resolve(Some("admin@example.com"), Some(Uuid::new_v4()))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn dev_bypass_principal_stands_in_for_missing_session() {
    let (db, live, _demo) = setup().await;
    let resolver = OrgContextService::new(
        SurrealOrganizationRepository::new(db.clone()),
        SurrealMembershipRepository::new(db.clone()),
        ServiceConfig {
            dev_principal: Some("admin@example.com".into()),
            ..Default::default()
        },
    );

    let ctx = resolver
        .resolve(None, Some(live))
        .await
        .unwrap()
        .expect("dev bypass must resolve");
    assert_eq!(ctx.principal, "admin@example.com");
}

#[tokio::test]
async fn catalog_seeding_is_idempotent() {
    let (db, _live, _demo) = setup().await;
    let catalog = TemplateCatalog::new(SurrealTemplateRepository::new(db.clone()));

    // setup() already seeded once.
    let second = catalog.seed_builtins().await.unwrap();
    assert_eq!(second, 0);

    let entries = catalog.list().await.unwrap();
    let keys: Vec<&str> = entries.iter().map(|e| e.template.key.as_str()).collect();
    assert_eq!(keys, vec!["construction_ops", "revenue_ops"]);
}

#[tokio::test]
async fn catalog_fails_fast_on_malformed_body() {
    let (db, _live, _demo) = setup().await;
    let repo = SurrealTemplateRepository::new(db.clone());

    repo.create(CreateTemplate {
        key: "broken".into(),
        name: "Broken".into(),
        description: String::new(),
        version: 1,
        body: serde_json::json!({
            "alert_rules": [{"alert_type": "x", "severity": "apocalyptic", "title": "t"}]
        }),
    })
    .await
    .unwrap();

    let catalog = TemplateCatalog::new(repo);
    let result = catalog.get("broken").await;
    assert!(matches!(result, Err(CompassError::Validation { .. })));
}

#[tokio::test]
async fn mutations_leave_an_audit_trail() {
    let (db, live, _demo) = setup().await;
    let instances = instance_service(&db);
    let ctx = admin_ctx(live, false);

    let draft = instances
        .create(&ctx, "construction_ops", None)
        .await
        .unwrap();
    instances.publish(&ctx, draft.id).await.unwrap();

    // A denied attempt is recorded too.
    let _ = instances.publish(&viewer_ctx(live), draft.id).await;

    let trail = SurrealAuditLogRepository::new(db.clone())
        .list(live, Pagination::default())
        .await
        .unwrap();

    let publishes: Vec<_> = trail
        .items
        .iter()
        .filter(|e| e.action == "instance.publish")
        .collect();
    assert_eq!(publishes.len(), 2);
    assert!(
        publishes
            .iter()
            .any(|e| e.outcome == AuditOutcome::Success && e.actor == "admin@example.com")
    );
    assert!(
        publishes
            .iter()
            .any(|e| e.outcome == AuditOutcome::Denied && e.actor == "viewer@example.com")
    );
}
