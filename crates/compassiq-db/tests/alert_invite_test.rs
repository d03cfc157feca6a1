//! Integration tests for Alert and Invite repositories using in-memory
//! SurrealDB.

use chrono::{Duration, Utc};
use compassiq_core::error::CompassError;
use compassiq_core::fanout::FanoutRows;
use compassiq_core::models::alert::{
    AlertFilter, AlertSeverity, AlertState, NewAlert, UpdateAlert,
};
use compassiq_core::models::instance::CreateInstance;
use compassiq_core::models::invite::CreateInvite;
use compassiq_core::models::organization::CreateOrganization;
use compassiq_core::models::template::CreateTemplate;
use compassiq_core::rbac::Role;
use compassiq_core::repository::{
    AlertRepository, InstanceRepository, InviteRepository, MembershipRepository,
    OrganizationRepository, Pagination, TemplateRepository,
};
use compassiq_db::repository::{
    SurrealAlertRepository, SurrealInstanceRepository, SurrealInviteRepository,
    SurrealMembershipRepository, SurrealOrganizationRepository, SurrealTemplateRepository,
};
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

/// Helper: in-memory DB, one org, one published instance with alerts.
async fn setup() -> (Surreal<Db>, Uuid, Uuid, Vec<Uuid>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    compassiq_db::run_migrations(&db).await.unwrap();

    let org = SurrealOrganizationRepository::new(db.clone())
        .create(CreateOrganization {
            name: "Meridian".into(),
            slug: "meridian".into(),
            is_demo: false,
            metadata: None,
        })
        .await
        .unwrap();

    let template = SurrealTemplateRepository::new(db.clone())
        .create(CreateTemplate {
            key: "construction_ops".into(),
            name: "Construction Ops".into(),
            description: String::new(),
            version: 1,
            body: json!({}),
        })
        .await
        .unwrap();

    let instance_repo = SurrealInstanceRepository::new(db.clone());
    let instance = instance_repo
        .create(CreateInstance {
            org_id: org.id,
            template_id: template.id,
            name: "Rollout".into(),
        })
        .await
        .unwrap();

    instance_repo
        .publish(
            org.id,
            instance.id,
            Utc::now(),
            FanoutRows {
                alerts: vec![
                    NewAlert {
                        org_id: org.id,
                        instance_id: Some(instance.id),
                        severity: AlertSeverity::High,
                        alert_type: "budget_overrun".into(),
                        title: "Budget overrun".into(),
                        description: String::new(),
                        state: AlertState::Open,
                        owner: None,
                        due_at: None,
                    },
                    NewAlert {
                        org_id: org.id,
                        instance_id: Some(instance.id),
                        severity: AlertSeverity::Low,
                        alert_type: "stale_pipeline".into(),
                        title: "Stale pipeline".into(),
                        description: String::new(),
                        state: AlertState::Open,
                        owner: None,
                        due_at: None,
                    },
                ],
                cadence_items: vec![],
            },
        )
        .await
        .unwrap();

    let alerts = SurrealAlertRepository::new(db.clone())
        .list_by_instance(org.id, instance.id)
        .await
        .unwrap();
    let alert_ids = alerts.iter().map(|a| a.id).collect();

    (db, org.id, instance.id, alert_ids)
}

// -----------------------------------------------------------------------
// Alert tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn patch_state_only_leaves_other_fields() {
    let (db, org_id, _instance, alert_ids) = setup().await;
    let repo = SurrealAlertRepository::new(db);

    let updated = repo
        .update(
            org_id,
            alert_ids[0],
            UpdateAlert {
                state: Some(AlertState::Resolved),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.state, AlertState::Resolved);
    assert_eq!(updated.owner, None);
    assert_eq!(updated.title, "Budget overrun");

    // The sibling alert is untouched.
    let sibling = repo.get_by_id(org_id, alert_ids[1]).await.unwrap();
    assert_eq!(sibling.state, AlertState::Open);
}

#[tokio::test]
async fn patch_sets_and_clears_owner_and_due() {
    let (db, org_id, _instance, alert_ids) = setup().await;
    let repo = SurrealAlertRepository::new(db);

    let due = Utc::now() + Duration::days(7);
    let updated = repo
        .update(
            org_id,
            alert_ids[0],
            UpdateAlert {
                owner: Some(Some("pm@example.com".into())),
                due_at: Some(Some(due)),
                disposition: Some(Some("investigating".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.owner.as_deref(), Some("pm@example.com"));
    assert!(updated.due_at.is_some());
    assert_eq!(updated.disposition.as_deref(), Some("investigating"));

    // `Some(None)` clears; absent fields stay.
    let cleared = repo
        .update(
            org_id,
            alert_ids[0],
            UpdateAlert {
                owner: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.owner, None);
    assert!(cleared.due_at.is_some(), "due_at must survive an owner clear");
}

#[tokio::test]
async fn update_is_org_scoped() {
    let (db, _org_id, _instance, alert_ids) = setup().await;
    let repo = SurrealAlertRepository::new(db.clone());

    let rival = SurrealOrganizationRepository::new(db)
        .create(CreateOrganization {
            name: "Rival".into(),
            slug: "rival".into(),
            is_demo: false,
            metadata: None,
        })
        .await
        .unwrap();

    let result = repo
        .update(
            rival.id,
            alert_ids[0],
            UpdateAlert {
                state: Some(AlertState::Dismissed),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(CompassError::NotFound { .. })));
}

#[tokio::test]
async fn list_filters_by_state_and_severity() {
    let (db, org_id, _instance, alert_ids) = setup().await;
    let repo = SurrealAlertRepository::new(db);

    repo.update(
        org_id,
        alert_ids[0],
        UpdateAlert {
            state: Some(AlertState::Resolved),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let open = repo
        .list(
            org_id,
            AlertFilter {
                state: Some(AlertState::Open),
                severity: None,
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(open.total, 1);
    assert_eq!(open.items[0].state, AlertState::Open);

    let high = repo
        .list(
            org_id,
            AlertFilter {
                state: None,
                severity: Some(AlertSeverity::High),
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(high.total, 1);
    assert_eq!(high.items[0].severity, AlertSeverity::High);

    let all = repo
        .list(org_id, AlertFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.total, 2);
}

// -----------------------------------------------------------------------
// Invite tests
// -----------------------------------------------------------------------

fn invite_input(org_id: Uuid, token_hash: &str, expires_in: Duration) -> CreateInvite {
    CreateInvite {
        org_id,
        email: "new.hire@example.com".into(),
        role: Role::Ops,
        token_hash: token_hash.into(),
        expires_at: Utc::now() + expires_in,
    }
}

#[tokio::test]
async fn create_and_list_invites() {
    let (db, org_id, _instance, _alerts) = setup().await;
    let repo = SurrealInviteRepository::new(db);

    let invite = repo
        .create(invite_input(org_id, "hash-1", Duration::days(7)))
        .await
        .unwrap();
    assert_eq!(invite.role, Role::Ops);
    assert!(invite.accepted_at.is_none());

    let invites = repo.list(org_id).await.unwrap();
    assert_eq!(invites.len(), 1);

    let fetched = repo.get_by_id(org_id, invite.id).await.unwrap();
    assert_eq!(fetched.token_hash, "hash-1");
}

#[tokio::test]
async fn accept_creates_membership_and_consumes_token() {
    let (db, org_id, _instance, _alerts) = setup().await;
    let invite_repo = SurrealInviteRepository::new(db.clone());
    let member_repo = SurrealMembershipRepository::new(db);

    invite_repo
        .create(invite_input(org_id, "hash-accept", Duration::days(7)))
        .await
        .unwrap();

    let (invite, membership) = invite_repo
        .accept("hash-accept", "new.hire@example.com")
        .await
        .unwrap();

    assert!(invite.accepted_at.is_some());
    assert_eq!(membership.org_id, org_id);
    assert_eq!(membership.role, Role::Ops);
    assert_eq!(membership.principal, "new.hire@example.com");

    let stored = member_repo
        .get(org_id, "new.hire@example.com")
        .await
        .unwrap();
    assert_eq!(stored.id, membership.id);

    // Single-use: a second redemption looks like an unknown token.
    let again = invite_repo.accept("hash-accept", "other@example.com").await;
    assert!(matches!(again, Err(CompassError::NotFound { .. })));
}

#[tokio::test]
async fn accept_expired_invite_conflicts() {
    let (db, org_id, _instance, _alerts) = setup().await;
    let invite_repo = SurrealInviteRepository::new(db.clone());
    let member_repo = SurrealMembershipRepository::new(db);

    invite_repo
        .create(invite_input(org_id, "hash-expired", Duration::days(-1)))
        .await
        .unwrap();

    let result = invite_repo
        .accept("hash-expired", "late@example.com")
        .await;
    assert!(matches!(result, Err(CompassError::Conflict { .. })));

    let membership = member_repo.get(org_id, "late@example.com").await;
    assert!(
        matches!(membership, Err(CompassError::NotFound { .. })),
        "an expired invite must not create a membership"
    );
}

#[tokio::test]
async fn accept_unknown_token_is_not_found() {
    let (db, _org_id, _instance, _alerts) = setup().await;
    let repo = SurrealInviteRepository::new(db);

    let result = repo.accept("no-such-hash", "nobody@example.com").await;
    assert!(matches!(result, Err(CompassError::NotFound { .. })));
}

#[tokio::test]
async fn delete_invite() {
    let (db, org_id, _instance, _alerts) = setup().await;
    let repo = SurrealInviteRepository::new(db);

    let invite = repo
        .create(invite_input(org_id, "hash-revoke", Duration::days(7)))
        .await
        .unwrap();

    repo.delete(org_id, invite.id).await.unwrap();

    let result = repo.get_by_id(org_id, invite.id).await;
    assert!(matches!(result, Err(CompassError::NotFound { .. })));
}
