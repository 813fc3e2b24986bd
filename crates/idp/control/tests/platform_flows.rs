//! Integration tests: catalog, environment, policy and audit operations.
//!
//! Verifies that:
//! - guardrails reject bad services, environments and updates
//! - rejections tied to an existing entity leave a guardrail_blocked entry
//! - role checks run before any state is touched
//! - deletes cascade or detach as the ownership model requires

mod common;

use common::*;
use idp_control::{
    CreatePolicy, CreateTeam, PlatformError, ProvisionEnvironment, RegisterService,
    TriggerDeployment, UpdateService,
};
use idp_types::{AuditAction, AuditQuery, ConfigMap, EntityKind, TeamId, Tier};
use serde_json::json;

fn config(key: &str) -> ConfigMap {
    let mut config = ConfigMap::new();
    config.insert(key.to_string(), json!("value"));
    config
}

fn reason(err: PlatformError) -> String {
    match err {
        PlatformError::GuardrailViolation(v) => v.reason,
        other => panic!("expected guardrail violation, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_service_then_duplicate_fails() {
    let (h, _) = Harness::manual();
    let service = h
        .platform
        .register_service(
            RegisterService::new("payment-api", valid_tags()),
            &developer(),
        )
        .await
        .unwrap();
    assert_eq!(service.name, "payment-api");
    assert_eq!(service.tags, valid_tags());
    assert_eq!(service.team_id, None);

    let err = h
        .platform
        .register_service(
            RegisterService::new("payment-api", valid_tags()),
            &developer(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PlatformError::already_exists(EntityKind::Service, "payment-api")
    );

    let created = h
        .platform
        .audit_log(
            &AuditQuery::for_entity(EntityKind::Service, service.id.to_string()),
            &team_admin(),
        )
        .await
        .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].action, AuditAction::Created);
    assert_eq!(created[0].metadata["name"], "payment-api");
}

#[tokio::test]
async fn register_service_missing_sensitivity_is_rejected() {
    let (h, _) = Harness::manual();
    let err = h
        .platform
        .register_service(
            RegisterService::new("api", tags(&[("owner", "team")])),
            &developer(),
        )
        .await
        .unwrap_err();
    assert_eq!(reason(err), "Missing mandatory tags: data_sensitivity");
    assert!(h.platform.list_services().await.unwrap().is_empty());
}

#[tokio::test]
async fn register_service_with_credential_config_is_rejected() {
    let (h, _) = Harness::manual();
    let err = h
        .platform
        .register_service(
            RegisterService::new("api", valid_tags()).with_config(config("Token")),
            &developer(),
        )
        .await
        .unwrap_err();
    assert_eq!(reason(err), "Restricted configuration key: Token");
}

#[tokio::test]
async fn invalid_tag_update_is_blocked_and_audited() {
    let (h, _) = Harness::manual();
    let (service, _) = h.service_with_tiers("api", &[]).await;

    let update = UpdateService {
        tags: Some(tags(&[("owner", "x"), ("data_sensitivity", "secret-ish")])),
        ..Default::default()
    };
    let err = h
        .platform
        .update_service(&service.id, update, &team_admin())
        .await
        .unwrap_err();
    assert!(reason(err).starts_with("Invalid data_sensitivity tag value: secret-ish"));

    let unchanged = h.platform.get_service(&service.id).await.unwrap();
    assert_eq!(unchanged.tags, valid_tags());

    let blocked = h
        .platform
        .audit_log(
            &AuditQuery::for_entity(EntityKind::Service, service.id.to_string())
                .with_action(AuditAction::GuardrailBlocked),
            &team_admin(),
        )
        .await
        .unwrap();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].metadata["guardrail"], "data-sensitivity");
}

#[tokio::test]
async fn update_service_applies_fields() {
    let (h, _) = Harness::manual();
    let (service, _) = h.service_with_tiers("api", &[]).await;

    let update = UpdateService {
        description: Some("Payments gateway".into()),
        config: Some(config("replicas")),
        ..Default::default()
    };
    let updated = h
        .platform
        .update_service(&service.id, update, &team_admin())
        .await
        .unwrap();
    assert_eq!(updated.description.as_deref(), Some("Payments gateway"));
    assert!(updated.config.contains_key("replicas"));

    let entries = h
        .platform
        .audit_log(
            &AuditQuery::for_entity(EntityKind::Service, service.id.to_string())
                .with_action(AuditAction::Updated),
            &team_admin(),
        )
        .await
        .unwrap();
    assert_eq!(entries[0].metadata["updated"], json!(["description", "config"]));
}

#[tokio::test]
async fn update_service_with_unknown_team_is_not_found() {
    let (h, _) = Harness::manual();
    let (service, _) = h.service_with_tiers("api", &[]).await;

    let update = UpdateService {
        team_id: Some(TeamId::generate()),
        ..Default::default()
    };
    let err = h
        .platform
        .update_service(&service.id, update, &team_admin())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PlatformError::NotFound {
            kind: EntityKind::Team,
            ..
        }
    ));
}

#[tokio::test]
async fn developer_cannot_update_service() {
    let (h, _) = Harness::manual();
    let (service, _) = h.service_with_tiers("api", &[]).await;

    let err = h
        .platform
        .update_service(&service.id, UpdateService::default(), &developer())
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::PermissionDenied(_)));
}

#[tokio::test]
async fn delete_service_cascades_and_keeps_audit() {
    let (h, _) = Harness::manual();
    let (service, envs) = h.service_with_tiers("api", &[Tier::Dev]).await;
    h.orchestrator
        .trigger_deployment(
            &service.id,
            &envs[0].id,
            TriggerDeployment::new("1.0.0"),
            &[],
            &developer(),
        )
        .await
        .unwrap();

    h.platform
        .delete_service(&service.id, &team_admin())
        .await
        .unwrap();

    assert!(matches!(
        h.platform.get_service(&service.id).await,
        Err(PlatformError::NotFound { .. })
    ));
    assert!(h.orchestrator.deployment_history(&service.id).await.is_err());

    let history = h
        .platform
        .audit_log(
            &AuditQuery::for_entity(EntityKind::Service, service.id.to_string()),
            &team_admin(),
        )
        .await
        .unwrap();
    let actions: Vec<AuditAction> = history.iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![AuditAction::Deleted, AuditAction::Created]);
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[tokio::test]
async fn team_lifecycle_detaches_services() {
    let (h, _) = Harness::manual();
    let team = h
        .platform
        .create_team(CreateTeam::new("payments"), &team_admin())
        .await
        .unwrap();

    let err = h
        .platform
        .create_team(CreateTeam::new("payments"), &platform_admin())
        .await
        .unwrap_err();
    assert_eq!(err, PlatformError::already_exists(EntityKind::Team, "payments"));

    let (service, _) = h.service_with_tiers("api", &[]).await;
    let assigned = h
        .platform
        .assign_team(&service.id, &team.id, &team_admin())
        .await
        .unwrap();
    assert_eq!(assigned.team_id, Some(team.id));

    h.platform.delete_team(&team.id, &team_admin()).await.unwrap();
    assert!(h.platform.list_teams().await.unwrap().is_empty());
    let service = h.platform.get_service(&service.id).await.unwrap();
    assert_eq!(service.team_id, None);
}

#[tokio::test]
async fn developer_cannot_create_team() {
    let (h, _) = Harness::manual();
    let err = h
        .platform
        .create_team(CreateTeam::new("payments"), &developer())
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::PermissionDenied(_)));
    assert!(h.platform.list_teams().await.unwrap().is_empty());
}

#[tokio::test]
async fn assign_unknown_team_is_not_found() {
    let (h, _) = Harness::manual();
    let (service, _) = h.service_with_tiers("api", &[]).await;
    let err = h
        .platform
        .assign_team(&service.id, &TeamId::generate(), &team_admin())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PlatformError::NotFound {
            kind: EntityKind::Team,
            ..
        }
    ));
}

// ---------------------------------------------------------------------------
// Environments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provision_dev_on_empty_service() {
    let (h, _) = Harness::manual();
    let (service, _) = h.service_with_tiers("api", &[]).await;

    let env = h
        .platform
        .provision_environment(
            &service.id,
            ProvisionEnvironment::new("dev", Tier::Dev),
            &team_admin(),
        )
        .await
        .unwrap();
    assert_eq!(env.service_id, service.id);

    let envs = h.platform.list_environments(&service.id).await.unwrap();
    assert_eq!(envs, vec![env.clone()]);

    let created = h
        .platform
        .audit_log(
            &AuditQuery::for_entity(EntityKind::Environment, env.id.to_string()),
            &team_admin(),
        )
        .await
        .unwrap();
    assert_eq!(created[0].metadata["tier"], "dev");
}

#[tokio::test]
async fn provision_prod_without_staging_is_blocked() {
    let (h, _) = Harness::manual();
    let (service, _) = h.service_with_tiers("api", &[Tier::Dev]).await;

    let err = h
        .platform
        .provision_environment(
            &service.id,
            ProvisionEnvironment::new("prod", Tier::Prod),
            &team_admin(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        reason(err),
        "Environment staging must exist before provisioning prod"
    );
    assert_eq!(h.platform.list_environments(&service.id).await.unwrap().len(), 1);

    let blocked = h
        .platform
        .audit_log(
            &AuditQuery::for_entity(EntityKind::Service, service.id.to_string())
                .with_action(AuditAction::GuardrailBlocked),
            &team_admin(),
        )
        .await
        .unwrap();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].metadata["tier"], "prod");
}

#[tokio::test]
async fn provision_with_secret_config_is_blocked() {
    let (h, _) = Harness::manual();
    let (service, _) = h.service_with_tiers("api", &[]).await;

    let err = h
        .platform
        .provision_environment(
            &service.id,
            ProvisionEnvironment::new("dev", Tier::Dev).with_config(config("SECRET")),
            &team_admin(),
        )
        .await
        .unwrap_err();
    assert_eq!(reason(err), "Restricted configuration key: SECRET");
}

#[tokio::test]
async fn provision_for_unknown_service_is_not_found() {
    let (h, _) = Harness::manual();
    let err = h
        .platform
        .provision_environment(
            &idp_types::ServiceId::generate(),
            ProvisionEnvironment::new("dev", Tier::Dev),
            &team_admin(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::NotFound { .. }));
}

#[tokio::test]
async fn developer_cannot_provision() {
    let (h, _) = Harness::manual();
    let (service, _) = h.service_with_tiers("api", &[]).await;
    let err = h
        .platform
        .provision_environment(
            &service.id,
            ProvisionEnvironment::new("dev", Tier::Dev),
            &developer(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::PermissionDenied(_)));
}

// ---------------------------------------------------------------------------
// Policies and audit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn policies_require_platform_admin_and_unique_names() {
    let (h, _) = Harness::manual();
    let request = CreatePolicy::new("baseline", config("max_replicas"));

    let err = h
        .platform
        .create_policy(request.clone(), &team_admin())
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::PermissionDenied(_)));

    let policy = h
        .platform
        .create_policy(request.clone(), &platform_admin())
        .await
        .unwrap();
    assert!(policy.enforced);

    let err = h
        .platform
        .create_policy(request, &platform_admin())
        .await
        .unwrap_err();
    assert_eq!(err, PlatformError::already_exists(EntityKind::Policy, "baseline"));

    let err = h
        .platform
        .create_policy(CreatePolicy::new("leaky", config("password")), &platform_admin())
        .await
        .unwrap_err();
    assert_eq!(reason(err), "Restricted configuration key: password");

    assert_eq!(h.platform.list_policies().await.unwrap(), vec![policy]);
}

#[tokio::test]
async fn audit_log_requires_admin_and_honours_limit() {
    let (h, _) = Harness::manual();
    h.service_with_tiers("api", &[Tier::Dev, Tier::Staging]).await;

    let err = h
        .platform
        .audit_log(&AuditQuery::new(), &developer())
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::PermissionDenied(_)));

    let all = h
        .platform
        .audit_log(&AuditQuery::new(), &team_admin())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    let latest = h
        .platform
        .audit_log(&AuditQuery::new().with_limit(1), &team_admin())
        .await
        .unwrap();
    assert_eq!(latest, vec![all[0].clone()]);
    assert_eq!(latest[0].metadata["tier"], "staging");
}
