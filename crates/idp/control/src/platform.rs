//! Team, service, environment, policy and audit operations

use crate::access::{authorize, Operation};
use crate::context::PlatformContext;
use crate::error::{PlatformError, Result};
use crate::requests::{CreatePolicy, CreateTeam, ProvisionEnvironment, RegisterService, UpdateService};
use idp_audit::metadata;
use idp_store::Mutation;
use idp_types::{
    Actor, AuditAction, AuditLog, AuditQuery, ConfigMap, EntityKind, Environment, PlatformPolicy,
    Service, ServiceId, Team, TeamId,
};
use serde_json::Value;
use tracing::{info, instrument};

/// Catalog and environment operations of the platform
#[derive(Debug, Clone)]
pub struct PlatformService {
    ctx: PlatformContext,
}

impl PlatformService {
    pub fn new(ctx: PlatformContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &PlatformContext {
        &self.ctx
    }

    // ========== Teams ==========

    #[instrument(skip(self, request, actor), fields(team = %request.name, actor = %actor.identity))]
    pub async fn create_team(&self, request: CreateTeam, actor: &Actor) -> Result<Team> {
        authorize(actor, Operation::CreateTeam)?;
        request.validate()?;

        let mut tx = self.ctx.begin().await?;
        if tx.find_team_by_name(&request.name).await?.is_some() {
            return Err(PlatformError::already_exists(EntityKind::Team, request.name));
        }

        let team = Team::new(request.name, request.description);
        tx.put_team(team.clone());
        self.ctx.audit.record(
            tx.as_mut(),
            AuditAction::Created,
            EntityKind::Team,
            team.id.to_string(),
            &actor.identity,
            metadata([("name", team.name.as_str())]),
        );
        self.ctx.audit.commit(tx).await?;

        info!(team_id = %team.id, "Team created");
        Ok(team)
    }

    pub async fn list_teams(&self) -> Result<Vec<Team>> {
        let tx = self.ctx.begin().await?;
        Ok(tx.list_teams().await?)
    }

    pub async fn get_team(&self, id: &TeamId) -> Result<Team> {
        let tx = self.ctx.begin().await?;
        tx.get_team(id)
            .await?
            .ok_or_else(|| PlatformError::not_found(EntityKind::Team, id))
    }

    /// Delete a team; services it owned become unowned
    #[instrument(skip(self, actor), fields(team_id = %id, actor = %actor.identity))]
    pub async fn delete_team(&self, id: &TeamId, actor: &Actor) -> Result<()> {
        authorize(actor, Operation::DeleteTeam)?;

        let mut tx = self.ctx.begin().await?;
        let team = tx
            .get_team(id)
            .await?
            .ok_or_else(|| PlatformError::not_found(EntityKind::Team, id))?;

        tx.stage(Mutation::DeleteTeam(team.id));
        self.ctx.audit.record(
            tx.as_mut(),
            AuditAction::Deleted,
            EntityKind::Team,
            team.id.to_string(),
            &actor.identity,
            metadata([("name", team.name.as_str())]),
        );
        self.ctx.audit.commit(tx).await?;

        info!("Team deleted");
        Ok(())
    }

    // ========== Services ==========

    /// Register a service after checking its tags and configuration
    #[instrument(skip(self, request, actor), fields(service = %request.name, actor = %actor.identity))]
    pub async fn register_service(
        &self,
        request: RegisterService,
        actor: &Actor,
    ) -> Result<Service> {
        authorize(actor, Operation::RegisterService)?;
        request.validate()?;

        let mut tx = self.ctx.begin().await?;
        if tx.find_service_by_name(&request.name).await?.is_some() {
            return Err(PlatformError::already_exists(
                EntityKind::Service,
                request.name,
            ));
        }

        let service = Service::new(request.name, request.tags)
            .with_description(request.description)
            .with_config(request.config);
        self.ctx.guardrails.enforce_service(&service)?;

        tx.put_service(service.clone());
        self.ctx.audit.record(
            tx.as_mut(),
            AuditAction::Created,
            EntityKind::Service,
            service.id.to_string(),
            &actor.identity,
            metadata([("name", service.name.as_str())]),
        );
        self.ctx.audit.commit(tx).await?;

        info!(service_id = %service.id, "Service registered");
        Ok(service)
    }

    pub async fn list_services(&self) -> Result<Vec<Service>> {
        let tx = self.ctx.begin().await?;
        Ok(tx.list_services().await?)
    }

    pub async fn get_service(&self, id: &ServiceId) -> Result<Service> {
        let tx = self.ctx.begin().await?;
        tx.get_service(id)
            .await?
            .ok_or_else(|| PlatformError::not_found(EntityKind::Service, id))
    }

    /// Apply a partial update
    ///
    /// New tags and configuration go through the same guardrails as
    /// registration. A rejection is audited against the service.
    #[instrument(skip(self, update, actor), fields(service_id = %id, actor = %actor.identity))]
    pub async fn update_service(
        &self,
        id: &ServiceId,
        update: UpdateService,
        actor: &Actor,
    ) -> Result<Service> {
        authorize(actor, Operation::UpdateService)?;

        let mut tx = self.ctx.begin().await?;
        let mut service = tx
            .get_service(id)
            .await?
            .ok_or_else(|| PlatformError::not_found(EntityKind::Service, id))?;

        let checked = match &update.tags {
            Some(tags) => self.ctx.guardrails.validate_service_tags(tags),
            None => Ok(()),
        }
        .and_then(|()| match &update.config {
            Some(config) => self.ctx.guardrails.validate_config(config),
            None => Ok(()),
        });
        if let Err(violation) = checked {
            drop(tx);
            return Err(self
                .ctx
                .reject(
                    EntityKind::Service,
                    service.id,
                    actor,
                    violation,
                    ConfigMap::new(),
                )
                .await);
        }

        if let Some(team_id) = update.team_id {
            if tx.get_team(&team_id).await?.is_none() {
                return Err(PlatformError::not_found(EntityKind::Team, team_id));
            }
        }

        let fields: Vec<Value> = update.fields().into_iter().map(Value::from).collect();
        if let Some(description) = update.description {
            service.description = Some(description);
        }
        if let Some(tags) = update.tags {
            service.tags = tags;
        }
        if let Some(config) = update.config {
            service.config = config;
        }
        if let Some(team_id) = update.team_id {
            service.team_id = Some(team_id);
        }

        tx.put_service(service.clone());
        self.ctx.audit.record(
            tx.as_mut(),
            AuditAction::Updated,
            EntityKind::Service,
            service.id.to_string(),
            &actor.identity,
            metadata([("updated", fields)]),
        );
        self.ctx.audit.commit(tx).await?;

        info!("Service updated");
        Ok(service)
    }

    #[instrument(skip(self, actor), fields(service_id = %service_id, team_id = %team_id, actor = %actor.identity))]
    pub async fn assign_team(
        &self,
        service_id: &ServiceId,
        team_id: &TeamId,
        actor: &Actor,
    ) -> Result<Service> {
        authorize(actor, Operation::AssignTeam)?;

        let mut tx = self.ctx.begin().await?;
        let mut service = tx
            .get_service(service_id)
            .await?
            .ok_or_else(|| PlatformError::not_found(EntityKind::Service, service_id))?;
        let team = tx
            .get_team(team_id)
            .await?
            .ok_or_else(|| PlatformError::not_found(EntityKind::Team, team_id))?;

        service.team_id = Some(team.id);
        tx.put_service(service.clone());
        self.ctx.audit.record(
            tx.as_mut(),
            AuditAction::Updated,
            EntityKind::Service,
            service.id.to_string(),
            &actor.identity,
            metadata([("team_id", team.id.to_string())]),
        );
        self.ctx.audit.commit(tx).await?;

        info!("Team assigned");
        Ok(service)
    }

    /// Delete a service with its environments and deployments
    ///
    /// Audit entries about the service are retained.
    #[instrument(skip(self, actor), fields(service_id = %id, actor = %actor.identity))]
    pub async fn delete_service(&self, id: &ServiceId, actor: &Actor) -> Result<()> {
        authorize(actor, Operation::DeleteService)?;

        let mut tx = self.ctx.begin().await?;
        let service = tx
            .get_service(id)
            .await?
            .ok_or_else(|| PlatformError::not_found(EntityKind::Service, id))?;

        tx.stage(Mutation::DeleteService(service.id));
        self.ctx.audit.record(
            tx.as_mut(),
            AuditAction::Deleted,
            EntityKind::Service,
            service.id.to_string(),
            &actor.identity,
            metadata([("name", service.name.as_str())]),
        );
        self.ctx.audit.commit(tx).await?;

        info!("Service deleted");
        Ok(())
    }

    // ========== Environments ==========

    /// Provision an environment for a service
    ///
    /// Checks run in order: service tags, tier promotion, environment
    /// configuration. The first violation is audited against the service
    /// and returned.
    #[instrument(skip(self, request, actor), fields(service_id = %service_id, tier = %request.tier, actor = %actor.identity))]
    pub async fn provision_environment(
        &self,
        service_id: &ServiceId,
        request: ProvisionEnvironment,
        actor: &Actor,
    ) -> Result<Environment> {
        authorize(actor, Operation::ProvisionEnvironment)?;
        request.validate()?;

        let mut tx = self.ctx.begin().await?;
        let service = tx
            .get_service(service_id)
            .await?
            .ok_or_else(|| PlatformError::not_found(EntityKind::Service, service_id))?;
        let existing: Vec<&'static str> = tx
            .list_environments(&service.id)
            .await?
            .iter()
            .map(|env| env.tier.as_str())
            .collect();

        let guardrails = &self.ctx.guardrails;
        let checked = guardrails
            .validate_service_tags(&service.tags)
            .and_then(|()| guardrails.validate_environment_promotion(&existing, request.tier))
            .and_then(|()| guardrails.validate_config(&request.config));
        if let Err(violation) = checked {
            drop(tx);
            return Err(self
                .ctx
                .reject(
                    EntityKind::Service,
                    service.id,
                    actor,
                    violation,
                    metadata([("tier", request.tier.as_str())]),
                )
                .await);
        }

        let environment =
            Environment::new(service.id, request.name, request.tier, request.config);
        tx.put_environment(environment.clone());
        self.ctx.audit.record(
            tx.as_mut(),
            AuditAction::Created,
            EntityKind::Environment,
            environment.id.to_string(),
            &actor.identity,
            metadata([("tier", environment.tier.as_str())]),
        );
        self.ctx.audit.commit(tx).await?;

        info!(environment_id = %environment.id, "Environment provisioned");
        Ok(environment)
    }

    pub async fn list_environments(&self, service_id: &ServiceId) -> Result<Vec<Environment>> {
        let tx = self.ctx.begin().await?;
        if tx.get_service(service_id).await?.is_none() {
            return Err(PlatformError::not_found(EntityKind::Service, service_id));
        }
        Ok(tx.list_environments(service_id).await?)
    }

    // ========== Policies ==========

    #[instrument(skip(self, request, actor), fields(policy = %request.name, actor = %actor.identity))]
    pub async fn create_policy(
        &self,
        request: CreatePolicy,
        actor: &Actor,
    ) -> Result<PlatformPolicy> {
        authorize(actor, Operation::ManagePolicies)?;
        request.validate()?;

        let mut tx = self.ctx.begin().await?;
        if tx.find_policy_by_name(&request.name).await?.is_some() {
            return Err(PlatformError::already_exists(EntityKind::Policy, request.name));
        }
        self.ctx.guardrails.validate_config(&request.config)?;

        let policy = PlatformPolicy::new(request.name, request.description, request.config)
            .with_enforced(request.enforced);
        tx.put_policy(policy.clone());
        self.ctx.audit.record(
            tx.as_mut(),
            AuditAction::Created,
            EntityKind::Policy,
            policy.id.to_string(),
            &actor.identity,
            metadata([("name", policy.name.as_str())]),
        );
        self.ctx.audit.commit(tx).await?;

        info!(policy_id = %policy.id, "Policy created");
        Ok(policy)
    }

    pub async fn list_policies(&self) -> Result<Vec<PlatformPolicy>> {
        let tx = self.ctx.begin().await?;
        Ok(tx.list_policies().await?)
    }

    // ========== Audit ==========

    /// Audit entries matching `query`, newest first
    pub async fn audit_log(&self, query: &AuditQuery, actor: &Actor) -> Result<Vec<AuditLog>> {
        authorize(actor, Operation::ReadAuditLog)?;
        let tx = self.ctx.begin().await?;
        Ok(self.ctx.audit.query(tx.as_ref(), query).await?)
    }
}
