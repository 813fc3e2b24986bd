//! Store trait definitions

use crate::error::StoreResult;
use async_trait::async_trait;
use idp_types::{
    AuditLog, AuditQuery, Deployment, DeploymentId, DeploymentKey, Environment, EnvironmentId,
    PlatformPolicy, Service, ServiceId, Team, TeamId,
};

/// Entry point of the persistence layer
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Open a transaction over a consistent snapshot
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;
}

/// Staged write applied on commit
#[derive(Debug, Clone)]
pub enum Mutation {
    PutTeam(Team),
    PutService(Service),
    PutEnvironment(Environment),
    PutDeployment(Deployment),
    PutPolicy(PlatformPolicy),
    /// Append-only; fails on commit if the entry id already exists
    AppendAudit(AuditLog),
    /// Removes the team; its services become unowned
    DeleteTeam(TeamId),
    /// Removes the service with its environments and deployments
    DeleteService(ServiceId),
}

/// A unit of work: snapshot reads plus staged writes
///
/// Dropping a transaction without committing discards its staged writes.
#[async_trait]
pub trait StoreTransaction: Send + Sync {
    async fn get_team(&self, id: &TeamId) -> StoreResult<Option<Team>>;

    async fn find_team_by_name(&self, name: &str) -> StoreResult<Option<Team>>;

    async fn list_teams(&self) -> StoreResult<Vec<Team>>;

    async fn get_service(&self, id: &ServiceId) -> StoreResult<Option<Service>>;

    async fn find_service_by_name(&self, name: &str) -> StoreResult<Option<Service>>;

    async fn list_services(&self) -> StoreResult<Vec<Service>>;

    async fn get_environment(&self, id: &EnvironmentId) -> StoreResult<Option<Environment>>;

    /// Environments of a service, oldest first
    async fn list_environments(&self, service_id: &ServiceId) -> StoreResult<Vec<Environment>>;

    async fn get_deployment(&self, id: &DeploymentId) -> StoreResult<Option<Deployment>>;

    /// Look up a deployment by its idempotence key
    async fn find_deployment(&self, key: &DeploymentKey) -> StoreResult<Option<Deployment>>;

    /// Deployments of a service, oldest first
    async fn list_deployments(&self, service_id: &ServiceId) -> StoreResult<Vec<Deployment>>;

    async fn find_policy_by_name(&self, name: &str) -> StoreResult<Option<PlatformPolicy>>;

    async fn list_policies(&self) -> StoreResult<Vec<PlatformPolicy>>;

    /// Audit entries matching `query`, newest first
    async fn list_audit(&self, query: &AuditQuery) -> StoreResult<Vec<AuditLog>>;

    /// Stage a write
    fn stage(&mut self, mutation: Mutation);

    /// Number of staged writes
    fn pending(&self) -> usize;

    /// Audit entries staged in this transaction, in staging order
    fn staged_audit(&self) -> Vec<AuditLog>;

    /// Apply every staged write atomically
    async fn commit(self: Box<Self>) -> StoreResult<()>;

    fn put_team(&mut self, team: Team) {
        self.stage(Mutation::PutTeam(team));
    }

    fn put_service(&mut self, service: Service) {
        self.stage(Mutation::PutService(service));
    }

    fn put_environment(&mut self, environment: Environment) {
        self.stage(Mutation::PutEnvironment(environment));
    }

    fn put_deployment(&mut self, deployment: Deployment) {
        self.stage(Mutation::PutDeployment(deployment));
    }

    fn put_policy(&mut self, policy: PlatformPolicy) {
        self.stage(Mutation::PutPolicy(policy));
    }

    fn append_audit(&mut self, entry: AuditLog) {
        self.stage(Mutation::AppendAudit(entry));
    }
}
