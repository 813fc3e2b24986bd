//! In-memory store implementation
//!
//! The store keeps an immutable [`Tables`] snapshot behind a lock. A
//! transaction clones the snapshot handle on `begin`, so its reads never see
//! concurrent commits. `commit` takes the write lock, applies the staged
//! mutations to a copy of the latest tables and swaps the copy in only if
//! every constraint holds.
//!
//! Each table sits behind its own `Arc` and is copied only when a mutation
//! writes to it. The audit trail is a persistent list shared by every
//! snapshot, so appending never copies earlier entries.

use crate::error::{Constraint, StoreError, StoreResult};
use crate::traits::{EntityStore, Mutation, StoreTransaction};
use async_trait::async_trait;
use idp_types::{
    AuditLog, AuditLogId, AuditQuery, Deployment, DeploymentId, DeploymentKey, EntityKind,
    Environment, EnvironmentId, PlatformPolicy, PolicyId, Service, ServiceId, Team, TeamId,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

struct AuditNode {
    entry: AuditLog,
    prev: Option<Arc<AuditNode>>,
}

impl Drop for AuditNode {
    // Unlink iteratively; a long trail would overflow the stack otherwise.
    fn drop(&mut self) {
        let mut next = self.prev.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut node) => next = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

/// Append-only audit entries, newest at the head
#[derive(Clone, Default)]
struct AuditTrail {
    head: Option<Arc<AuditNode>>,
    len: usize,
}

impl AuditTrail {
    fn push(&mut self, entry: AuditLog) {
        let prev = self.head.take();
        self.head = Some(Arc::new(AuditNode { entry, prev }));
        self.len += 1;
    }

    fn newest_first(&self) -> impl Iterator<Item = &AuditLog> {
        std::iter::successors(self.head.as_deref(), |node| node.prev.as_deref())
            .map(|node| &node.entry)
    }
}

impl fmt::Debug for AuditTrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditTrail").field("len", &self.len).finish()
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    teams: Arc<HashMap<TeamId, Team>>,
    services: Arc<HashMap<ServiceId, Service>>,
    environments: Arc<HashMap<EnvironmentId, Environment>>,
    deployments: Arc<HashMap<DeploymentId, Deployment>>,
    policies: Arc<HashMap<PolicyId, PlatformPolicy>>,
    audit: AuditTrail,
}

impl Tables {
    fn apply(&mut self, mutation: Mutation) -> StoreResult<()> {
        match mutation {
            Mutation::PutTeam(team) => {
                if self
                    .teams
                    .values()
                    .any(|t| t.id != team.id && t.name == team.name)
                {
                    return Err(StoreError::Conflict(Constraint::TeamName(team.name)));
                }
                Arc::make_mut(&mut self.teams).insert(team.id, team);
            }
            Mutation::PutService(service) => {
                if self
                    .services
                    .values()
                    .any(|s| s.id != service.id && s.name == service.name)
                {
                    return Err(StoreError::Conflict(Constraint::ServiceName(service.name)));
                }
                if let Some(team_id) = service.team_id {
                    if !self.teams.contains_key(&team_id) {
                        return Err(StoreError::InvalidReference(format!(
                            "service {} references missing team {}",
                            service.id, team_id
                        )));
                    }
                }
                Arc::make_mut(&mut self.services).insert(service.id, service);
            }
            Mutation::PutEnvironment(environment) => {
                if !self.services.contains_key(&environment.service_id) {
                    return Err(StoreError::InvalidReference(format!(
                        "environment {} references missing service {}",
                        environment.id, environment.service_id
                    )));
                }
                Arc::make_mut(&mut self.environments).insert(environment.id, environment);
            }
            Mutation::PutDeployment(deployment) => {
                if !self.services.contains_key(&deployment.service_id) {
                    return Err(StoreError::InvalidReference(format!(
                        "deployment {} references missing service {}",
                        deployment.id, deployment.service_id
                    )));
                }
                match self.environments.get(&deployment.environment_id) {
                    Some(env) if env.service_id == deployment.service_id => {}
                    Some(env) => {
                        return Err(StoreError::InvalidReference(format!(
                            "environment {} belongs to service {}, not {}",
                            env.id, env.service_id, deployment.service_id
                        )));
                    }
                    None => {
                        return Err(StoreError::InvalidReference(format!(
                            "deployment {} references missing environment {}",
                            deployment.id, deployment.environment_id
                        )));
                    }
                }
                let key = deployment.key();
                if self
                    .deployments
                    .values()
                    .any(|d| d.id != deployment.id && d.key() == key)
                {
                    return Err(StoreError::Conflict(Constraint::DeploymentKey(key)));
                }
                Arc::make_mut(&mut self.deployments).insert(deployment.id, deployment);
            }
            Mutation::PutPolicy(policy) => {
                if self
                    .policies
                    .values()
                    .any(|p| p.id != policy.id && p.name == policy.name)
                {
                    return Err(StoreError::Conflict(Constraint::PolicyName(policy.name)));
                }
                Arc::make_mut(&mut self.policies).insert(policy.id, policy);
            }
            // Id uniqueness is checked by the caller against the store's id index.
            Mutation::AppendAudit(entry) => self.audit.push(entry),
            Mutation::DeleteTeam(id) => {
                if !self.teams.contains_key(&id) {
                    return Err(StoreError::not_found(EntityKind::Team, id));
                }
                Arc::make_mut(&mut self.teams).remove(&id);
                if self.services.values().any(|s| s.team_id == Some(id)) {
                    for service in Arc::make_mut(&mut self.services).values_mut() {
                        if service.team_id == Some(id) {
                            service.team_id = None;
                        }
                    }
                }
            }
            Mutation::DeleteService(id) => {
                if !self.services.contains_key(&id) {
                    return Err(StoreError::not_found(EntityKind::Service, id));
                }
                Arc::make_mut(&mut self.services).remove(&id);
                if self.environments.values().any(|e| e.service_id == id) {
                    Arc::make_mut(&mut self.environments).retain(|_, env| env.service_id != id);
                }
                if self.deployments.values().any(|d| d.service_id == id) {
                    Arc::make_mut(&mut self.deployments).retain(|_, d| d.service_id != id);
                }
            }
        }
        Ok(())
    }
}

/// Latest committed tables plus the index of every committed audit id
#[derive(Debug, Default)]
struct StoreState {
    tables: Arc<Tables>,
    audit_ids: HashSet<AuditLogId>,
}

/// In-memory store for development and testing
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
    fail_commits: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent commit fail with [`StoreError::Storage`]
    ///
    /// Used to exercise storage-failure paths in tests.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let snapshot = self.state.read().await.tables.clone();
        Ok(Box::new(MemoryTransaction {
            snapshot,
            staged: Vec::new(),
            state: self.state.clone(),
            fail_commits: self.fail_commits.clone(),
        }))
    }
}

/// Transaction over an [`InMemoryStore`] snapshot
#[derive(Debug)]
pub struct MemoryTransaction {
    snapshot: Arc<Tables>,
    staged: Vec<Mutation>,
    state: Arc<RwLock<StoreState>>,
    fail_commits: Arc<AtomicBool>,
}

fn sorted_by_creation<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(key);
    items
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn get_team(&self, id: &TeamId) -> StoreResult<Option<Team>> {
        Ok(self.snapshot.teams.get(id).cloned())
    }

    async fn find_team_by_name(&self, name: &str) -> StoreResult<Option<Team>> {
        Ok(self
            .snapshot
            .teams
            .values()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        Ok(sorted_by_creation(
            self.snapshot.teams.values().cloned().collect(),
            |t| (t.created_at, t.name.clone()),
        ))
    }

    async fn get_service(&self, id: &ServiceId) -> StoreResult<Option<Service>> {
        Ok(self.snapshot.services.get(id).cloned())
    }

    async fn find_service_by_name(&self, name: &str) -> StoreResult<Option<Service>> {
        Ok(self
            .snapshot
            .services
            .values()
            .find(|s| s.name == name)
            .cloned())
    }

    async fn list_services(&self) -> StoreResult<Vec<Service>> {
        Ok(sorted_by_creation(
            self.snapshot.services.values().cloned().collect(),
            |s| (s.created_at, s.name.clone()),
        ))
    }

    async fn get_environment(&self, id: &EnvironmentId) -> StoreResult<Option<Environment>> {
        Ok(self.snapshot.environments.get(id).cloned())
    }

    async fn list_environments(&self, service_id: &ServiceId) -> StoreResult<Vec<Environment>> {
        Ok(sorted_by_creation(
            self.snapshot
                .environments
                .values()
                .filter(|e| &e.service_id == service_id)
                .cloned()
                .collect(),
            |e| (e.created_at, e.tier),
        ))
    }

    async fn get_deployment(&self, id: &DeploymentId) -> StoreResult<Option<Deployment>> {
        Ok(self.snapshot.deployments.get(id).cloned())
    }

    async fn find_deployment(&self, key: &DeploymentKey) -> StoreResult<Option<Deployment>> {
        Ok(self
            .snapshot
            .deployments
            .values()
            .find(|d| {
                d.service_id == key.service_id
                    && d.environment_id == key.environment_id
                    && d.version == key.version
            })
            .cloned())
    }

    async fn list_deployments(&self, service_id: &ServiceId) -> StoreResult<Vec<Deployment>> {
        Ok(sorted_by_creation(
            self.snapshot
                .deployments
                .values()
                .filter(|d| &d.service_id == service_id)
                .cloned()
                .collect(),
            |d| (d.created_at, d.id),
        ))
    }

    async fn find_policy_by_name(&self, name: &str) -> StoreResult<Option<PlatformPolicy>> {
        Ok(self
            .snapshot
            .policies
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn list_policies(&self) -> StoreResult<Vec<PlatformPolicy>> {
        Ok(sorted_by_creation(
            self.snapshot.policies.values().cloned().collect(),
            |p| (p.created_at, p.name.clone()),
        ))
    }

    async fn list_audit(&self, query: &AuditQuery) -> StoreResult<Vec<AuditLog>> {
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(self
            .snapshot
            .audit
            .newest_first()
            .filter(|entry| query.matches(entry))
            .take(limit)
            .cloned()
            .collect())
    }

    fn stage(&mut self, mutation: Mutation) {
        self.staged.push(mutation);
    }

    fn pending(&self) -> usize {
        self.staged.len()
    }

    fn staged_audit(&self) -> Vec<AuditLog> {
        self.staged
            .iter()
            .filter_map(|mutation| match mutation {
                Mutation::AppendAudit(entry) => Some(entry.clone()),
                _ => None,
            })
            .collect()
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction {
            staged,
            state,
            fail_commits,
            ..
        } = *self;

        if staged.is_empty() {
            return Ok(());
        }
        if fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Storage("commit rejected by store".into()));
        }

        let mut state = state.write().await;

        let mut appended = HashSet::new();
        for mutation in &staged {
            if let Mutation::AppendAudit(entry) = mutation {
                if state.audit_ids.contains(&entry.id) || !appended.insert(entry.id) {
                    return Err(StoreError::ImmutableAudit(entry.id));
                }
            }
        }

        let mut next = Tables::clone(&state.tables);
        let count = staged.len();
        for mutation in staged {
            next.apply(mutation)?;
        }
        state.tables = Arc::new(next);
        state.audit_ids.extend(appended);

        debug!(mutations = count, "committed transaction");
        Ok(())
    }
}
