//! Audit log records
//!
//! Audit entries are append-only: once written they are never edited or
//! deleted, including when the entity they describe is deleted.

use crate::{AuditLogId, ConfigMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of action an audit entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    /// A guardrail rejected the operation before any state change
    GuardrailBlocked,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Updated => "updated",
            AuditAction::Deleted => "deleted",
            AuditAction::GuardrailBlocked => "guardrail_blocked",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity type referenced by an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Team,
    Service,
    Environment,
    Deployment,
    Policy,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Team => "team",
            EntityKind::Service => "service",
            EntityKind::Environment => "environment",
            EntityKind::Deployment => "deployment",
            EntityKind::Policy => "policy",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of a state-changing or rejected action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: AuditLogId,
    pub action: AuditAction,
    pub entity_type: EntityKind,
    pub entity_id: String,
    /// Identity of the actor that performed the action
    pub performed_by: String,
    #[serde(default)]
    pub metadata: ConfigMap,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(
        action: AuditAction,
        entity_type: EntityKind,
        entity_id: impl Into<String>,
        performed_by: impl Into<String>,
        metadata: ConfigMap,
    ) -> Self {
        Self {
            id: AuditLogId::generate(),
            action,
            entity_type,
            entity_id: entity_id.into(),
            performed_by: performed_by.into(),
            metadata,
            created_at: Utc::now(),
        }
    }
}

/// Filter for audit log queries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    pub entity_type: Option<EntityKind>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub action: Option<AuditAction>,
    /// Maximum number of entries, newest first
    #[serde(default)]
    pub limit: Option<usize>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_entity(entity_type: EntityKind, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type),
            entity_id: Some(entity_id.into()),
            ..Default::default()
        }
    }

    pub fn with_action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, entry: &AuditLog) -> bool {
        self.entity_type.map_or(true, |t| t == entry.entity_type)
            && self
                .entity_id
                .as_deref()
                .map_or(true, |id| id == entry.entity_id)
            && self.action.map_or(true, |a| a == entry.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serializes_snake_case() {
        let json = serde_json::to_string(&AuditAction::GuardrailBlocked).unwrap();
        assert_eq!(json, "\"guardrail_blocked\"");
    }

    #[test]
    fn test_query_matching() {
        let entry = AuditLog::new(
            AuditAction::Created,
            EntityKind::Service,
            "svc-1",
            "alice",
            ConfigMap::new(),
        );

        assert!(AuditQuery::new().matches(&entry));
        assert!(AuditQuery::for_entity(EntityKind::Service, "svc-1").matches(&entry));
        assert!(!AuditQuery::for_entity(EntityKind::Service, "svc-2").matches(&entry));
        assert!(!AuditQuery::new()
            .with_action(AuditAction::Deleted)
            .matches(&entry));
    }
}
