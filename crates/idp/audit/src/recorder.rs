//! Audit recorder

use idp_store::{StoreResult, StoreTransaction};
use idp_types::{AuditAction, AuditLog, AuditQuery, ConfigMap, EntityKind};
use serde_json::Value;
use tracing::{info, warn};

/// Tracing target for audit events
pub const AUDIT_TARGET: &str = "idp::audit";

/// Build audit metadata from key/value pairs
pub fn metadata<I, K, V>(pairs: I) -> ConfigMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn emit(entry: &AuditLog) {
    match entry.action {
        AuditAction::GuardrailBlocked => warn!(
            target: AUDIT_TARGET,
            audit_id = %entry.id,
            action = %entry.action,
            entity_type = %entry.entity_type,
            entity_id = %entry.entity_id,
            performed_by = %entry.performed_by,
            "Guardrail blocked operation"
        ),
        _ => info!(
            target: AUDIT_TARGET,
            audit_id = %entry.id,
            action = %entry.action,
            entity_type = %entry.entity_type,
            entity_id = %entry.entity_id,
            performed_by = %entry.performed_by,
            "Audit entry recorded"
        ),
    }
}

/// Stages audit entries into store transactions
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditRecorder;

impl AuditRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Stage an audit entry into `tx` and return it
    ///
    /// The entry becomes visible only when `tx` commits through
    /// [`AuditRecorder::commit`].
    pub fn record(
        &self,
        tx: &mut dyn StoreTransaction,
        action: AuditAction,
        entity_type: EntityKind,
        entity_id: impl Into<String>,
        performed_by: &str,
        metadata: ConfigMap,
    ) -> AuditLog {
        let entry = AuditLog::new(action, entity_type, entity_id, performed_by, metadata);
        tx.append_audit(entry.clone());
        entry
    }

    /// Commit `tx` and emit its audit entries on [`AUDIT_TARGET`]
    ///
    /// Nothing is emitted when the commit fails. Returns the committed entries.
    pub async fn commit(&self, tx: Box<dyn StoreTransaction>) -> StoreResult<Vec<AuditLog>> {
        let entries = tx.staged_audit();
        tx.commit().await?;
        for entry in &entries {
            emit(entry);
        }
        Ok(entries)
    }

    /// Query committed audit entries, newest first
    pub async fn query(
        &self,
        tx: &dyn StoreTransaction,
        query: &AuditQuery,
    ) -> StoreResult<Vec<AuditLog>> {
        tx.list_audit(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idp_store::{EntityStore, InMemoryStore};
    use idp_types::{Service, TagMap};
    use std::sync::{Arc, Mutex};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Captures the entity ids of events on the audit target
    #[derive(Clone, Default)]
    struct AuditEvents(Arc<Mutex<Vec<String>>>);

    impl AuditEvents {
        fn count(&self) -> usize {
            self.0.lock().unwrap().len()
        }
    }

    impl<S: Subscriber> Layer<S> for AuditEvents {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if event.metadata().target() == AUDIT_TARGET {
                self.0
                    .lock()
                    .unwrap()
                    .push(event.metadata().level().to_string());
            }
        }
    }

    #[test]
    fn test_metadata_builder() {
        let meta = metadata([("version", "1.2.0")]);
        assert_eq!(meta.get("version"), Some(&Value::from("1.2.0")));

        let empty = metadata(Vec::<(String, Value)>::new());
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_record_is_staged_until_commit() {
        let store = InMemoryStore::new();
        let recorder = AuditRecorder::new();

        let mut tx = store.begin().await.unwrap();
        let entry = recorder.record(
            tx.as_mut(),
            AuditAction::Created,
            EntityKind::Team,
            "team-1",
            "alice",
            ConfigMap::new(),
        );
        assert_eq!(tx.pending(), 1);
        assert!(recorder
            .query(tx.as_ref(), &AuditQuery::new())
            .await
            .unwrap()
            .is_empty());
        let committed = recorder.commit(tx).await.unwrap();
        assert_eq!(committed, vec![entry.clone()]);

        let tx = store.begin().await.unwrap();
        let entries = recorder.query(tx.as_ref(), &AuditQuery::new()).await.unwrap();
        assert_eq!(entries, vec![entry]);
    }

    #[tokio::test]
    async fn test_uncommitted_record_is_discarded() {
        let store = InMemoryStore::new();
        let recorder = AuditRecorder::new();
        {
            let mut tx = store.begin().await.unwrap();
            recorder.record(
                tx.as_mut(),
                AuditAction::GuardrailBlocked,
                EntityKind::Service,
                "svc",
                "bob",
                metadata([("reason", "Missing mandatory tags: owner")]),
            );
        }

        let tx = store.begin().await.unwrap();
        assert!(tx.list_audit(&AuditQuery::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_filters_by_entity() {
        let store = InMemoryStore::new();
        let recorder = AuditRecorder::new();

        let mut tx = store.begin().await.unwrap();
        recorder.record(
            tx.as_mut(),
            AuditAction::Created,
            EntityKind::Service,
            "svc-a",
            "alice",
            ConfigMap::new(),
        );
        recorder.record(
            tx.as_mut(),
            AuditAction::Updated,
            EntityKind::Service,
            "svc-b",
            "alice",
            ConfigMap::new(),
        );
        recorder.commit(tx).await.unwrap();

        let tx = store.begin().await.unwrap();
        let entries = recorder
            .query(
                tx.as_ref(),
                &AuditQuery::for_entity(EntityKind::Service, "svc-b"),
            )
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Updated);
    }

    #[tokio::test]
    async fn test_events_emitted_only_after_successful_commit() {
        let events = AuditEvents::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(events.clone()));

        let store = InMemoryStore::new();
        let recorder = AuditRecorder::new();

        let mut tx = store.begin().await.unwrap();
        recorder.record(
            tx.as_mut(),
            AuditAction::Created,
            EntityKind::Service,
            "billing",
            "alice",
            ConfigMap::new(),
        );
        assert_eq!(events.count(), 0);
        tx.put_service(Service::new("billing", TagMap::new()));
        recorder.commit(tx).await.unwrap();
        assert_eq!(events.count(), 1);

        // Name conflict at commit: the staged entry is never persisted
        let mut tx = store.begin().await.unwrap();
        recorder.record(
            tx.as_mut(),
            AuditAction::Created,
            EntityKind::Service,
            "billing",
            "bob",
            ConfigMap::new(),
        );
        tx.put_service(Service::new("billing", TagMap::new()));
        assert!(recorder.commit(tx).await.is_err());
        assert_eq!(events.count(), 1);

        store.set_fail_commits(true);
        let mut tx = store.begin().await.unwrap();
        recorder.record(
            tx.as_mut(),
            AuditAction::GuardrailBlocked,
            EntityKind::Service,
            "billing",
            "bob",
            ConfigMap::new(),
        );
        assert!(recorder.commit(tx).await.is_err());
        assert_eq!(events.count(), 1);

        store.set_fail_commits(false);
        let mut tx = store.begin().await.unwrap();
        recorder.record(
            tx.as_mut(),
            AuditAction::GuardrailBlocked,
            EntityKind::Service,
            "billing",
            "bob",
            ConfigMap::new(),
        );
        recorder.commit(tx).await.unwrap();
        assert_eq!(*events.0.lock().unwrap(), vec!["INFO", "WARN"]);
    }
}
