use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::resource::ResourceId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditCategory {
    Permission,
    Workflow,
    Persistence,
    System,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Rejected,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub resource_id: Option<ResourceId>,
    pub correlation_id: String,
    pub actor: String,
}

impl AuditContext {
    pub fn new(
        resource_id: Option<ResourceId>,
        correlation_id: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self { resource_id, correlation_id: correlation_id.into(), actor: actor.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub resource_id: Option<ResourceId>,
    pub correlation_id: String,
    pub event_type: String,
    pub category: AuditCategory,
    pub actor: String,
    pub outcome: AuditOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        context: &AuditContext,
        event_type: impl Into<String>,
        category: AuditCategory,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            resource_id: context.resource_id.clone(),
            correlation_id: context.correlation_id.clone(),
            event_type: event_type.into(),
            category,
            actor: context.actor.clone(),
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Discards events. Used when auditing is switched off in configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn emit(&self, _event: AuditEvent) {}
}

/// Forwards only successful events to the inner sink.
#[derive(Clone, Debug, Default)]
pub struct SuccessOnlyAuditSink<S> {
    inner: S,
}

impl<S> SuccessOnlyAuditSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: AuditSink> AuditSink for SuccessOnlyAuditSink<S> {
    fn emit(&self, event: AuditEvent) {
        if event.outcome == AuditOutcome::Success {
            self.inner.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        audit::{
            AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink,
            NoopAuditSink, SuccessOnlyAuditSink,
        },
        domain::resource::ResourceId,
    };

    #[test]
    fn in_memory_sink_records_events_with_correlation_fields() {
        let sink = InMemoryAuditSink::default();
        let context =
            AuditContext::new(Some(ResourceId("P-2026-0042".to_owned())), "req-123", "u-sub");
        sink.emit(
            AuditEvent::new(
                &context,
                "workflow.transition_applied",
                AuditCategory::Workflow,
                AuditOutcome::Success,
            )
            .with_metadata("from", "SUBMITTED")
            .with_metadata("to", "SUB_PMO_APPROVED"),
        );

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].correlation_id, "req-123");
        assert_eq!(events[0].actor, "u-sub");
        assert_eq!(events[0].resource_id.as_ref().map(|id| id.0.as_str()), Some("P-2026-0042"));
        assert_eq!(events[0].metadata.get("to").map(String::as_str), Some("SUB_PMO_APPROVED"));
    }

    #[test]
    fn noop_sink_accepts_events() {
        let context = AuditContext::new(None, "req-1", "u-1");
        NoopAuditSink.emit(AuditEvent::new(
            &context,
            "system.noop",
            AuditCategory::System,
            AuditOutcome::Success,
        ));
    }

    #[test]
    fn success_only_sink_drops_rejections_and_failures() {
        let sink = SuccessOnlyAuditSink::new(InMemoryAuditSink::default());
        let context = AuditContext::new(None, "req-7", "u-dev");

        for outcome in [AuditOutcome::Rejected, AuditOutcome::Failed, AuditOutcome::Success] {
            sink.emit(AuditEvent::new(
                &context,
                "workflow.permission_denied",
                AuditCategory::Permission,
                outcome,
            ));
        }

        let events = sink.inner().events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, AuditOutcome::Success);
    }
}
