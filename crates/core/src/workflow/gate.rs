use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::actor::{Actor, UserId};
use crate::domain::approval::{ApprovalStatus, WorkflowAction};
use crate::domain::resource::{ResourceContext, ResourceId};
use crate::permissions::{Permission, PermissionFailure, RoleCapabilityEngine};
use crate::store::{ApprovalRecordStore, ProjectApprovalRecord, StoreError};
use crate::workflow::machine::{
    ApprovalWorkflow, IllegalTransition, TwoTierReview, WorkflowDefinition,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: ApprovalStatus,
    pub to: ApprovalStatus,
    pub action: WorkflowAction,
    pub actor_id: UserId,
    pub resource_id: Option<ResourceId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("permission denied for `{permission}`: {reason}")]
    PermissionDenied {
        permission: Permission,
        reason: String,
        failure: Option<PermissionFailure>,
    },
    #[error("resource carries no approval status")]
    MissingApprovalStatus,
    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The permission that must hold before a workflow action is attempted.
pub fn required_permission(action: WorkflowAction) -> Permission {
    match action {
        WorkflowAction::Submit => Permission::SubmitProject,
        WorkflowAction::Approve => Permission::ApproveProject,
        WorkflowAction::Reject => Permission::RejectProject,
        WorkflowAction::RequestChanges => Permission::RequestChanges,
    }
}

/// Checks capability first, then asks the workflow for the successor state.
#[derive(Clone, Debug)]
pub struct ApprovalGate<D = TwoTierReview> {
    capabilities: RoleCapabilityEngine,
    workflow: ApprovalWorkflow<D>,
    enforce_version_check: bool,
}

impl<D> ApprovalGate<D>
where
    D: WorkflowDefinition,
{
    pub fn new(capabilities: RoleCapabilityEngine, workflow: ApprovalWorkflow<D>) -> Self {
        Self { capabilities, workflow, enforce_version_check: true }
    }

    /// When disabled, store writes skip the version comparison (last write wins).
    pub fn with_version_check(mut self, enforce: bool) -> Self {
        self.enforce_version_check = enforce;
        self
    }

    pub fn authorize(
        &self,
        actor: &Actor,
        context: &ResourceContext,
        action: WorkflowAction,
    ) -> Result<TransitionOutcome, GateError> {
        let permission = required_permission(action);
        let decision = self.capabilities.decide(permission, actor, Some(context));
        if !decision.allowed {
            return Err(GateError::PermissionDenied {
                permission,
                reason: decision.reason,
                failure: decision.failure,
            });
        }

        let from = context.current_approval_status.ok_or(GateError::MissingApprovalStatus)?;
        let Some(role) = actor.role else {
            return Err(GateError::PermissionDenied {
                permission,
                reason: "actor has no resolved role".to_owned(),
                failure: Some(PermissionFailure::MissingRole),
            });
        };
        let to = self.workflow.next_state(from, role, action)?;

        Ok(TransitionOutcome {
            from,
            to,
            action,
            actor_id: actor.user_id.clone(),
            resource_id: context.resource_id.clone(),
            occurred_at: Utc::now(),
        })
    }

    pub fn authorize_with_audit<S>(
        &self,
        actor: &Actor,
        context: &ResourceContext,
        action: WorkflowAction,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, GateError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.authorize(actor, context, action);
        let from = context
            .current_approval_status
            .map(|status| status.to_string())
            .unwrap_or_else(|| "unknown".to_owned());

        match &result {
            Ok(outcome) => {
                tracing::info!(
                    event_name = "workflow.transition_applied",
                    correlation_id = %audit.correlation_id,
                    actor_id = %outcome.actor_id,
                    resource_id = ?outcome.resource_id,
                    from = %outcome.from,
                    to = %outcome.to,
                    action = %outcome.action,
                    "approval transition applied"
                );
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "workflow.transition_applied",
                        AuditCategory::Workflow,
                        AuditOutcome::Success,
                    )
                    .at(outcome.occurred_at)
                    .with_metadata("actor_id", outcome.actor_id.to_string())
                    .with_metadata("from", outcome.from.to_string())
                    .with_metadata("to", outcome.to.to_string())
                    .with_metadata("action", outcome.action.to_string()),
                );
            }
            Err(GateError::PermissionDenied { permission, reason, .. }) => {
                tracing::warn!(
                    event_name = "workflow.permission_denied",
                    correlation_id = %audit.correlation_id,
                    actor_id = %actor.user_id,
                    resource_id = ?context.resource_id,
                    permission = %permission,
                    action = %action,
                    "{reason}"
                );
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "workflow.permission_denied",
                        AuditCategory::Permission,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("actor_id", actor.user_id.to_string())
                    .with_metadata("permission", permission.to_string())
                    .with_metadata("from", from)
                    .with_metadata("action", action.to_string())
                    .with_metadata("reason", reason.clone()),
                );
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "workflow.transition_rejected",
                    correlation_id = %audit.correlation_id,
                    actor_id = %actor.user_id,
                    resource_id = ?context.resource_id,
                    action = %action,
                    "{error}"
                );
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "workflow.transition_rejected",
                        AuditCategory::Workflow,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("actor_id", actor.user_id.to_string())
                    .with_metadata("from", from)
                    .with_metadata("action", action.to_string())
                    .with_metadata("error", error.to_string()),
                );
            }
        }

        result
    }

    /// Loads the project's record, authorizes the action and commits the new status.
    ///
    /// `expected_version` is the version the caller last read. It is ignored when
    /// version checking is disabled.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_to_store<R, S>(
        &self,
        store: &R,
        actor: &Actor,
        project_id: &ResourceId,
        action: WorkflowAction,
        expected_version: u64,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<ProjectApprovalRecord, GateError>
    where
        R: ApprovalRecordStore + ?Sized,
        S: AuditSink + ?Sized,
    {
        let record =
            store.load(project_id)?.ok_or_else(|| StoreError::NotFound(project_id.clone()))?;

        if self.enforce_version_check && expected_version != record.version {
            let error = StoreError::VersionConflict {
                project_id: project_id.clone(),
                expected: expected_version,
                actual: record.version,
            };
            emit_store_failure(sink, audit, actor, action, &error);
            return Err(error.into());
        }

        let outcome = self.authorize_with_audit(
            actor,
            &record.resource_context(),
            action,
            sink,
            audit,
        )?;

        let committed = if self.enforce_version_check {
            store.compare_and_swap(project_id, expected_version, outcome.to)
        } else {
            store.overwrite_status(project_id, outcome.to)
        };
        committed.map_err(|error| {
            emit_store_failure(sink, audit, actor, action, &error);
            GateError::from(error)
        })
    }
}

impl Default for ApprovalGate<TwoTierReview> {
    fn default() -> Self {
        Self::new(RoleCapabilityEngine::new(), ApprovalWorkflow::default())
    }
}

fn emit_store_failure<S>(
    sink: &S,
    audit: &AuditContext,
    actor: &Actor,
    action: WorkflowAction,
    error: &StoreError,
) where
    S: AuditSink + ?Sized,
{
    tracing::warn!(
        event_name = "workflow.commit_failed",
        correlation_id = %audit.correlation_id,
        actor_id = %actor.user_id,
        action = %action,
        "{error}"
    );
    sink.emit(
        AuditEvent::new(
            audit,
            "workflow.commit_failed",
            AuditCategory::Persistence,
            AuditOutcome::Failed,
        )
        .with_metadata("actor_id", actor.user_id.to_string())
        .with_metadata("action", action.to_string())
        .with_metadata("error", error.to_string()),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::audit::{AuditContext, AuditOutcome, InMemoryAuditSink};
    use crate::domain::actor::{Actor, Role};
    use crate::domain::approval::{ApprovalStatus, WorkflowAction};
    use crate::domain::resource::{ResourceContext, ResourceId};
    use crate::permissions::{Permission, PermissionFailure};
    use crate::store::{
        ApprovalRecordStore, InMemoryApprovalRecordStore, ProjectApprovalRecord, StoreError,
    };
    use crate::workflow::gate::{ApprovalGate, GateError};
    use crate::workflow::machine::IllegalTransition;

    fn audit(actor: &Actor) -> AuditContext {
        AuditContext::new(Some(ResourceId("P-7".to_owned())), "req-gate", actor.user_id.0.clone())
    }

    fn store() -> (InMemoryApprovalRecordStore, ResourceId) {
        let store = InMemoryApprovalRecordStore::default();
        let record = ProjectApprovalRecord::new("P-7", "u-pm", None);
        let id = record.project_id.clone();
        store.insert(record).expect("insert project");
        (store, id)
    }

    /// Lands one competing write right after the first load returns.
    struct RacingStore {
        inner: InMemoryApprovalRecordStore,
        raced: AtomicBool,
    }

    impl RacingStore {
        fn new(inner: InMemoryApprovalRecordStore) -> Self {
            Self { inner, raced: AtomicBool::new(false) }
        }
    }

    impl ApprovalRecordStore for RacingStore {
        fn load(
            &self,
            project_id: &ResourceId,
        ) -> Result<Option<ProjectApprovalRecord>, StoreError> {
            let snapshot = self.inner.load(project_id)?;
            if let Some(record) = &snapshot {
                if !self.raced.swap(true, Ordering::SeqCst) {
                    self.inner.compare_and_swap(
                        project_id,
                        record.version,
                        ApprovalStatus::Submitted,
                    )?;
                }
            }
            Ok(snapshot)
        }

        fn compare_and_swap(
            &self,
            project_id: &ResourceId,
            expected_version: u64,
            status: ApprovalStatus,
        ) -> Result<ProjectApprovalRecord, StoreError> {
            self.inner.compare_and_swap(project_id, expected_version, status)
        }

        fn overwrite_status(
            &self,
            project_id: &ResourceId,
            status: ApprovalStatus,
        ) -> Result<ProjectApprovalRecord, StoreError> {
            self.inner.overwrite_status(project_id, status)
        }
    }

    #[test]
    fn permission_is_checked_before_the_state_machine() {
        let gate = ApprovalGate::default();
        let sub = Actor::new("u-sub", Role::SubPmo);
        let context = ResourceContext::project("P-7", ApprovalStatus::Submitted).owned_by("u-sub");

        let error = gate
            .authorize(&sub, &context, WorkflowAction::Approve)
            .expect_err("self approval must be blocked");
        assert!(matches!(
            error,
            GateError::PermissionDenied {
                permission: Permission::ApproveProject,
                failure: Some(PermissionFailure::OwnItemSegregation { .. }),
                ..
            }
        ));
    }

    #[test]
    fn illegal_transition_is_reported_after_permission_passes() {
        let gate = ApprovalGate::default();
        let main = Actor::new("u-main", Role::MainPmo);
        let context = ResourceContext::project("P-7", ApprovalStatus::Approved);

        assert_eq!(
            gate.authorize(&main, &context, WorkflowAction::Approve),
            Err(GateError::IllegalTransition(IllegalTransition {
                state: ApprovalStatus::Approved,
                role: Role::MainPmo,
                action: WorkflowAction::Approve,
            }))
        );
    }

    #[test]
    fn missing_status_is_reported() {
        let gate = ApprovalGate::default();
        let admin = Actor::new("u-admin", Role::Admin);
        let mut context = ResourceContext::project("P-7", ApprovalStatus::Draft);
        context.current_approval_status = None;

        assert_eq!(
            gate.authorize(&admin, &context, WorkflowAction::Submit),
            Err(GateError::MissingApprovalStatus)
        );
    }

    #[test]
    fn audit_records_one_event_per_attempt() {
        let gate = ApprovalGate::default();
        let sink = InMemoryAuditSink::default();
        let pm = Actor::new("u-pm", Role::ProjectManager);
        let dev = Actor::new("u-dev", Role::Developer);
        let context = ResourceContext::project("P-7", ApprovalStatus::Draft).owned_by("u-pm");

        let outcome = gate
            .authorize_with_audit(&pm, &context, WorkflowAction::Submit, &sink, &audit(&pm))
            .expect("owner may submit");
        assert_eq!(outcome.to, ApprovalStatus::Submitted);

        let denied =
            gate.authorize_with_audit(&dev, &context, WorkflowAction::Submit, &sink, &audit(&dev));
        assert!(denied.is_err());

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "workflow.transition_applied");
        assert_eq!(events[0].outcome, AuditOutcome::Success);
        assert_eq!(events[0].metadata.get("from").map(String::as_str), Some("DRAFT"));
        assert_eq!(events[0].metadata.get("to").map(String::as_str), Some("SUBMITTED"));
        assert_eq!(events[0].occurred_at, outcome.occurred_at);
        assert_eq!(events[1].event_type, "workflow.permission_denied");
        assert_eq!(events[1].outcome, AuditOutcome::Rejected);
    }

    #[test]
    fn end_to_end_review_through_the_store() {
        let gate = ApprovalGate::default();
        let sink = InMemoryAuditSink::default();
        let (store, id) = store();
        let pm = Actor::new("u-pm", Role::ProjectManager);
        let sub = Actor::new("u-sub", Role::SubPmo);
        let main = Actor::new("u-main", Role::MainPmo);

        let steps = [
            (&pm, WorkflowAction::Submit, ApprovalStatus::Submitted),
            (&sub, WorkflowAction::RequestChanges, ApprovalStatus::ChangesRequested),
            (&pm, WorkflowAction::Submit, ApprovalStatus::Submitted),
            (&sub, WorkflowAction::Approve, ApprovalStatus::SubPmoApproved),
            (&main, WorkflowAction::Approve, ApprovalStatus::Approved),
        ];

        for (version, (actor, action, expected)) in steps.into_iter().enumerate() {
            let record = gate
                .apply_to_store(&store, actor, &id, action, version as u64, &sink, &audit(actor))
                .expect("scenario step should succeed");
            assert_eq!(record.status, expected);
            assert_eq!(record.version, version as u64 + 1);
        }

        assert_eq!(sink.events().len(), 5);
    }

    #[test]
    fn draft_cannot_jump_to_approved() {
        let gate = ApprovalGate::default();
        let sink = InMemoryAuditSink::default();
        let (store, id) = store();
        let main = Actor::new("u-main", Role::MainPmo);

        let error = gate
            .apply_to_store(&store, &main, &id, WorkflowAction::Approve, 0, &sink, &audit(&main))
            .expect_err("no tier may be skipped");
        assert!(matches!(error, GateError::IllegalTransition(_)));

        let record = store.load(&id).expect("load").expect("record exists");
        assert_eq!(record.status, ApprovalStatus::Draft);
        assert_eq!(record.version, 0);
    }

    #[test]
    fn stale_version_is_rejected_when_enforced() {
        let gate = ApprovalGate::default();
        let sink = InMemoryAuditSink::default();
        let (store, id) = store();
        let pm = Actor::new("u-pm", Role::ProjectManager);

        gate.apply_to_store(&store, &pm, &id, WorkflowAction::Submit, 0, &sink, &audit(&pm))
            .expect("first submit");

        let sub = Actor::new("u-sub", Role::SubPmo);
        let error = gate
            .apply_to_store(&store, &sub, &id, WorkflowAction::Reject, 0, &sink, &audit(&sub))
            .expect_err("reviewer read version 0 before the submit landed");
        assert_eq!(
            error,
            GateError::Store(StoreError::VersionConflict { project_id: id, expected: 0, actual: 1 })
        );
        assert_eq!(
            sink.events().last().map(|event| event.event_type.as_str()),
            Some("workflow.commit_failed")
        );
    }

    #[test]
    fn last_write_wins_when_version_check_is_disabled() {
        let gate = ApprovalGate::default().with_version_check(false);
        let sink = InMemoryAuditSink::default();
        let (store, id) = store();
        let pm = Actor::new("u-pm", Role::ProjectManager);
        let sub = Actor::new("u-sub", Role::SubPmo);

        gate.apply_to_store(&store, &pm, &id, WorkflowAction::Submit, 0, &sink, &audit(&pm))
            .expect("submit");
        let record = gate
            .apply_to_store(&store, &sub, &id, WorkflowAction::Reject, 0, &sink, &audit(&sub))
            .expect("stale version ignored");
        assert_eq!(record.status, ApprovalStatus::Rejected);
    }

    #[test]
    fn last_write_wins_over_a_concurrent_commit() {
        let gate = ApprovalGate::default().with_version_check(false);
        let sink = InMemoryAuditSink::default();
        let (inner, id) = store();
        let racing = RacingStore::new(inner);
        let pm = Actor::new("u-pm", Role::ProjectManager);

        let record = gate
            .apply_to_store(&racing, &pm, &id, WorkflowAction::Submit, 0, &sink, &audit(&pm))
            .expect("competing write is overwritten");
        assert_eq!(record.status, ApprovalStatus::Submitted);
        assert_eq!(record.version, 2);
    }

    #[test]
    fn concurrent_commit_conflicts_when_version_is_enforced() {
        let gate = ApprovalGate::default();
        let sink = InMemoryAuditSink::default();
        let (inner, id) = store();
        let racing = RacingStore::new(inner);
        let pm = Actor::new("u-pm", Role::ProjectManager);

        let error = gate
            .apply_to_store(&racing, &pm, &id, WorkflowAction::Submit, 0, &sink, &audit(&pm))
            .expect_err("the competing write moved the version");
        assert_eq!(
            error,
            GateError::Store(StoreError::VersionConflict { project_id: id, expected: 0, actual: 1 })
        );
    }

    #[test]
    fn illegal_transition_is_audited_as_rejected() {
        let gate = ApprovalGate::default();
        let sink = InMemoryAuditSink::default();
        let main = Actor::new("u-main", Role::MainPmo);
        let context = ResourceContext::project("P-7", ApprovalStatus::Approved);

        let result = gate.authorize_with_audit(
            &main,
            &context,
            WorkflowAction::Approve,
            &sink,
            &audit(&main),
        );
        assert!(matches!(result, Err(GateError::IllegalTransition(_))));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "workflow.transition_rejected");
        assert_eq!(events[0].outcome, AuditOutcome::Rejected);
        assert_eq!(events[0].metadata.get("from").map(String::as_str), Some("APPROVED"));
    }
}
