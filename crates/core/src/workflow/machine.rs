use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::actor::Role;
use crate::domain::approval::{ApprovalStatus, WorkflowAction};

/// A table of legal approval transitions.
pub trait WorkflowDefinition {
    fn initial_state(&self) -> ApprovalStatus;
    fn transition(
        &self,
        current: ApprovalStatus,
        role: Role,
        action: WorkflowAction,
    ) -> Result<ApprovalStatus, IllegalTransition>;
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("illegal transition: role `{role}` cannot {action} a project in state {state}")]
pub struct IllegalTransition {
    pub state: ApprovalStatus,
    pub role: Role,
    pub action: WorkflowAction,
}

/// Sub PMO review followed by a final Main PMO decision.
#[derive(Clone, Copy, Debug, Default)]
pub struct TwoTierReview;

impl WorkflowDefinition for TwoTierReview {
    fn initial_state(&self) -> ApprovalStatus {
        ApprovalStatus::initial()
    }

    fn transition(
        &self,
        current: ApprovalStatus,
        role: Role,
        action: WorkflowAction,
    ) -> Result<ApprovalStatus, IllegalTransition> {
        transition_two_tier(current, role, action)
    }
}

fn sub_pmo_tier(role: Role) -> bool {
    match role {
        Role::SubPmo | Role::MainPmo | Role::Admin => true,
        Role::ProjectManager
        | Role::TeamLead
        | Role::Developer
        | Role::DepartmentDirector
        | Role::Executive
        | Role::Pending => false,
    }
}

fn main_pmo_tier(role: Role) -> bool {
    match role {
        Role::MainPmo | Role::Admin => true,
        Role::SubPmo
        | Role::ProjectManager
        | Role::TeamLead
        | Role::Developer
        | Role::DepartmentDirector
        | Role::Executive
        | Role::Pending => false,
    }
}

fn transition_two_tier(
    current: ApprovalStatus,
    role: Role,
    action: WorkflowAction,
) -> Result<ApprovalStatus, IllegalTransition> {
    use ApprovalStatus::{
        Approved, ChangesRequested, Draft, MainPmoApproved, MainPmoReview, Rejected, SubPmoApproved,
        SubPmoReview, Submitted,
    };
    use WorkflowAction::{Approve, Reject, RequestChanges, Submit};

    let next = match (current, action) {
        (Draft, Submit) | (ChangesRequested, Submit) if role.can_own_projects() => Some(Submitted),
        (Submitted, Approve) if sub_pmo_tier(role) => Some(SubPmoApproved),
        (Submitted, Reject) if sub_pmo_tier(role) => Some(Rejected),
        (Submitted, RequestChanges) if sub_pmo_tier(role) => Some(ChangesRequested),
        (SubPmoApproved, Approve) if main_pmo_tier(role) => Some(Approved),
        (SubPmoApproved, Reject) if main_pmo_tier(role) => Some(Rejected),
        (SubPmoApproved, RequestChanges) if main_pmo_tier(role) => Some(ChangesRequested),
        (Approved | Rejected, _) => None,
        // Reserved for a three-tier review; nothing leads into or out of them yet.
        (SubPmoReview | MainPmoReview | MainPmoApproved, _) => None,
        (Draft | Submitted | SubPmoApproved | ChangesRequested, _) => None,
    };

    next.ok_or(IllegalTransition { state: current, role, action })
}

/// Computes legal approval transitions. The single writer of a project's status.
#[derive(Clone, Debug)]
pub struct ApprovalWorkflow<D = TwoTierReview> {
    definition: D,
}

impl<D> ApprovalWorkflow<D>
where
    D: WorkflowDefinition,
{
    pub fn new(definition: D) -> Self {
        Self { definition }
    }

    pub fn initial_state(&self) -> ApprovalStatus {
        self.definition.initial_state()
    }

    pub fn next_state(
        &self,
        current: ApprovalStatus,
        role: Role,
        action: WorkflowAction,
    ) -> Result<ApprovalStatus, IllegalTransition> {
        if current.is_reserved() {
            tracing::warn!(
                event_name = "workflow.reserved_state",
                state = %current,
                action = %action,
                "transition requested from a reserved approval state"
            );
        }

        self.definition.transition(current, role, action)
    }

    /// Actions the role may take from `current`, in catalogue order.
    pub fn available_actions(&self, current: ApprovalStatus, role: Role) -> Vec<WorkflowAction> {
        WorkflowAction::ALL
            .into_iter()
            .filter(|action| self.definition.transition(current, role, *action).is_ok())
            .collect()
    }

    pub fn is_terminal(&self, status: ApprovalStatus) -> bool {
        status.is_terminal()
    }
}

impl Default for ApprovalWorkflow<TwoTierReview> {
    fn default() -> Self {
        Self::new(TwoTierReview)
    }
}
