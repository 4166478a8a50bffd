pub mod gate;
pub mod machine;

pub use gate::{required_permission, ApprovalGate, GateError, TransitionOutcome};
pub use machine::{ApprovalWorkflow, IllegalTransition, TwoTierReview, WorkflowDefinition};
