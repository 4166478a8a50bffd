pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod permissions;
pub mod store;
pub mod workflow;

pub use audit::{
    AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, NoopAuditSink, SuccessOnlyAuditSink,
};
pub use domain::actor::{Actor, DepartmentId, Role, UserId};
pub use domain::approval::{ApprovalStatus, WorkflowAction};
pub use domain::resource::{ResourceContext, ResourceId, ResourceKind};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use permissions::{
    Grant, Permission, PermissionDecision, PermissionFailure, RoleCapabilityEngine,
};
pub use store::{
    ApprovalRecordStore, InMemoryApprovalRecordStore, ProjectApprovalRecord, StoreError,
};
pub use workflow::{
    ApprovalGate, ApprovalWorkflow, GateError, IllegalTransition, TransitionOutcome,
    WorkflowDefinition,
};
