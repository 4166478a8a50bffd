//! Role capability evaluation.
//!
//! Answers whether an actor may exercise a catalogued permission against a
//! resource. Evaluation is pure and fails closed: a missing role, an unknown
//! permission name or missing context needed by a scoped grant all deny.

pub mod catalogue;

use serde::{Deserialize, Serialize};

use crate::domain::actor::{Actor, Role};
use crate::domain::resource::ResourceContext;

pub use catalogue::{Grant, Permission, UnknownPermission};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PermissionFailure {
    MissingRole,
    UnknownPermission { permission: String },
    RoleNotGranted { permission: Permission, role: Role },
    NotOwnItem { permission: Permission, role: Role },
    OwnItemSegregation { permission: Permission, role: Role },
    DepartmentMismatch { permission: Permission, role: Role },
    MissingContext { permission: Permission, role: Role },
}

impl PermissionFailure {
    fn reason(&self) -> String {
        match self {
            Self::MissingRole => "actor has no resolved role".to_owned(),
            Self::UnknownPermission { permission } => {
                format!("unknown permission `{permission}`")
            }
            Self::RoleNotGranted { permission, role } => {
                format!("role `{role}` is not granted `{permission}`")
            }
            Self::NotOwnItem { permission, role } => {
                format!("role `{role}` may only use `{permission}` on items it owns")
            }
            Self::OwnItemSegregation { permission, role } => {
                format!("role `{role}` may not use `{permission}` on items it owns")
            }
            Self::DepartmentMismatch { permission, role } => {
                format!("role `{role}` may only use `{permission}` within its own department")
            }
            Self::MissingContext { permission, role } => {
                format!("`{permission}` for role `{role}` requires a resource context")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDecision {
    pub allowed: bool,
    pub reason: String,
    pub failure: Option<PermissionFailure>,
}

impl PermissionDecision {
    fn allow(reason: impl Into<String>) -> Self {
        Self { allowed: true, reason: reason.into(), failure: None }
    }

    fn deny(failure: PermissionFailure) -> Self {
        Self { allowed: false, reason: failure.reason(), failure: Some(failure) }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RoleCapabilityEngine;

impl RoleCapabilityEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        permission: Permission,
        actor: &Actor,
        context: Option<&ResourceContext>,
    ) -> bool {
        self.decide(permission, actor, context).allowed
    }

    /// Evaluates a permission held as a name. Names outside the catalogue deny.
    pub fn evaluate_named(
        &self,
        permission: &str,
        actor: &Actor,
        context: Option<&ResourceContext>,
    ) -> bool {
        self.decide_named(permission, actor, context).allowed
    }

    pub fn decide_named(
        &self,
        permission: &str,
        actor: &Actor,
        context: Option<&ResourceContext>,
    ) -> PermissionDecision {
        match permission.parse::<Permission>() {
            Ok(permission) => self.decide(permission, actor, context),
            Err(UnknownPermission(name)) => {
                tracing::debug!(
                    event_name = "permission.unknown_permission",
                    actor_id = %actor.user_id,
                    permission = %name,
                    "denying unknown permission"
                );
                PermissionDecision::deny(PermissionFailure::UnknownPermission { permission: name })
            }
        }
    }

    pub fn decide(
        &self,
        permission: Permission,
        actor: &Actor,
        context: Option<&ResourceContext>,
    ) -> PermissionDecision {
        let Some(role) = actor.role else {
            return PermissionDecision::deny(PermissionFailure::MissingRole);
        };

        match permission.grant_for(role) {
            Grant::Always => {
                PermissionDecision::allow(format!("role `{role}` holds `{permission}`"))
            }
            Grant::Never => {
                PermissionDecision::deny(PermissionFailure::RoleNotGranted { permission, role })
            }
            Grant::OwnItem => match context.and_then(|context| context.is_owned_by(actor)) {
                Some(true) => PermissionDecision::allow(format!(
                    "role `{role}` holds `{permission}` on its own item"
                )),
                Some(false) => {
                    PermissionDecision::deny(PermissionFailure::NotOwnItem { permission, role })
                }
                None => {
                    PermissionDecision::deny(PermissionFailure::MissingContext { permission, role })
                }
            },
            Grant::NotOwnItem => match context.and_then(|context| context.is_owned_by(actor)) {
                Some(false) => PermissionDecision::allow(format!(
                    "role `{role}` holds `{permission}` on an item owned by someone else"
                )),
                Some(true) => PermissionDecision::deny(PermissionFailure::OwnItemSegregation {
                    permission,
                    role,
                }),
                None => {
                    PermissionDecision::deny(PermissionFailure::MissingContext { permission, role })
                }
            },
            Grant::SameDepartment => match context {
                Some(context) if context.shares_department_with(actor) => PermissionDecision::allow(
                    format!("role `{role}` holds `{permission}` within its department"),
                ),
                Some(_) => PermissionDecision::deny(PermissionFailure::DepartmentMismatch {
                    permission,
                    role,
                }),
                None => {
                    PermissionDecision::deny(PermissionFailure::MissingContext { permission, role })
                }
            },
        }
    }

    /// Every catalogued permission with the grant the role receives for it.
    pub fn grants_for(&self, role: Role) -> Vec<(Permission, Grant)> {
        Permission::ALL
            .into_iter()
            .map(|permission| (permission, permission.grant_for(role)))
            .collect()
    }
}
