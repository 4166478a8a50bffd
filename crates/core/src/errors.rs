use thiserror::Error;

use crate::{
    permissions::Permission,
    store::StoreError,
    workflow::{GateError, IllegalTransition},
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("permission denied for `{permission}`: {reason}")]
    PermissionDenied { permission: Permission, reason: String },
    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("concurrent update: {0}")]
    Conflict(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("forbidden: {message}")]
    Forbidden { message: String, correlation_id: String },
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Forbidden { .. } => {
                "You do not have permission to perform this action on the item in its current state."
            }
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Conflict { .. } => {
                "The item was changed by someone else. Reload it before trying again."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl From<GateError> for ApplicationError {
    fn from(value: GateError) -> Self {
        match value {
            GateError::PermissionDenied { permission, reason, .. } => {
                Self::Domain(DomainError::PermissionDenied { permission, reason })
            }
            GateError::IllegalTransition(illegal) => Self::Domain(illegal.into()),
            GateError::MissingApprovalStatus => Self::Domain(DomainError::InvariantViolation(
                "project resource carries no approval status".to_owned(),
            )),
            GateError::Store(error @ StoreError::VersionConflict { .. }) => {
                Self::Conflict(error.to_string())
            }
            GateError::Store(error) => Self::Persistence(error.to_string()),
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::Forbidden { correlation_id: id, .. }
            | InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(DomainError::PermissionDenied { .. })
            | ApplicationError::Domain(DomainError::IllegalTransition(_)) => Self::Forbidden {
                message: value.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Domain(DomainError::InvariantViolation(_)) => Self::BadRequest {
                message: "domain validation failed".to_owned(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Conflict(message) => {
                Self::Conflict { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Persistence(message) | ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
