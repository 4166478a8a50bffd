use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::actor::{Actor, DepartmentId, UserId};
use crate::domain::approval::ApprovalStatus;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub String);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Project,
    Task,
    Risk,
    Issue,
    Assignment,
    Meeting,
    WeeklyUpdate,
    User,
    Report,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Task => "task",
            Self::Risk => "risk",
            Self::Issue => "issue",
            Self::Assignment => "assignment",
            Self::Meeting => "meeting",
            Self::WeeklyUpdate => "weekly_update",
            Self::User => "user",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown resource kind `{0}`")]
pub struct UnknownResourceKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownResourceKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "project" => Ok(Self::Project),
            "task" => Ok(Self::Task),
            "risk" => Ok(Self::Risk),
            "issue" => Ok(Self::Issue),
            "assignment" => Ok(Self::Assignment),
            "meeting" => Ok(Self::Meeting),
            "weekly_update" | "weeklyupdate" => Ok(Self::WeeklyUpdate),
            "user" => Ok(Self::User),
            "report" => Ok(Self::Report),
            _ => Err(UnknownResourceKind(value.to_owned())),
        }
    }
}

/// Describes the object an action targets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContext {
    pub kind: ResourceKind,
    pub resource_id: Option<ResourceId>,
    pub owner_id: Option<UserId>,
    /// Set by callers that already know whether the actor owns the item.
    /// Takes precedence over `owner_id`.
    pub is_own_item: Option<bool>,
    pub department_id: Option<DepartmentId>,
    pub current_approval_status: Option<ApprovalStatus>,
}

impl ResourceContext {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            resource_id: None,
            owner_id: None,
            is_own_item: None,
            department_id: None,
            current_approval_status: None,
        }
    }

    /// A project carries an approval lifecycle, so its status is always present.
    pub fn project(resource_id: impl Into<String>, status: ApprovalStatus) -> Self {
        Self {
            resource_id: Some(ResourceId(resource_id.into())),
            current_approval_status: Some(status),
            ..Self::new(ResourceKind::Project)
        }
    }

    pub fn with_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(ResourceId(resource_id.into()));
        self
    }

    pub fn owned_by(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(UserId(owner_id.into()));
        self
    }

    pub fn own_item(mut self, is_own_item: bool) -> Self {
        self.is_own_item = Some(is_own_item);
        self
    }

    pub fn in_department(mut self, department_id: impl Into<String>) -> Self {
        self.department_id = Some(DepartmentId(department_id.into()));
        self
    }

    /// `None` when ownership cannot be established from the context.
    pub fn is_owned_by(&self, actor: &Actor) -> Option<bool> {
        if let Some(is_own_item) = self.is_own_item {
            return Some(is_own_item);
        }

        self.owner_id.as_ref().map(|owner_id| *owner_id == actor.user_id)
    }

    pub fn shares_department_with(&self, actor: &Actor) -> bool {
        match (&self.department_id, &actor.department_id) {
            (Some(resource), Some(actor)) => resource == actor,
            _ => false,
        }
    }
}
