use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepartmentId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    ProjectManager,
    TeamLead,
    Developer,
    SubPmo,
    MainPmo,
    DepartmentDirector,
    Executive,
    /// Registered but not yet approved by an administrator. Holds no capability.
    Pending,
}

impl Role {
    pub const ALL: [Role; 9] = [
        Role::Admin,
        Role::ProjectManager,
        Role::TeamLead,
        Role::Developer,
        Role::SubPmo,
        Role::MainPmo,
        Role::DepartmentDirector,
        Role::Executive,
        Role::Pending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::ProjectManager => "project_manager",
            Self::TeamLead => "team_lead",
            Self::Developer => "developer",
            Self::SubPmo => "sub_pmo",
            Self::MainPmo => "main_pmo",
            Self::DepartmentDirector => "department_director",
            Self::Executive => "executive",
            Self::Pending => "pending",
        }
    }

    /// Roles that may own a project and therefore send it into review.
    pub fn can_own_projects(&self) -> bool {
        match self {
            Self::Admin | Self::ProjectManager | Self::SubPmo | Self::MainPmo => true,
            Self::TeamLead
            | Self::Developer
            | Self::DepartmentDirector
            | Self::Executive
            | Self::Pending => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key: String = value
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '_' | '-' | ' '))
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "admin" => Ok(Self::Admin),
            "projectmanager" | "pm" => Ok(Self::ProjectManager),
            "teamlead" => Ok(Self::TeamLead),
            "developer" => Ok(Self::Developer),
            "subpmo" => Ok(Self::SubPmo),
            "mainpmo" => Ok(Self::MainPmo),
            "departmentdirector" => Ok(Self::DepartmentDirector),
            "executive" => Ok(Self::Executive),
            "pending" => Ok(Self::Pending),
            _ => Err(UnknownRole(value.to_owned())),
        }
    }
}

/// The identity attempting an action, as resolved by the session layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    /// `None` when the session could not resolve a role.
    pub role: Option<Role>,
    pub department_id: Option<DepartmentId>,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self { user_id: UserId(user_id.into()), role: Some(role), department_id: None }
    }

    pub fn anonymous(user_id: impl Into<String>) -> Self {
        Self { user_id: UserId(user_id.into()), role: None, department_id: None }
    }

    /// Resolves a raw role label. Unknown labels yield an actor without a role.
    pub fn from_raw_role(
        user_id: impl Into<String>,
        raw_role: &str,
        department_id: Option<DepartmentId>,
    ) -> Self {
        let user_id = UserId(user_id.into());
        let role = match raw_role.parse::<Role>() {
            Ok(role) => Some(role),
            Err(error) => {
                tracing::warn!(
                    event_name = "permission.unknown_role",
                    actor_id = %user_id,
                    raw_role,
                    "{error}; actor resolved without a role"
                );
                None
            }
        };

        Self { user_id, role, department_id }
    }

    pub fn in_department(mut self, department_id: impl Into<String>) -> Self {
        self.department_id = Some(DepartmentId(department_id.into()));
        self
    }
}
