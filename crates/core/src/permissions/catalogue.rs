use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::actor::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    CreateProject,
    EditProject,
    DeleteProject,
    SubmitProject,
    ApproveProject,
    RejectProject,
    RequestChanges,
    CreateTask,
    EditTask,
    DeleteTask,
    ApproveTask,
    CreateRisk,
    EditRisk,
    CreateIssue,
    EditIssue,
    SubmitWeeklyUpdate,
    ApproveWeeklyUpdate,
    ViewAllProjects,
    ViewDepartmentProjects,
    ViewReports,
    ExportReports,
    ManageUsers,
}

/// How a role is granted a permission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
    Always,
    /// Only when the actor owns the targeted item.
    OwnItem,
    /// Only when the actor does not own the targeted item (segregation of duties).
    NotOwnItem,
    /// Only when the item belongs to the actor's department.
    SameDepartment,
    Never,
}

impl Permission {
    pub const ALL: [Permission; 22] = [
        Permission::CreateProject,
        Permission::EditProject,
        Permission::DeleteProject,
        Permission::SubmitProject,
        Permission::ApproveProject,
        Permission::RejectProject,
        Permission::RequestChanges,
        Permission::CreateTask,
        Permission::EditTask,
        Permission::DeleteTask,
        Permission::ApproveTask,
        Permission::CreateRisk,
        Permission::EditRisk,
        Permission::CreateIssue,
        Permission::EditIssue,
        Permission::SubmitWeeklyUpdate,
        Permission::ApproveWeeklyUpdate,
        Permission::ViewAllProjects,
        Permission::ViewDepartmentProjects,
        Permission::ViewReports,
        Permission::ExportReports,
        Permission::ManageUsers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateProject => "CREATE_PROJECT",
            Self::EditProject => "EDIT_PROJECT",
            Self::DeleteProject => "DELETE_PROJECT",
            Self::SubmitProject => "SUBMIT_PROJECT",
            Self::ApproveProject => "APPROVE_PROJECT",
            Self::RejectProject => "REJECT_PROJECT",
            Self::RequestChanges => "REQUEST_CHANGES",
            Self::CreateTask => "CREATE_TASK",
            Self::EditTask => "EDIT_TASK",
            Self::DeleteTask => "DELETE_TASK",
            Self::ApproveTask => "APPROVE_TASK",
            Self::CreateRisk => "CREATE_RISK",
            Self::EditRisk => "EDIT_RISK",
            Self::CreateIssue => "CREATE_ISSUE",
            Self::EditIssue => "EDIT_ISSUE",
            Self::SubmitWeeklyUpdate => "SUBMIT_WEEKLY_UPDATE",
            Self::ApproveWeeklyUpdate => "APPROVE_WEEKLY_UPDATE",
            Self::ViewAllProjects => "VIEW_ALL_PROJECTS",
            Self::ViewDepartmentProjects => "VIEW_DEPARTMENT_PROJECTS",
            Self::ViewReports => "VIEW_REPORTS",
            Self::ExportReports => "EXPORT_REPORTS",
            Self::ManageUsers => "MANAGE_USERS",
        }
    }

    /// The decision table. Every role is matched explicitly for every permission.
    pub fn grant_for(&self, role: Role) -> Grant {
        use Grant::{Always, Never, NotOwnItem, OwnItem, SameDepartment};
        use Role::{
            Admin, DepartmentDirector, Developer, Executive, MainPmo, Pending, ProjectManager,
            SubPmo, TeamLead,
        };

        match self {
            Self::CreateProject => match role {
                Admin | ProjectManager | MainPmo | SubPmo => Always,
                TeamLead | Developer | DepartmentDirector | Executive | Pending => Never,
            },
            Self::EditProject | Self::SubmitProject => match role {
                Admin | MainPmo | SubPmo => Always,
                ProjectManager => OwnItem,
                TeamLead | Developer | DepartmentDirector | Executive | Pending => Never,
            },
            Self::DeleteProject => match role {
                Admin | MainPmo => Always,
                ProjectManager | SubPmo | TeamLead | Developer | DepartmentDirector
                | Executive | Pending => Never,
            },
            Self::ApproveProject
            | Self::RejectProject
            | Self::RequestChanges
            | Self::ApproveWeeklyUpdate => match role {
                Admin | MainPmo => Always,
                SubPmo => NotOwnItem,
                ProjectManager | TeamLead | Developer | DepartmentDirector | Executive
                | Pending => Never,
            },
            Self::CreateTask | Self::CreateRisk => match role {
                Admin | ProjectManager | TeamLead | MainPmo | SubPmo => Always,
                Developer | DepartmentDirector | Executive | Pending => Never,
            },
            Self::EditTask => match role {
                Admin | ProjectManager | TeamLead | MainPmo | SubPmo => Always,
                Developer => OwnItem,
                DepartmentDirector | Executive | Pending => Never,
            },
            Self::DeleteTask => match role {
                Admin | ProjectManager | MainPmo => Always,
                TeamLead | Developer | SubPmo | DepartmentDirector | Executive | Pending => Never,
            },
            Self::ApproveTask => match role {
                Admin | ProjectManager | TeamLead => Always,
                Developer | SubPmo | MainPmo | DepartmentDirector | Executive | Pending => Never,
            },
            Self::EditRisk => match role {
                Admin | MainPmo | SubPmo => Always,
                ProjectManager | TeamLead => OwnItem,
                Developer | DepartmentDirector | Executive | Pending => Never,
            },
            Self::CreateIssue => match role {
                Admin | ProjectManager | TeamLead | Developer | MainPmo | SubPmo => Always,
                DepartmentDirector | Executive | Pending => Never,
            },
            Self::EditIssue => match role {
                Admin | MainPmo | SubPmo => Always,
                ProjectManager | TeamLead | Developer => OwnItem,
                DepartmentDirector | Executive | Pending => Never,
            },
            Self::SubmitWeeklyUpdate => match role {
                Admin => Always,
                ProjectManager => OwnItem,
                TeamLead | Developer | SubPmo | MainPmo | DepartmentDirector | Executive
                | Pending => Never,
            },
            Self::ViewAllProjects => match role {
                Admin | MainPmo | Executive => Always,
                ProjectManager | TeamLead | Developer | SubPmo | DepartmentDirector | Pending => {
                    Never
                }
            },
            Self::ViewDepartmentProjects => match role {
                Admin | MainPmo | Executive => Always,
                SubPmo | DepartmentDirector => SameDepartment,
                ProjectManager | TeamLead | Developer | Pending => Never,
            },
            Self::ViewReports => match role {
                Admin | MainPmo | SubPmo | DepartmentDirector | Executive => Always,
                ProjectManager | TeamLead | Developer | Pending => Never,
            },
            Self::ExportReports => match role {
                Admin | MainPmo | Executive => Always,
                ProjectManager | TeamLead | Developer | SubPmo | DepartmentDirector | Pending => {
                    Never
                }
            },
            Self::ManageUsers => match role {
                Admin => Always,
                ProjectManager | TeamLead | Developer | SubPmo | MainPmo | DepartmentDirector
                | Executive | Pending => Never,
            },
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown permission `{0}`")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = value.trim().replace(['-', ' '], "_").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|permission| permission.as_str() == key)
            .ok_or_else(|| UnknownPermission(value.to_owned()))
    }
}
