use clap::Args;
use portfolio_core::domain::actor::{Actor, DepartmentId};
use portfolio_core::domain::approval::ApprovalStatus;
use portfolio_core::domain::resource::{ResourceContext, ResourceKind};
use portfolio_core::permissions::{PermissionFailure, RoleCapabilityEngine};
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_DENIED, EXIT_OK};

#[derive(Clone, Debug, Args)]
pub struct EvaluateArgs {
    #[arg(long, help = "Permission name, e.g. APPROVE_PROJECT")]
    pub permission: String,
    #[arg(long, help = "Actor role; unrecognized roles resolve to no role")]
    pub role: Option<String>,
    #[arg(long, default_value = "cli-user")]
    pub user_id: String,
    #[arg(long, help = "Department of the actor")]
    pub department: Option<String>,
    #[arg(long, help = "Evaluate without any resource context")]
    pub no_context: bool,
    #[arg(long, default_value = "project")]
    pub kind: String,
    #[arg(long)]
    pub resource_id: Option<String>,
    #[arg(long, help = "User id of the resource owner")]
    pub owner_id: Option<String>,
    #[arg(long, help = "Whether the actor owns the resource; overrides --owner-id")]
    pub own_item: Option<bool>,
    #[arg(long, help = "Department the resource belongs to")]
    pub resource_department: Option<String>,
    #[arg(long, help = "Current approval status of the resource")]
    pub status: Option<String>,
}

impl EvaluateArgs {
    pub fn new(permission: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            permission: permission.into(),
            role: Some(role.into()),
            user_id: "cli-user".to_string(),
            department: None,
            no_context: false,
            kind: "project".to_string(),
            resource_id: None,
            owner_id: None,
            own_item: None,
            resource_department: None,
            status: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct EvaluateReport {
    command: &'static str,
    permission: String,
    role: Option<String>,
    allowed: bool,
    reason: String,
    failure: Option<PermissionFailure>,
}

pub fn run(args: &EvaluateArgs) -> CommandResult {
    let actor = resolve_actor(args);
    let context = match build_context(args) {
        Ok(context) => context,
        Err(message) => return CommandResult::invalid_input("evaluate", message),
    };

    let decision =
        RoleCapabilityEngine::new().decide_named(&args.permission, &actor, context.as_ref());
    let exit_code = if decision.allowed { EXIT_OK } else { EXIT_DENIED };

    let report = EvaluateReport {
        command: "evaluate",
        permission: args.permission.clone(),
        role: actor.role.map(|role| role.to_string()),
        allowed: decision.allowed,
        reason: decision.reason,
        failure: decision.failure,
    };
    CommandResult::document("evaluate", &report, exit_code)
}

fn resolve_actor(args: &EvaluateArgs) -> Actor {
    let department = args.department.clone().map(DepartmentId);
    match args.role.as_deref() {
        Some(raw_role) => Actor::from_raw_role(args.user_id.clone(), raw_role, department),
        None => Actor { department_id: department, ..Actor::anonymous(args.user_id.clone()) },
    }
}

fn build_context(args: &EvaluateArgs) -> Result<Option<ResourceContext>, String> {
    if args.no_context {
        return Ok(None);
    }

    let kind = args.kind.parse::<ResourceKind>().map_err(|error| error.to_string())?;
    let mut context = ResourceContext::new(kind);

    if let Some(resource_id) = &args.resource_id {
        context = context.with_id(resource_id.clone());
    }
    if let Some(owner_id) = &args.owner_id {
        context = context.owned_by(owner_id.clone());
    }
    if let Some(own_item) = args.own_item {
        context = context.own_item(own_item);
    }
    if let Some(department) = &args.resource_department {
        context = context.in_department(department.clone());
    }
    if let Some(status) = &args.status {
        let status = status.parse::<ApprovalStatus>().map_err(|error| error.to_string())?;
        context.current_approval_status = Some(status);
    }

    Ok(Some(context))
}
