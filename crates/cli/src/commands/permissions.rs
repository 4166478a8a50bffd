use clap::Args;
use portfolio_core::domain::actor::Role;
use portfolio_core::permissions::{Grant, Permission, RoleCapabilityEngine};
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_OK};

#[derive(Clone, Debug, Args)]
pub struct PermissionsArgs {
    #[arg(long, help = "Role whose grants should be listed")]
    pub role: String,
    #[arg(long, help = "Hide permissions the role never holds")]
    pub granted_only: bool,
}

#[derive(Debug, Serialize)]
struct PermissionsReport {
    command: &'static str,
    role: Role,
    grants: Vec<GrantLine>,
}

#[derive(Debug, Serialize)]
struct GrantLine {
    permission: Permission,
    grant: Grant,
}

pub fn run(args: &PermissionsArgs) -> CommandResult {
    let role = match args.role.parse::<Role>() {
        Ok(role) => role,
        Err(error) => return CommandResult::invalid_input("permissions", error.to_string()),
    };

    let grants = RoleCapabilityEngine::new()
        .grants_for(role)
        .into_iter()
        .filter(|(_, grant)| !args.granted_only || *grant != Grant::Never)
        .map(|(permission, grant)| GrantLine { permission, grant })
        .collect();

    CommandResult::document(
        "permissions",
        &PermissionsReport { command: "permissions", role, grants },
        EXIT_OK,
    )
}
