use clap::Args;
use portfolio_core::domain::actor::Role;
use portfolio_core::domain::approval::{ApprovalStatus, WorkflowAction};
use portfolio_core::workflow::ApprovalWorkflow;
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_OK};

#[derive(Clone, Debug, Args)]
pub struct ActionsArgs {
    #[arg(long, help = "Current approval status")]
    pub state: String,
    #[arg(long, help = "Role of the acting user")]
    pub role: String,
}

#[derive(Debug, Serialize)]
struct ActionsReport {
    command: &'static str,
    state: ApprovalStatus,
    role: Role,
    terminal: bool,
    reserved: bool,
    actions: Vec<ActionTarget>,
}

#[derive(Debug, Serialize)]
struct ActionTarget {
    action: WorkflowAction,
    to: ApprovalStatus,
}

pub fn run(args: &ActionsArgs) -> CommandResult {
    let state = match args.state.parse::<ApprovalStatus>() {
        Ok(state) => state,
        Err(error) => return CommandResult::invalid_input("actions", error.to_string()),
    };
    let role = match args.role.parse::<Role>() {
        Ok(role) => role,
        Err(error) => return CommandResult::invalid_input("actions", error.to_string()),
    };

    let workflow = ApprovalWorkflow::default();
    let actions = workflow
        .available_actions(state, role)
        .into_iter()
        .filter_map(|action| {
            workflow.next_state(state, role, action).ok().map(|to| ActionTarget { action, to })
        })
        .collect();

    let report = ActionsReport {
        command: "actions",
        state,
        role,
        terminal: workflow.is_terminal(state),
        reserved: state.is_reserved(),
        actions,
    };
    CommandResult::document("actions", &report, EXIT_OK)
}
