use clap::Args;
use portfolio_core::domain::actor::Role;
use portfolio_core::domain::approval::{ApprovalStatus, WorkflowAction};
use portfolio_core::workflow::ApprovalWorkflow;
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_DENIED, EXIT_OK};

#[derive(Clone, Debug, Args)]
pub struct TransitionArgs {
    #[arg(long, help = "Current approval status, e.g. SUBMITTED")]
    pub state: String,
    #[arg(long, help = "Role of the acting user")]
    pub role: String,
    #[arg(long, help = "SUBMIT, APPROVE, REJECT or REQUEST_CHANGES")]
    pub action: String,
}

#[derive(Debug, Serialize)]
struct TransitionReport {
    command: &'static str,
    status: &'static str,
    from: ApprovalStatus,
    to: ApprovalStatus,
    role: Role,
    action: WorkflowAction,
    terminal: bool,
}

pub fn run(args: &TransitionArgs) -> CommandResult {
    let (state, role, action) = match parse_inputs(args) {
        Ok(inputs) => inputs,
        Err(message) => return CommandResult::invalid_input("transition", message),
    };

    let workflow = ApprovalWorkflow::default();
    match workflow.next_state(state, role, action) {
        Ok(next) => CommandResult::document(
            "transition",
            &TransitionReport {
                command: "transition",
                status: "ok",
                from: state,
                to: next,
                role,
                action,
                terminal: workflow.is_terminal(next),
            },
            EXIT_OK,
        ),
        Err(error) => CommandResult::failure(
            "transition",
            "illegal_transition",
            error.to_string(),
            EXIT_DENIED,
        ),
    }
}

fn parse_inputs(args: &TransitionArgs) -> Result<(ApprovalStatus, Role, WorkflowAction), String> {
    let state = args.state.parse::<ApprovalStatus>().map_err(|error| error.to_string())?;
    let role = args.role.parse::<Role>().map_err(|error| error.to_string())?;
    let action = args.action.parse::<WorkflowAction>().map_err(|error| error.to_string())?;
    Ok((state, role, action))
}
