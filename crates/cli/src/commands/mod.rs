pub mod actions;
pub mod config;
pub mod doctor;
pub mod evaluate;
pub mod permissions;
pub mod transition;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// A command-specific JSON document in place of the generic outcome payload.
    pub fn document<T: Serialize>(command: &str, document: &T, exit_code: u8) -> Self {
        match serde_json::to_string(document) {
            Ok(output) => Self { exit_code, output },
            Err(error) => Self::failure(command, "serialization", error.to_string(), exit_code),
        }
    }

    pub fn invalid_input(command: &str, message: impl Into<String>) -> Self {
        Self::failure(command, "invalid_input", message, EXIT_INVALID_INPUT)
    }
}

pub const EXIT_OK: u8 = 0;
pub const EXIT_DENIED: u8 = 1;
pub const EXIT_INVALID_INPUT: u8 = 2;

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
