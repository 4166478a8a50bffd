use std::env;
use std::fs;
use std::path::Path;

use portfolio_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use crate::commands::{CommandResult, EXIT_INVALID_INPUT, EXIT_OK};

struct FieldSpec {
    key_path: &'static str,
    env_keys: &'static [&'static str],
}

const FIELDS: [FieldSpec; 5] = [
    FieldSpec {
        key_path: "logging.level",
        env_keys: &["PORTFOLIO_LOGGING_LEVEL", "PORTFOLIO_LOG_LEVEL"],
    },
    FieldSpec {
        key_path: "logging.format",
        env_keys: &["PORTFOLIO_LOGGING_FORMAT", "PORTFOLIO_LOG_FORMAT"],
    },
    FieldSpec { key_path: "audit.enabled", env_keys: &["PORTFOLIO_AUDIT_ENABLED"] },
    FieldSpec {
        key_path: "audit.include_denials",
        env_keys: &["PORTFOLIO_AUDIT_INCLUDE_DENIALS"],
    },
    FieldSpec {
        key_path: "workflow.enforce_version_check",
        env_keys: &["PORTFOLIO_WORKFLOW_ENFORCE_VERSION_CHECK"],
    },
];

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_INVALID_INPUT,
            );
        }
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec![
        "effective config (source precedence: override > env > file > default):".to_string()
    ];

    for field in &FIELDS {
        let source = if is_overridden(options, field.key_path) {
            "override (command line)".to_string()
        } else {
            field_source(
                field.key_path,
                field.env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            )
        };
        lines.push(render_line(field.key_path, &field_value(&config, field.key_path), source));
    }

    CommandResult { exit_code: EXIT_OK, output: lines.join("\n") }
}

fn field_value(config: &AppConfig, key_path: &str) -> String {
    match key_path {
        "logging.level" => config.logging.level.clone(),
        "logging.format" => format!("{:?}", config.logging.format),
        "audit.enabled" => config.audit.enabled.to_string(),
        "audit.include_denials" => config.audit.include_denials.to_string(),
        "workflow.enforce_version_check" => config.workflow.enforce_version_check.to_string(),
        _ => "<unknown>".to_string(),
    }
}

fn is_overridden(options: &LoadOptions, key_path: &str) -> bool {
    let overrides = &options.overrides;
    match key_path {
        "logging.level" => overrides.log_level.is_some(),
        "logging.format" => overrides.log_format.is_some(),
        "audit.enabled" => overrides.audit_enabled.is_some(),
        "workflow.enforce_version_check" => overrides.enforce_version_check.is_some(),
        _ => false,
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| is_set(key)) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn is_set(env_key: &str) -> bool {
    env::var(env_key).map(|value| !value.trim().is_empty()).unwrap_or(false)
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
