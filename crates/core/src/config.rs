use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub audit: AuditConfig,
    pub workflow: WorkflowConfig,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug)]
pub struct AuditConfig {
    pub enabled: bool,
    /// Record denied and illegal attempts as well as applied transitions.
    /// Ignored when `enabled` is false.
    pub include_denials: bool,
}

#[derive(Clone, Debug)]
pub struct WorkflowConfig {
    pub enforce_version_check: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub audit_enabled: Option<bool>,
    pub enforce_version_check: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["portfolio.toml", "config/portfolio.toml"];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            audit: AuditConfig { enabled: true, include_denials: true },
            workflow: WorkflowConfig { enforce_version_check: true },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(audit) = patch.audit {
            if let Some(enabled) = audit.enabled {
                self.audit.enabled = enabled;
            }
            if let Some(include_denials) = audit.include_denials {
                self.audit.include_denials = include_denials;
            }
        }

        if let Some(workflow) = patch.workflow {
            if let Some(enforce_version_check) = workflow.enforce_version_check {
                self.workflow.enforce_version_check = enforce_version_check;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let log_level =
            read_env("PORTFOLIO_LOGGING_LEVEL").or_else(|| read_env("PORTFOLIO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PORTFOLIO_LOGGING_FORMAT").or_else(|| read_env("PORTFOLIO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("PORTFOLIO_AUDIT_ENABLED") {
            self.audit.enabled = parse_bool("PORTFOLIO_AUDIT_ENABLED", &value)?;
        }
        if let Some(value) = read_env("PORTFOLIO_AUDIT_INCLUDE_DENIALS") {
            self.audit.include_denials = parse_bool("PORTFOLIO_AUDIT_INCLUDE_DENIALS", &value)?;
        }

        if let Some(value) = read_env("PORTFOLIO_WORKFLOW_ENFORCE_VERSION_CHECK") {
            self.workflow.enforce_version_check =
                parse_bool("PORTFOLIO_WORKFLOW_ENFORCE_VERSION_CHECK", &value)?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(audit_enabled) = overrides.audit_enabled {
            self.audit.enabled = audit_enabled;
        }
        if let Some(enforce_version_check) = overrides.enforce_version_check {
            self.workflow.enforce_version_check = enforce_version_check;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_logging(&self.logging)
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    logging: Option<LoggingPatch>,
    audit: Option<AuditPatch>,
    workflow: Option<WorkflowPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct AuditPatch {
    enabled: Option<bool>,
    include_denials: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkflowPatch {
    enforce_version_check: Option<bool>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_and_strict() -> Result<(), String> {
        let config = AppConfig::default();
        config.validate().map_err(|err| err.to_string())?;

        ensure(config.workflow.enforce_version_check, "version check should default on")?;
        ensure(config.audit.enabled, "audit should default on")?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "compact is the default")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_PORTFOLIO_LEVEL", "debug");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("portfolio.toml");
            fs::write(
                &path,
                r#"
[logging]
level = "${TEST_PORTFOLIO_LEVEL}"
format = "json"

[workflow]
enforce_version_check = false
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "debug", "level should be interpolated from env")?;
            ensure(matches!(config.logging.format, LogFormat::Json), "format should be json")?;
            ensure(!config.workflow.enforce_version_check, "file should disable version check")?;
            Ok(())
        })();

        clear_vars(&["TEST_PORTFOLIO_LEVEL"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_PORTFOLIO_UNSET"]);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("portfolio.toml");
        fs::write(&path, "[logging]\nlevel = \"${TEST_PORTFOLIO_UNSET}\"\n")
            .map_err(|err| err.to_string())?;

        let error = match AppConfig::load(LoadOptions {
            config_path: Some(path),
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected interpolation failure".to_string()),
            Err(error) => error,
        };

        ensure(
            matches!(
                error,
                ConfigError::MissingEnvInterpolation { ref var } if var == "TEST_PORTFOLIO_UNSET"
            ),
            "error should name the missing variable",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PORTFOLIO_LOG_LEVEL", "warn");
        env::set_var("PORTFOLIO_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["PORTFOLIO_LOG_LEVEL", "PORTFOLIO_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PORTFOLIO_WORKFLOW_ENFORCE_VERSION_CHECK", "true");
        env::set_var("PORTFOLIO_LOGGING_LEVEL", "error");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("portfolio.toml");
            fs::write(
                &path,
                r#"
[logging]
level = "warn"

[audit]
include_denials = false

[workflow]
enforce_version_check = false
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "debug", "override log level should win")?;
            ensure(config.workflow.enforce_version_check, "env should win over file")?;
            ensure(!config.audit.include_denials, "file should win over defaults")?;
            Ok(())
        })();

        clear_vars(&["PORTFOLIO_WORKFLOW_ENFORCE_VERSION_CHECK", "PORTFOLIO_LOGGING_LEVEL"]);
        result
    }

    #[test]
    fn invalid_env_boolean_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PORTFOLIO_AUDIT_ENABLED", "sometimes");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected invalid override failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. }
                        if key == "PORTFOLIO_AUDIT_ENABLED"
                ),
                "error should name the offending variable",
            )
        })();

        clear_vars(&["PORTFOLIO_AUDIT_ENABLED"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PORTFOLIO_LOG_LEVEL", "verbose");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("logging.level")
            );
            ensure(has_message, "validation failure should mention logging.level")
        })();

        clear_vars(&["PORTFOLIO_LOG_LEVEL"]);
        result
    }

    #[test]
    fn unknown_log_format_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PORTFOLIO_LOG_FORMAT", "xml");
        let result = AppConfig::load(LoadOptions::default());
        clear_vars(&["PORTFOLIO_LOG_FORMAT"]);

        ensure(
            matches!(result, Err(ConfigError::Validation(ref message)) if message.contains("xml")),
            "unsupported format should be named in the error",
        )
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("missing.toml");

        let result = AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(ref missing)) if *missing == path),
            "missing file should be reported",
        )
    }
}
