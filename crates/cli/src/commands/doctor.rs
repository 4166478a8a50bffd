use portfolio_core::audit::{
    AuditContext, AuditSink, InMemoryAuditSink, NoopAuditSink, SuccessOnlyAuditSink,
};
use portfolio_core::config::{AppConfig, AuditConfig, LoadOptions};
use portfolio_core::domain::actor::{Actor, Role};
use portfolio_core::domain::approval::{ApprovalStatus, WorkflowAction};
use portfolio_core::domain::resource::ResourceId;
use portfolio_core::permissions::{Grant, Permission, RoleCapabilityEngine};
use portfolio_core::store::{
    ApprovalRecordStore, InMemoryApprovalRecordStore, ProjectApprovalRecord,
};
use portfolio_core::workflow::{ApprovalGate, GateError};
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_DENIED, EXIT_OK};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const SCENARIO_PROJECT: &str = "doctor-project";
const SCENARIO_OWNER: &str = "doctor-pm";

pub fn run(options: &LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let exit_code = if report.overall_status == CheckStatus::Fail { EXIT_DENIED } else { EXIT_OK };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_capability_catalogue());

            let recorded = InMemoryAuditSink::default();
            let sink = audit_sink_for(&config.audit, &recorded);
            checks.push(check_approval_scenario(&config, sink.as_ref()));
            checks.push(check_audit_trail(&config.audit, &recorded));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(check_capability_catalogue());
            checks.push(skipped("approval_scenario"));
            checks.push(skipped("audit_trail"));
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: "skipped because configuration did not load".to_string(),
    }
}

fn audit_sink_for(audit: &AuditConfig, recorded: &InMemoryAuditSink) -> Box<dyn AuditSink> {
    match (audit.enabled, audit.include_denials) {
        (false, _) => Box::new(NoopAuditSink),
        (true, true) => Box::new(recorded.clone()),
        (true, false) => Box::new(SuccessOnlyAuditSink::new(recorded.clone())),
    }
}

fn check_capability_catalogue() -> DoctorCheck {
    let engine = RoleCapabilityEngine::new();
    let admin_holds_all =
        engine.grants_for(Role::Admin).iter().all(|(_, grant)| *grant == Grant::Always);
    let pending_holds_none =
        engine.grants_for(Role::Pending).iter().all(|(_, grant)| *grant == Grant::Never);
    let anonymous = Actor::anonymous("doctor-anonymous");
    let anonymous_denied =
        Permission::ALL.iter().all(|permission| !engine.evaluate(*permission, &anonymous, None));

    if admin_holds_all && pending_holds_none && anonymous_denied {
        DoctorCheck {
            name: "capability_catalogue",
            status: CheckStatus::Pass,
            details: format!(
                "{} permissions across {} roles",
                Permission::ALL.len(),
                Role::ALL.len()
            ),
        }
    } else {
        DoctorCheck {
            name: "capability_catalogue",
            status: CheckStatus::Fail,
            details: format!(
                "admin_holds_all={admin_holds_all} pending_holds_none={pending_holds_none} \
                 anonymous_denied={anonymous_denied}"
            ),
        }
    }
}

fn check_approval_scenario(config: &AppConfig, sink: &dyn AuditSink) -> DoctorCheck {
    match replay_scenario(config, sink) {
        Ok(path) => DoctorCheck {
            name: "approval_scenario",
            status: CheckStatus::Pass,
            details: path.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> "),
        },
        Err(details) => {
            DoctorCheck { name: "approval_scenario", status: CheckStatus::Fail, details }
        }
    }
}

/// Drives a project from draft to approval through one round of requested changes.
fn replay_scenario(
    config: &AppConfig,
    sink: &dyn AuditSink,
) -> Result<Vec<ApprovalStatus>, String> {
    let gate = ApprovalGate::default().with_version_check(config.workflow.enforce_version_check);
    let store = InMemoryApprovalRecordStore::default();
    let project_id = ResourceId(SCENARIO_PROJECT.to_string());
    store
        .insert(ProjectApprovalRecord::new(SCENARIO_PROJECT, SCENARIO_OWNER, None))
        .map_err(|error| error.to_string())?;

    let owner = Actor::new(SCENARIO_OWNER, Role::ProjectManager);
    let sub_pmo = Actor::new("doctor-sub-pmo", Role::SubPmo);
    let main_pmo = Actor::new("doctor-main-pmo", Role::MainPmo);
    let developer = Actor::new("doctor-developer", Role::Developer);
    let audit = AuditContext::new(Some(project_id.clone()), "doctor", "portfolio-doctor");

    let steps = [
        (&owner, WorkflowAction::Submit, ApprovalStatus::Submitted),
        (&sub_pmo, WorkflowAction::RequestChanges, ApprovalStatus::ChangesRequested),
        (&owner, WorkflowAction::Submit, ApprovalStatus::Submitted),
        (&sub_pmo, WorkflowAction::Approve, ApprovalStatus::SubPmoApproved),
        (&main_pmo, WorkflowAction::Approve, ApprovalStatus::Approved),
    ];

    let mut path = vec![ApprovalStatus::initial()];
    for (actor, action, expected) in steps {
        let current = store
            .load(&project_id)
            .map_err(|error| error.to_string())?
            .ok_or_else(|| format!("project `{project_id}` vanished from the store"))?;

        if action == WorkflowAction::Approve && current.status == ApprovalStatus::Submitted {
            match gate.apply_to_store(
                &store,
                &developer,
                &project_id,
                action,
                current.version,
                sink,
                &audit,
            ) {
                Err(GateError::PermissionDenied { .. }) => {}
                other => return Err(format!("developer approval was not denied: {other:?}")),
            }
        }

        let record = gate
            .apply_to_store(&store, actor, &project_id, action, current.version, sink, &audit)
            .map_err(|error| format!("{action} by {}: {error}", actor.user_id))?;
        if record.status != expected {
            return Err(format!("{action} led to {} instead of {expected}", record.status));
        }
        path.push(record.status);
    }

    Ok(path)
}

fn check_audit_trail(audit: &AuditConfig, recorded: &InMemoryAuditSink) -> DoctorCheck {
    if !audit.enabled {
        return DoctorCheck {
            name: "audit_trail",
            status: CheckStatus::Skipped,
            details: "auditing disabled by configuration".to_string(),
        };
    }

    let events = recorded.events();
    let applied =
        events.iter().filter(|event| event.event_type == "workflow.transition_applied").count();
    let denied =
        events.iter().filter(|event| event.event_type == "workflow.permission_denied").count();
    let expected_denied = if audit.include_denials { 1 } else { 0 };

    if applied == 5 && denied == expected_denied {
        DoctorCheck {
            name: "audit_trail",
            status: CheckStatus::Pass,
            details: format!("{applied} applied and {denied} denied transitions recorded"),
        }
    } else {
        DoctorCheck {
            name: "audit_trail",
            status: CheckStatus::Fail,
            details: format!(
                "expected 5 applied and {expected_denied} denied events, found {applied} and {denied}"
            ),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
