use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Draft,
    Submitted,
    SubPmoReview,
    SubPmoApproved,
    MainPmoReview,
    MainPmoApproved,
    Approved,
    Rejected,
    ChangesRequested,
}

impl ApprovalStatus {
    pub const ALL: [ApprovalStatus; 9] = [
        ApprovalStatus::Draft,
        ApprovalStatus::Submitted,
        ApprovalStatus::SubPmoReview,
        ApprovalStatus::SubPmoApproved,
        ApprovalStatus::MainPmoReview,
        ApprovalStatus::MainPmoApproved,
        ApprovalStatus::Approved,
        ApprovalStatus::Rejected,
        ApprovalStatus::ChangesRequested,
    ];

    pub fn initial() -> Self {
        Self::Draft
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Part of the enumeration for a three-tier review but never targeted by a transition.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::SubPmoReview | Self::MainPmoReview | Self::MainPmoApproved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::SubPmoReview => "SUB_PMO_REVIEW",
            Self::SubPmoApproved => "SUB_PMO_APPROVED",
            Self::MainPmoReview => "MAIN_PMO_REVIEW",
            Self::MainPmoApproved => "MAIN_PMO_APPROVED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::ChangesRequested => "CHANGES_REQUESTED",
        }
    }
}

impl Default for ApprovalStatus {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowAction {
    Submit,
    Approve,
    Reject,
    RequestChanges,
}

impl WorkflowAction {
    pub const ALL: [WorkflowAction; 4] = [
        WorkflowAction::Submit,
        WorkflowAction::Approve,
        WorkflowAction::Reject,
        WorkflowAction::RequestChanges,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "SUBMIT",
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
            Self::RequestChanges => "REQUEST_CHANGES",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseApprovalError {
    #[error("unknown approval status `{0}`")]
    Status(String),
    #[error("unknown workflow action `{0}`")]
    Action(String),
}

fn normalize_key(raw: &str) -> String {
    raw.trim().replace(['-', ' '], "_").to_ascii_uppercase()
}

impl FromStr for ApprovalStatus {
    type Err = ParseApprovalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(value);
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == key)
            .ok_or_else(|| ParseApprovalError::Status(value.to_owned()))
    }
}

impl FromStr for WorkflowAction {
    type Err = ParseApprovalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(value);
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == key)
            .ok_or_else(|| ParseApprovalError::Action(value.to_owned()))
    }
}
