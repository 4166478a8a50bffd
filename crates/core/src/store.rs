//! Approval record boundary.
//!
//! Durable storage lives outside this crate. The trait here is the seam a
//! persistence layer implements; its compare-and-swap carries a version so two
//! reviewers acting on the same stale state cannot both succeed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::actor::{DepartmentId, UserId};
use crate::domain::approval::ApprovalStatus;
use crate::domain::resource::{ResourceContext, ResourceId, ResourceKind};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectApprovalRecord {
    pub project_id: ResourceId,
    pub status: ApprovalStatus,
    pub version: u64,
    pub owner_id: UserId,
    pub department_id: Option<DepartmentId>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectApprovalRecord {
    pub fn new(
        project_id: impl Into<String>,
        owner_id: impl Into<String>,
        department_id: Option<DepartmentId>,
    ) -> Self {
        Self {
            project_id: ResourceId(project_id.into()),
            status: ApprovalStatus::initial(),
            version: 0,
            owner_id: UserId(owner_id.into()),
            department_id,
            updated_at: Utc::now(),
        }
    }

    pub fn resource_context(&self) -> ResourceContext {
        ResourceContext {
            kind: ResourceKind::Project,
            resource_id: Some(self.project_id.clone()),
            owner_id: Some(self.owner_id.clone()),
            is_own_item: None,
            department_id: self.department_id.clone(),
            current_approval_status: Some(self.status),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("project `{0}` has no approval record")]
    NotFound(ResourceId),
    #[error("project `{project_id}` already has an approval record")]
    AlreadyExists { project_id: ResourceId },
    #[error("stale record for `{project_id}`: expected version {expected}, found {actual}")]
    VersionConflict { project_id: ResourceId, expected: u64, actual: u64 },
}

pub trait ApprovalRecordStore: Send + Sync {
    fn load(&self, project_id: &ResourceId) -> Result<Option<ProjectApprovalRecord>, StoreError>;

    /// Writes `status` only if the stored record is still at `expected_version`.
    fn compare_and_swap(
        &self,
        project_id: &ResourceId,
        expected_version: u64,
        status: ApprovalStatus,
    ) -> Result<ProjectApprovalRecord, StoreError>;

    /// Writes `status` regardless of the stored version. Last write wins.
    fn overwrite_status(
        &self,
        project_id: &ResourceId,
        status: ApprovalStatus,
    ) -> Result<ProjectApprovalRecord, StoreError>;
}

#[derive(Clone, Default)]
pub struct InMemoryApprovalRecordStore {
    records: Arc<Mutex<HashMap<ResourceId, ProjectApprovalRecord>>>,
}

impl InMemoryApprovalRecordStore {
    pub fn insert(&self, record: ProjectApprovalRecord) -> Result<(), StoreError> {
        let mut records = self.records();
        if records.contains_key(&record.project_id) {
            return Err(StoreError::AlreadyExists { project_id: record.project_id });
        }
        records.insert(record.project_id.clone(), record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<ResourceId, ProjectApprovalRecord>> {
        match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ApprovalRecordStore for InMemoryApprovalRecordStore {
    fn load(&self, project_id: &ResourceId) -> Result<Option<ProjectApprovalRecord>, StoreError> {
        Ok(self.records().get(project_id).cloned())
    }

    fn compare_and_swap(
        &self,
        project_id: &ResourceId,
        expected_version: u64,
        status: ApprovalStatus,
    ) -> Result<ProjectApprovalRecord, StoreError> {
        let mut records = self.records();
        let record =
            records.get_mut(project_id).ok_or_else(|| StoreError::NotFound(project_id.clone()))?;

        if record.version != expected_version {
            return Err(StoreError::VersionConflict {
                project_id: project_id.clone(),
                expected: expected_version,
                actual: record.version,
            });
        }

        record.status = status;
        record.version += 1;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn overwrite_status(
        &self,
        project_id: &ResourceId,
        status: ApprovalStatus,
    ) -> Result<ProjectApprovalRecord, StoreError> {
        let mut records = self.records();
        let record =
            records.get_mut(project_id).ok_or_else(|| StoreError::NotFound(project_id.clone()))?;

        record.status = status;
        record.version += 1;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}
