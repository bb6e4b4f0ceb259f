use std::collections::HashMap;
use std::sync::Mutex;

use super::CaseStore;
use crate::error::WorkflowError;
use crate::model::case::{AuditEntry, CaseId, CaseRecord};
use crate::model::role::Role;
use crate::model::stage::Stage;

/// In-memory case store. One mutex guards the whole map, which makes the
/// compare-and-swap trivially atomic; fine for tests and single-process use.
#[derive(Default)]
pub struct MemoryCaseStore {
    cases: Mutex<HashMap<CaseId, CaseRecord>>,
}

impl MemoryCaseStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CaseId, CaseRecord>> {
        match self.cases.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CaseStore for MemoryCaseStore {
    fn create(&self, record: &CaseRecord) -> Result<(), WorkflowError> {
        let mut cases = self.lock();
        if cases.contains_key(&record.id) {
            return Err(WorkflowError::Storage(anyhow::anyhow!(
                "case id '{}' already exists",
                record.id
            )));
        }
        cases.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn load(&self, id: &CaseId) -> Result<CaseRecord, WorkflowError> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or_else(|| WorkflowError::CaseNotFound(id.to_string()))
    }

    fn compare_and_swap_stage(
        &self,
        id: &CaseId,
        expected: Stage,
        new_assigned_role: Role,
        audit: &AuditEntry,
    ) -> Result<(), WorkflowError> {
        let mut cases = self.lock();
        let Some(case) = cases.get_mut(id) else {
            return Err(WorkflowError::CaseNotFound(id.to_string()));
        };
        if case.stage != expected {
            return Err(WorkflowError::StageConflict {
                expected,
                actual: case.stage,
            });
        }
        case.stage = audit.to_stage;
        case.assigned_role = new_assigned_role;
        case.history.push(audit.clone());
        Ok(())
    }

    fn list(&self, stage: Option<Stage>) -> Result<Vec<CaseRecord>, WorkflowError> {
        let cases = self.lock();
        let mut out: Vec<CaseRecord> = cases
            .values()
            .filter(|case| stage.is_none_or(|wanted| case.stage == wanted))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }
}
