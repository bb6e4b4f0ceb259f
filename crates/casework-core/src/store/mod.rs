//! Case record storage contract.
//!
//! The engine's concurrency guarantee rests entirely on
//! [`CaseStore::compare_and_swap_stage`] being atomic with respect to the
//! expected-stage check: two racing transitions on one case must yield
//! exactly one success and one conflict, never a lost update. Any durable
//! medium providing that contract works; this crate ships an in-memory map
//! and a SQLite implementation.

pub mod memory;
pub mod sqlite;

use crate::error::WorkflowError;
use crate::model::case::{AuditEntry, CaseId, CaseRecord};
use crate::model::role::Role;
use crate::model::stage::Stage;

pub use memory::MemoryCaseStore;
pub use sqlite::{SqliteCaseStore, SqliteSessionStore, open_store};

/// Storage contract required by the workflow engine.
pub trait CaseStore: Send + Sync {
    /// Persist a new case record. The record's id must be unused.
    fn create(&self, record: &CaseRecord) -> Result<(), WorkflowError>;

    /// Load a case with its full audit history.
    fn load(&self, id: &CaseId) -> Result<CaseRecord, WorkflowError>;

    /// Atomically move the case from `expected` to `audit.to_stage`,
    /// reassign it to `new_assigned_role`, and append `audit` — all one unit.
    ///
    /// If the stored stage no longer equals `expected` the write must not
    /// happen and `StageConflict` is returned carrying the actual stage.
    fn compare_and_swap_stage(
        &self,
        id: &CaseId,
        expected: Stage,
        new_assigned_role: Role,
        audit: &AuditEntry,
    ) -> Result<(), WorkflowError>;

    /// List cases, optionally narrowed to one stage, newest first.
    fn list(&self, stage: Option<Stage>) -> Result<Vec<CaseRecord>, WorkflowError>;
}
