//! Domain model: workflow stages, roles, and the case aggregate.

pub mod case;
pub mod role;
pub mod stage;

pub use case::{AuditEntry, CaseId, CaseRecord};
pub use role::Role;
pub use stage::{ParseEnumError, Stage};
