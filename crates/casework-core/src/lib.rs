//! casework-core: the case workflow/authorization engine.
//!
//! A fraud-investigation case moves through a fixed stage sequence, each
//! stage owned by a role. This crate is the state machine behind that
//! workflow: the permission table saying which role may move a case where,
//! the session layer gating every call on a live authenticated identity,
//! and the audited compare-and-swap stores that make concurrent transitions
//! safe. Presentation, dashboards, and AI assistance live elsewhere and
//! call in through [`engine::WorkflowEngine`].
//!
//! # Conventions
//!
//! - **Errors**: engine operations return the typed [`error::WorkflowError`];
//!   `anyhow::Result` with context is used at application boundaries.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).
//! - **Time**: all operations take `now` explicitly; nothing reads an
//!   ambient clock, so timeout behavior is testable.

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod rules;
pub mod session;
pub mod store;

pub use engine::WorkflowEngine;
pub use error::{ErrorCode, WorkflowError};
pub use model::{AuditEntry, CaseId, CaseRecord, Role, Stage};
pub use rules::PermissionTable;
pub use session::{Identity, Session, SessionId, SessionStore};
pub use store::CaseStore;
