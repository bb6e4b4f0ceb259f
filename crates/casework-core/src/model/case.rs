use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::role::Role;
use super::stage::Stage;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 10;

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())]))
        .collect()
}

/// Opaque case identifier, `case-` followed by a random base36 suffix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    /// Generate a fresh id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("case-{}", random_suffix()))
    }

    /// Wrap an id already read from storage or user input; no format check
    /// beyond non-emptiness is performed because lookups fail safely.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry in a case's append-only audit trail.
///
/// `from_stage` is `None` only for the creation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor: String,
    pub acted_as: Role,
    pub from_stage: Option<Stage>,
    pub to_stage: Stage,
    pub at: DateTime<Utc>,
    pub comment: Option<String>,
}

/// The persisted aggregate for one case.
///
/// `payload` carries the case details (category, region, amounts, free text)
/// and is opaque to the engine: it is stored, returned, and never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: CaseId,
    pub stage: Stage,
    pub assigned_role: Role,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub history: Vec<AuditEntry>,
    pub payload: serde_json::Value,
}

impl CaseRecord {
    /// Build a brand-new case at stage `New` with its creation audit entry.
    #[must_use]
    pub fn open(
        created_by: impl Into<String>,
        acted_as: Role,
        payload: serde_json::Value,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let created_by = created_by.into();
        let creation = AuditEntry {
            actor: created_by.clone(),
            acted_as,
            from_stage: None,
            to_stage: Stage::New,
            at: now,
            comment,
        };
        Self {
            id: CaseId::generate(),
            stage: Stage::New,
            assigned_role: Role::Investigator,
            created_by,
            created_at: now,
            history: vec![creation],
            payload,
        }
    }
}
