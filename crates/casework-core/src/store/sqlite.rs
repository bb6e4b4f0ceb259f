//! SQLite-backed case and session stores.
//!
//! Runtime defaults are intentionally conservative:
//! - `journal_mode = WAL` to allow concurrent readers while writers commit
//! - `busy_timeout = 5s` to reduce transient lock failures under contention
//! - `foreign_keys = ON` to protect the audit table's referential integrity
//!
//! The stage compare-and-swap is a single transaction: an `UPDATE … WHERE
//! stage = expected` guarded write plus the audit insert. Zero updated rows
//! means the case either vanished (never happens; cases are not deleted) or
//! lost the race, and an existence probe decides which error to surface.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use super::CaseStore;
use crate::error::WorkflowError;
use crate::model::case::{AuditEntry, CaseId, CaseRecord};
use crate::model::role::Role;
use crate::model::stage::Stage;
use crate::session::{Identity, Session, SessionId, SessionStore};

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Latest schema version understood by this binary.
pub const LATEST_SCHEMA_VERSION: u32 = 1;

/// Migration v1: cases, append-only audit trail, sessions.
const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS cases (
    case_id TEXT PRIMARY KEY,
    stage TEXT NOT NULL CHECK (stage IN (
        'new', 'under_investigation', 'pending_review', 'pending_approval_l1',
        'pending_approval_l2', 'pending_legal_review', 'pending_closure',
        'closed', 'rejected')),
    assigned_role TEXT NOT NULL CHECK (assigned_role IN (
        'initiator', 'investigator', 'reviewer', 'approver_l1', 'approver_l2',
        'legal_reviewer', 'actioner', 'admin')),
    created_by TEXT NOT NULL,
    created_at_us INTEGER NOT NULL,
    payload_json TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS case_audit (
    audit_id INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id TEXT NOT NULL REFERENCES cases(case_id) ON DELETE CASCADE,
    actor TEXT NOT NULL,
    acted_as TEXT NOT NULL,
    from_stage TEXT,
    to_stage TEXT NOT NULL,
    at_us INTEGER NOT NULL,
    comment TEXT
);

CREATE INDEX IF NOT EXISTS idx_case_audit_case ON case_audit(case_id, audit_id);

CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    username TEXT NOT NULL,
    display_name TEXT NOT NULL,
    team TEXT NOT NULL,
    base_role TEXT NOT NULL,
    active_role TEXT NOT NULL,
    all_roles_access INTEGER NOT NULL CHECK (all_roles_access IN (0, 1)),
    login_at_us INTEGER NOT NULL,
    last_activity_at_us INTEGER NOT NULL
);
";

const MIGRATIONS: &[(u32, &str)] = &[(1, MIGRATION_V1_SQL)];

/// Open (or create) the store database, apply runtime pragmas, and migrate
/// the schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create store directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open case database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrate(&mut conn).context("apply store migrations")?;

    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

/// Apply all pending migrations in ascending order, tracked via
/// `PRAGMA user_version`.
fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let mut current = u32::try_from(version).unwrap_or(0);

    for (version, sql) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", i64::from(*version))?;
        tx.commit()?;
        current = *version;
    }

    Ok(current)
}

fn to_us(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

fn from_us(us: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(us)
        .with_context(|| format!("timestamp out of range: {us}"))
}

fn parse_stage(raw: &str) -> Result<Stage> {
    Stage::from_str(raw).with_context(|| format!("corrupt stage column: '{raw}'"))
}

fn parse_role(raw: &str) -> Result<Role> {
    Role::from_str(raw).with_context(|| format!("corrupt role column: '{raw}'"))
}

/// Case store over a shared SQLite connection.
pub struct SqliteCaseStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCaseStore {
    #[must_use]
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn history(conn: &Connection, id: &CaseId) -> Result<Vec<AuditEntry>, WorkflowError> {
        let mut stmt = conn.prepare(
            "SELECT actor, acted_as, from_stage, to_stage, at_us, comment
             FROM case_audit WHERE case_id = ?1 ORDER BY audit_id",
        )?;
        let rows = stmt.query_map(params![id.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut history = Vec::new();
        for row in rows {
            let (actor, acted_as, from_stage, to_stage, at_us, comment) = row?;
            history.push(AuditEntry {
                actor,
                acted_as: parse_role(&acted_as)?,
                from_stage: from_stage.as_deref().map(parse_stage).transpose()?,
                to_stage: parse_stage(&to_stage)?,
                at: from_us(at_us)?,
                comment,
            });
        }
        Ok(history)
    }

    fn load_in(conn: &Connection, id: &CaseId) -> Result<CaseRecord, WorkflowError> {
        let row = conn
            .query_row(
                "SELECT stage, assigned_role, created_by, created_at_us, payload_json
                 FROM cases WHERE case_id = ?1",
                params![id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((stage, assigned_role, created_by, created_at_us, payload_json)) = row else {
            return Err(WorkflowError::CaseNotFound(id.to_string()));
        };

        Ok(CaseRecord {
            id: id.clone(),
            stage: parse_stage(&stage)?,
            assigned_role: parse_role(&assigned_role)?,
            created_by,
            created_at: from_us(created_at_us)?,
            history: Self::history(conn, id)?,
            payload: serde_json::from_str(&payload_json)
                .context("corrupt payload_json column")
                .map_err(WorkflowError::Storage)?,
        })
    }
}

impl CaseStore for SqliteCaseStore {
    fn create(&self, record: &CaseRecord) -> Result<(), WorkflowError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let payload = serde_json::to_string(&record.payload)
            .context("encode case payload")
            .map_err(WorkflowError::Storage)?;
        tx.execute(
            "INSERT INTO cases (case_id, stage, assigned_role, created_by, created_at_us, payload_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id.as_str(),
                record.stage.to_string(),
                record.assigned_role.to_string(),
                record.created_by,
                to_us(record.created_at),
                payload,
            ],
        )?;
        for entry in &record.history {
            tx.execute(
                "INSERT INTO case_audit (case_id, actor, acted_as, from_stage, to_stage, at_us, comment)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id.as_str(),
                    entry.actor,
                    entry.acted_as.to_string(),
                    entry.from_stage.map(|stage| stage.to_string()),
                    entry.to_stage.to_string(),
                    to_us(entry.at),
                    entry.comment,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load(&self, id: &CaseId) -> Result<CaseRecord, WorkflowError> {
        Self::load_in(&self.lock(), id)
    }

    fn compare_and_swap_stage(
        &self,
        id: &CaseId,
        expected: Stage,
        new_assigned_role: Role,
        audit: &AuditEntry,
    ) -> Result<(), WorkflowError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE cases SET stage = ?1, assigned_role = ?2
             WHERE case_id = ?3 AND stage = ?4",
            params![
                audit.to_stage.to_string(),
                new_assigned_role.to_string(),
                id.as_str(),
                expected.to_string(),
            ],
        )?;

        if updated == 0 {
            let actual: Option<String> = tx
                .query_row(
                    "SELECT stage FROM cases WHERE case_id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            return match actual {
                None => Err(WorkflowError::CaseNotFound(id.to_string())),
                Some(raw) => Err(WorkflowError::StageConflict {
                    expected,
                    actual: parse_stage(&raw)?,
                }),
            };
        }

        tx.execute(
            "INSERT INTO case_audit (case_id, actor, acted_as, from_stage, to_stage, at_us, comment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.as_str(),
                audit.actor,
                audit.acted_as.to_string(),
                audit.from_stage.map(|stage| stage.to_string()),
                audit.to_stage.to_string(),
                to_us(audit.at),
                audit.comment,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn list(&self, stage: Option<Stage>) -> Result<Vec<CaseRecord>, WorkflowError> {
        let conn = self.lock();
        let mut ids: Vec<CaseId> = Vec::new();
        match stage {
            Some(wanted) => {
                let mut stmt = conn.prepare(
                    "SELECT case_id FROM cases WHERE stage = ?1
                     ORDER BY created_at_us DESC, case_id",
                )?;
                let rows =
                    stmt.query_map(params![wanted.to_string()], |row| row.get::<_, String>(0))?;
                for row in rows {
                    ids.push(CaseId::new(row?));
                }
            }
            None => {
                let mut stmt = conn
                    .prepare("SELECT case_id FROM cases ORDER BY created_at_us DESC, case_id")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                for row in rows {
                    ids.push(CaseId::new(row?));
                }
            }
        }

        ids.iter().map(|id| Self::load_in(&conn, id)).collect()
    }
}

/// Session store over the same SQLite database, for dispatchers that need
/// sessions to survive process restarts.
pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
    timeout: Duration,
}

impl SqliteSessionStore {
    #[must_use]
    pub fn new(conn: Arc<Mutex<Connection>>, timeout: Duration) -> Self {
        Self { conn, timeout }
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn load(conn: &Connection, id: &SessionId) -> Result<Option<Session>, WorkflowError> {
        let row = conn
            .query_row(
                "SELECT username, display_name, team, base_role, active_role,
                        all_roles_access, login_at_us, last_activity_at_us
                 FROM sessions WHERE session_id = ?1",
                params![id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, i64>(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((username, display_name, team, base_role, active_role, all_roles, login, last)) =
            row
        else {
            return Ok(None);
        };

        Ok(Some(Session {
            id: id.clone(),
            username,
            display_name,
            team,
            base_role: parse_role(&base_role)?,
            active_role: parse_role(&active_role)?,
            all_roles_access: all_roles != 0,
            login_at: from_us(login)?,
            last_activity_at: from_us(last)?,
        }))
    }
}

impl SessionStore for SqliteSessionStore {
    fn create(&self, identity: &Identity, now: DateTime<Utc>) -> Result<Session, WorkflowError> {
        let session = Session::open(identity, now);
        self.lock().execute(
            "INSERT INTO sessions (session_id, username, display_name, team, base_role,
                                   active_role, all_roles_access, login_at_us, last_activity_at_us)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                session.id.as_str(),
                session.username,
                session.display_name,
                session.team,
                session.base_role.to_string(),
                session.active_role.to_string(),
                i64::from(session.all_roles_access),
                to_us(session.login_at),
                to_us(session.last_activity_at),
            ],
        )?;
        Ok(session)
    }

    fn validate(&self, id: &SessionId, now: DateTime<Utc>) -> Result<Session, WorkflowError> {
        let conn = self.lock();
        let Some(session) = Self::load(&conn, id)? else {
            return Err(WorkflowError::SessionNotFound);
        };
        if session.is_live(now, self.timeout) {
            Ok(session)
        } else {
            conn.execute(
                "DELETE FROM sessions WHERE session_id = ?1",
                params![id.as_str()],
            )?;
            Err(WorkflowError::SessionExpired)
        }
    }

    fn touch(&self, id: &SessionId, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        self.lock().execute(
            "UPDATE sessions SET last_activity_at_us = ?1 WHERE session_id = ?2",
            params![to_us(now), id.as_str()],
        )?;
        Ok(())
    }

    fn switch_active_role(&self, id: &SessionId, new_role: Role) -> Result<Session, WorkflowError> {
        let conn = self.lock();
        let Some(session) = Self::load(&conn, id)? else {
            return Err(WorkflowError::SessionNotFound);
        };
        session.check_role_switch(new_role)?;
        conn.execute(
            "UPDATE sessions SET active_role = ?1 WHERE session_id = ?2",
            params![new_role.to_string(), id.as_str()],
        )?;
        Ok(Session {
            active_role: new_role,
            ..session
        })
    }

    fn destroy(&self, id: &SessionId) -> Result<(), WorkflowError> {
        self.lock().execute(
            "DELETE FROM sessions WHERE session_id = ?1",
            params![id.as_str()],
        )?;
        Ok(())
    }
}
