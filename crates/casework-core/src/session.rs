//! Session-scoped identity and role switching.
//!
//! A session is an explicit value passed into every engine call, never an
//! ambient process-wide flag. Validity is inactivity-based: every authorized
//! request refreshes `last_activity_at`, and a session older than the timeout
//! window is rejected with `SessionExpired` so the caller can force a fresh
//! login.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use crate::error::WorkflowError;
use crate::model::role::Role;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 16;

/// Opaque session identifier handed back at login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..ID_LEN)
            .map(|_| char::from(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())]))
            .collect();
        Self(format!("sess-{suffix}"))
    }

    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated identity a session was opened for, as reported by the
/// authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub display_name: String,
    pub team: String,
    pub role: Role,
    pub all_roles_access: bool,
}

/// One live session: identity plus the role it is currently operating as.
///
/// `active_role` starts equal to `base_role` and changes only through an
/// explicit, capability-gated switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub username: String,
    pub display_name: String,
    pub team: String,
    pub base_role: Role,
    pub active_role: Role,
    pub all_roles_access: bool,
    pub login_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn open(identity: &Identity, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::generate(),
            username: identity.username.clone(),
            display_name: identity.display_name.clone(),
            team: identity.team.clone(),
            base_role: identity.role,
            active_role: identity.role,
            all_roles_access: identity.all_roles_access,
            login_at: now,
            last_activity_at: now,
        }
    }

    /// Whether the session is still within the inactivity window at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_activity_at < timeout
    }

    /// Check the capability rules for switching this session to `new_role`.
    ///
    /// Requires the all-roles-access capability; switching *to* `admin`
    /// additionally requires an Admin base identity, matching the original
    /// role selector which only offers the Admin entry to Admin users.
    pub fn check_role_switch(&self, new_role: Role) -> Result<(), WorkflowError> {
        if !self.all_roles_access {
            return Err(WorkflowError::RoleSwitchDenied { requested: new_role });
        }
        if new_role == Role::Admin && self.base_role != Role::Admin {
            return Err(WorkflowError::RoleSwitchDenied { requested: new_role });
        }
        Ok(())
    }
}

/// Storage contract for sessions. Implementations need no cross-session
/// locking; every operation touches a single session.
pub trait SessionStore: Send + Sync {
    /// Persist a new session opened for `identity` and return it.
    fn create(&self, identity: &Identity, now: DateTime<Utc>) -> Result<Session, WorkflowError>;

    /// Return the session if it exists and is within the inactivity window.
    ///
    /// An expired session is destroyed as a side effect (forced logout) and
    /// reported as `SessionExpired`; an unknown id is `SessionNotFound`.
    fn validate(&self, id: &SessionId, now: DateTime<Utc>) -> Result<Session, WorkflowError>;

    /// Refresh `last_activity_at`. No-op on a missing session.
    fn touch(&self, id: &SessionId, now: DateTime<Utc>) -> Result<(), WorkflowError>;

    /// Change the session's active role after the capability checks pass.
    fn switch_active_role(&self, id: &SessionId, new_role: Role) -> Result<Session, WorkflowError>;

    /// Remove the session (explicit logout). Removing a missing session is
    /// not an error.
    fn destroy(&self, id: &SessionId) -> Result<(), WorkflowError>;
}

/// In-memory session store: a mutex-guarded map, suitable for tests and
/// single-process embedding.
pub struct MemorySessionStore {
    timeout: Duration,
    sessions: Mutex<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, Session>> {
        // Session maps hold plain data; a poisoned lock means a panic mid-read
        // which cannot leave the map inconsistent.
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self, identity: &Identity, now: DateTime<Utc>) -> Result<Session, WorkflowError> {
        let session = Session::open(identity, now);
        self.lock().insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn validate(&self, id: &SessionId, now: DateTime<Utc>) -> Result<Session, WorkflowError> {
        let mut sessions = self.lock();
        let Some(session) = sessions.get(id) else {
            return Err(WorkflowError::SessionNotFound);
        };
        if session.is_live(now, self.timeout) {
            Ok(session.clone())
        } else {
            sessions.remove(id);
            Err(WorkflowError::SessionExpired)
        }
    }

    fn touch(&self, id: &SessionId, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        if let Some(session) = self.lock().get_mut(id) {
            session.last_activity_at = now;
        }
        Ok(())
    }

    fn switch_active_role(&self, id: &SessionId, new_role: Role) -> Result<Session, WorkflowError> {
        let mut sessions = self.lock();
        let Some(session) = sessions.get_mut(id) else {
            return Err(WorkflowError::SessionNotFound);
        };
        session.check_role_switch(new_role)?;
        session.active_role = new_role;
        Ok(session.clone())
    }

    fn destroy(&self, id: &SessionId) -> Result<(), WorkflowError> {
        self.lock().remove(id);
        Ok(())
    }
}
