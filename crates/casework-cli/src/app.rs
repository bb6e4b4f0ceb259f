//! Wiring: config, database, stores, and the engine behind one handle.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use casework_core::WorkflowEngine;
use casework_core::auth::StaticDirectory;
use casework_core::config::{WorkflowConfig, load_config};
use casework_core::error::WorkflowError;
use casework_core::session::{SessionId, SessionStore};
use casework_core::store::{SqliteCaseStore, SqliteSessionStore, open_store};

use crate::state;

/// Everything a command needs: the engine, the authenticator, and a direct
/// handle on the session store for login/logout.
pub struct App {
    pub engine: WorkflowEngine,
    pub auth: StaticDirectory,
    pub sessions: Arc<dyn SessionStore>,
    pub config: WorkflowConfig,
}

impl App {
    /// Open (or create) the store under `root` per `<root>/casework.toml`.
    pub fn open(root: &Path) -> Result<Self> {
        let config = load_config(root).context("load casework.toml")?;

        let db_path = if config.storage.db_path.is_absolute() {
            config.storage.db_path.clone()
        } else {
            root.join(&config.storage.db_path)
        };
        let conn = Arc::new(Mutex::new(open_store(&db_path)?));

        let cases = Arc::new(SqliteCaseStore::new(Arc::clone(&conn)));
        let sessions: Arc<dyn SessionStore> = Arc::new(SqliteSessionStore::new(
            conn,
            config.session.timeout(),
        ));

        Ok(Self {
            engine: WorkflowEngine::new(cases, Arc::clone(&sessions)),
            auth: StaticDirectory::new(config.users.clone()),
            sessions,
            config,
        })
    }
}

/// The saved session id, or a friendly error telling the user to log in.
pub fn require_session(root: &Path) -> Result<SessionId> {
    state::load_session_id(root).ok_or_else(|| anyhow!("not logged in; run `cw login` first"))
}

/// Convert an engine failure into a command error carrying the stable code
/// and remediation hint. A dead session also clears the saved session id so
/// the next command prompts for a fresh login.
pub fn report(root: &Path, error: WorkflowError) -> anyhow::Error {
    if matches!(
        error,
        WorkflowError::SessionExpired | WorkflowError::SessionNotFound
    ) {
        // Forced logout: the stale id is useless now.
        let _ = state::clear_session_id(root);
    }

    let code = error.code();
    match code.hint() {
        Some(hint) => anyhow!("{code} {error}\n  hint: {hint}"),
        None => anyhow!("{code} {error}"),
    }
}
