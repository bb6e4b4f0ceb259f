//! Active-session bookkeeping between CLI invocations.
//!
//! The session itself lives in the database; this file only remembers which
//! session id the terminal is operating as. Written via tmp-file + rename so
//! a crash mid-write never leaves a torn id behind.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use casework_core::session::SessionId;

fn session_path(root: &Path) -> PathBuf {
    root.join(".casework").join("session")
}

/// Persist the active session id.
pub fn save_session_id(root: &Path, id: &SessionId) -> Result<()> {
    let path = session_path(root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, id.as_str().as_bytes())
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, &path).with_context(|| format!("failed to persist {}", path.display()))?;
    Ok(())
}

/// The active session id, if one was saved.
pub fn load_session_id(root: &Path) -> Option<SessionId> {
    let raw = fs::read_to_string(session_path(root)).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(SessionId::new(trimmed))
    }
}

/// Forget the active session id (logout, forced or explicit).
pub fn clear_session_id(root: &Path) -> Result<()> {
    let path = session_path(root);
    if path.exists() {
        fs::remove_file(&path).with_context(|| format!("failed to remove {}", path.display()))?;
    }
    Ok(())
}
