//! Shared output layer for human/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: key-value text for humans, stable JSON for scripts.

use casework_core::model::{CaseRecord, Stage};
use casework_core::session::Session;
use serde::Serialize;
use std::io::{self, Write};

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Render a left-aligned key/value line in human output.
pub fn kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

/// Render any serializable value as pretty JSON to stdout.
pub fn json(value: &impl Serialize) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Render a case in the requested mode.
pub fn render_case(case: &CaseRecord, mode: OutputMode) -> anyhow::Result<()> {
    if mode.is_json() {
        return json(case);
    }
    let mut out = io::stdout().lock();
    kv(&mut out, "case", case.id.as_str())?;
    kv(&mut out, "stage", case.stage.to_string())?;
    kv(&mut out, "assigned to", case.assigned_role.to_string())?;
    kv(&mut out, "created by", &case.created_by)?;
    kv(&mut out, "created at", case.created_at.to_rfc3339())?;
    kv(&mut out, "audit entries", case.history.len().to_string())?;
    Ok(())
}

/// Render a case list as a compact table or JSON array.
pub fn render_case_list(
    cases: &[CaseRecord],
    filter: Option<Stage>,
    mode: OutputMode,
) -> anyhow::Result<()> {
    if mode.is_json() {
        return json(&cases);
    }
    let mut out = io::stdout().lock();
    if cases.is_empty() {
        match filter {
            Some(stage) => writeln!(out, "no cases at stage '{stage}'")?,
            None => writeln!(out, "no cases")?,
        }
        return Ok(());
    }
    for case in cases {
        writeln!(
            out,
            "{:<18} {:<22} {:<14} {}",
            case.id, case.stage, case.assigned_role, case.created_by
        )?;
    }
    Ok(())
}

/// Render session identity details (whoami, login, role switch).
pub fn render_session(session: &Session, mode: OutputMode) -> anyhow::Result<()> {
    if mode.is_json() {
        return json(session);
    }
    let mut out = io::stdout().lock();
    kv(&mut out, "user", &session.username)?;
    kv(&mut out, "name", &session.display_name)?;
    if !session.team.is_empty() {
        kv(&mut out, "team", &session.team)?;
    }
    kv(&mut out, "role", session.base_role.to_string())?;
    if session.active_role != session.base_role {
        kv(&mut out, "acting as", session.active_role.to_string())?;
    }
    kv(&mut out, "logged in", session.login_at.to_rfc3339())?;
    Ok(())
}
