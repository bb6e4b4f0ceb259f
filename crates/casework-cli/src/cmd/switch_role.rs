//! `cw switch-role` — change the session's acting role (capability-gated).

use anyhow::Result;
use casework_core::model::Role;
use chrono::Utc;
use clap::Args;
use std::path::Path;
use std::str::FromStr;

use crate::app::{App, report, require_session};
use crate::output::{OutputMode, render_session};

/// Arguments for `cw switch-role`.
#[derive(Args, Debug)]
pub struct SwitchRoleArgs {
    /// The role to act as (e.g. `reviewer`, `approver_l1`).
    pub role: String,
}

/// Run the `cw switch-role` command.
pub fn run_switch_role(args: &SwitchRoleArgs, output: OutputMode, root: &Path) -> Result<()> {
    let role = Role::from_str(&args.role)?;
    let app = App::open(root)?;
    let id = require_session(root)?;

    let session = app
        .engine
        .switch_active_role(&id, role, Utc::now())
        .map_err(|error| report(root, error))?;

    render_session(&session, output)
}
