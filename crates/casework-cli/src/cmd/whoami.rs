//! `cw whoami` — show the active session's identity and acting role.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use std::path::Path;

use crate::app::{App, report, require_session};
use crate::output::{OutputMode, render_session};

/// Arguments for `cw whoami`.
#[derive(Args, Debug)]
pub struct WhoamiArgs {}

/// Run the `cw whoami` command.
pub fn run_whoami(_args: &WhoamiArgs, output: OutputMode, root: &Path) -> Result<()> {
    let app = App::open(root)?;
    let id = require_session(root)?;
    let now = Utc::now();

    let session = app
        .sessions
        .validate(&id, now)
        .map_err(|error| report(root, error))?;
    app.sessions
        .touch(&id, now)
        .map_err(|error| report(root, error))?;

    render_session(&session, output)
}
