//! `cw logout` — destroy the active session and forget it locally.

use anyhow::Result;
use clap::Args;
use std::path::Path;

use crate::app::{App, report};
use crate::output::OutputMode;
use crate::state;

/// Arguments for `cw logout`.
#[derive(Args, Debug)]
pub struct LogoutArgs {}

/// Run the `cw logout` command. Logging out without a session is fine.
pub fn run_logout(_args: &LogoutArgs, output: OutputMode, root: &Path) -> Result<()> {
    if let Some(id) = state::load_session_id(root) {
        let app = App::open(root)?;
        app.sessions
            .destroy(&id)
            .map_err(|error| report(root, error))?;
    }
    state::clear_session_id(root)?;

    if output.is_json() {
        println!("{{\"logged_out\": true}}");
    } else {
        println!("logged out");
    }
    Ok(())
}
