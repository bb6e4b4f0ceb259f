//! `cw advance` — move a case to a named next stage.

use anyhow::Result;
use casework_core::model::{CaseId, Stage};
use chrono::Utc;
use clap::Args;
use std::path::Path;
use std::str::FromStr;

use crate::app::{App, report, require_session};
use crate::output::{OutputMode, render_case};

/// Arguments for `cw advance`.
#[derive(Args, Debug)]
pub struct AdvanceArgs {
    /// Case id.
    pub case: String,

    /// Target stage (e.g. `under_investigation`, `pending_review`).
    #[arg(long)]
    pub to: String,

    /// Optional comment for the audit trail.
    #[arg(long)]
    pub comment: Option<String>,
}

/// Run the `cw advance` command.
pub fn run_advance(args: &AdvanceArgs, output: OutputMode, root: &Path) -> Result<()> {
    let to_stage = Stage::from_str(&args.to)?;
    let app = App::open(root)?;
    let id = require_session(root)?;

    let case = app
        .engine
        .request_transition(
            &CaseId::new(args.case.clone()),
            &id,
            to_stage,
            args.comment.clone(),
            Utc::now(),
        )
        .map_err(|error| report(root, error))?;

    render_case(&case, output)
}
