//! `cw reject` — send a case to the `Rejected` terminal.
//!
//! Semantically `cw advance --to rejected` with a required reason; rejection
//! without a recorded reason is not useful to anyone downstream.

use anyhow::Result;
use casework_core::model::{CaseId, Stage};
use chrono::Utc;
use clap::Args;
use std::path::Path;

use crate::app::{App, report, require_session};
use crate::output::{OutputMode, render_case};

/// Arguments for `cw reject`.
#[derive(Args, Debug)]
pub struct RejectArgs {
    /// Case id.
    pub case: String,

    /// Reason for rejecting this case.
    #[arg(long)]
    pub reason: String,
}

/// Run the `cw reject` command.
pub fn run_reject(args: &RejectArgs, output: OutputMode, root: &Path) -> Result<()> {
    let app = App::open(root)?;
    let id = require_session(root)?;

    let case = app
        .engine
        .request_transition(
            &CaseId::new(args.case.clone()),
            &id,
            Stage::Rejected,
            Some(args.reason.clone()),
            Utc::now(),
        )
        .map_err(|error| report(root, error))?;

    render_case(&case, output)
}
