//! `cw list` — case queues, optionally narrowed to one stage.

use anyhow::Result;
use casework_core::model::Stage;
use chrono::Utc;
use clap::Args;
use std::path::Path;
use std::str::FromStr;

use crate::app::{App, report, require_session};
use crate::output::{OutputMode, render_case_list};

/// Arguments for `cw list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only cases at this stage (e.g. `pending_review`).
    #[arg(long)]
    pub stage: Option<String>,
}

/// Run the `cw list` command.
pub fn run_list(args: &ListArgs, output: OutputMode, root: &Path) -> Result<()> {
    let stage = args
        .stage
        .as_deref()
        .map(Stage::from_str)
        .transpose()?;
    let app = App::open(root)?;
    let id = require_session(root)?;

    let cases = app
        .engine
        .list_cases(&id, stage, Utc::now())
        .map_err(|error| report(root, error))?;

    render_case_list(&cases, stage, output)
}
