//! `cw create` — register a new case (Initiator or Admin).

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use std::path::Path;

use crate::app::{App, report, require_session};
use crate::output::{OutputMode, render_case};

/// Arguments for `cw create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Fraud category (e.g. loan_fraud, card_fraud).
    #[arg(long)]
    pub category: String,

    /// Region or branch the case originates from.
    #[arg(long)]
    pub region: Option<String>,

    /// One-line case summary.
    #[arg(long)]
    pub summary: Option<String>,

    /// Optional registration comment for the audit trail.
    #[arg(long)]
    pub comment: Option<String>,
}

impl CreateArgs {
    /// The opaque payload the engine stores verbatim.
    fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "category": self.category,
            "region": self.region,
            "summary": self.summary,
        })
    }
}

/// Run the `cw create` command.
pub fn run_create(args: &CreateArgs, output: OutputMode, root: &Path) -> Result<()> {
    let app = App::open(root)?;
    let id = require_session(root)?;

    let case = app
        .engine
        .create_case(&id, args.payload(), args.comment.clone(), Utc::now())
        .map_err(|error| report(root, error))?;

    render_case(&case, output)
}
