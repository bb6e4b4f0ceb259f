//! `cw history` — a case's audit trail, oldest entry first.

use anyhow::Result;
use casework_core::model::CaseId;
use chrono::Utc;
use clap::Args;
use std::io::Write;
use std::path::Path;

use crate::app::{App, report, require_session};
use crate::output::{self, OutputMode};

/// Arguments for `cw history`.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Case id.
    pub case: String,
}

/// Run the `cw history` command.
pub fn run_history(args: &HistoryArgs, output: OutputMode, root: &Path) -> Result<()> {
    let app = App::open(root)?;
    let id = require_session(root)?;

    let case = app
        .engine
        .show_case(&CaseId::new(args.case.clone()), &id, Utc::now())
        .map_err(|error| report(root, error))?;

    if output.is_json() {
        return output::json(&case.history);
    }

    let mut out = std::io::stdout().lock();
    for entry in &case.history {
        let from = entry
            .from_stage
            .map_or_else(|| "-".to_string(), |stage| stage.to_string());
        write!(
            out,
            "{}  {:>22} -> {:<22} {} ({})",
            entry.at.to_rfc3339(),
            from,
            entry.to_stage.to_string(),
            entry.actor,
            entry.acted_as
        )?;
        match &entry.comment {
            Some(comment) => writeln!(out, "  \"{comment}\"")?,
            None => writeln!(out)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{HistoryArgs, run_history};
    use crate::app::{App, require_session};
    use crate::cmd::create::{CreateArgs, run_create};
    use crate::cmd::login::tests::write_user_config;
    use crate::cmd::login::{LoginArgs, run_login};
    use crate::output::OutputMode;
    use casework_core::model::Stage;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn history_renders_for_a_fresh_case() {
        let dir = TempDir::new().expect("temp dir");
        write_user_config(dir.path());
        run_login(
            &LoginArgs {
                user: "u1".to_string(),
                password: "pw1".to_string(),
            },
            OutputMode::Human,
            dir.path(),
        )
        .expect("login");
        run_create(
            &CreateArgs {
                category: "loan_fraud".to_string(),
                region: None,
                summary: None,
                comment: Some("registered".to_string()),
            },
            OutputMode::Human,
            dir.path(),
        )
        .expect("create");

        let app = App::open(dir.path()).expect("reopen");
        let session = require_session(dir.path()).expect("session id");
        let case_id = app
            .engine
            .list_cases(&session, Some(Stage::New), Utc::now())
            .expect("list")
            .remove(0)
            .id;

        run_history(
            &HistoryArgs {
                case: case_id.to_string(),
            },
            OutputMode::Json,
            dir.path(),
        )
        .expect("history");
    }
}
