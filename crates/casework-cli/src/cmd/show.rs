//! `cw show` — full details for a single case.

use anyhow::Result;
use casework_core::model::CaseId;
use chrono::Utc;
use clap::Args;
use std::path::Path;

use crate::app::{App, report, require_session};
use crate::output::{OutputMode, render_case};

/// Arguments for `cw show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Case id.
    pub case: String,
}

/// Run the `cw show` command.
pub fn run_show(args: &ShowArgs, output: OutputMode, root: &Path) -> Result<()> {
    let app = App::open(root)?;
    let id = require_session(root)?;

    let case = app
        .engine
        .show_case(&CaseId::new(args.case.clone()), &id, Utc::now())
        .map_err(|error| report(root, error))?;

    render_case(&case, output)
}

#[cfg(test)]
mod tests {
    use super::{ShowArgs, run_show};
    use crate::cmd::login::tests::write_user_config;
    use crate::cmd::login::{LoginArgs, run_login};
    use crate::output::OutputMode;
    use tempfile::TempDir;

    #[test]
    fn unknown_case_reports_not_found() {
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

        let error = run_show(
            &ShowArgs {
                case: "case-missing".to_string(),
            },
            OutputMode::Human,
            dir.path(),
        )
        .expect_err("not found");
        assert!(error.to_string().contains("E2001"));
    }
}
