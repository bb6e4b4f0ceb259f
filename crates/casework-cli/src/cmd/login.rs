//! `cw login` — authenticate and open a session.

use anyhow::Result;
use casework_core::auth::Authenticator;
use chrono::Utc;
use clap::Args;
use std::path::Path;

use crate::app::{App, report};
use crate::output::{OutputMode, render_session};
use crate::state;

/// Arguments for `cw login`.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// User id.
    #[arg(long, short)]
    pub user: String,

    /// Password.
    #[arg(long, short)]
    pub password: String,
}

/// Run the `cw login` command.
pub fn run_login(args: &LoginArgs, output: OutputMode, root: &Path) -> Result<()> {
    let app = App::open(root)?;
    let now = Utc::now();

    let identity = app
        .auth
        .authenticate(&args.user, &args.password)
        .map_err(|error| report(root, error))?;
    let session = app
        .sessions
        .create(&identity, now)
        .map_err(|error| report(root, error))?;

    state::save_session_id(root, &session.id)?;
    render_session(&session, output)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{LoginArgs, run_login};
    use crate::app::{App, require_session};
    use crate::output::OutputMode;
    use casework_core::model::Role;
    use chrono::Utc;
    use tempfile::TempDir;

    pub(crate) fn write_user_config(root: &std::path::Path) {
        std::fs::write(
            root.join("casework.toml"),
            r#"
[[users]]
username = "u1"
password = "pw1"
display_name = "Initiator One"
team = "fraud-west"
role = "initiator"

[[users]]
username = "u2"
password = "pw2"
display_name = "Investigator Two"
role = "investigator"

[[users]]
username = "u3"
password = "pw3"
display_name = "Reviewer Three"
role = "reviewer"

[[users]]
username = "root"
password = "pw0"
display_name = "Root"
role = "admin"
"#,
        )
        .expect("write config");
    }

    #[test]
    fn login_saves_a_usable_session() {
        let dir = TempDir::new().expect("temp dir");
        write_user_config(dir.path());

        let args = LoginArgs {
            user: "u1".to_string(),
            password: "pw1".to_string(),
        };
        run_login(&args, OutputMode::Human, dir.path()).expect("login");

        let id = require_session(dir.path()).expect("saved session id");
        let app = App::open(dir.path()).expect("reopen app");
        let session = app
            .sessions
            .validate(&id, Utc::now())
            .expect("session is live");
        assert_eq!(session.username, "u1");
        assert_eq!(session.active_role, Role::Initiator);
    }

    #[test]
    fn bad_credentials_fail_with_auth_code() {
        let dir = TempDir::new().expect("temp dir");
        write_user_config(dir.path());

        let args = LoginArgs {
            user: "u1".to_string(),
            password: "wrong".to_string(),
        };
        let error = run_login(&args, OutputMode::Human, dir.path()).expect_err("bad login");
        assert!(error.to_string().contains("E3005"));
        assert!(require_session(dir.path()).is_err());
    }
}
