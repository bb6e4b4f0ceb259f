//! One module per `cw` subcommand.

pub mod advance;
pub mod create;
pub mod history;
pub mod list;
pub mod login;
pub mod logout;
pub mod reject;
pub mod show;
pub mod switch_role;
pub mod whoami;
