#![forbid(unsafe_code)]

mod app;
mod cmd;
mod output;
mod state;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cw: fraud-investigation case workflow",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Session",
        about = "Authenticate and open a session",
        after_help = "EXAMPLES:\n    cw login --user u1 --password secret"
    )]
    Login(cmd::login::LoginArgs),

    #[command(next_help_heading = "Session", about = "Close the active session")]
    Logout(cmd::logout::LogoutArgs),

    #[command(next_help_heading = "Session", about = "Show the active identity and acting role")]
    Whoami(cmd::whoami::WhoamiArgs),

    #[command(
        next_help_heading = "Session",
        name = "switch-role",
        about = "Change the session's acting role",
        after_help = "EXAMPLES:\n    cw switch-role reviewer\n    cw switch-role admin"
    )]
    SwitchRole(cmd::switch_role::SwitchRoleArgs),

    #[command(
        next_help_heading = "Cases",
        about = "Register a new case",
        after_help = "EXAMPLES:\n    cw create --category loan_fraud --region west --summary \"forged income docs\""
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Cases",
        about = "Move a case to its next stage",
        after_help = "EXAMPLES:\n    cw advance case-ab12cd34ef --to under_investigation\n    cw advance case-ab12cd34ef --to pending_review --comment \"findings attached\""
    )]
    Advance(cmd::advance::AdvanceArgs),

    #[command(
        next_help_heading = "Cases",
        about = "Reject a case (terminal)",
        after_help = "EXAMPLES:\n    cw reject case-ab12cd34ef --reason \"insufficient evidence\""
    )]
    Reject(cmd::reject::RejectArgs),

    #[command(next_help_heading = "Read", about = "Show one case")]
    Show(cmd::show::ShowArgs),

    #[command(next_help_heading = "Read", about = "Show a case's audit trail")]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Read",
        about = "List cases",
        after_help = "EXAMPLES:\n    cw list\n    cw list --stage pending_review --json"
    )]
    List(cmd::list::ListArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CASEWORK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "casework=debug,info"
        } else {
            "casework=info,warn"
        })
    });

    let format = env::var("CASEWORK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let root = std::env::current_dir()?;
    let output = cli.output_mode();

    match cli.command {
        Commands::Login(ref args) => cmd::login::run_login(args, output, &root),
        Commands::Logout(ref args) => cmd::logout::run_logout(args, output, &root),
        Commands::Whoami(ref args) => cmd::whoami::run_whoami(args, output, &root),
        Commands::SwitchRole(ref args) => cmd::switch_role::run_switch_role(args, output, &root),
        Commands::Create(ref args) => cmd::create::run_create(args, output, &root),
        Commands::Advance(ref args) => cmd::advance::run_advance(args, output, &root),
        Commands::Reject(ref args) => cmd::reject::run_reject(args, output, &root),
        Commands::Show(ref args) => cmd::show::run_show(args, output, &root),
        Commands::History(ref args) => cmd::history::run_history(args, output, &root),
        Commands::List(ref args) => cmd::list::run_list(args, output, &root),
    }
}
