#![forbid(unsafe_code)]

mod app;
mod cmd;
mod output;
mod terminal;

use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use haze_core::error::ErrorCode;
use output::{CliError, OutputMode, render_error};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::app::App;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "haze: a random quote browser with likes that follow you",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Project root holding `.haze/` (defaults to the current directory).
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Quote-pick seed, only meaningful for `show`.
    const fn seed(&self) -> Option<u64> {
        match &self.command {
            Commands::Show(args) => args.seed,
            _ => None,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Browse",
        about = "Show a random quote",
        long_about = "Show a quote: forward history first, then a random pick that avoids recent quotes.",
        after_help = "EXAMPLES:\n    # Show a quote\n    haze show\n\n    # Reproducible pick\n    haze show --seed 7\n\n    # Emit machine-readable output\n    haze show --json"
    )]
    Show(cmd::nav::ShowArgs),

    #[command(
        next_help_heading = "Browse",
        about = "Show the next quote",
        after_help = "EXAMPLES:\n    haze next"
    )]
    Next,

    #[command(
        next_help_heading = "Browse",
        about = "Go back to the previous quote",
        long_about = "Step back through the last few quotes shown.",
        after_help = "EXAMPLES:\n    haze prev"
    )]
    Prev,

    #[command(
        next_help_heading = "Browse",
        about = "Print the current quote for sharing",
        after_help = "EXAMPLES:\n    haze share | pbcopy"
    )]
    Share,

    #[command(
        next_help_heading = "Browse",
        about = "Browse interactively",
        long_about = "Read one key per line from stdin: n (next), p (previous), l (like), s (share), q (quit).",
        after_help = "EXAMPLES:\n    haze browse\n\n    # Scripted\n    printf 'n\\nl\\nq\\n' | haze browse"
    )]
    Browse,

    #[command(
        next_help_heading = "Likes",
        about = "Like a quote",
        long_about = "Like a quote by ID, or the quote on screen. Signed-in likes sync to the cloud.",
        after_help = "EXAMPLES:\n    # Like the quote on screen\n    haze like\n\n    # Like by ID\n    haze like 12 --json"
    )]
    Like(cmd::like::LikeArgs),

    #[command(
        next_help_heading = "Likes",
        about = "Remove a like",
        after_help = "EXAMPLES:\n    haze unlike 12"
    )]
    Unlike(cmd::like::LikeArgs),

    #[command(
        next_help_heading = "Likes",
        about = "List liked quotes",
        after_help = "EXAMPLES:\n    haze likes\n\n    # Emit machine-readable output\n    haze likes --json"
    )]
    Likes,

    #[command(
        next_help_heading = "Account",
        about = "Sign in and sync likes",
        long_about = "Sign in and merge this device's likes with the account's cloud record.",
        after_help = "EXAMPLES:\n    haze signin --uid u1 --name \"Ada Lovelace\""
    )]
    Signin(cmd::session::SigninArgs),

    #[command(
        next_help_heading = "Account",
        about = "Sign out",
        long_about = "Sign out. Likes stay on this device.",
        after_help = "EXAMPLES:\n    haze signout"
    )]
    Signout,

    #[command(
        next_help_heading = "Account",
        about = "Sync likes with the cloud",
        after_help = "EXAMPLES:\n    haze sync\n\n    # Rewrite the cloud record even if up to date\n    haze sync --force"
    )]
    Sync(cmd::sync::SyncArgs),

    #[command(
        next_help_heading = "Account",
        about = "Show the account and its liked quotes",
        after_help = "EXAMPLES:\n    haze account\n\n    # Remove a like everywhere\n    haze account remove 12"
    )]
    Account(cmd::account::AccountArgs),
}

/// Filter used when `HAZE_LOG` is unset.
const fn default_log_filter(debug: bool) -> &'static str {
    if debug {
        "haze_core=debug,haze=debug,info"
    } else {
        "haze_core=info,haze=info,warn"
    }
}

fn init_tracing(verbose: bool) {
    let debug = verbose || env::var_os("DEBUG").is_some();
    let filter = EnvFilter::try_from_env("HAZE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(debug)));

    let format = env::var("HAZE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    haze_core::init();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let root = match cli.root.clone() {
        Some(root) => root,
        None => env::current_dir()?,
    };
    let mut app = match App::open(&root, cli.json, cli.seed()) {
        Ok(app) => app,
        Err(err) => {
            let mode = if cli.json {
                OutputMode::Json
            } else {
                OutputMode::Text
            };
            render_error(
                mode,
                &CliError::coded(ErrorCode::ConfigParseError, format!("{err:#}")),
            )?;
            return Err(err);
        }
    };

    match &cli.command {
        Commands::Show(_) | Commands::Next => cmd::nav::run_next(&mut app),
        Commands::Prev => cmd::nav::run_prev(&mut app),
        Commands::Share => cmd::share::run_share(&mut app),
        Commands::Browse => cmd::browse::run_browse(&mut app),
        Commands::Like(args) => cmd::like::run_like(&mut app, args, true),
        Commands::Unlike(args) => cmd::like::run_like(&mut app, args, false),
        Commands::Likes => cmd::likes::run_likes(&app),
        Commands::Signin(args) => cmd::session::run_signin(&app, args),
        Commands::Signout => cmd::session::run_signout(&app),
        Commands::Sync(args) => cmd::sync::run_sync(&app, args),
        Commands::Account(args) => cmd::account::run_account(&app, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_log_filter_levels() {
        assert_eq!(default_log_filter(false), "haze_core=info,haze=info,warn");
        assert_eq!(default_log_filter(true), "haze_core=debug,haze=debug,info");
        assert!(EnvFilter::try_new(default_log_filter(false)).is_ok());
        assert!(EnvFilter::try_new(default_log_filter(true)).is_ok());
    }

    #[test]
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from(["haze", "likes", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Likes));
    }

    #[test]
    fn root_flag_is_global() {
        let cli = Cli::parse_from(["haze", "next", "--root", "/tmp/quotes"]);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/quotes")));
    }

    #[test]
    fn seed_only_applies_to_show() {
        let cli = Cli::parse_from(["haze", "show", "--seed", "7"]);
        assert_eq!(cli.seed(), Some(7));
        let cli = Cli::parse_from(["haze", "next"]);
        assert_eq!(cli.seed(), None);
    }

    #[test]
    fn like_id_is_optional() {
        let cli = Cli::parse_from(["haze", "like"]);
        assert!(matches!(cli.command, Commands::Like(ref args) if args.id.is_none()));
        let cli = Cli::parse_from(["haze", "unlike", "12"]);
        assert!(matches!(cli.command, Commands::Unlike(ref args) if args.id.as_deref() == Some("12")));
    }

    #[test]
    fn signin_requires_uid() {
        assert!(Cli::try_parse_from(["haze", "signin"]).is_err());
        let cli = Cli::parse_from(["haze", "signin", "--uid", "u1", "--name", "Ada Lovelace"]);
        let Commands::Signin(args) = cli.command else {
            panic!("expected signin");
        };
        assert_eq!(args.uid, "u1");
        assert_eq!(args.name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn account_remove_parses() {
        let cli = Cli::parse_from(["haze", "account", "remove", "3"]);
        let Commands::Account(args) = cli.command else {
            panic!("expected account");
        };
        assert!(matches!(
            args.command,
            Some(cmd::account::AccountCommand::Remove { ref id }) if id == "3"
        ));
    }
}
