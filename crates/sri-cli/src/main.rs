//! # sri CLI entry point
//!
//! Parses command-line arguments, installs logging and dispatches to the
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sri_cli::id::{run_id, IdArgs};
use sri_cli::key::{run_key, KeyArgs};
use sri_cli::render::{run_render, RenderArgs};
use sri_cli::validate::{run_validate, ValidateArgs};
use sri_cli::Settings;

/// Electronic tax documents for the SRI: identifiers, access keys,
/// validation and rendering.
#[derive(Parser, Debug)]
#[command(name = "sri", version, about, long_about = None)]
struct Cli {
    /// YAML validation policy overriding the default limits.
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Reference date for date windows (YYYY-MM-DD). Defaults to today.
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a national identifier.
    Id(IdArgs),

    /// Generate or verify a 49-digit access key.
    Key(KeyArgs),

    /// Validate a document payload and list its violations.
    Validate(ValidateArgs),

    /// Validate, key and render a document payload.
    Render(RenderArgs),
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let settings = Settings {
        policy: cli.policy,
        today: cli.today,
    };

    let result = match cli.command {
        Commands::Id(args) => run_id(&args),
        Commands::Key(args) => run_key(&args),
        Commands::Validate(args) => run_validate(&args, &settings),
        Commands::Render(args) => run_render(&args, &settings),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_with_type() {
        let cli = Cli::try_parse_from(["sri", "id", "1710034065", "--type", "05"]).unwrap();
        let Commands::Id(args) = cli.command else {
            panic!("expected id");
        };
        assert_eq!(args.value, "1710034065");
        assert_eq!(args.id_type.as_deref(), Some("05"));
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sri",
            "validate",
            "doc.json",
            "--today",
            "2026-01-15",
            "--policy",
            "policy.yaml",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(cli.today, NaiveDate::from_ymd_opt(2026, 1, 15));
        assert_eq!(cli.policy, Some(PathBuf::from("policy.yaml")));
        assert!(cli.log_json);
        assert!(matches!(cli.command, Commands::Validate(_)));
    }

    #[test]
    fn parse_key_subcommands() {
        let cli = Cli::try_parse_from(["sri", "key", "generate", "-", "--fill", "00000001"]).unwrap();
        assert!(matches!(cli.command, Commands::Key(_)));
        let cli = Cli::try_parse_from(["sri", "key", "verify", "123"]).unwrap();
        assert!(matches!(cli.command, Commands::Key(_)));
    }

    #[test]
    fn parse_render_fill() {
        let cli = Cli::try_parse_from(["sri", "render", "doc.json", "--fill", "12345678"]).unwrap();
        let Commands::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.fill.as_deref(), Some("12345678"));
    }

    #[test]
    fn rejects_malformed_today() {
        assert!(Cli::try_parse_from(["sri", "validate", "doc.json", "--today", "15/01/2026"]).is_err());
    }

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
