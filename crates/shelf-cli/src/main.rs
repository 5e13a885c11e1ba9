//! Shelf CLI binary entrypoint.
//!
//! This is the main entry point for the `shelf` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use shelf_cli::Cli;

fn main() -> ExitCode {
    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();

    match shelf_cli::run(cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error [{}]: {e}", e.reason());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_cli::{Commands, Format};

    #[test]
    fn cli_parses_treasury() {
        let cli = Cli::parse_from(["shelf", "treasury"]);
        assert!(matches!(cli.command, Commands::Treasury));
    }

    #[test]
    fn cli_parses_rent() {
        let cli = Cli::parse_from(["shelf", "rent", "--as", "bob", "3", "--pay", "0.11"]);
        match cli.command {
            Commands::Rent { who, id, pay, at } => {
                assert_eq!(who, "bob");
                assert_eq!(id, 3);
                assert_eq!(pay, "0.11");
                assert_eq!(at, None);
            }
            other => unreachable!("expected rent command, got {other:?}"),
        }
    }

    #[test]
    fn cli_parses_return_with_extra() {
        let cli = Cli::parse_from(["shelf", "return", "--as", "bob", "0", "--extra", "0.02", "--at", "720"]);
        assert!(matches!(
            cli.command,
            Commands::Return { ref extra, at: Some(720), .. } if extra.as_deref() == Some("0.02")
        ));
    }

    #[test]
    fn cli_respects_format_flag() {
        let cli = Cli::parse_from(["shelf", "--format", "json", "books"]);
        assert_eq!(cli.format, Format::Json);
    }

    #[test]
    fn cli_respects_state_flag() {
        let cli = Cli::parse_from(["shelf", "--state", "/tmp/other.json", "books", "--available"]);
        assert_eq!(cli.state, std::path::PathBuf::from("/tmp/other.json"));
    }

    #[test]
    fn cli_rejects_conflicting_filters() {
        assert!(Cli::try_parse_from(["shelf", "books", "--owner", "a", "--renter", "b"]).is_err());
    }
}
