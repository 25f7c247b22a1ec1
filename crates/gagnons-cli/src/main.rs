//! Gagnons - command-line client for the Gagnons service.
//!
//! Logs in against the remote service, keeps the access token between runs,
//! and shows the protected dashboard while the session is valid.

mod app;

use std::io;
use std::path::Path;

use anyhow::Result;
use gagnons_core::routes::ENTRY_VIEW;
use gagnons_core::Config;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

const USAGE: &str = "\
Usage: gagnons [COMMAND]

Commands:
  login [USERNAME]   Log in, then open the dashboard
  logout             Forget the stored session
  status             Print whether a session is held
  open PATH          Open a view (/, /dashboard)

Without a command, opens /.";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Login(Option<String>),
    Logout,
    Status,
    Open(String),
    Help,
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        let mut rest = args.iter().skip(1).map(String::as_str);
        let command = match rest.next() {
            None => Command::Open(ENTRY_VIEW.to_string()),
            Some("login") => Command::Login(rest.next().map(str::to_string)),
            Some("logout") => Command::Logout,
            Some("status") => Command::Status,
            Some("open") => {
                let path = rest
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("open requires a PATH\n\n{}", USAGE))?;
                Command::Open(path.to_string())
            }
            Some("-h" | "--help" | "help") => Command::Help,
            Some(other) => return Err(anyhow::anyhow!("Unknown command: {}\n\n{}", other, USAGE)),
        };

        if let Some(extra) = rest.next() {
            return Err(anyhow::anyhow!("Unexpected argument: {}\n\n{}", extra, USAGE));
        }
        Ok(command)
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file.and_then(|p| Some((p.parent()?, p.file_name()?))) {
        Some((dir, name)) => {
            let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let command = Command::parse(&args)?;
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let (mut config, load_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.apply_env();

    let _guard = init_tracing(config.log_file.as_deref());
    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }
    info!(?command, "Gagnons starting");

    let mut app = App::new(config)?;
    match command {
        Command::Login(username) => app.login(username).await,
        Command::Logout => app.logout(),
        Command::Status => app.status(),
        Command::Open(path) => app.open(&path).await,
        Command::Help => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command> {
        let args: Vec<String> = std::iter::once("gagnons")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect();
        Command::parse(&args)
    }

    #[test]
    fn test_no_command_opens_entry_view() {
        assert_eq!(parse(&[]).unwrap(), Command::Open("/".to_string()));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse(&["login"]).unwrap(), Command::Login(None));
        assert_eq!(
            parse(&["login", "alice"]).unwrap(),
            Command::Login(Some("alice".to_string()))
        );
        assert_eq!(parse(&["logout"]).unwrap(), Command::Logout);
        assert_eq!(parse(&["status"]).unwrap(), Command::Status);
        assert_eq!(
            parse(&["open", "/dashboard"]).unwrap(),
            Command::Open("/dashboard".to_string())
        );
        assert_eq!(parse(&["--help"]).unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&["open"]).is_err());
        assert!(parse(&["frobnicate"]).is_err());
        assert!(parse(&["logout", "now"]).is_err());
    }
}
