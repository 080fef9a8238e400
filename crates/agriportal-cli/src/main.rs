use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use agriportal_core::{AgriportalError, AppConfig, ExitCode, MemoryStore};

mod session;

use session::{Outcome, Session, load_seed, parse_line};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "agriportal",
    about = "Admin editing sessions with undo/redo for the Agriportal CMS",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format, one object per line.
    /// Also enabled by setting AGRIPORTAL_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Use this config file instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an editing session, reading commands from a script or stdin.
    ///
    /// Commands: create <resource> <json>, update <resource> <id> <json>,
    /// delete <resource> <id>, restore <resource> <json>, undo (or u),
    /// redo, clear, history, show <resource>.
    Session {
        /// Script file with one command per line.
        #[arg(long)]
        script: Option<PathBuf>,
        /// JSON file of initial rows: { "<resource>": [rows...] }.
        #[arg(long)]
        seed: Option<PathBuf>,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information.
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location.
    Path,
    /// Print the effective config.
    Show,
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("AGRIPORTAL_JSON").as_deref() == Ok("1");

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let loaded = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config {}: {e}", config_path.display());
            std::process::exit(e.exit_code() as i32);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Session { script, seed } => {
            let store = match seed {
                Some(path) => load_seed(&path).await?,
                None => MemoryStore::new(),
            };
            let mut session = Session::new(store, config.history.max_entries);

            let failures = match script {
                Some(path) => {
                    let file = tokio::fs::File::open(&path).await.map_err(|e| {
                        anyhow::anyhow!("Cannot open script {}: {e}", path.display())
                    })?;
                    run_session(&mut session, BufReader::new(file), json_output).await?
                }
                None => {
                    run_session(&mut session, BufReader::new(tokio::io::stdin()), json_output)
                        .await?
                }
            };

            info!(failures, "session finished");
            let code = session_exit_code(failures);
            if code != ExitCode::Success {
                std::process::exit(code as i32);
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Path => {
                if json_output {
                    print_json(&serde_json::json!({
                        "status": "ok",
                        "data": { "path": config_path.display().to_string() }
                    }))?;
                } else {
                    println!("{}", config_path.display());
                }
            }
            ConfigAction::Show => {
                if json_output {
                    print_json(&serde_json::json!({ "status": "ok", "data": config }))?;
                } else {
                    println!("# {}", config_path.display());
                    match config.history.max_entries {
                        Some(n) => println!("history.max_entries = {n}"),
                        None => println!("history.max_entries = (unbounded)"),
                    }
                    println!("log.filter = {:?}", config.log.filter);
                }
            }
        },

        Commands::Version => {
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "version": env!("CARGO_PKG_VERSION") }
                }))?;
            } else {
                println!("agriportal {}", env!("CARGO_PKG_VERSION"));
            }
        }
    }

    Ok(())
}

// ─── Session loop ────────────────────────────────────────────────────────────

/// Execute every line, reporting failures and carrying on. Returns how many
/// lines failed.
async fn run_session<R>(session: &mut Session, reader: R, json_output: bool) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut failures = 0;
    let mut line_no = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                failures += 1;
                report_error(line_no, &e.to_string(), "invalid_command", json_output)?;
                continue;
            }
        };

        match session.execute(command).await {
            Ok(outcome) => report_ok(&outcome, json_output)?,
            Err(e) => {
                failures += 1;
                let kind = match e.downcast_ref::<AgriportalError>() {
                    Some(AgriportalError::NotFound { .. }) => "not_found",
                    Some(AgriportalError::RowExists { .. }) => "conflict",
                    Some(AgriportalError::Reversal { .. }) => "reversal_failed",
                    Some(AgriportalError::Validation(_)) => "invalid_input",
                    _ => "error",
                };
                report_error(line_no, &format!("{e:#}"), kind, json_output)?;
            }
        }
    }

    Ok(failures)
}

fn session_exit_code(failures: usize) -> ExitCode {
    if failures == 0 {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    }
}

fn report_ok(outcome: &Outcome, json_output: bool) -> Result<()> {
    if json_output {
        print_json(&serde_json::json!({
            "status": "ok",
            "message": outcome.message,
            "data": outcome.data,
        }))
    } else {
        println!("{}", outcome.message);
        Ok(())
    }
}

fn report_error(line_no: usize, message: &str, kind: &str, json_output: bool) -> Result<()> {
    if json_output {
        print_json(&serde_json::json!({
            "status": "error",
            "error": kind,
            "message": message,
            "line": line_no,
        }))
    } else {
        eprintln!("line {line_no}: {message}");
        Ok(())
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
