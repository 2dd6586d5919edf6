//! skyops - command line front end for drone operations coordination.
//!
//! Each invocation turns its arguments into one structured request, runs it
//! against a freshly loaded session and prints the outcome as JSON on
//! stdout. Rendering tables or text is left to whatever reads that JSON.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use skyops_core::store::TokenStore;
use skyops_core::{
    handle, Config, DroneFilter, DroneStatus, ErrorResult, PilotFilter, PilotStatus, Request,
    Response, Session,
};

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "skyops.log";

#[derive(Parser)]
#[command(name = "skyops")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Coordinate drone pilots, drones and missions")]
struct Cli {
    /// Directory holding pilot_roster.csv, drone_fleet.csv and missions.csv
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Evaluate dates as of this day (YYYY-MM-DD) instead of today
    #[arg(long, global = true, value_parser = parse_date)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List pilots, optionally filtered
    Pilots {
        #[arg(long)]
        skill: Option<String>,
        #[arg(long)]
        certification: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, value_parser = parse_pilot_status)]
        status: Option<PilotStatus>,
    },

    /// List available pilots
    Available,

    /// List drones, optionally filtered
    Drones {
        #[arg(long)]
        capability: Option<String>,
        #[arg(long, value_parser = parse_drone_status)]
        status: Option<DroneStatus>,
        #[arg(long)]
        location: Option<String>,
    },

    /// List missions
    Missions,

    /// List pilots holding a current assignment
    Assignments,

    /// List drones whose maintenance is due
    MaintenanceDue,

    /// Pilots qualified for a project
    Match { project_id: String },

    /// Drones suited to a project
    MatchDrones { project_id: String },

    /// Report scheduling and resource conflicts
    Conflicts,

    /// Suggest replacements for a project
    Urgent {
        project_id: String,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Set a pilot's status
    SetStatus { pilot_id: String, status: String },

    /// Set a drone's status
    SetDroneStatus { drone_id: String, status: String },

    /// Assign a pilot to a project
    Assign { pilot_id: String, project_id: String },

    /// Clear a pilot's assignment
    Unassign { pilot_id: String },

    /// Assign a drone to a project
    AssignDrone { drone_id: String, project_id: String },

    /// Clear a drone's assignment
    UnassignDrone { drone_id: String },

    /// Retry pending write-throughs
    Sync,

    /// Run a raw JSON request, e.g. '{"op":"list_available"}'
    Request { json: String },

    /// Store a Google Sheets access token in the OS keychain
    Login,

    /// Remove the stored access token
    Logout,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| format!("{}: {}", raw, e))
}

fn parse_pilot_status(raw: &str) -> Result<PilotStatus, String> {
    raw.parse().map_err(|e: skyops_core::OpsError| e.to_string())
}

fn parse_drone_status(raw: &str) -> Result<DroneStatus, String> {
    raw.parse().map_err(|e: skyops_core::OpsError| e.to_string())
}

impl Command {
    /// The request this command stands for. `None` for keychain commands.
    fn into_request(self) -> Result<Option<Request>> {
        let request = match self {
            Command::Pilots {
                skill,
                certification,
                location,
                status,
            } => Request::ListPilots {
                filter: PilotFilter {
                    skill,
                    certification,
                    location,
                    status,
                },
            },
            Command::Available => Request::ListAvailable,
            Command::Drones {
                capability,
                status,
                location,
            } => Request::ListDrones {
                filter: DroneFilter {
                    capability,
                    status,
                    location,
                },
            },
            Command::Missions => Request::ListMissions,
            Command::Assignments => Request::CurrentAssignments,
            Command::MaintenanceDue => Request::MaintenanceDue,
            Command::Match { project_id } => Request::MatchProject { project_id },
            Command::MatchDrones { project_id } => Request::MatchDrones { project_id },
            Command::Conflicts => Request::DetectConflicts,
            Command::Urgent { project_id, reason } => {
                Request::UrgentReassignment { project_id, reason }
            }
            Command::SetStatus { pilot_id, status } => {
                Request::UpdatePilotStatus { pilot_id, status }
            }
            Command::SetDroneStatus { drone_id, status } => {
                Request::UpdateDroneStatus { drone_id, status }
            }
            Command::Assign {
                pilot_id,
                project_id,
            } => Request::Assign {
                pilot_id,
                project_id,
            },
            Command::Unassign { pilot_id } => Request::Unassign { pilot_id },
            Command::AssignDrone {
                drone_id,
                project_id,
            } => Request::AssignDrone {
                drone_id,
                project_id,
            },
            Command::UnassignDrone { drone_id } => Request::UnassignDrone { drone_id },
            Command::Sync => Request::Sync,
            Command::Request { json } => {
                serde_json::from_str(&json).context("Failed to parse request JSON")?
            }
            Command::Login | Command::Logout => return Ok(None),
        };
        Ok(Some(request))
    }
}

/// Initialize the tracing subscriber for logging.
/// Logs go to stderr, or to a daily file when a log directory is set.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn login() -> Result<()> {
    let token = rpassword::prompt_password("Google Sheets access token: ")
        .context("Failed to read access token")?;
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("No access token entered");
    }
    TokenStore::store(token)?;
    println!("Access token stored in keychain");
    Ok(())
}

fn logout() -> Result<()> {
    TokenStore::delete()?;
    println!("Access token removed from keychain");
    Ok(())
}

fn print_outcome(outcome: &Result<Response, ErrorResult>) -> Result<()> {
    let json = match outcome {
        Ok(response) => serde_json::to_string_pretty(response)?,
        Err(error) => serde_json::to_string_pretty(&serde_json::json!({ "error": error }))?,
    };
    println!("{}", json);
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let request = cli
        .command
        .into_request()?
        .context("Command does not map to a request")?;

    let mut config = Config::load()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let backend = config.backend()?;
    info!(backend = %backend.describe(), request = request.name(), "Starting");

    let session = Session::load(backend)
        .await
        .map_err(ErrorResult::from);
    let outcome = match session {
        Ok(session) => {
            let mut session = match cli.today {
                Some(today) => session.with_evaluation_date(today),
                None => session,
            };
            handle(&mut session, request).await
        }
        Err(error) => Err(error),
    };

    print_outcome(&outcome)?;
    Ok(if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Login => login().map(|_| ExitCode::SUCCESS),
        Command::Logout => logout().map(|_| ExitCode::SUCCESS),
        _ => {
            let log_dir = Config::load().ok().and_then(|c| c.log_dir);
            let _guard = init_tracing(log_dir.as_deref());
            run(cli).await
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
