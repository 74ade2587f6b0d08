//! # TSK Counter Console
//!
//! Command-line front end for the billing core.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logs go to stderr, output to stdout)
//! 2. Parse the command line
//! 3. Load `tsk.toml` and environment overrides
//! 4. Open the database and run migrations
//! 5. Dispatch the subcommand
//! 6. Close the pool and exit with the error's code on failure
//!
//! ## Exit Codes
//! | Code | Meaning                         |
//! |------|---------------------------------|
//! | 0    | Success                         |
//! | 2    | Validation or config error      |
//! | 3    | Database or internal error      |
//! | 4    | Insufficient stock              |
//! | 5    | Not found                       |
//! | 6    | Business rule rejected          |

mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tsk_db::Database;

use cli::Cli;
use commands::Context;
use config::AppConfig;
use error::AppError;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let json = cli.json;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, json);
            ExitCode::from(err.code.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let db_config = config.db_config()?;
    debug!(path = %db_config.database_path.display(), "Opening database");

    let db = Database::new(db_config).await?;
    debug!(store = %config.store_name, "Console ready");

    let ctx = Context {
        db,
        config,
        json: cli.json,
    };

    let result = commands::dispatch(&ctx, cli.command).await;
    ctx.db.close().await;
    result
}

fn report(err: &AppError, json: bool) {
    if json {
        match serde_json::to_string(err) {
            Ok(body) => eprintln!("{}", body),
            Err(_) => eprintln!("error: {}", err),
        }
    } else {
        eprintln!("error: {}", err);
    }
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tsk_db=trace` - Trace the database layer only
/// - Default: warnings, plus info from the database layer and console
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,tsk=info,tsk_db=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
