//! FinLoan - Loan Application Wizard
//!
//! A terminal wizard that walks an applicant through a three-step loan
//! application, validating as they type, and hands the finished application
//! off as JSON.
//!
//! ## Usage
//!
//! ```bash
//! # Start the wizard
//! finloan
//!
//! # With verbose logging
//! finloan -v
//!
//! # Resume a saved draft
//! finloan --draft my-application
//!
//! # With custom config and storage
//! finloan --config ./finloan.yaml --storage-dir ./data
//! ```

use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::Parser;
use finloan_core::{FinloanConfig, LocalStorage, LogGuard, init_logging};
use finloan_form::{LoanApplication, LoanDecision, LoanInsights};
use finloan_tui::App;
use tracing::{error, info, warn};

/// FinLoan Loan Application Wizard
///
/// Fill in a loan application step by step in the terminal. The submitted
/// application is printed to stdout as JSON.
#[derive(Parser, Debug)]
#[command(name = "finloan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.finloan/logs/)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Config file (defaults to ~/.finloan/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for drafts and submissions (overrides the config file)
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Draft key to restore at startup and save to with Ctrl+S
    #[arg(long)]
    draft: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::from(1);
        }
    };

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!("Error: {}", e);
            if let Some(hint) = e.guidance() {
                eprintln!("Hint: {}", hint);
            }
            return ExitCode::from(2);
        }
    };

    let storage = open_storage(&cli, &config);

    install_panic_hook();

    info!("Starting FinLoan wizard");

    let mut app = App::new(&config.form, storage.clone());
    if let Some(key) = &cli.draft {
        app = app.with_draft_key(key.as_str());
        app.load_draft(Instant::now());
    }

    match app.run() {
        Ok(Some(application)) => {
            info!(applicant = %application.applicant_name, "application submitted");
            hand_off(&application, storage.as_ref())
        }
        Ok(None) => {
            info!("FinLoan wizard exited without submitting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("FinLoan wizard error: {}", e);
            eprintln!("Error: {}", e);
            eprintln!("Hint: {}", e.guidance());
            ExitCode::from(1)
        }
    }
}

/// Install a panic hook that restores the terminal before printing the panic message.
fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Restore terminal to its normal state.
fn restore_terminal() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();

    let _ = crossterm::terminal::disable_raw_mode();

    crossterm::execute!(
        stdout,
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::event::DisableMouseCapture
    )?;
    crossterm::execute!(stdout, crossterm::cursor::Show)?;

    stdout.flush()?;

    Ok(())
}

/// Set up logging based on CLI arguments.
fn setup_logging(cli: &Cli) -> finloan_core::Result<LogGuard> {
    let debug = cli.verbose > 0;
    init_logging(cli.log_dir.clone(), debug)
}

fn load_config(cli: &Cli) -> finloan_core::Result<FinloanConfig> {
    match &cli.config {
        Some(path) => FinloanConfig::load_from(path),
        None => FinloanConfig::load(),
    }
}

/// Storage is optional: without it drafts are disabled and submissions are
/// only printed.
fn open_storage(cli: &Cli, config: &FinloanConfig) -> Option<LocalStorage> {
    let dir = match &cli.storage_dir {
        Some(dir) => dir.clone(),
        None => match config.storage.resolve_dir() {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Local storage disabled: {}", e);
                return None;
            }
        },
    };
    Some(LocalStorage::new(dir))
}

/// Print the submitted application and keep a copy in local storage.
fn hand_off(application: &LoanApplication, storage: Option<&LocalStorage>) -> ExitCode {
    let payload = submission_payload(application);

    let json = match serde_json::to_string_pretty(&payload) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize application: {}", e);
            eprintln!("Error: failed to serialize application: {}", e);
            return ExitCode::from(1);
        }
    };
    println!("{}", json);

    if let Some(storage) = storage
        && store_submission(storage, &payload, Utc::now()).is_none()
    {
        eprintln!("Warning: the application could not be saved locally");
    }

    ExitCode::SUCCESS
}

/// The application with its estimate and approval decision.
fn submission_payload(application: &LoanApplication) -> serde_json::Value {
    let insights = LoanInsights::for_application(application);
    let decision = LoanDecision::for_application(application);
    info!(
        status = ?decision.status,
        probability = decision.approval_probability,
        "loan decision"
    );
    serde_json::json!({
        "application": application,
        "insights": insights,
        "decision": decision,
    })
}

/// Save under `application-<timestamp>`. Returns the key on success.
fn store_submission(
    storage: &LocalStorage,
    payload: &serde_json::Value,
    at: DateTime<Utc>,
) -> Option<String> {
    let key = format!("application-{}", at.format("%Y%m%d%H%M%S"));
    if !storage.save(&key, payload) {
        return None;
    }
    info!(key = %key, dir = %storage.dir().display(), "application stored");
    Some(key)
}
