//! termgram entry point.

use std::{
    error::Error,
    io::{self, Write},
    process::ExitCode,
    sync::Arc,
};

use clap::Parser;
use termgram_app::login::{self, Prompter};
use termgram_app::repl::Repl;
use termgram_client::{Authenticator, SIM_LOGIN_CODE, SimBackend, SimConfig};
use termgram_tui::{Args, Config, Mode, Runtime, TerminalDriver, TerminalPrompter, logging};
use tokio::io::BufReader;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = writeln!(io::stderr(), "termgram: {err}");
            ExitCode::FAILURE
        },
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = Config::from_args(Args::parse())?;
    let _log_guard = logging::init(config.mode, &config.log_level, config.log_file.as_deref())?;
    info!(mode = ?config.mode, api_id = config.api_id, session = %config.session.display(), "starting");

    let backend = Arc::new(SimBackend::seeded(SimConfig {
        session_path: Some(config.session.clone()),
        ..SimConfig::default()
    }));

    let mut prompter = TerminalPrompter::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    let authorized = match backend.is_authorized().await {
        Ok(authorized) => authorized,
        Err(err) => {
            warn!(error = %err, "could not check saved session");
            false
        },
    };
    if !authorized {
        prompter.notify(&format!("Offline account: the login code is {SIM_LOGIN_CODE}.")).await?;
    }
    login::run(backend.as_ref(), &mut prompter).await?;

    match config.mode {
        Mode::Legacy => {
            let (reader, writer) = prompter.into_parts();
            Repl::new(backend, reader, writer, config.limit).run().await?;
        },
        Mode::Interactive => {
            drop(prompter);
            let driver = TerminalDriver::new()?;
            Runtime::new(driver, backend, config.limit).run().await?;
        },
    }

    info!("exiting");
    Ok(())
}
