use std::io;
use std::process::ExitCode;

use anyhow::Context;
use brandqr::config::Config;
use brandqr::logo::default_rasterizer;
use brandqr::shell::Shell;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> anyhow::Result<bool> {
    let config = Config::load().context("failed to load configuration")?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    let outcome = Shell::new(stdin.lock(), stdout.lock(), &config, default_rasterizer())
        .run()
        .context("terminal I/O failed")?;
    Ok(!outcome.is_failure())
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("brandqr: {e:#}");
            ExitCode::FAILURE
        }
    }
}
