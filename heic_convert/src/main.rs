use anyhow::Context;
use clap::Parser;
use heic_convert::{execute, Cli};
use shared_utils::logging::{init_logging, LogConfig};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::Level;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli) {
        eprintln!("⚠️  {:#}", e);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let code = execute(&cli, None, &mut out, &mut io::stderr());
    out.flush().context("Could not flush report to stdout")?;

    Ok(ExitCode::from(code))
}

fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let mut config = LogConfig::default().with_level(level);
    if let Some(dir) = &cli.log_dir {
        config = config.with_log_dir(dir);
    }
    init_logging("heic_convert", config).context("Could not initialize logging")
}
