//! torrename - rename torrent files with FileBot through qBittorrent
//!
//! # Usage
//!
//! ```bash
//! # Start the HTTP API (default)
//! torrename
//!
//! # CLI mode
//! torrename torrents --json
//! torrename suggest <hash> --type tv
//! torrename check
//! ```

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use torrename::config::Config;
use torrename::logging::init_logging;
use torrename::server;

use crate::cli::{Cli, Command, ExitCode, Output};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format)?;

    let mut config = Config::load(cli.config.as_deref())?;

    if cli.is_server_mode() {
        if let Some(Command::Serve(cmd)) = &cli.command {
            if let Some(port) = cmd.port {
                config.server.port = port;
            }
            if let Some(bind) = &cmd.bind {
                config.server.bind = bind.clone();
            }
        }
        server::serve(&config).await
    } else {
        // CLI mode: execute command and exit
        let exit_code = run_cli(cli, &config).await;
        std::process::exit(exit_code.into());
    }
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli, config: &Config) -> ExitCode {
    let output = Output::new(&cli);

    match cli.command {
        Some(Command::Torrents(cmd)) => commands::torrents_cmd(cmd, config, &output).await,

        Some(Command::Suggest(cmd)) => commands::suggest_cmd(cmd, config, &output).await,

        Some(Command::Rename(cmd)) => commands::rename_cmd(cmd, config, &output).await,

        Some(Command::Check(cmd)) => commands::check_cmd(cmd, config, &output).await,

        Some(Command::Serve(_)) | None => {
            // Handled by is_server_mode()
            ExitCode::Success
        }
    }
}
