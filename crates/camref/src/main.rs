#![forbid(unsafe_code)]

mod args;
mod commands;
mod config;
mod logger;
mod report;

use std::{io, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use crate::{
    args::ConnectionArgs,
    commands::{
        cameras::CamerasCommand, config::ConfigCommand, connect::ConnectCommand,
        export::ExportCommand, project::ProjectCommand, snapshot::SnapshotCommand,
    },
    config::Config,
};

/// Collect live and archive reference images from an Axxon One server.
#[derive(Parser)]
#[command(name = "camref")]
struct Cli {
    /// Location of the configuration file.
    #[clap(long, global = true, env = "CAMREF_CONFIG")]
    config: Option<PathBuf>,
    #[command(flatten)]
    connection: ConnectionArgs,
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn exec(self) -> anyhow::Result<()> {
        let Self {
            config: config_path,
            connection,
            command,
        } = self;
        let config_path = match config_path {
            Some(p) => p,
            None => Config::default_path()?,
        };
        let mut config = Config::load(&config_path)?;
        connection.apply(&mut config.connection);
        match command {
            Commands::Connect(cmd) => cmd.exec(&config, &config_path).await?,
            Commands::Cameras(cmd) => cmd.exec(&args::connect(&config.connection)?).await?,
            Commands::Snapshot(cmd) => {
                cmd.exec(&args::connect(&config.connection)?, &config)
                    .await?
            }
            Commands::Export(cmd) => {
                cmd.exec(&args::connect(&config.connection)?, &config)
                    .await?
            }
            Commands::Project(cmd) => cmd.exec(&config_path)?,
            Commands::Config(cmd) => cmd.exec(&config)?,
            Commands::Completions { shell } => {
                generate(shell, &mut Self::command(), "camref", &mut io::stdout())
            }
        }
        Ok(())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the server is reachable and accepts the credentials.
    Connect(ConnectCommand),
    /// List the cameras of the server.
    Cameras(CamerasCommand),
    /// Save a single live or archive image.
    Snapshot(SnapshotCommand),
    /// Save live and archive images of many cameras, with a manifest.
    Export(ExportCommand),
    /// Set the project details recorded in exported reports.
    Project(ProjectCommand),
    /// Print the effective configuration.
    Config(ConfigCommand),
    /// Print a completion file for the given shell.
    ///
    /// Example: `camref completions zsh | source /dev/stdin`.
    Completions { shell: Shell },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut guard = logger::init();
    Cli::parse().exec().await?;
    guard.disarm();
    Ok(())
}
