use std::path::Path;

use anyhow::Context;
use log::info;

use crate::{args, config::Config};

#[derive(Clone, Debug, clap::Parser)]
pub struct ConnectCommand {
    /// Store the connection settings in the configuration file if the connection succeeds.
    #[arg(long)]
    save: bool,
}

impl ConnectCommand {
    pub async fn exec(self, config: &Config, config_path: &Path) -> anyhow::Result<()> {
        let Self { save } = self;
        let client = args::connect(&config.connection)?;
        client.probe().await?;
        println!("Connected to {}", client.url());
        client.close();
        if save {
            let mut stored = Config::load(config_path)?;
            stored.connection = config.connection.clone();
            stored
                .save(config_path)
                .context("Connected, but could not save the connection settings")?;
            info!("Saved connection settings to {config_path:?}");
        }
        Ok(())
    }
}
