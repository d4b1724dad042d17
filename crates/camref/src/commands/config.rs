use crate::config::Config;

#[derive(Clone, Debug, clap::Parser)]
pub struct ConfigCommand {}

impl ConfigCommand {
    /// Print the effective configuration, without revealing the password.
    pub fn exec(self, config: &Config) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(&config.masked())?);
        Ok(())
    }
}
