use std::path::Path;

use crate::config::Config;

#[derive(Clone, Debug, clap::Parser)]
pub struct ProjectCommand {
    /// Name of the project the report is made for.
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    location: Option<String>,
    /// Who took the pictures.
    #[arg(long)]
    technician: Option<String>,
    #[arg(long)]
    company: Option<String>,
    /// Image to show on the report.
    #[arg(long)]
    logo: Option<String>,
}

impl ProjectCommand {
    /// Update the given project fields in the configuration file.
    pub fn exec(self, config_path: &Path) -> anyhow::Result<()> {
        let Self {
            name,
            location,
            technician,
            company,
            logo,
        } = self;
        // Start from the file so that overrides from the command line are not persisted.
        let mut config = Config::load(config_path)?;
        let project = &mut config.project;
        for (field, value) in [
            (&mut project.name, name),
            (&mut project.location, location),
            (&mut project.technician, technician),
            (&mut project.company, company),
            (&mut project.logo_path, logo),
        ] {
            if let Some(value) = value {
                *field = value;
            }
        }
        config.save(config_path)
    }
}
