use std::{fs, path::PathBuf};

use anyhow::Context;
use camref_axxon::{list_cameras, Client};
use log::info;

use crate::{args, commands::select_cameras, config::Config};

#[derive(Clone, Debug, clap::Parser)]
pub struct SnapshotCommand {
    /// Name, id or access point of the camera.
    camera: String,
    /// Fetch the recorded image at this local time (`YYYY-MM-DD HH:MM:SS`) instead of the live one.
    #[arg(long)]
    at: Option<String>,
    /// `{width}x{height}` or `Original`; defaults to the configured resolution.
    #[arg(long)]
    resolution: Option<String>,
    /// Where to write the JPEG image.
    #[arg(short, long)]
    output: PathBuf,
}

impl SnapshotCommand {
    pub async fn exec(self, client: &Client, config: &Config) -> anyhow::Result<()> {
        let Self {
            camera,
            at,
            resolution,
            output,
        } = self;
        let timestamp = at.as_deref().map(args::parse_archive_time).transpose()?;
        let resolution = args::resolution(resolution.as_deref(), &config.export)?;

        let cameras = list_cameras().send(client).await?;
        let camera = select_cameras(cameras, &[camera])?
            .into_iter()
            .next()
            .context("Camera list changed while selecting a camera")?;

        let image = match timestamp {
            Some(timestamp) => {
                client
                    .archive_media()
                    .snapshot(&camera.access_point, timestamp)
                    .resolution(resolution)
                    .send()
                    .await?
            }
            None => {
                client
                    .live_media()
                    .snapshot(&camera.access_point)
                    .resolution(resolution)
                    .send()
                    .await?
            }
        };
        fs::write(&output, &image).with_context(|| format!("Failed to write {output:?}"))?;
        info!("Wrote {} bytes from {} to {output:?}", image.len(), camera.name);
        Ok(())
    }
}
