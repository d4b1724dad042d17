use std::path::PathBuf;

use anyhow::bail;
use camref_axxon::{batch::collect_snapshots, list_cameras, CameraRecord, Client};
use chrono::Local;
use log::info;

use crate::{args, commands::select_cameras, config::Config, report::write_report};

#[derive(Clone, Debug, clap::Parser)]
pub struct ExportCommand {
    /// Name, id or access point of a camera to include; all cameras if omitted.
    #[arg(long = "camera")]
    cameras: Vec<String>,
    /// Include archive images even if the configuration leaves them out.
    #[arg(long, conflicts_with = "no_archive")]
    archive: bool,
    /// Leave out archive images even if the configuration includes them.
    #[arg(long)]
    no_archive: bool,
    /// Local time (`YYYY-MM-DD HH:MM:SS`) of the archive images; implies `--archive`.
    ///
    /// Defaults to the configured number of hours ago.
    #[arg(long, conflicts_with = "no_archive")]
    at: Option<String>,
    /// `{width}x{height}` or `Original`; defaults to the configured resolution.
    #[arg(long)]
    resolution: Option<String>,
    /// Directory to write the report to.
    #[arg(short, long)]
    output: PathBuf,
}

impl ExportCommand {
    pub async fn exec(self, client: &Client, config: &Config) -> anyhow::Result<()> {
        let Self {
            cameras,
            archive,
            no_archive,
            at,
            resolution,
            output,
        } = self;
        let include_archive = match (archive || at.is_some(), no_archive) {
            (true, _) => true,
            (false, true) => false,
            (false, false) => config.export.include_archive,
        };
        let archive_time = match (include_archive, at.as_deref()) {
            (false, _) => None,
            (true, Some(at)) => Some(args::parse_archive_time(at)?),
            (true, None) => Some(
                config
                    .export
                    .default_archive_time(Local::now().naive_local()),
            ),
        };
        let resolution = args::resolution(resolution.as_deref(), &config.export)?;

        let cameras = select_cameras(list_cameras().send(client).await?, &cameras)?;
        if cameras.is_empty() {
            bail!("The server has no cameras to export");
        }

        let progress = |done: usize, total: usize, camera: &CameraRecord| {
            eprintln!("[{}/{total}] Fetching images for {}", done + 1, camera.name);
        };
        let batch = collect_snapshots(client, &cameras, resolution, archive_time, progress).await;

        for failure in &batch.failures {
            eprintln!("Could not fetch images for {}: {:#}", failure.name, failure.error);
        }
        if batch.snapshots.is_empty() {
            bail!("Could not fetch images for any camera");
        }

        let manifest = write_report(&output, &batch.snapshots, &config.project, include_archive)?;
        info!("Wrote manifest to {manifest:?}");
        println!(
            "Exported {} of {} cameras to {output:?}",
            batch.snapshots.len(),
            cameras.len()
        );
        Ok(())
    }
}
