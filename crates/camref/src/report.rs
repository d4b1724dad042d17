//! Writes collected snapshots to a directory, with a manifest describing them.
use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use camref_axxon::batch::CameraSnapshots;
use chrono::{Local, NaiveDateTime};
use log::debug;
use serde::Serialize;

use crate::config::ProjectConfig;

pub const MANIFEST_FILE_NAME: &str = "report.json";

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    project: &'a ProjectConfig,
    generated_at: NaiveDateTime,
    include_archive: bool,
    cameras: Vec<ManifestEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct ManifestEntry<'a> {
    name: &'a str,
    live_image: String,
    archive_image: Option<String>,
    archive_timestamp: Option<NaiveDateTime>,
}

fn slug(name: &str) -> String {
    let slug = name
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    match slug.is_empty() {
        true => "camera".to_string(),
        false => slug,
    }
}

fn write_image(dir: &Path, file_name: String, image: &[u8]) -> anyhow::Result<String> {
    let path = dir.join(&file_name);
    fs::write(&path, image).with_context(|| format!("Failed to write {path:?}"))?;
    debug!("Wrote {} bytes to {path:?}", image.len());
    Ok(file_name)
}

/// Write one file per image and a manifest, returning the path of the manifest.
///
/// Archive images are only written when `include_archive` is set.
pub fn write_report(
    dir: &Path,
    snapshots: &[CameraSnapshots],
    project: &ProjectConfig,
    include_archive: bool,
) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {dir:?}"))?;
    let mut cameras = Vec::with_capacity(snapshots.len());
    for (i, snapshot) in snapshots.iter().enumerate() {
        let CameraSnapshots {
            name,
            live_image,
            archive_image,
            archive_timestamp,
        } = snapshot;
        let prefix = format!("{:02}-{}", i + 1, slug(name));
        let live_image = write_image(dir, format!("{prefix}-live.jpg"), live_image)?;
        let archive_image = match archive_image {
            Some(image) if include_archive => Some(write_image(
                dir,
                format!("{prefix}-archive.jpg"),
                image,
            )?),
            _ => None,
        };
        cameras.push(ManifestEntry {
            name,
            live_image,
            archive_image,
            archive_timestamp: archive_timestamp.filter(|_| include_archive),
        });
    }
    let manifest = Manifest {
        project,
        generated_at: Local::now().naive_local(),
        include_archive,
        cameras,
    };
    let path = dir.join(MANIFEST_FILE_NAME);
    let text = serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
    fs::write(&path, text).with_context(|| format!("Failed to write {path:?}"))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn snapshots() -> Vec<CameraSnapshots> {
        let timestamp = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0);
        vec![
            CameraSnapshots {
                name: "Front Gate".to_string(),
                live_image: b"live 1".to_vec(),
                archive_image: Some(b"archive 1".to_vec()),
                archive_timestamp: timestamp,
            },
            CameraSnapshots {
                name: "Hall / West".to_string(),
                live_image: b"live 2".to_vec(),
                archive_image: None,
                archive_timestamp: timestamp,
            },
        ]
    }

    #[test]
    fn slug_keeps_only_alphanumeric_runs() {
        assert_eq!(slug("Hall / West"), "hall-west");
        assert_eq!(slug("Kamera Süd 2"), "kamera-süd-2");
        assert_eq!(slug("///"), "camera");
    }

    #[test]
    fn images_and_manifest_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectConfig {
            name: "Depot".to_string(),
            ..ProjectConfig::default()
        };

        let manifest = write_report(dir.path(), &snapshots(), &project, true).unwrap();

        assert_eq!(
            fs::read(dir.path().join("01-front-gate-live.jpg")).unwrap(),
            b"live 1"
        );
        assert_eq!(
            fs::read(dir.path().join("01-front-gate-archive.jpg")).unwrap(),
            b"archive 1"
        );
        assert!(!dir.path().join("02-hall-west-archive.jpg").exists());

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(manifest).unwrap()).unwrap();
        assert_eq!(value["project"]["name"], "Depot");
        assert_eq!(value["cameras"][0]["archive_image"], "01-front-gate-archive.jpg");
        assert_eq!(value["cameras"][0]["archive_timestamp"], "2024-02-01T10:00:00");
        assert_eq!(value["cameras"][1]["live_image"], "02-hall-west-live.jpg");
        assert!(value["cameras"][1]["archive_image"].is_null());
    }

    #[test]
    fn archive_is_left_out_when_not_included() {
        let dir = tempfile::tempdir().unwrap();
        write_report(dir.path(), &snapshots(), &ProjectConfig::default(), false).unwrap();
        assert!(!dir.path().join("01-front-gate-archive.jpg").exists());
        assert!(dir.path().join("01-front-gate-live.jpg").exists());
    }
}
