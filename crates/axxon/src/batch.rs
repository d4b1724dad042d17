//! Fetching snapshots for many cameras, one at a time.

use std::future::Future;

use chrono::NaiveDateTime;
use log::{info, warn};

use crate::{camera_list::CameraRecord, media::Resolution, Client};

/// Where snapshots come from.
pub trait SnapshotSource {
    fn live_snapshot(
        &self,
        access_point: &str,
        resolution: Option<Resolution>,
    ) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send;

    fn archive_snapshot(
        &self,
        access_point: &str,
        timestamp: NaiveDateTime,
        resolution: Option<Resolution>,
    ) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send;
}

impl SnapshotSource for Client {
    fn live_snapshot(
        &self,
        access_point: &str,
        resolution: Option<Resolution>,
    ) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send {
        self.live_media()
            .snapshot(access_point)
            .resolution(resolution)
            .send()
    }

    fn archive_snapshot(
        &self,
        access_point: &str,
        timestamp: NaiveDateTime,
        resolution: Option<Resolution>,
    ) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send {
        self.archive_media()
            .snapshot(access_point, timestamp)
            .resolution(resolution)
            .send()
    }
}

/// The images of one camera, ready to be put in a report.
#[derive(Clone, Debug)]
pub struct CameraSnapshots {
    pub name: String,
    pub live_image: Vec<u8>,
    pub archive_image: Option<Vec<u8>>,
    pub archive_timestamp: Option<NaiveDateTime>,
}

#[derive(Debug)]
pub struct CameraFailure {
    pub name: String,
    pub error: anyhow::Error,
}

#[derive(Debug, Default)]
pub struct Batch {
    /// In the order the cameras were given.
    pub snapshots: Vec<CameraSnapshots>,
    pub failures: Vec<CameraFailure>,
}

/// Fetch the live, and optionally the archive, snapshot of every camera.
///
/// A camera whose live snapshot cannot be fetched is reported as a failure and left out. A camera
/// whose archive snapshot cannot be fetched is kept without an archive image.
///
/// `on_progress` is called with the number of cameras done, the total and the camera about to be
/// fetched.
pub async fn collect_snapshots<S>(
    source: &S,
    cameras: &[CameraRecord],
    resolution: Option<Resolution>,
    archive_time: Option<NaiveDateTime>,
    mut on_progress: impl FnMut(usize, usize, &CameraRecord),
) -> Batch
where
    S: SnapshotSource,
{
    let mut batch = Batch::default();
    let total = cameras.len();
    for (done, camera) in cameras.iter().enumerate() {
        on_progress(done, total, camera);
        let live_image = match source
            .live_snapshot(&camera.access_point, resolution)
            .await
        {
            Ok(image) => image,
            Err(error) => {
                warn!("Could not get live image for {}: {error:#}", camera.name);
                batch.failures.push(CameraFailure {
                    name: camera.name.clone(),
                    error,
                });
                continue;
            }
        };
        let archive_image = match archive_time {
            Some(timestamp) => match source
                .archive_snapshot(&camera.access_point, timestamp, resolution)
                .await
            {
                Ok(image) => Some(image),
                Err(error) => {
                    warn!("Could not get archive image for {}: {error:#}", camera.name);
                    None
                }
            },
            None => None,
        };
        batch.snapshots.push(CameraSnapshots {
            name: camera.name.clone(),
            live_image,
            archive_image,
            archive_timestamp: archive_time,
        });
    }
    info!(
        "Collected snapshots for {} of {total} cameras",
        batch.snapshots.len()
    );
    batch
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::bail;
    use chrono::NaiveDate;

    use super::*;

    struct FakeSource {
        failing_live: &'static str,
        failing_archive: &'static str,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(failing_live: &'static str, failing_archive: &'static str) -> Self {
            Self {
                failing_live,
                failing_archive,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl SnapshotSource for FakeSource {
        fn live_snapshot(
            &self,
            access_point: &str,
            _resolution: Option<Resolution>,
        ) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send {
            self.calls.lock().unwrap().push(format!("live {access_point}"));
            let fails = access_point == self.failing_live;
            let image = format!("live {access_point}").into_bytes();
            async move {
                if fails {
                    bail!("camera offline");
                }
                Ok(image)
            }
        }

        fn archive_snapshot(
            &self,
            access_point: &str,
            _timestamp: NaiveDateTime,
            _resolution: Option<Resolution>,
        ) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send {
            self.calls
                .lock()
                .unwrap()
                .push(format!("archive {access_point}"));
            let fails = access_point == self.failing_archive;
            let image = format!("archive {access_point}").into_bytes();
            async move {
                if fails {
                    bail!("no recording");
                }
                Ok(image)
            }
        }
    }

    fn cameras() -> Vec<CameraRecord> {
        (1..=3)
            .map(|i| CameraRecord {
                id: i.to_string(),
                name: format!("Camera {i}"),
                access_point: format!("S/DeviceIpint.{i}"),
                ip_address: "N/A".to_string(),
            })
            .collect()
    }

    fn archive_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn failing_live_snapshot_does_not_abort_batch() {
        let source = FakeSource::new("S/DeviceIpint.2", "");
        let mut progress = Vec::new();
        let batch = collect_snapshots(&source, &cameras(), None, None, |done, total, _| {
            progress.push((done, total))
        })
        .await;

        let names: Vec<_> = batch.snapshots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Camera 1", "Camera 3"]);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].name, "Camera 2");
        assert_eq!(progress, [(0, 3), (1, 3), (2, 3)]);
        assert_eq!(
            *source.calls.lock().unwrap(),
            ["live S/DeviceIpint.1", "live S/DeviceIpint.2", "live S/DeviceIpint.3"]
        );
    }

    #[tokio::test]
    async fn failing_archive_snapshot_keeps_camera() {
        let source = FakeSource::new("", "S/DeviceIpint.1");
        let batch =
            collect_snapshots(&source, &cameras(), None, Some(archive_time()), |_, _, _| {}).await;

        assert!(batch.failures.is_empty());
        assert_eq!(batch.snapshots.len(), 3);
        assert_eq!(batch.snapshots[0].archive_image, None);
        assert_eq!(batch.snapshots[0].archive_timestamp, Some(archive_time()));
        assert_eq!(
            batch.snapshots[1].archive_image.as_deref(),
            Some(&b"archive S/DeviceIpint.2"[..])
        );
    }

    #[tokio::test]
    async fn archive_is_skipped_without_time() {
        let source = FakeSource::new("", "");
        let batch = collect_snapshots(&source, &cameras(), None, None, |_, _, _| {}).await;
        assert!(batch.snapshots.iter().all(|s| s.archive_image.is_none()));
        assert!(source
            .calls
            .lock()
            .unwrap()
            .iter()
            .all(|c| c.starts_with("live")));
    }
}
