pub mod cameras;
pub mod config;
pub mod connect;
pub mod export;
pub mod project;
pub mod snapshot;

use camref_axxon::{strip_hosts_prefix, CameraRecord, Error};

fn matches(camera: &CameraRecord, selector: &str) -> bool {
    camera.name == selector
        || camera.id == selector
        || strip_hosts_prefix(&camera.access_point) == strip_hosts_prefix(selector)
}

/// Pick the cameras matching the selectors, by name, id or access point, in catalog order.
///
/// No selectors selects every camera; a selector that matches nothing is an error.
pub(crate) fn select_cameras(
    cameras: Vec<CameraRecord>,
    selectors: &[String],
) -> anyhow::Result<Vec<CameraRecord>> {
    if let Some(unknown) = selectors
        .iter()
        .find(|s| !cameras.iter().any(|c| matches(c, s)))
    {
        return Err(Error::InvalidInput(format!("no camera matches {unknown:?}")).into());
    }
    if selectors.is_empty() {
        return Ok(cameras);
    }
    Ok(cameras
        .into_iter()
        .filter(|c| selectors.iter().any(|s| matches(c, s)))
        .collect())
}
