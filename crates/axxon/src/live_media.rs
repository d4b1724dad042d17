//! Live snapshots.
use anyhow::Context;
use log::debug;

use crate::{
    client::send,
    error::from_transport,
    media::{resize_query, strip_hosts_prefix, Resolution},
    Client,
};

pub struct LiveMedia {
    client: Client,
}

pub struct SnapshotRequestBuilder {
    client: Client,
    access_point: String,
    width: Option<u32>,
    height: Option<u32>,
}

/// Path of the live snapshot endpoint for an access point, with or without the `hosts/` prefix.
pub fn snapshot_path(access_point: &str) -> String {
    format!("live/media/snapshot/{}", strip_hosts_prefix(access_point))
}

impl SnapshotRequestBuilder {
    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Set both dimensions, or clear them to get the native camera resolution.
    pub fn resolution(mut self, resolution: Option<Resolution>) -> Self {
        self.width = resolution.map(|r| r.width);
        self.height = resolution.map(|r| r.height);
        self
    }

    pub async fn send(self) -> anyhow::Result<Vec<u8>> {
        let Self {
            client,
            access_point,
            width,
            height,
        } = self;
        client
            .until_closed(fetch(&client, &access_point, width, height))
            .await
            .context("Failed to fetch live snapshot")
    }
}

async fn fetch(
    client: &Client,
    access_point: &str,
    width: Option<u32>,
    height: Option<u32>,
) -> anyhow::Result<Vec<u8>> {
    let path = snapshot_path(access_point);
    debug!("Fetching live snapshot from {path}");
    let query = resize_query(width, height);
    let request = client
        .get(&path)?
        .query(&query)
        .timeout(client.fetch_timeout());
    let response = send(request).await?;
    let bytes = response.bytes().await.map_err(from_transport)?;
    Ok(bytes.to_vec())
}

impl LiveMedia {
    /// Get the current image of a camera.
    pub fn snapshot(self, access_point: &str) -> SnapshotRequestBuilder {
        SnapshotRequestBuilder {
            client: self.client,
            access_point: access_point.to_string(),
            width: None,
            height: None,
        }
    }
}

impl Client {
    pub fn live_media(&self) -> LiveMedia {
        LiveMedia {
            client: self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_ignores_hosts_prefix() {
        assert_eq!(
            snapshot_path("hosts/SERVER/DeviceIpint.3/SourceEndpoint.video:0:0"),
            snapshot_path("SERVER/DeviceIpint.3/SourceEndpoint.video:0:0"),
        );
        assert_eq!(
            snapshot_path("SERVER/DeviceIpint.3/SourceEndpoint.video:0:0"),
            "live/media/snapshot/SERVER/DeviceIpint.3/SourceEndpoint.video:0:0"
        );
    }
}
