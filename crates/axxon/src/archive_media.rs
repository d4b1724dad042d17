//! Archive snapshots.
//!
//! Depending on server version and configuration, the archive endpoint either answers with the
//! image itself or with a JSON description of an MJPEG stream that the image must be cut from.
use anyhow::Context;
use chrono::NaiveDateTime;
use futures_util::TryStreamExt;
use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::{
    client::send,
    error::{from_transport, Error},
    media::{resize_query, strip_hosts_prefix, Resolution},
    mjpeg::extract_first_frame,
    Client,
};

/// Format a point in time the way the archive endpoint expects it, e.g. `20240131T235959.000`.
///
/// Milliseconds are always zero.
pub fn archive_time_token(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%Y%m%dT%H%M%S.000").to_string()
}

/// Path of the archive endpoint for an access point, with or without the `hosts/` prefix.
pub fn media_path(access_point: &str, timestamp: &NaiveDateTime) -> String {
    format!(
        "archive/media/{}/{}",
        strip_hosts_prefix(access_point),
        archive_time_token(timestamp)
    )
}

/// What the archive endpoint answered, as declared by its content type.
#[derive(Debug, PartialEq, Eq)]
pub enum ArchiveResponse {
    Image(Vec<u8>),
    /// URL of an MJPEG stream holding the image.
    StreamDescriptor(String),
    /// Returned verbatim in the hope that it is an image.
    Unrecognized(Vec<u8>),
}

#[derive(Debug, Deserialize)]
struct StreamDescriptor {
    httpproxy: Option<String>,
    http: Option<String>,
}

impl ArchiveResponse {
    /// Decide what the archive endpoint answered.
    ///
    /// A JSON body names the stream in `httpproxy` or `http`. An empty `httpproxy` counts as
    /// absent, so `http` is used rather than failing with no URL.
    pub fn classify(content_type: &str, body: Vec<u8>) -> anyhow::Result<Self> {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("image") || content_type.contains("jpeg") {
            return Ok(Self::Image(body));
        }
        if !content_type.contains("json") {
            return Ok(Self::Unrecognized(body));
        }
        let StreamDescriptor { httpproxy, http } = serde_json::from_slice(&body)
            .map_err(|e| Error::MalformedResponse(format!("stream descriptor: {e}")))?;
        // The proxied URL goes through the server we are already talking to.
        let url = httpproxy
            .filter(|u| !u.is_empty())
            .or(http.filter(|u| !u.is_empty()))
            .ok_or_else(|| Error::MalformedResponse("no image URL in response".to_string()))?;
        Ok(Self::StreamDescriptor(url))
    }
}

pub struct ArchiveMedia {
    client: Client,
}

pub struct SnapshotRequestBuilder {
    client: Client,
    access_point: String,
    timestamp: NaiveDateTime,
    width: Option<u32>,
    height: Option<u32>,
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

    pub fn resolution(mut self, resolution: Option<Resolution>) -> Self {
        self.width = resolution.map(|r| r.width);
        self.height = resolution.map(|r| r.height);
        self
    }

    pub async fn send(self) -> anyhow::Result<Vec<u8>> {
        let Self {
            client,
            access_point,
            timestamp,
            width,
            height,
        } = self;
        client
            .until_closed(fetch(&client, &access_point, &timestamp, width, height))
            .await
            .context("Failed to fetch archive snapshot")
    }
}

async fn fetch(
    client: &Client,
    access_point: &str,
    timestamp: &NaiveDateTime,
    width: Option<u32>,
    height: Option<u32>,
) -> anyhow::Result<Vec<u8>> {
    let path = media_path(access_point, timestamp);
    debug!("Fetching archive snapshot from {path}");
    let mut query = vec![("format", "mjpeg".to_string())];
    query.extend(resize_query(width, height));
    let request = client
        .get(&path)?
        .query(&query)
        .timeout(client.fetch_timeout());
    let response = send(request).await?;
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response.bytes().await.map_err(from_transport)?.to_vec();

    match ArchiveResponse::classify(&content_type, body)? {
        ArchiveResponse::Image(image) => Ok(image),
        ArchiveResponse::StreamDescriptor(url) => {
            debug!("Extracting archive snapshot from stream {url}");
            let response = send(client.get_url(&url)?.timeout(client.fetch_timeout()))
                .await
                .context("Failed to open stream")?;
            extract_first_frame(response.bytes_stream().map_err(from_transport)).await
        }
        ArchiveResponse::Unrecognized(body) => {
            warn!(
                "Unrecognized content type {content_type:?}, using {} bytes as image",
                body.len()
            );
            Ok(body)
        }
    }
}

impl ArchiveMedia {
    /// Get the recorded image of a camera closest to `timestamp`.
    pub fn snapshot(self, access_point: &str, timestamp: NaiveDateTime) -> SnapshotRequestBuilder {
        SnapshotRequestBuilder {
            client: self.client,
            access_point: access_point.to_string(),
            timestamp,
            width: None,
            height: None,
        }
    }
}

impl Client {
    pub fn archive_media(&self) -> ArchiveMedia {
        ArchiveMedia {
            client: self.clone(),
        }
    }
}
