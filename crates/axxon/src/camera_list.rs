//! The camera catalog, normalized into one record per usable camera.

use anyhow::Context;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    client::send,
    error::{from_transport, Error},
    Client,
};

const PATH: &str = "camera/list";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraRecord {
    pub id: String,
    pub name: String,
    /// The video source used in every per-camera endpoint, e.g.
    /// `hosts/SERVER/DeviceIpint.1/SourceEndpoint.video:0:0`.
    pub access_point: String,
    pub ip_address: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CameraListPayload {
    Bare(Vec<RawCamera>),
    Wrapped {
        #[serde(default)]
        cameras: Vec<RawCamera>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCamera {
    display_id: Option<String>,
    id: Option<String>,
    display_name: Option<String>,
    ip_address: Option<String>,
    video_streams: Option<Vec<RawVideoStream>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVideoStream {
    access_point: Option<String>,
}

impl RawCamera {
    fn into_record(self) -> Option<CameraRecord> {
        let Self {
            display_id,
            id,
            display_name,
            ip_address,
            video_streams,
        } = self;
        // The first stream is canonical; later streams are never considered.
        let access_point = video_streams?
            .into_iter()
            .next()?
            .access_point
            .filter(|a| !a.is_empty());
        let Some(access_point) = access_point else {
            debug!("Skipping camera {display_id:?} without an access point");
            return None;
        };
        Some(CameraRecord {
            name: display_name
                .or_else(|| display_id.clone())
                .unwrap_or_else(|| "Unknown camera".to_string()),
            id: display_id.or(id).unwrap_or_default(),
            access_point,
            ip_address: ip_address.unwrap_or_else(|| "N/A".to_string()),
        })
    }
}

/// Parse a catalog payload, given either as a bare list or as an object with a `cameras` list.
pub fn parse_camera_list(text: &str) -> anyhow::Result<Vec<CameraRecord>> {
    let payload: CameraListPayload = serde_json::from_str(text)
        .map_err(|e| Error::MalformedResponse(format!("camera list: {e}")))?;
    let cameras = match payload {
        CameraListPayload::Bare(cameras) => cameras,
        CameraListPayload::Wrapped { cameras } => cameras,
    };
    Ok(cameras
        .into_iter()
        .filter_map(RawCamera::into_record)
        .collect())
}

pub struct ListCamerasRequest {
    _private: (),
}

impl ListCamerasRequest {
    pub async fn send(self, client: &Client) -> anyhow::Result<Vec<CameraRecord>> {
        client
            .until_closed(fetch(client))
            .await
            .context("Failed to fetch camera list")
    }
}

async fn fetch(client: &Client) -> anyhow::Result<Vec<CameraRecord>> {
    let response = send(client.get(PATH)?.timeout(client.fetch_timeout())).await?;
    let text = response.text().await.map_err(from_transport)?;
    parse_camera_list(&text)
}

pub fn list_cameras() -> ListCamerasRequest {
    ListCamerasRequest { _private: () }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_id_is_preferred_over_internal_id() {
        let cameras = parse_camera_list(
            r#"[{"id": "internal", "displayId": "7", "videoStreams": [{"accessPoint": "hosts/S/DeviceIpint.7/SourceEndpoint.video:0:0"}]}]"#,
        )
        .unwrap();
        assert_eq!(cameras[0].id, "7");
        assert_eq!(cameras[0].name, "7");
        assert_eq!(cameras[0].ip_address, "N/A");
    }

    #[test]
    fn internal_id_is_used_without_display_id() {
        let cameras = parse_camera_list(
            r#"{"cameras": [{"id": "internal", "videoStreams": [{"accessPoint": "S/DeviceIpint.1"}]}]}"#,
        )
        .unwrap();
        assert_eq!(cameras[0].id, "internal");
        assert_eq!(cameras[0].name, "Unknown camera");
    }

    #[test]
    fn object_without_camera_field_is_empty() {
        assert!(parse_camera_list(r#"{"search_meta_data": []}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn empty_first_access_point_drops_camera() {
        let cameras = parse_camera_list(
            r#"[{"displayId": "1", "videoStreams": [{"accessPoint": ""}, {"accessPoint": "S/DeviceIpint.1"}]}]"#,
        )
        .unwrap();
        assert!(cameras.is_empty());
    }

    #[test]
    fn scalar_payload_is_malformed() {
        let error = parse_camera_list("42").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::MalformedResponse(_))
        ));
    }
}
