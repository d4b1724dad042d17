//! Client for the snapshot endpoints of the Axxon One VMS HTTP API.
pub mod archive_media;
pub mod batch;
mod camera_list;
mod client;
mod error;
pub mod live_media;
mod media;
pub mod mjpeg;

pub use camera_list::{list_cameras, parse_camera_list, CameraRecord, ListCamerasRequest};
pub use client::{
    authorization_headers, Client, ClientBuilder, Scheme, FETCH_TIMEOUT, PROBE_TIMEOUT,
};
pub use error::Error;
pub use media::{strip_hosts_prefix, Resolution};
