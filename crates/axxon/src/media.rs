//! Parameters shared by the live and archive media endpoints.

use std::{fmt, str::FromStr};

use crate::error::Error;

/// Remove the `hosts/` segment that the camera catalog prepends to access points.
///
/// The media endpoints expect the bare `SERVER/DeviceIpint.N/...` form.
pub fn strip_hosts_prefix(access_point: &str) -> &str {
    access_point.strip_prefix("hosts/").unwrap_or(access_point)
}

/// Requested image size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Parse `"{width}x{height}"`, or `"Original"` for the native camera resolution.
    ///
    /// Example: `"1920x1080"`.
    pub fn parse_optional(s: &str) -> anyhow::Result<Option<Self>> {
        if s.eq_ignore_ascii_case("original") {
            return Ok(None);
        }
        Ok(Some(s.parse()?))
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidInput(format!("resolution {s:?}, expected WIDTHxHEIGHT"));
        let (width, height) = s.split_once(|c: char| c == 'x' || c == 'X').ok_or_else(invalid)?;
        let width = width.trim().parse().map_err(|_| invalid())?;
        let height = height.trim().parse().map_err(|_| invalid())?;
        Ok(Self { width, height })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Resize parameters are only sent when both dimensions are known and non-zero.
pub(crate) fn resize_query(width: Option<u32>, height: Option<u32>) -> Vec<(&'static str, String)> {
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => vec![("w", w.to_string()), ("h", h.to_string())],
        _ => Vec::new(),
    }
}
