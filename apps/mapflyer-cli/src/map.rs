//! Static map retrieval
//!
//! Builds the Google Static Maps URL with one marker per extracted
//! coordinate and fetches the image. The coordinates go into the URL as
//! the extracted text, so the request reproduces the source precision.

use anyhow::{bail, Context};
use mapflyer_core::Coordinate;
use tracing::debug;

use crate::config::MapConfig;

const STATIC_MAP_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/staticmap";
const MARKER_STYLE: &str = "color:red|size:tiny";

/// Assemble the request URL for the given coordinates.
pub fn map_url(config: &MapConfig, api_key: &str, coordinates: &[Coordinate]) -> String {
    let markers = coordinates
        .iter()
        .map(|c| format!("{},{}", c.latitude, c.longitude))
        .collect::<Vec<_>>()
        .join("|");

    let mut url = format!(
        "{STATIC_MAP_ENDPOINT}?size={}x{}&scale=2&markers={MARKER_STYLE}|{markers}",
        config.width, config.height
    );
    if let Some(center) = &config.center {
        url.push_str(&format!("&center={center}"));
    }
    if let Some(zoom) = config.zoom {
        url.push_str(&format!("&zoom={zoom}"));
    }
    url.push_str(&format!("&key={api_key}"));
    url
}

/// Fetch the map image, failing on any non-success status.
pub fn fetch_map(url: &str) -> anyhow::Result<Vec<u8>> {
    debug!(markers = url.matches('|').count(), "Requesting static map");
    let response = reqwest::blocking::get(url).context("Static map request failed")?;
    let status = response.status();
    if !status.is_success() {
        bail!("Static map request returned {}", status);
    }
    let bytes = response
        .bytes()
        .context("Failed to read static map response")?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinate(lat: &str, lon: &str) -> Coordinate {
        Coordinate {
            latitude: lat.to_string(),
            longitude: lon.to_string(),
            style_url: "#s".to_string(),
        }
    }

    #[test]
    fn test_markers_keep_extraction_order_and_text() {
        let url = map_url(
            &MapConfig::default(),
            "KEY",
            &[coordinate("48.1", "11.5"), coordinate("48.2", "11.60")],
        );
        assert!(url.contains("markers=color:red|size:tiny|48.1,11.5|48.2,11.60"));
        assert!(url.ends_with("&key=KEY"));
    }

    #[test]
    fn test_center_and_zoom_are_optional() {
        let plain = map_url(&MapConfig::default(), "KEY", &[]);
        assert!(!plain.contains("center="));
        assert!(!plain.contains("zoom="));

        let config = MapConfig {
            center: Some("48.06388,11.6681".into()),
            zoom: Some(12),
            ..MapConfig::default()
        };
        let url = map_url(&config, "KEY", &[]);
        assert!(url.contains("&center=48.06388,11.6681"));
        assert!(url.contains("&zoom=12"));
    }

    #[test]
    fn test_size_and_scale_come_from_config() {
        let config = MapConfig {
            width: 800,
            height: 500,
            ..MapConfig::default()
        };
        let url = map_url(&config, "KEY", &[]);
        assert!(url.contains("size=800x500"));
        assert!(url.contains("scale=2"));
    }
}
