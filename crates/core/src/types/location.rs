//! Delivery coordinates and map-link parsing.
//!
//! Customers paste whatever their map app gives them when sharing a pin.
//! [`extract_coordinates`] pulls a latitude/longitude pair out of the common
//! Google Maps shapes and plain `lat,lng` text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Errors from building a [`GeoPoint`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),
    #[error("no coordinates found in input")]
    NotFound,
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Build a range-checked point.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError`] if either coordinate is out of range or not finite.
    pub fn new(lat: f64, lng: f64) -> Result<Self, LocationError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(LocationError::LatitudeOutOfRange(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(LocationError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Link that opens the point in Google Maps.
    #[must_use]
    pub fn maps_url(&self) -> String {
        format!("https://www.google.com/maps?q={},{}", self.lat, self.lng)
    }
}

const NUM: &str = r"(-?\d{1,3}(?:\.\d+)?)";

// Place pins (`!3d..!4d..`) are checked before the `@` viewport centre, which
// can be offset from the pin itself.
static PIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"!3d{NUM}!4d{NUM}")).expect("Invalid regex")
});

static PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)[?&](?:q|query|ll|destination)=(?:loc:)?{NUM}(?:,|%2C)\s*(?:\+|%20)?{NUM}"
    ))
    .expect("Invalid regex")
});

static AT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"@{NUM},{NUM}")).expect("Invalid regex"));

static BARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*{NUM}\s*,\s*{NUM}\s*$")).expect("Invalid regex")
});

/// Extract a coordinate pair from a map share link or `lat,lng` text.
///
/// ```
/// use dukkan_core::extract_coordinates;
///
/// let point = extract_coordinates("https://maps.google.com/?q=24.7136,46.6753").unwrap();
/// assert_eq!((point.lat, point.lng), (24.7136, 46.6753));
/// ```
///
/// # Errors
///
/// Returns [`LocationError::NotFound`] if no pattern matches, or a range
/// error if the matched pair is not a valid point.
pub fn extract_coordinates(input: &str) -> Result<GeoPoint, LocationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(LocationError::NotFound);
    }

    for re in [&*PIN_RE, &*PARAM_RE, &*AT_RE, &*BARE_RE] {
        if let Some(caps) = re.captures(input) {
            let lat = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
            let lng = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
            if let (Some(lat), Some(lng)) = (lat, lng) {
                return GeoPoint::new(lat, lng);
            }
        }
    }

    Err(LocationError::NotFound)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn pair(input: &str) -> (f64, f64) {
        let p = extract_coordinates(input).unwrap();
        (p.lat, p.lng)
    }

    #[test]
    fn test_at_viewport() {
        assert_eq!(
            pair("https://www.google.com/maps/@24.7136,46.6753,15z"),
            (24.7136, 46.6753)
        );
    }

    #[test]
    fn test_query_parameters() {
        assert_eq!(pair("https://maps.google.com/?q=21.4858,39.1925"), (21.4858, 39.1925));
        assert_eq!(
            pair("https://www.google.com/maps/search/?api=1&query=26.4207%2C50.0888"),
            (26.4207, 50.0888)
        );
        assert_eq!(pair("https://maps.google.com/?ll=24.1,46.2&z=10"), (24.1, 46.2));
        assert_eq!(
            pair("https://www.google.com/maps/dir/?api=1&destination=24.5,46.5"),
            (24.5, 46.5)
        );
    }

    #[test]
    fn test_place_pin_preferred_over_viewport() {
        let url = "https://www.google.com/maps/place/X/@24.70,46.60,17z/data=!3m1!4b1!4m5!3m4!1s0x0:0x0!8m2!3d24.7136!4d46.6753";
        assert_eq!(pair(url), (24.7136, 46.6753));
    }

    #[test]
    fn test_bare_pair() {
        assert_eq!(pair(" 24.7136 , 46.6753 "), (24.7136, 46.6753));
        assert_eq!(pair("-33.9,18.4"), (-33.9, 18.4));
    }

    #[test]
    fn test_rejects_missing_and_out_of_range() {
        assert_eq!(extract_coordinates(""), Err(LocationError::NotFound));
        assert_eq!(
            extract_coordinates("https://maps.app.goo.gl/abc123"),
            Err(LocationError::NotFound)
        );
        assert_eq!(
            extract_coordinates("95.0,46.0"),
            Err(LocationError::LatitudeOutOfRange(95.0))
        );
        assert_eq!(
            extract_coordinates("24.0,190.0"),
            Err(LocationError::LongitudeOutOfRange(190.0))
        );
    }

    #[test]
    fn test_maps_url() {
        let p = GeoPoint::new(24.5, 46.25).unwrap();
        assert_eq!(p.maps_url(), "https://www.google.com/maps?q=24.5,46.25");
    }
}
