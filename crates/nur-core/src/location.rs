//! Geographic location a schedule is computed for.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Mean Earth radius used by the haversine distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance beyond which a location change is considered significant.
pub const SIGNIFICANT_CHANGE_KM: f64 = 50.0;

/// A place on Earth plus its display strings.
///
/// Equality compares every field. Cache lookups use [`Location::same_place`],
/// which only compares coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    #[serde(default)]
    pub country: String,
    /// `true` when entered by the user, `false` when detected by the device.
    #[serde(default)]
    pub is_manual: bool,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, city: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            city: city.into(),
            country: String::new(),
            is_manual: false,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn manual(mut self) -> Self {
        self.is_manual = true;
        self
    }

    /// Cupertino, CA.
    pub fn cupertino() -> Self {
        Self::new(37.3230, -122.0322, "Cupertino").with_country("United States")
    }

    pub fn new_york() -> Self {
        Self::new(40.7128, -74.0060, "New York").with_country("United States")
    }

    pub fn mecca() -> Self {
        Self::new(21.4225, 39.8262, "Mecca").with_country("Saudi Arabia")
    }

    /// Reject coordinates outside [-90, 90] x [-180, 180] or non-finite ones.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lon_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(ValidationError::InvalidCoordinates {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    /// Coordinates match exactly; display text is ignored.
    pub fn same_place(&self, other: &Location) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }

    /// "City, Country", or just the city when no country is set.
    pub fn display_name(&self) -> String {
        if self.country.is_empty() {
            self.city.clone()
        } else {
            format!("{}, {}", self.city, self.country)
        }
    }

    /// e.g. "40.7128°N, 74.0060°W"
    pub fn coordinate_string(&self) -> String {
        let lat_dir = if self.latitude >= 0.0 { "N" } else { "S" };
        let lon_dir = if self.longitude >= 0.0 { "E" } else { "W" };
        format!(
            "{:.4}°{}, {:.4}°{}",
            self.latitude.abs(),
            lat_dir,
            self.longitude.abs(),
            lon_dir
        )
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &Location) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }

    pub fn has_significant_change(&self, other: &Location) -> bool {
        self.distance_km(other) > SIGNIFICANT_CHANGE_KM
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::cupertino()
    }
}
