//! Location model for geographic coordinates and the resolved address

use chrono::{DateTime, Utc};
use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

const DEFAULT_LATITUDE: f64 = 22.346151;
const DEFAULT_LONGITUDE: f64 = 114.189330;
const DEFAULT_ACCURACY_M: f64 = 100.0;

/// Hong Kong reference point and radius used by the coordinate fallback
const HONG_KONG_CENTER: (f64, f64) = (22.3193, 114.1694);
const HONG_KONG_RADIUS_KM: f64 = 45.0;
const WONG_TAI_SIN_RADIUS_KM: f64 = 4.0;

const RESOLVING: &str = "Resolving...";

/// Fixes closer than this share a resolved address
pub const SAME_FIX_KM: f64 = 0.05;

/// Human readable address for a coordinate fix
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Address {
    pub city: String,
    pub region: String,
    pub country: String,
    pub full: String,
    /// False while this is still the placeholder shown during reverse geocoding
    pub resolved: bool,
}

impl Address {
    #[must_use]
    pub fn new(city: &str, region: &str, country: &str, full: &str) -> Self {
        Self {
            city: city.to_string(),
            region: region.to_string(),
            country: country.to_string(),
            full: full.to_string(),
            resolved: true,
        }
    }

    /// Placeholder used until the background address resolution lands
    #[must_use]
    pub fn resolving() -> Self {
        Self {
            city: RESOLVING.to_string(),
            region: RESOLVING.to_string(),
            country: RESOLVING.to_string(),
            full: "Address resolving...".to_string(),
            resolved: false,
        }
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        !self.resolved
    }

    /// Best-effort address derived from coordinates alone, used when reverse
    /// geocoding fails.
    #[must_use]
    pub fn fallback_for(latitude: f64, longitude: f64) -> Self {
        let here = (latitude, longitude);

        if km_between(here, (DEFAULT_LATITUDE, DEFAULT_LONGITUDE)) <= WONG_TAI_SIN_RADIUS_KM {
            Self::wong_tai_sin()
        } else if km_between(here, HONG_KONG_CENTER) <= HONG_KONG_RADIUS_KM {
            Self::new(
                "Hong Kong",
                "Hong Kong",
                "Hong Kong SAR",
                "Hong Kong, Hong Kong SAR",
            )
        } else {
            Self::new(
                "Unknown City",
                "Unknown Region",
                "Unknown Country",
                &format!("{latitude:.4}, {longitude:.4}"),
            )
        }
    }

    fn wong_tai_sin() -> Self {
        Self::new(
            "Wong Tai Sin",
            "Kowloon",
            "Hong Kong SAR",
            "Wong Tai Sin, Kowloon, Hong Kong SAR",
        )
    }
}

/// A coordinate fix plus its (possibly still resolving) address
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Fix accuracy in meters
    pub accuracy: f64,
    pub captured_at: DateTime<Utc>,
    pub address: Address,
    /// True only when no real fix could be obtained
    pub is_default: bool,
}

impl Location {
    /// A fresh fix whose address still has to be resolved
    #[must_use]
    pub fn from_fix(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            captured_at: Utc::now(),
            address: Address::resolving(),
            is_default: false,
        }
    }

    /// Deterministic fallback location (Wong Tai Sin, Hong Kong)
    #[must_use]
    pub fn default_fix() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            accuracy: DEFAULT_ACCURACY_M,
            captured_at: DateTime::<Utc>::default(),
            address: Address::wong_tai_sin(),
            is_default: true,
        }
    }

    #[must_use]
    pub fn needs_address(&self) -> bool {
        self.address.is_placeholder()
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Whether `(latitude, longitude)` is close enough to share this address
    #[must_use]
    pub fn is_same_fix(&self, latitude: f64, longitude: f64) -> bool {
        km_between((self.latitude, self.longitude), (latitude, longitude)) < SAME_FIX_KM
    }

    /// Great-circle distance to another location in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Location) -> f64 {
        km_between(
            (self.latitude, self.longitude),
            (other.latitude, other.longitude),
        )
    }
}

fn km_between(from: (f64, f64), to: (f64, f64)) -> f64 {
    distance(
        HaversineLocation {
            latitude: from.0,
            longitude: from.1,
        },
        HaversineLocation {
            latitude: to.0,
            longitude: to.1,
        },
        Units::Kilometers,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_fix_is_resolved_and_default() {
        let location = Location::default_fix();
        assert!(location.is_default);
        assert!(!location.needs_address());
        assert_eq!(location.address.city, "Wong Tai Sin");
        assert_eq!(location, Location::default_fix());
    }

    #[test]
    fn test_from_fix_needs_address() {
        let location = Location::from_fix(51.5, -0.12, 12.0);
        assert!(!location.is_default);
        assert!(location.needs_address());
        assert_eq!(location.format_coordinates(), "51.5000, -0.1200");
    }

    #[rstest]
    #[case(22.346151, 114.189330, "Wong Tai Sin")]
    #[case(22.2783, 114.1747, "Hong Kong")]
    #[case(48.8566, 2.3522, "Unknown City")]
    fn test_address_fallback(#[case] lat: f64, #[case] lon: f64, #[case] city: &str) {
        let address = Address::fallback_for(lat, lon);
        assert_eq!(address.city, city);
        assert!(address.resolved);
    }

    #[test]
    fn test_unknown_fallback_uses_coordinates() {
        let address = Address::fallback_for(48.8566, 2.3522);
        assert_eq!(address.full, "48.8566, 2.3522");
    }

    #[rstest]
    #[case(51.5072, -0.1276, true)]
    #[case(51.5074, -0.1276, true)]
    #[case(51.5082, -0.1276, false)]
    #[case(22.3193, 114.1694, false)]
    fn test_is_same_fix(#[case] lat: f64, #[case] lon: f64, #[case] same: bool) {
        let location = Location::from_fix(51.5072, -0.1276, 10.0);
        assert_eq!(location.is_same_fix(lat, lon), same);
    }

    #[test]
    fn test_distance_km() {
        let a = Location::from_fix(22.3193, 114.1694, 10.0);
        let b = Location::default_fix();
        let d = a.distance_km(&b);
        assert!(d > 1.0 && d < 10.0, "unexpected distance {d}");
    }
}
