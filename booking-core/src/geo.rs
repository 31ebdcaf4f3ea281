//! Great-circle distance and travel time estimates.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Assumed average speed of 30 km/h.
pub const MINUTES_PER_KM: f64 = 2.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a point only when both coordinates are present and finite.
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some(Self { lat, lng }),
            _ => None,
        }
    }
}

/// Distance plus the derived travel time, as shown on doctor cards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TravelEstimate {
    pub distance_km: f64,
    pub minutes: u32,
}

impl TravelEstimate {
    pub fn between(from: Option<GeoPoint>, to: Option<GeoPoint>) -> Option<Self> {
        let distance_km = distance_km(from, to)?;
        let minutes = travel_minutes(Some(distance_km))?;
        Some(Self {
            distance_km,
            minutes,
        })
    }
}

pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// `None` whenever either endpoint is unknown.
pub fn distance_km(from: Option<GeoPoint>, to: Option<GeoPoint>) -> Option<f64> {
    Some(haversine_km(from?, to?))
}

/// Whole minutes needed to cover `distance`, rounded to nearest.
pub fn travel_minutes(distance: Option<f64>) -> Option<u32> {
    let distance = distance.filter(|km| km.is_finite() && *km >= 0.0)?;
    Some((distance * MINUTES_PER_KM).round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DHAKA: GeoPoint = GeoPoint {
        lat: 23.8103,
        lng: 90.4125,
    };
    const CHITTAGONG: GeoPoint = GeoPoint {
        lat: 22.3569,
        lng: 91.7832,
    };

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(distance_km(Some(DHAKA), Some(DHAKA)), Some(0.0));
        let origin = GeoPoint::new(0.0, 0.0);
        assert_eq!(distance_km(Some(origin), Some(origin)), Some(0.0));
    }

    #[test]
    fn distance_matches_known_city_pair() {
        let km = distance_km(Some(DHAKA), Some(CHITTAGONG)).expect("both points known");
        assert!((km - 213.95).abs() < 0.1, "unexpected distance {km}");
        let back = haversine_km(CHITTAGONG, DHAKA);
        assert!((km - back).abs() < 1e-9);
    }

    #[test]
    fn missing_coordinates_yield_none() {
        assert_eq!(GeoPoint::from_parts(Some(1.0), None), None);
        assert_eq!(GeoPoint::from_parts(None, Some(1.0)), None);
        assert_eq!(GeoPoint::from_parts(Some(f64::NAN), Some(1.0)), None);
        assert_eq!(distance_km(None, Some(DHAKA)), None);
        assert_eq!(distance_km(Some(DHAKA), None), None);
        assert_eq!(travel_minutes(None), None);
        assert_eq!(TravelEstimate::between(Some(DHAKA), None), None);
    }

    #[test]
    fn travel_minutes_rounds_double_the_distance() {
        assert_eq!(travel_minutes(Some(0.0)), Some(0));
        assert_eq!(travel_minutes(Some(2.2)), Some(4));
        assert_eq!(travel_minutes(Some(2.3)), Some(5));
        assert_eq!(travel_minutes(Some(15.0)), Some(30));
    }

    #[test]
    fn estimate_combines_distance_and_minutes() {
        let estimate =
            TravelEstimate::between(Some(DHAKA), Some(CHITTAGONG)).expect("both points known");
        assert_eq!(
            estimate.minutes,
            (estimate.distance_km * 2.0).round() as u32
        );
    }
}
