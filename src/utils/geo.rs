use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the map, longitude first
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lng, self.lat)
    }
}

impl std::str::FromStr for Coordinate {
    type Err = String;

    /// Parses `"<lng>,<lat>"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lng, lat) = s
            .split_once(',')
            .ok_or_else(|| format!("expected <lng>,<lat> but got '{}'", s))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| format!("invalid longitude '{}'", lng.trim()))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;

        if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
            return Err(format!("coordinate out of range: {}", s));
        }

        Ok(Self { lng, lat })
    }
}

/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(start: &Coordinate, end: &Coordinate) -> f64 {
    let start_lat = start.lat.to_radians();
    let end_lat = end.lat.to_radians();
    let delta_lat = end_lat - start_lat;
    let delta_lng = end.lng.to_radians() - start.lng.to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + start_lat.cos() * end_lat.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance between two optional points.
///
/// `None` when either point is missing, e.g. a trip that only has an origin so far.
pub fn distance_km(start: Option<&Coordinate>, end: Option<&Coordinate>) -> Option<f64> {
    Some(haversine_distance(start?, end?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_melbourne_geelong() {
        let melbourne = Coordinate::new(144.9631, -37.8136);
        let geelong = Coordinate::new(144.3614, -38.1499);

        let distance = haversine_distance(&melbourne, &geelong);
        // Should be approximately 60-70 km
        assert!(distance > 60.0 && distance < 70.0);
    }

    #[test]
    fn test_same_point_is_zero() {
        let point = Coordinate::new(145.2265143113404, -37.86932655978508);
        assert_eq!(haversine_distance(&point, &point), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let a = Coordinate::new(145.1, -37.9);
        let b = Coordinate::new(144.8, -37.6);
        assert_eq!(haversine_distance(&a, &b), haversine_distance(&b, &a));
    }

    #[test]
    fn test_one_degree_on_equator() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 0.0);
        let distance = haversine_distance(&a, &b);
        assert!((distance - 111.19).abs() < 0.01, "got {}", distance);
    }

    #[test]
    fn test_missing_point_has_no_distance() {
        let a = Coordinate::new(145.1, -37.9);
        assert_eq!(distance_km(Some(&a), None), None);
        assert_eq!(distance_km(None, Some(&a)), None);
        assert_eq!(distance_km(Some(&a), Some(&a)), Some(0.0));
    }

    #[test]
    fn test_parse_coordinate() {
        let parsed: Coordinate = "145.2265, -37.8693".parse().unwrap();
        assert_eq!(parsed, Coordinate::new(145.2265, -37.8693));

        assert!("145.2".parse::<Coordinate>().is_err());
        assert!("abc,1".parse::<Coordinate>().is_err());
        assert!("200,1".parse::<Coordinate>().is_err());
    }
}
