use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::booking::hour_of_day;
use crate::models::fare::{compute_fare, estimate_duration_minutes, is_night_rate};
use crate::models::{Stop, TaxiType, Trip};

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub stops: Vec<Stop>,
    pub taxi_type: TaxiType,
    pub flagged: bool,
    pub time: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub stops: Vec<String>,
    pub taxi_type: TaxiType,
    pub distance_km: f64,
    pub cost: f64,
    pub night_rate: bool,
    pub duration_minutes: u32,
}

/// Estimate for a trip before anything is reserved
pub fn quote(request: &QuoteRequest) -> AppResult<QuoteResponse> {
    if request.stops.len() < 2 {
        return Err(AppError::BadRequest(
            "A trip needs at least two stops".to_string(),
        ));
    }

    let trip = Trip::from_stops(&request.stops);
    let hour = hour_of_day(&request.time);
    let distance_km = trip.total_distance();

    Ok(QuoteResponse {
        stops: request.stops.iter().map(|s| s.formatted.clone()).collect(),
        taxi_type: request.taxi_type,
        distance_km,
        cost: compute_fare(distance_km, request.taxi_type, request.flagged, hour),
        night_rate: is_night_rate(hour),
        duration_minutes: estimate_duration_minutes(distance_km),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::geo::Coordinate;

    fn request(time: &str) -> QuoteRequest {
        QuoteRequest {
            stops: vec![
                Stop::new(Coordinate::new(0.0, 0.0), "A"),
                Stop::new(Coordinate::new(0.05, 0.0), "B"),
                Stop::new(Coordinate::new(0.1, 0.0), "C"),
            ],
            taxi_type: TaxiType::Van,
            flagged: true,
            time: NaiveDateTime::parse_from_str(time, "%Y-%m-%d %H:%M").unwrap(),
        }
    }

    #[test]
    fn test_quote_day() {
        let response = quote(&request("2030-01-01 10:00")).unwrap();

        assert!((response.distance_km - 11.119).abs() < 0.01);
        let expected = 1.622 * response.distance_km + 7.10 + 4.20;
        assert!((response.cost - expected).abs() < 1e-9);
        assert!(!response.night_rate);
        assert_eq!(response.duration_minutes, 14);
        assert_eq!(response.stops, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_quote_night() {
        let day = quote(&request("2030-01-01 16:59")).unwrap();
        let night = quote(&request("2030-01-01 17:00")).unwrap();

        assert!(night.night_rate);
        assert!((night.cost - day.cost * 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_quote_needs_two_stops() {
        let mut req = request("2030-01-01 10:00");
        req.stops.truncate(1);
        assert!(matches!(quote(&req), Err(AppError::BadRequest(_))));
    }
}
