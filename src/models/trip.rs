use serde::{Deserialize, Serialize};

use crate::utils::geo::{Coordinate, haversine_distance};

/// A chosen point together with the address shown for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub coordinate: Coordinate,
    pub formatted: String,
}

impl Stop {
    pub fn new(coordinate: Coordinate, formatted: impl Into<String>) -> Self {
        Self {
            coordinate,
            formatted: formatted.into(),
        }
    }
}

/// One origin to destination leg. The distance is fixed when the leg is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub start: Coordinate,
    pub formatted_start: String,
    pub end: Coordinate,
    pub formatted_end: String,
    pub distance: f64,
}

impl Route {
    pub fn new(
        start: Coordinate,
        end: Coordinate,
        formatted_start: impl Into<String>,
        formatted_end: impl Into<String>,
    ) -> Self {
        Self {
            start,
            formatted_start: formatted_start.into(),
            end,
            formatted_end: formatted_end.into(),
            distance: haversine_distance(&start, &end),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    routes: Vec<Route>,
    total_distance: f64,
}

impl Trip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chains consecutive stops into legs. Fewer than two stops gives an empty trip.
    pub fn from_stops(stops: &[Stop]) -> Self {
        let mut trip = Self::new();
        for pair in stops.windows(2) {
            trip.add_route(
                pair[0].coordinate,
                pair[1].coordinate,
                pair[0].formatted.clone(),
                pair[1].formatted.clone(),
            );
        }
        trip
    }

    /// Appends a leg. The caller keeps `start` equal to the previous leg's end.
    pub fn add_route(
        &mut self,
        start: Coordinate,
        end: Coordinate,
        formatted_start: impl Into<String>,
        formatted_end: impl Into<String>,
    ) {
        let route = Route::new(start, end, formatted_start, formatted_end);
        self.total_distance += route.distance;
        self.routes.push(route);
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Ordered points for the map: every leg's start, then the final end.
    pub fn waypoints(&self) -> Vec<Coordinate> {
        let mut points: Vec<Coordinate> = self.routes.iter().map(|r| r.start).collect();
        if let Some(last) = self.routes.last() {
            points.push(last.end);
        }
        points
    }

    pub fn formatted_stops(&self) -> Vec<&str> {
        let mut stops: Vec<&str> = self
            .routes
            .iter()
            .map(|r| r.formatted_start.as_str())
            .collect();
        if let Some(last) = self.routes.last() {
            stops.push(last.formatted_end.as_str());
        }
        stops
    }
}
